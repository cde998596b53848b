use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_FILENAME: &str = "qbank.toml";

pub const DEFAULT_TOTAL: usize = 150;
pub const DEFAULT_BATCH: usize = 25;
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_DELAY_MS: u64 = 12_000;
pub const DEFAULT_RETRY_429_SEC: u64 = 90;
pub const DEFAULT_MAX_FAILS: u32 = 3;
pub const DEFAULT_OUT_FILE: &str = "data/questions_new.json";
pub const DEFAULT_MAIN_FILE: &str = "data/questions.json";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub providers: ProvidersSection,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PipelineSection {
    /// Target corpus size for one generation run.
    #[serde(default)]
    pub total: Option<usize>,
    /// Candidates requested per batch.
    #[serde(default)]
    pub batch: Option<usize>,
    #[serde(default)]
    pub delay_between_batches_ms: Option<u64>,
    /// Cooldown after all backends report a rate limit. 0 disables the
    /// cooldown path; such failures then burn the failure budget.
    #[serde(default)]
    pub retry_after_429_sec: Option<u64>,
    #[serde(default)]
    pub max_consecutive_fails: Option<u32>,
    #[serde(default)]
    pub out_file: Option<String>,
    /// Canonical corpus the merge tool maintains.
    #[serde(default)]
    pub main_file: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ProvidersSection {
    /// Fallback priority. Unknown names are rejected at startup; known names
    /// without an API key in the environment are skipped at call time.
    #[serde(default)]
    pub order: Option<Vec<String>>,
    /// Per-provider model identifier overrides.
    #[serde(default)]
    pub models: HashMap<String, String>,
}

/// Fully resolved run settings. Precedence per knob: CLI flag (or its
/// environment variable, via clap) > config file > built-in default.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub total: usize,
    pub batch: usize,
    pub delay_between_batches: std::time::Duration,
    pub retry_after_429: std::time::Duration,
    pub max_consecutive_fails: u32,
    pub out_file: PathBuf,
    pub main_file: PathBuf,
    pub model: String,
    pub provider_order: Vec<String>,
    pub provider_models: HashMap<String, String>,
}

pub const KNOWN_PROVIDERS: [&str; 4] = ["gemini", "claude", "openai", "deepseek"];

impl RunConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        file_cfg: &AppConfig,
        total: Option<usize>,
        batch: Option<usize>,
        model: Option<String>,
        delay_ms: Option<u64>,
        retry_429_sec: Option<u64>,
        max_fails: Option<u32>,
        out_file: Option<PathBuf>,
        main_file: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let p = &file_cfg.pipeline;
        let provider_order = file_cfg
            .providers
            .order
            .clone()
            .unwrap_or_else(|| KNOWN_PROVIDERS.iter().map(|s| s.to_string()).collect());
        for name in &provider_order {
            if !KNOWN_PROVIDERS.contains(&name.as_str()) {
                anyhow::bail!("unknown provider in config order: {name}");
            }
        }

        let total = total.or(p.total).unwrap_or(DEFAULT_TOTAL);
        let batch = batch.or(p.batch).unwrap_or(DEFAULT_BATCH).max(1);
        Ok(Self {
            total,
            batch,
            delay_between_batches: std::time::Duration::from_millis(
                delay_ms
                    .or(p.delay_between_batches_ms)
                    .unwrap_or(DEFAULT_DELAY_MS),
            ),
            retry_after_429: std::time::Duration::from_secs(
                retry_429_sec
                    .or(p.retry_after_429_sec)
                    .unwrap_or(DEFAULT_RETRY_429_SEC),
            ),
            max_consecutive_fails: max_fails
                .or(p.max_consecutive_fails)
                .unwrap_or(DEFAULT_MAX_FAILS)
                .max(1),
            out_file: out_file
                .or_else(|| p.out_file.clone().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_FILE)),
            main_file: main_file
                .or_else(|| p.main_file.clone().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MAIN_FILE)),
            model: model
                .or_else(|| file_cfg.providers.models.get("gemini").cloned())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            provider_order,
            provider_models: file_cfg.providers.models.clone(),
        })
    }
}

fn find_file_upwards(start: &Path, filename: &str, max_depth: usize) -> Option<PathBuf> {
    let mut dir = Some(start.to_path_buf());
    for _ in 0..max_depth {
        let d = dir?;
        let candidate = d.join(filename);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = d.parent().map(|p| p.to_path_buf());
    }
    None
}

/// Search for the config file upwards from the working directory, then from
/// the executable's directory.
pub fn find_default_config() -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(p) = find_file_upwards(&cwd, CONFIG_FILENAME, 8) {
            return Some(p);
        }
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            if let Some(p) = find_file_upwards(dir, CONFIG_FILENAME, 8) {
                return Some(p);
            }
        }
    }
    None
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: AppConfig = toml::from_str(&text).context("parse config toml")?;
    Ok(cfg)
}

/// Write a commented default `qbank.toml`, leaving an existing one alone
/// unless forced.
pub fn init_default_config(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create config dir: {}", dir.display()))?;
    let cfg_path = dir.join(CONFIG_FILENAME);
    if cfg_path.exists() && !force {
        return Ok(cfg_path);
    }

    let cfg_text = r#"[pipeline]
total = 150
batch = 25
delay_between_batches_ms = 12000
# Cooldown after every backend reports a rate limit. 0 disables the cooldown;
# rate limits then count against max_consecutive_fails like any other failure.
retry_after_429_sec = 90
max_consecutive_fails = 3
out_file = "data/questions_new.json"
main_file = "data/questions.json"

[providers]
# Fallback priority. A provider is only called when its API key is present:
# GEMINI_API_KEY | ANTHROPIC_API_KEY | OPENAI_API_KEY | DEEPSEEK_API_KEY
order = ["gemini", "claude", "openai", "deepseek"]

[providers.models]
gemini = "gemini-2.5-flash"
claude = "claude-3-5-sonnet-20241022"
openai = "gpt-4o-mini"
deepseek = "deepseek-chat"
"#;

    std::fs::write(&cfg_path, cfg_text)
        .with_context(|| format!("write config: {}", cfg_path.display()))?;
    Ok(cfg_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_everything_is_absent() {
        let cfg = RunConfig::resolve(
            &AppConfig::default(),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            None,
        )
        .expect("resolve");
        assert_eq!(cfg.total, DEFAULT_TOTAL);
        assert_eq!(cfg.batch, DEFAULT_BATCH);
        assert_eq!(cfg.max_consecutive_fails, DEFAULT_MAX_FAILS);
        assert_eq!(cfg.out_file, PathBuf::from(DEFAULT_OUT_FILE));
        assert_eq!(cfg.provider_order.len(), 4);
    }

    #[test]
    fn cli_overrides_file_values() {
        let file_cfg: AppConfig = toml::from_str(
            r#"
            [pipeline]
            total = 500
            batch = 10
            "#,
        )
        .expect("toml");
        let cfg = RunConfig::resolve(
            &file_cfg,
            Some(60),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
        )
        .expect("resolve");
        assert_eq!(cfg.total, 60);
        assert_eq!(cfg.batch, 10);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let file_cfg: AppConfig = toml::from_str(
            r#"
            [providers]
            order = ["gemini", "yahoo"]
            "#,
        )
        .expect("toml");
        let err = RunConfig::resolve(
            &file_cfg,
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("yahoo"));
    }

    #[test]
    fn init_config_respects_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = init_default_config(dir.path(), false).expect("init");
        std::fs::write(&first, "# custom\n").expect("overwrite");
        let second = init_default_config(dir.path(), false).expect("init again");
        assert_eq!(first, second);
        assert_eq!(std::fs::read_to_string(&second).expect("read"), "# custom\n");
        init_default_config(dir.path(), true).expect("forced");
        assert!(std::fs::read_to_string(&second)
            .expect("read")
            .contains("[pipeline]"));
    }
}
