use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use qbank::config::{find_default_config, init_default_config, load_config, AppConfig, RunConfig};
use qbank::merge::{merge, normalize, MergeOptions};
use qbank::pipeline::GenPipeline;
use qbank::progress::ConsoleProgress;
use qbank::providers::configured_backends;

#[derive(Parser, Debug)]
#[command(name = "qbank")]
#[command(about = "Arabic quiz question-bank generator (LLM backends + merge tool)", long_about = None)]
struct Args {
    /// Merge one or more add-files into the main corpus, then exit
    #[arg(long, value_name = "JSON", num_args = 1..)]
    merge: Vec<PathBuf>,

    /// Re-canonicalize the main corpus in place, then exit
    #[arg(long)]
    normalize: bool,

    /// Actually write (merge/normalize default to a dry-run report)
    #[arg(long)]
    apply: bool,

    /// Truncate merged add-files to [] after a successful --merge --apply
    #[arg(long)]
    clear_after: bool,

    /// Generate a default config file, then exit
    #[arg(long)]
    init_config: bool,

    /// Directory to write the config file (default: current directory)
    #[arg(long, value_name = "DIR")]
    init_config_dir: Option<PathBuf>,

    /// Overwrite an existing config file when used with --init-config
    #[arg(long)]
    force: bool,

    /// Target corpus size
    #[arg(long, env = "TOTAL")]
    total: Option<usize>,

    /// Questions requested per batch
    #[arg(long, env = "BATCH")]
    batch: Option<usize>,

    /// Gemini model identifier
    #[arg(long, env = "MODEL")]
    model: Option<String>,

    /// Pause between accepted batches, milliseconds
    #[arg(long = "delay-ms", env = "DELAY_BETWEEN_BATCHES_MS")]
    delay_ms: Option<u64>,

    /// Cooldown after an all-backends rate limit, seconds (0 disables)
    #[arg(long = "retry-429-sec", env = "RETRY_AFTER_429_SEC")]
    retry_429_sec: Option<u64>,

    /// Consecutive generation failures before aborting
    #[arg(long = "max-fails", env = "MAX_CONSECUTIVE_FAILS")]
    max_fails: Option<u32>,

    /// Generation checkpoint file
    #[arg(long, env = "OUT_FILE", value_name = "JSON")]
    out: Option<PathBuf>,

    /// Main corpus file (merge/normalize target)
    #[arg(long = "main-file", env = "MAIN_FILE", value_name = "JSON")]
    main_file: Option<PathBuf>,

    /// Config file path (default: search for qbank.toml upwards)
    #[arg(long, env = "QBANK_CONFIG")]
    config: Option<PathBuf>,

    /// Suppress the progress log on stderr
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let progress = ConsoleProgress::new(!args.quiet);

    if args.init_config {
        let dir = args
            .init_config_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let cfg_path = init_default_config(&dir, args.force).context("init default config")?;
        eprintln!("Wrote config: {}", cfg_path.display());
        return Ok(());
    }

    let file_cfg = match args.config.clone().or_else(find_default_config) {
        Some(path) => load_config(&path)?,
        None => AppConfig::default(),
    };
    let cfg = RunConfig::resolve(
        &file_cfg,
        args.total,
        args.batch,
        args.model.clone(),
        args.delay_ms,
        args.retry_429_sec,
        args.max_fails,
        args.out.clone(),
        args.main_file.clone(),
    )?;

    if !args.merge.is_empty() {
        merge(
            &cfg.main_file,
            &args.merge,
            MergeOptions {
                apply: args.apply,
                clear_after: args.clear_after,
            },
            &progress,
        )?;
        return Ok(());
    }

    if args.normalize {
        normalize(&cfg.main_file, args.apply, &progress)?;
        return Ok(());
    }

    let backends = configured_backends(&cfg);
    let report = GenPipeline::new(cfg, backends, progress).run()?;
    eprintln!(
        "done: {} questions ({} added this run, {} batches)",
        report.corpus_size, report.added, report.batches_accepted
    );
    Ok(())
}
