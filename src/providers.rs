use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::config::RunConfig;
use crate::errors::ProviderError;
use crate::provider::GenBackend;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

const DEFAULT_CLAUDE_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";

fn env_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Build the backend chain from the configured priority order. A provider
/// without its API key in the environment is silently left out; the run
/// fails up front only when the chain ends up empty.
pub fn configured_backends(cfg: &RunConfig) -> Vec<Box<dyn GenBackend>> {
    let model_for = |name: &str, default: &str| -> String {
        cfg.provider_models
            .get(name)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    };
    let mut backends: Vec<Box<dyn GenBackend>> = Vec::new();
    for name in &cfg.provider_order {
        match name.as_str() {
            "gemini" => {
                if let Some(api_key) = env_key("GEMINI_API_KEY") {
                    backends.push(Box::new(GeminiBackend {
                        api_key,
                        model: cfg.model.clone(),
                    }));
                }
            }
            "claude" => {
                if let Some(api_key) = env_key("ANTHROPIC_API_KEY") {
                    backends.push(Box::new(ClaudeBackend {
                        api_key,
                        model: model_for("claude", DEFAULT_CLAUDE_MODEL),
                    }));
                }
            }
            "openai" => {
                if let Some(api_key) = env_key("OPENAI_API_KEY") {
                    backends.push(Box::new(ChatCompletionsBackend::openai(
                        api_key,
                        model_for("openai", DEFAULT_OPENAI_MODEL),
                    )));
                }
            }
            "deepseek" => {
                if let Some(api_key) = env_key("DEEPSEEK_API_KEY") {
                    backends.push(Box::new(ChatCompletionsBackend::deepseek(
                        api_key,
                        model_for("deepseek", DEFAULT_DEEPSEEK_MODEL),
                    )));
                }
            }
            _ => {}
        }
    }
    backends
}

fn http_client() -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Transient(format!("build http client: {e}")))
}

/// Map an HTTP status + body excerpt to the failure taxonomy. 429 drives the
/// cooldown path; 400/401/403 mark a dead key so fallback moves on for the
/// rest of the run's iteration.
fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let excerpt: String = body.chars().take(200).collect();
    let msg = format!("HTTP {}: {excerpt}", status.as_u16());
    match status.as_u16() {
        429 => ProviderError::RateLimited(msg),
        400 | 401 | 403 => ProviderError::Unauthorized(msg),
        _ => ProviderError::Transient(msg),
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    ProviderError::Transient(e.to_string())
}

fn post_json(url: &str, headers: &[(&str, &str)], body: &Value) -> Result<Value, ProviderError> {
    let client = http_client()?;
    let mut req = client.post(url).json(body);
    for (k, v) in headers {
        req = req.header(*k, *v);
    }
    let res = req.send().map_err(transport_error)?;
    let status = res.status();
    if !status.is_success() {
        let text = res.text().unwrap_or_default();
        return Err(classify_status(status, &text));
    }
    res.json::<Value>().map_err(transport_error)
}

/// Google Gemini `generateContent` endpoint.
pub struct GeminiBackend {
    pub api_key: String,
    pub model: String,
}

impl GenBackend for GeminiBackend {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {"temperature": 0.7, "topP": 0.9, "maxOutputTokens": 8192},
        });
        let data = post_json(&url, &[], &body)?;
        let text = data["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();
        Ok(text.trim().to_string())
    }
}

/// Anthropic messages API.
pub struct ClaudeBackend {
    pub api_key: String,
    pub model: String,
}

impl GenBackend for ClaudeBackend {
    fn name(&self) -> &str {
        "Claude"
    }

    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "max_tokens": 8192,
            "messages": [{"role": "user", "content": prompt}],
        });
        let data = post_json(
            "https://api.anthropic.com/v1/messages",
            &[
                ("x-api-key", self.api_key.as_str()),
                ("anthropic-version", "2023-06-01"),
            ],
            &body,
        )?;
        let text = data["content"]
            .as_array()
            .and_then(|blocks| {
                blocks
                    .iter()
                    .find(|b| b["type"] == "text")
                    .and_then(|b| b["text"].as_str())
            })
            .unwrap_or_default();
        Ok(text.trim().to_string())
    }
}

/// OpenAI-style chat completions; shared by OpenAI and DeepSeek, which speak
/// the same wire dialect at different hosts.
pub struct ChatCompletionsBackend {
    pub label: &'static str,
    pub url: &'static str,
    pub api_key: String,
    pub model: String,
}

impl ChatCompletionsBackend {
    pub fn openai(api_key: String, model: String) -> Self {
        Self {
            label: "OpenAI",
            url: "https://api.openai.com/v1/chat/completions",
            api_key,
            model,
        }
    }

    pub fn deepseek(api_key: String, model: String) -> Self {
        Self {
            label: "DeepSeek",
            url: "https://api.deepseek.com/v1/chat/completions",
            api_key,
            model,
        }
    }
}

impl GenBackend for ChatCompletionsBackend {
    fn name(&self) -> &str {
        self.label
    }

    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": 8192,
        });
        let auth = format!("Bearer {}", self.api_key);
        let data = post_json(self.url, &[("Authorization", auth.as_str())], &body)?;
        let text = data["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "quota"),
            ProviderError::RateLimited(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "expired key"),
            ProviderError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "bad key format"),
            ProviderError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            ProviderError::Transient(_)
        ));
    }

    #[test]
    fn excerpt_is_capped() {
        let long_body = "x".repeat(5000);
        let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, &long_body);
        assert!(err.to_string().len() < 300);
    }
}
