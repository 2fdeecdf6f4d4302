//! Model backend configuration.
//!
//! API keys are never stored here - only the name of the environment
//! variable that holds one. Local backends need no key at all.

use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_MODEL: &str = "qwen3:8b";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the generative-model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the chat endpoint host.
    pub base_url: String,
    /// Model name, e.g. "qwen3:8b".
    pub model: String,
    /// Environment variable holding the API key, if the backend needs one.
    pub api_key_env: Option<String>,
    /// Whole-request timeout applied at the HTTP client.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::local(DEFAULT_BASE_URL, DEFAULT_MODEL)
    }
}

impl BackendConfig {
    /// Local backend (Ollama-style); no API key.
    pub fn local(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key_env: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Remote backend; the key is read from `api_key_env` at request time.
    pub fn remote(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key_env: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key_env: Some(api_key_env.into()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Build from `RECYCLE_AI_URL`, `RECYCLE_AI_MODEL`,
    /// `RECYCLE_AI_KEY_ENV` and `RECYCLE_AI_TIMEOUT_SECS`, falling back
    /// to the local defaults for anything unset.
    pub fn from_env() -> Self {
        let base_url = env::var("RECYCLE_AI_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = env::var("RECYCLE_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_key_env = env::var("RECYCLE_AI_KEY_ENV").ok().filter(|v| !v.is_empty());
        let timeout_secs = env::var("RECYCLE_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self {
            base_url,
            model,
            api_key_env,
            timeout_secs,
        }
    }

    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_ref()
            .and_then(|name| env::var(name).ok())
            .filter(|key| !key.is_empty())
    }
}
