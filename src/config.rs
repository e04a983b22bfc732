//! Configuration helpers for PictoQuery
//!
//! Resolves the endpoint, model and API key from (in order) the environment,
//! explicit arguments and provider defaults. The API key can also come from a
//! TOML secrets file:
//!
//! ```toml
//! [openai]
//! api_key = "sk-..."
//! ```

use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Environment variable overriding the endpoint URL
pub const BASE_URL_ENV: &str = "PICTOQUERY_BASE_URL";

/// Environment variable overriding the model identifier
pub const MODEL_ENV: &str = "PICTOQUERY_MODEL";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Older vision model identifier still accepted by some deployments
pub const LEGACY_MODEL: &str = "gpt-4-vision-preview";

/// Secrets file looked up when no path is given
pub const DEFAULT_SECRETS_PATH: &str = "secrets.toml";

/// Supported provider shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    OpenAI,
    LMStudio,
    Ollama,
    LlamaCpp,
    VLLM,
}

impl Provider {
    /// Get the default base URL for this provider
    pub fn default_url(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::LMStudio => "http://localhost:1234/v1",
            Provider::Ollama => "http://localhost:11434/v1",
            Provider::LlamaCpp => "http://localhost:8080/v1",
            Provider::VLLM => "http://localhost:8000/v1",
        }
    }

    /// Parse a provider name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAI),
            "lmstudio" | "lm-studio" | "lm_studio" => Some(Provider::LMStudio),
            "ollama" => Some(Provider::Ollama),
            "llamacpp" | "llama-cpp" | "llama_cpp" | "llama.cpp" => Some(Provider::LlamaCpp),
            "vllm" => Some(Provider::VLLM),
            _ => None,
        }
    }
}

/// Get the base URL from environment variable or provider default
///
/// Priority:
/// 1. PICTOQUERY_BASE_URL environment variable
/// 2. Provider default URL (if provider is Some)
/// 3. fallback parameter
/// 4. OpenAI
pub fn get_base_url(provider: Option<Provider>, fallback: Option<&str>) -> String {
    resolve_base_url(env_var(BASE_URL_ENV), provider, fallback)
}

fn resolve_base_url(
    from_env: Option<String>,
    provider: Option<Provider>,
    fallback: Option<&str>,
) -> String {
    if let Some(url) = from_env {
        return url;
    }

    if let Some(p) = provider {
        return p.default_url().to_string();
    }

    fallback
        .unwrap_or(Provider::OpenAI.default_url())
        .to_string()
}

/// Get the model identifier
///
/// Priority:
/// 1. PICTOQUERY_MODEL environment variable (if prefer_env is true)
/// 2. fallback parameter
/// 3. [`DEFAULT_MODEL`]
pub fn get_model(fallback: Option<&str>, prefer_env: bool) -> String {
    let from_env = if prefer_env { env_var(MODEL_ENV) } else { None };
    resolve_model(from_env, fallback)
}

fn resolve_model(from_env: Option<String>, fallback: Option<&str>) -> String {
    from_env
        .or_else(|| fallback.map(|s| s.to_string()))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

/// Get the API key
///
/// Priority:
/// 1. OPENAI_API_KEY environment variable
/// 2. `[openai] api_key` in the secrets file at `secrets_path`
///    (or [`DEFAULT_SECRETS_PATH`] if it exists)
///
/// # Errors
///
/// `Error::Config` if neither source yields a key, or if an explicitly
/// named secrets file cannot be read or parsed.
pub fn get_api_key(secrets_path: Option<&Path>) -> Result<String> {
    if let Some(key) = env_var(API_KEY_ENV) {
        return Ok(key);
    }

    let secrets = match secrets_path {
        Some(path) => Secrets::load(path)?,
        None => {
            let default = Path::new(DEFAULT_SECRETS_PATH);
            if default.exists() {
                Secrets::load(default)?
            } else {
                Secrets::default()
            }
        }
    };

    secrets.api_key().map(str::to_string).ok_or_else(|| {
        Error::config(format!(
            "no API key found: set {} or add [openai] api_key to a secrets file",
            API_KEY_ENV
        ))
    })
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parsed secrets file
#[derive(Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    openai: Option<OpenAISecrets>,
}

#[derive(Deserialize)]
struct OpenAISecrets {
    #[serde(default)]
    api_key: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("api_key", &self.api_key().map(|_| "***"))
            .finish()
    }
}

impl Secrets {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        // Only the parser's message: its rendered form quotes source lines.
        toml::from_str(contents)
            .map_err(|e| Error::config(format!("invalid secrets file: {}", e.message())))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read secrets file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.openai
            .as_ref()
            .and_then(|o| o.api_key.as_deref())
            .filter(|k| !k.trim().is_empty())
    }
}
