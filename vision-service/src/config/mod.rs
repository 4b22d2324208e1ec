use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default Gemini model used for signal extraction.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Gemini REST API base URL.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound on a single inference call.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Largest request body accepted (20MB, the Gemini inline data limit).
const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    /// `None` keeps the service up; extraction requests then fail with a
    /// configuration error. Read once by `VisionConfig::load`, so a rotated
    /// `GEMINI_API_KEY` only takes effect after a restart.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl VisionConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        Ok(VisionConfig {
            common: common_config,
            gemini: GeminiSettings {
                api_key: api_key(env::var("GEMINI_API_KEY").ok()),
                model: get_env("GEMINI_MODEL", DEFAULT_MODEL),
                api_base: get_env("GEMINI_API_BASE", DEFAULT_API_BASE),
                timeout_secs: parse_env("GEMINI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            },
            max_body_bytes: parse_env("VISION_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
        })
    }
}

/// An empty key counts as unset.
fn api_key(value: Option<String>) -> Option<Secret<String>> {
    value.filter(|key| !key.is_empty()).map(Secret::new)
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(val) => val.parse().map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, val))
        }),
        Err(_) => Ok(default),
    }
}
