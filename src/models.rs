//! Data models and structures
//!
//! Defines the canonical generation request/result, the JSON payloads the HTTP
//! layer emits, and process-wide configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A request that has passed input normalization.
///
/// `image_source` is always either a `data:` URL or a remote URL.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub image_source: String,
    pub topic: Option<String>,
    pub level: Option<String>,
    pub items: Option<i64>,
    pub instruction: Option<String>,
}

impl GenerationRequest {
    pub fn new(image_source: String) -> Self {
        Self {
            image_source,
            topic: None,
            level: None,
            items: None,
            instruction: None,
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }
}

/// Successful generation output, serialized as the 200 response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationResult {
    pub result: String,
    pub illustration: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

// Configuration
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_CONCURRENT_PROVIDER_CALLS: usize = 8;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` keeps the server up but fails every generate request with a 500.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub chat_model: String,
    pub image_model: String,
    pub illustrations_enabled: bool,
    pub provider_timeout: Duration,
    pub max_concurrent_provider_calls: usize,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            illustrations_enabled: true,
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            max_concurrent_provider_calls: DEFAULT_MAX_CONCURRENT_PROVIDER_CALLS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider_timeout_secs: u64 =
            parse_var(&non_empty, "PROVIDER_TIMEOUT_SECS", DEFAULT_PROVIDER_TIMEOUT_SECS)?;
        let max_concurrent_provider_calls: usize = parse_var(
            &non_empty,
            "MAX_CONCURRENT_PROVIDER_CALLS",
            DEFAULT_MAX_CONCURRENT_PROVIDER_CALLS,
        )?;
        if max_concurrent_provider_calls == 0 {
            return Err(crate::Error::Generic(
                "MAX_CONCURRENT_PROVIDER_CALLS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_base_url: non_empty("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            chat_model: non_empty("OPENAI_MODEL").unwrap_or(defaults.chat_model),
            image_model: non_empty("OPENAI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            illustrations_enabled: parse_bool(&non_empty, "ENABLE_ILLUSTRATIONS", true)?,
            provider_timeout: Duration::from_secs(provider_timeout_secs),
            max_concurrent_provider_calls,
            max_upload_bytes: parse_var(&non_empty, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> crate::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| crate::Error::Generic(format!("{} has invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> crate::Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(crate::Error::Generic(format!(
            "{} has invalid value '{}'",
            key, v
        ))),
        None => Ok(default),
    }
}
