use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_RESCORE_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub model: String,
    pub rescore_model: String,
    pub max_upload_bytes: usize,
    pub request_timeout: Duration,
    pub model_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_base_url: optional_env("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            model: optional_env("GEMINI_MODEL", DEFAULT_MODEL),
            rescore_model: optional_env("GEMINI_RESCORE_MODEL", DEFAULT_RESCORE_MODEL),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            request_timeout: Duration::from_secs(parse_env(
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            model_timeout: Duration::from_secs(parse_env(
                "MODEL_TIMEOUT_SECS",
                DEFAULT_MODEL_TIMEOUT_SECS,
            )?),
            port: parse_env("PORT", 8080u16)?,
            rust_log: optional_env("RUST_LOG", "info"),
        };

        config.validate()?;
        Ok(config)
    }

    /// The model-call deadline must expire strictly before the request deadline,
    /// otherwise a slow model always surfaces as a 408 instead of fallback data.
    pub fn validate(&self) -> Result<()> {
        if self.gemini_api_key.trim().is_empty() {
            bail!("GEMINI_API_KEY must not be empty");
        }
        if self.max_upload_bytes == 0 {
            bail!("MAX_UPLOAD_BYTES must be greater than zero");
        }
        if self.model_timeout >= self.request_timeout {
            bail!(
                "MODEL_TIMEOUT_SECS ({}s) must be shorter than REQUEST_TIMEOUT_SECS ({}s)",
                self.model_timeout.as_secs(),
                self.request_timeout.as_secs()
            );
        }
        Ok(())
    }

    /// Settings handed to the analysis client at construction time.
    pub fn analysis(&self) -> AnalysisConfig {
        AnalysisConfig {
            api_key: self.gemini_api_key.clone(),
            base_url: self.gemini_base_url.clone(),
            model: self.model.clone(),
            rescore_model: self.rescore_model.clone(),
            model_timeout: self.model_timeout,
        }
    }

    /// Router-level body limit. Leaves room for multipart boundaries and headers
    /// so that an oversized file is still reported by the intake check.
    pub fn body_limit_bytes(&self) -> usize {
        self.max_upload_bytes.saturating_add(64 * 1024)
    }
}

/// Explicit configuration for the analysis client. Nothing inside the client
/// reads the process environment.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub rescore_model: String,
    pub model_timeout: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            rescore_model: DEFAULT_RESCORE_MODEL.to_string(),
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
