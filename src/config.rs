//! Environment-driven process configuration.
//!
//! Everything is read once at startup; the resulting `Config` is immutable
//! and handed to the application state explicitly. Missing credentials fail
//! here rather than on the first request.

use thiserror::Error;

use crate::impact::ImpactFactors;

/// Placeholder secret accepted so the demo runs unconfigured; startup logs a
/// warning when it is in effect.
pub const DEFAULT_SECRET_KEY: &str = "your-secret-key-here";

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the Gemini completion service.
    pub gemini_api_key: String,
    /// Model identifier passed in the request path.
    pub gemini_model: String,
    /// API root; overridable so tests can point at a local mock.
    pub gemini_base_url: String,
    /// Secret the session cookie MAC is derived from.
    pub secret_key: String,
    /// Listening port (the `--port` flag overrides this).
    pub port: u16,
    /// Bathtub capacity in tokens.
    pub bathtub_capacity: u64,
    /// Token-to-environmental-cost coefficients.
    pub factors: ImpactFactors,
    /// Pre-check estimator: words x this factor.
    pub estimate_words_factor: f64,
    /// Fallback estimator: exchange characters / this divisor.
    pub estimate_chars_per_token: f64,
}

impl Config {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable source. `from_env` is
    /// a thin wrapper; tests supply a map instead of touching the process
    /// environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let gemini_api_key = get("GEMINI_API_KEY")
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let bathtub_capacity: u64 = parsed(&get, "BATHTUB_CAPACITY", DEFAULT_CAPACITY)?;
        if bathtub_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "BATHTUB_CAPACITY",
                value: "0".to_string(),
            });
        }

        let chars_per_token: f64 = parsed(&get, "ESTIMATE_CHARS_PER_TOKEN", 4.0)?;
        if chars_per_token <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "ESTIMATE_CHARS_PER_TOKEN",
                value: chars_per_token.to_string(),
            });
        }

        Ok(Self {
            gemini_api_key,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: get("GEMINI_BASE_URL")
                .unwrap_or_else(|| crate::gemini::client::DEFAULT_BASE_URL.to_string()),
            secret_key: get("SECRET_KEY").unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string()),
            port: parsed(&get, "PORT", DEFAULT_PORT)?,
            bathtub_capacity,
            factors: ImpactFactors {
                co2_per_token: parsed(&get, "CO2_PER_TOKEN", 0.000_000_4)?,
                water_per_token: parsed(&get, "WATER_PER_TOKEN", 0.1)?,
            },
            estimate_words_factor: parsed(&get, "ESTIMATE_WORDS_FACTOR", 1.5)?,
            estimate_chars_per_token: chars_per_token,
        })
    }
}

fn parsed<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}
