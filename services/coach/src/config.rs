//! Application Configuration Module
//!
//! Loads the coach client's settings from environment variables (and a
//! `.env` file when present) into a single struct handed to `main`.

use coach_core::client::{DEFAULT_BACKEND_URL, DEFAULT_TIMEOUT};
use coach_core::session_state::SessionOptions;
use std::time::Duration;
use tracing::Level;

/// Which of the two coach front-ends to behave like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Variant {
    /// Guided flow across four phases with per-message analysis.
    Multi,
    /// Single reflection form.
    Reflection,
}

impl Variant {
    pub fn session_options(&self) -> SessionOptions {
        match self {
            Variant::Multi => SessionOptions::multi_phase(),
            Variant::Reflection => SessionOptions::reflection(),
        }
    }
}

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub variant: Variant,
    pub auto_speak: bool,
    /// `None` uses the variant's default locale.
    pub locale: Option<String>,
    pub tts_command: String,
    pub stt_command: Option<String>,
    pub http_timeout: Duration,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// *   `COACH_BACKEND_URL`: Base address of the coaching backend. Defaults to the hosted service.
    /// *   `COACH_VARIANT`: "multi" or "reflection". Defaults to "multi".
    /// *   `COACH_AUTO_SPEAK`: Speak every reply as it arrives. Defaults to true.
    /// *   `COACH_LOCALE`: Locale for recognition and synthesis. Defaults per variant.
    /// *   `COACH_TTS_COMMAND`: Speech synthesis command. Defaults to "espeak-ng".
    /// *   `COACH_STT_COMMAND`: (Optional) Speech recognition command. Voice input is unsupported without it.
    /// *   `COACH_HTTP_TIMEOUT_SECS`: Per-request timeout. Defaults to 60.
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend_url = var("COACH_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let variant = match var("COACH_VARIANT").map(|v| v.trim().to_lowercase()) {
            None => Variant::Multi,
            Some(v) if v == "multi" => Variant::Multi,
            Some(v) if v == "reflection" => Variant::Reflection,
            Some(v) => {
                return Err(ConfigError::InvalidValue(
                    "COACH_VARIANT".to_string(),
                    format!("'{v}' is not one of: multi, reflection"),
                ));
            }
        };

        let auto_speak = match var("COACH_AUTO_SPEAK") {
            None => true,
            Some(v) => parse_flag(&v).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "COACH_AUTO_SPEAK".to_string(),
                    format!("'{v}' is not a boolean"),
                )
            })?,
        };

        let http_timeout = match var("COACH_HTTP_TIMEOUT_SECS") {
            None => DEFAULT_TIMEOUT,
            Some(v) => v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "COACH_HTTP_TIMEOUT_SECS".to_string(),
                        format!("'{v}' is not a positive number of seconds"),
                    )
                })?,
        };

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            backend_url,
            variant,
            auto_speak,
            locale: var("COACH_LOCALE").map(|v| v.trim().to_string()),
            tts_command: var("COACH_TTS_COMMAND").unwrap_or_else(|| "espeak-ng".to_string()),
            stt_command: var("COACH_STT_COMMAND"),
            http_timeout,
            log_level,
        })
    }

    /// Session options for the configured variant with the overrides applied.
    pub fn session_options(&self) -> SessionOptions {
        let mut options = self.variant.session_options();
        options.auto_speak = self.auto_speak;
        if let Some(locale) = &self.locale {
            options.locale = locale.clone();
        }
        options
    }
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
