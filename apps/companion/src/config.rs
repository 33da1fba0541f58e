//! Runtime configuration read from the environment.

use crate::generation::gemini::{GeminiConfig, DEFAULT_BASE_URL};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not set")]
    MissingApiKey { name: &'static str },
    #[error("{name} must be an hour between 0 and 23, got {value:?}")]
    InvalidResetHour { name: &'static str, value: String },
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub data_dir: PathBuf,
    /// Hour of day (0-23) when a new study day begins.
    pub daily_reset_hour: u32,
}

impl Config {
    /// Read settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = var("GEMINI_API_KEY").ok_or(ConfigError::MissingApiKey {
            name: "GEMINI_API_KEY",
        })?;

        let defaults = GeminiConfig::new(api_key);
        let gemini = GeminiConfig {
            base_url: var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            text_model: var("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model.clone()),
            image_model: var("GEMINI_IMAGE_MODEL").unwrap_or(defaults.image_model.clone()),
            tts_model: var("GEMINI_TTS_MODEL").unwrap_or(defaults.tts_model.clone()),
            ..defaults
        };

        let data_dir = var("MEDRECAP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let daily_reset_hour = match var("DAILY_RESET_HOUR") {
            None => 0,
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|h| *h < 24)
                .ok_or(ConfigError::InvalidResetHour {
                    name: "DAILY_RESET_HOUR",
                    value,
                })?,
        };

        Ok(Self {
            gemini,
            data_dir,
            daily_reset_hour,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("medrecap.db")
    }
}

fn default_data_dir() -> PathBuf {
    // Use app data directory for production, fallback to current dir
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medrecap")
}
