//! Runtime configuration from environment variables
//!
//! - `AGRIBOT_CROP_TABLE`: path to a crop table replacing the bundled one
//! - `AGRIBOT_DISTRICT_TABLE`: path to a district table replacing the bundled one
//! - `AGRIBOT_FORMAT`: reply format, `markdown` (default) or `json`

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;

pub const CROP_TABLE_VAR: &str = "AGRIBOT_CROP_TABLE";
pub const DISTRICT_TABLE_VAR: &str = "AGRIBOT_DISTRICT_TABLE";
pub const FORMAT_VAR: &str = "AGRIBOT_FORMAT";

/// How replies are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::InvalidValue {
                field: FORMAT_VAR.to_string(),
                message: format!("expected 'markdown' or 'json', got '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub crop_table: Option<PathBuf>,
    pub district_table: Option<PathBuf>,
    pub format: OutputFormat,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key → value lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        };

        let format = match lookup(FORMAT_VAR) {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => OutputFormat::default(),
        };

        Ok(Config {
            crop_table: path(CROP_TABLE_VAR),
            district_table: path(DISTRICT_TABLE_VAR),
            format,
        })
    }
}
