//! Checker configuration.
//!
//! # Responsibility
//! - Hold host-tunable switches for export filtering and built-in fixes.
//! - Load them from JSON with every field defaulted.
//!
//! # Invariants
//! - `format_tags` entries are lower-case tag names.
//! - A zero `img_alt_length_limit` disables the length check.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const DEFAULT_FORMAT_TAGS: &str = "p;h1;h2;h3;h4;h5;h6;pre;address;div";
const DEFAULT_IMG_ALT_LENGTH_LIMIT: usize = 100;
const MAX_HEADING_LEVEL: u8 = 6;

/// Host configuration for one checker instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckerConfig {
    /// Strip `data-a11y-ignore` from exported markup.
    pub no_ignore_data: bool,
    /// `;`-separated block formats the host offers.
    pub format_tags: String,
    /// Maximum alt text length accepted by the image alt fix.
    pub img_alt_length_limit: usize,
    /// Log level for hosts that let the checker configure logging.
    pub log_level: Option<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            no_ignore_data: false,
            format_tags: DEFAULT_FORMAT_TAGS.to_string(),
            img_alt_length_limit: DEFAULT_IMG_ALT_LENGTH_LIMIT,
            log_level: None,
        }
    }
}

impl CheckerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for tag in self.format_tag_list() {
            let valid = tag.starts_with(|ch: char| ch.is_ascii_lowercase())
                && tag
                    .chars()
                    .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit());
            if !valid {
                return Err(ConfigError::Invalid(format!(
                    "format tag `{tag}` must be a lower-case tag name"
                )));
            }
        }
        Ok(())
    }

    fn format_tag_list(&self) -> impl Iterator<Item = &str> {
        self.format_tags
            .split(';')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
    }

    /// Heading levels offered by `format_tags`, ascending.
    ///
    /// Falls back to `1..=6` when no heading tag is configured.
    pub fn heading_levels(&self) -> Vec<u8> {
        let mut levels: Vec<u8> = self
            .format_tag_list()
            .filter_map(|tag| tag.strip_prefix('h'))
            .filter_map(|level| level.parse::<u8>().ok())
            .filter(|level| (1..=MAX_HEADING_LEVEL).contains(level))
            .collect();
        levels.sort_unstable();
        levels.dedup();
        if levels.is_empty() {
            return (1..=MAX_HEADING_LEVEL).collect();
        }
        levels
    }
}

/// Configuration load errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "failed to read config `{path}`: {message}"),
            Self::Parse(message) => write!(f, "invalid config json: {message}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {}
