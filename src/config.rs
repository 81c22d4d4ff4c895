//! Sender configuration loaded from an optional TOML file.
//!
//! The file is optional: a missing or empty file yields
//! `SenderConfig::default()`. Unknown keys are accepted and logged as
//! warnings, since they are usually typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Where and how feeds are sent.
///
/// Either `host` (with `secure`) or both `feed_url` and `groups_url` must be
/// set before a sender can be built; explicit URLs win when both are given.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Appliance host name; endpoints are derived from it.
    pub host: Option<String>,

    /// Use HTTPS on port 19902 instead of HTTP on 19900.
    pub secure: bool,

    /// Explicit content feed endpoint.
    pub feed_url: Option<String>,

    /// Explicit groups feed endpoint.
    pub groups_url: Option<String>,

    /// Charset used to decode appliance responses.
    pub charset: String,

    pub connect_timeout_secs: u64,

    pub read_timeout_secs: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            host: None,
            secure: false,
            feed_url: None,
            groups_url: None,
            charset: "UTF-8".to_string(),
            connect_timeout_secs: 30,
            read_timeout_secs: 300,
        }
    }
}

impl SenderConfig {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "host",
        "secure",
        "feed_url",
        "groups_url",
        "charset",
        "connect_timeout_secs",
        "read_timeout_secs",
    ];

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(SenderConfig::default())`
    /// - Empty file → `Ok(SenderConfig::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::from_toml(&content)?;
        tracing::info!(
            path = %path.display(),
            host = config.host.as_deref().unwrap_or(""),
            secure = config.secure,
            "Loaded sender configuration"
        );
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        Ok(toml::from_str(content)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
