//! Admin configuration
//!
//! Loaded from a TOML file. Every field has a default, so an empty file (or
//! no file at all) is a valid configuration that dry-runs all mail. The mail
//! API key may come from `PORTAL_MAIL_API_KEY` instead of the file.

use portal_notify::MailSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `mail.api_key`
pub const API_KEY_ENV: &str = "PORTAL_MAIL_API_KEY";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {}: {}", .path.display(), .source)]
    Read {
        /// File that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config {}: {}", .path.display(), .source)]
    Parse {
        /// File that was parsed
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// Settings that parse but cannot work together
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where rows are kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON document holding every row
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("portal.json"),
        }
    }
}

/// Outgoing mail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Sender address
    pub from: String,
    /// Optional reply-to address
    pub reply_to: Option<String>,
    /// Transactional mail API endpoint
    pub api_url: String,
    /// Bearer key for the mail API; `PORTAL_MAIL_API_KEY` overrides it
    pub api_key: Option<String>,
    /// Log messages instead of sending them
    pub dry_run: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: MailSettings::default().from,
            reply_to: None,
            api_url: "https://api.resend.com/emails".to_string(),
            api_key: None,
            dry_run: true,
        }
    }
}

/// Outline import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Description stored when an outline has none
    pub placeholder_description: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            placeholder_description: portal_import::DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

/// Log output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// One JSON object per line instead of human readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Complete admin configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Where rows are kept
    pub store: StoreConfig,
    /// Outgoing mail
    pub mail: MailConfig,
    /// Outline import
    pub import: ImportConfig,
    /// Log output
    pub log: LogConfig,
    /// Client portal link included in emails
    pub portal_url: Option<String>,
}

impl PortalConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML or unknown value types.
    pub fn from_toml_str(text: &str, origin: impl AsRef<Path>) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.as_ref().to_path_buf(),
            source,
        })
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// `ConfigError::Read` or `ConfigError::Parse`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text, path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise, then apply the environment
    ///
    /// # Errors
    /// See [`Self::from_file`] and [`Self::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides(std::env::var(API_KEY_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply the value of [`API_KEY_ENV`], if set and not blank
    #[must_use]
    pub fn with_env_overrides(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.mail.api_key = Some(key);
        }
        self
    }

    /// With store document path
    #[inline]
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = path.into();
        self
    }

    /// With mail dry-run mode
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.mail.dry_run = dry_run;
        self
    }

    /// With JSON log output
    #[inline]
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.log.json = json;
        self
    }

    /// Check settings that only fail at send time otherwise
    ///
    /// # Errors
    /// `ConfigError::Invalid` when live mail is requested without an API key
    /// or a sender address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mail.from.trim().is_empty() {
            return Err(ConfigError::Invalid("mail.from is empty".to_string()));
        }
        let has_key = self.mail.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
        if !self.mail.dry_run && !has_key {
            return Err(ConfigError::Invalid(format!(
                "mail.api_key (or {API_KEY_ENV}) is required unless mail.dry_run is set"
            )));
        }
        Ok(())
    }

    /// Sender settings for the notify services
    #[must_use]
    pub fn mail_settings(&self) -> MailSettings {
        MailSettings {
            from: self.mail.from.clone(),
            reply_to: self.mail.reply_to.clone(),
            portal_url: self.portal_url.clone(),
        }
    }
}
