//! Client configuration.
//!
//! # Responsibility
//! - Load `ClientConfig` from TOML text or a file.
//! - Reject values the client cannot act on before any connection opens.
//!
//! # Invariants
//! - Every field has a default; an empty document is a valid config.
//! - A config returned by `from_toml_str`/`load` has passed `validate()`.

use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Server endpoint used when none is configured.
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8000/";

pub type ConfigResult<T> = Result<T, ConfigError>;

/// What happens to a cell's outputs when it is run again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputPolicy {
    /// Outputs accumulate across runs.
    #[default]
    Append,
    /// Outputs are cleared locally when a run is requested.
    ClearOnRun,
}

impl OutputPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::ClearOnRun => "clear_on_run",
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    /// `server_url` is not a `ws://` URL with a host.
    InvalidServerUrl(String),
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::InvalidServerUrl(url) => {
                write!(f, "server_url must be a ws:// URL with a host, got `{url}`")
            }
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::RelativeLogDir(path) => {
                write!(f, "log_dir must be an absolute path, got `{}`", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidServerUrl(_) | Self::InvalidLogLevel(_) | Self::RelativeLogDir(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Settings for one notebook client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub server_url: String,
    pub log_level: String,
    /// Rolling log directory; stderr logging when absent.
    pub log_dir: Option<PathBuf>,
    pub output_policy: OutputPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
            output_policy: OutputPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let host = self
            .server_url
            .strip_prefix("ws://")
            .map(|rest| rest.split(['/', ':']).next().unwrap_or_default());
        if host.map_or(true, str::is_empty) {
            return Err(ConfigError::InvalidServerUrl(self.server_url.clone()));
        }

        normalize_level(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;

        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.clone()));
            }
        }
        Ok(())
    }
}
