//! Logging configuration
//!
//! Settings are read once, when the logger is built. They are layered with
//! `figment`: built-in defaults, then a TOML file, then environment variables
//! such as `MONITOR_LOGGING__LEVEL=debug` or
//! `MONITOR_LOGGING__USE_COMPRESSION=true`.

use crate::appenders::RotationPolicy;
use crate::core::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "MONITOR_";

/// The `[logging]` section.
///
/// ```toml
/// [logging]
/// level = "warn"
/// filename = "/var/log/monitor.log"
/// maxsize = 100
/// maxbackups = 10
/// maxage = 30
/// use-localtime = false
/// use-compression = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoggingConfig {
    /// Minimum severity name; unknown names fall back to `info`
    pub level: String,
    /// Rotating log file; records go to stdout when unset
    pub filename: Option<PathBuf>,
    /// Megabytes before the file is rotated
    #[serde(rename = "maxsize")]
    pub max_size: u64,
    /// Rotated files to keep (0 keeps all)
    #[serde(rename = "maxbackups")]
    pub max_backups: usize,
    /// Days to keep rotated files (0 disables age pruning)
    #[serde(rename = "maxage")]
    pub max_age: u32,
    pub use_localtime: bool,
    pub use_compression: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            filename: None,
            max_size: 100,
            max_backups: 10,
            max_age: 30,
            use_localtime: false,
            use_compression: false,
        }
    }
}

impl LoggingConfig {
    /// Rotation parameters for the file appender
    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy::new()
            .with_max_size_mb(self.max_size)
            .with_max_backups(self.max_backups)
            .with_max_age_days(self.max_age)
            .with_local_time(self.use_localtime)
            .with_compression(self.use_compression)
    }

    /// A file destination, with the remaining options left at their defaults
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}

/// Process configuration as far as this crate is concerned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load defaults, then `path`, then `MONITOR_`-prefixed environment
    /// variables. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Config`](crate::LoggerError::Config) when a value
    /// has the wrong type or the file is not valid TOML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = Self::figment()
            .merge(Toml::file(path.as_ref()))
            .merge(Self::env())
            .extract()?;
        Ok(settings)
    }

    /// Parse an in-memory TOML document over the defaults
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Config`](crate::LoggerError::Config) on invalid input.
    pub fn from_toml_str(document: &str) -> Result<Self> {
        let settings = Self::figment().merge(Toml::string(document)).extract()?;
        Ok(settings)
    }

    fn figment() -> Figment {
        Figment::new().merge(Serialized::defaults(Settings::default()))
    }

    fn env() -> Env {
        // MONITOR_LOGGING__USE_LOCALTIME -> logging.use-localtime
        Env::prefixed(ENV_PREFIX)
            .split("__")
            .map(|key| key.as_str().replace('_', "-").into())
    }
}
