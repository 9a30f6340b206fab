//! Runtime configuration for the review core.
//!
//! Values come from code or from `CRITICA_*` environment variables. Empty
//! variables count as unset.

use crate::logging::{self, LoggingError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "CRITICA_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CRITICA_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CRITICA_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file; `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Log directory; `None` leaves logging uninitialized.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by any non-empty `CRITICA_*` variable.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = value(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = value(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        config
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Starts logging when a log directory is configured.
    ///
    /// Returns `false` without touching the logger when `log_dir` is unset.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        let Some(dir) = self.log_dir.as_deref() else {
            return Ok(false);
        };
        logging::init_logging(&self.log_level, dir)?;
        Ok(true)
    }
}
