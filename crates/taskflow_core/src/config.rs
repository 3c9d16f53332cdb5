//! Runtime configuration resolved from the process environment.
//!
//! # Responsibility
//! - Decide where the slot database lives and how logging starts.
//!
//! # Invariants
//! - Blank variables count as unset.
//! - Every field has a usable default, so resolution never fails.

use crate::logging::{default_log_level, init_logging, LoggingError};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "TASKFLOW_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "TASKFLOW_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "TASKFLOW_LOG_DIR";

pub const DEFAULT_DB_FILE_NAME: &str = "taskflow.sqlite3";
pub const DEFAULT_LOG_DIR_NAME: &str = "taskflow-logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let temp = std::env::temp_dir();
        Self {
            db_path: temp.join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: temp.join(DEFAULT_LOG_DIR_NAME),
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves each field through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            db_path: non_blank(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: non_blank(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: non_blank(LOG_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
        }
    }

    /// Starts file logging with this configuration.
    pub fn init_logging(&self) -> Result<(), LoggingError> {
        init_logging(&self.log_level, &self.log_dir.to_string_lossy())
    }
}
