//! Store configuration via `schedule.toml`.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Config file name conventionally placed next to the database.
pub const CONFIG_FILE_NAME: &str = "schedule.toml";

/// Path value that opens a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

const DEFAULT_QUERY_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Largest timeout SQLite accepts: its busy timeout is an `int` of milliseconds.
pub const MAX_TIMEOUT_MS: u64 = i32::MAX as u64;

/// SQLite journal mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
}

impl JournalMode {
    pub const fn pragma_value(self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
        }
    }
}

/// Store configuration loaded from `schedule.toml`.
///
/// # Example
///
/// ```toml
/// path = "schedule.db"
/// query_timeout_ms = 3000
/// busy_timeout_ms = 5000
/// journal_mode = "wal"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file, or `":memory:"`.
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Deadline applied to every store call, in milliseconds.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// How long SQLite waits on a locked database file, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub journal_mode: JournalMode,
    /// Defaults applied to list requests that omit parameters.
    #[serde(default)]
    pub list: ListDefaults,
}

fn default_path() -> PathBuf {
    PathBuf::from("schedule.db")
}

fn default_query_timeout_ms() -> u64 {
    DEFAULT_QUERY_TIMEOUT_MS
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
            list: ListDefaults::default(),
        }
    }
}

impl StoreConfig {
    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(IN_MEMORY_PATH),
            ..Self::default()
        }
    }

    /// Configuration for a database file at `path`, defaults otherwise.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY_PATH
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Schedule store configuration
#
# Database file; ":memory:" keeps everything in process memory.
path = "schedule.db"

# Deadline for every store call in milliseconds (default: 3000).
query_timeout_ms = 3000

# How long SQLite waits on a locked database file (default: 5000).
busy_timeout_ms = 5000

# Journal mode: "wal" (default) or "delete".
journal_mode = "wal"

# Defaults for list requests that omit parameters.
[list]
page = 1
page_size = 20
sort = "id"
"#
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, StoreError> {
        let config: StoreConfig = toml::from_str(content)
            .map_err(|e| StoreError::Internal(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse configuration from a file path.
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Internal(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.query_timeout_ms == 0 {
            return Err(StoreError::Internal(
                "query_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.query_timeout_ms > MAX_TIMEOUT_MS || self.busy_timeout_ms > MAX_TIMEOUT_MS {
            return Err(StoreError::Internal(format!(
                "query_timeout_ms and busy_timeout_ms must be at most {}",
                MAX_TIMEOUT_MS
            )));
        }
        if self.list.page < 1 || !(1..=100).contains(&self.list.page_size) {
            return Err(StoreError::Internal(
                "list defaults must name a page >= 1 and a page_size in 1..=100".into(),
            ));
        }
        Ok(())
    }
}

/// Defaults for list parameters the caller leaves out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDefaults {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default = "default_sort")]
    pub sort: String,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

fn default_sort() -> String {
    "id".to_string()
}

impl Default for ListDefaults {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            sort: default_sort(),
        }
    }
}
