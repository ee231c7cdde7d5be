//! Runtime configuration types
//!
//! Global settings (application identity, MainDom), hosting environment,
//! type discovery and database selection.

use crate::constants::{DEFAULT_APPLICATION_ID, MAIN_DOM_LOCK_DIR_NAME};
use cbo_domain::constants::{
    MAIN_DOM_DEFAULT_ACQUIRE_TIMEOUT_MS, MAIN_DOM_DEFAULT_LOCK_NAME,
    MAIN_DOM_DEFAULT_POLL_INTERVAL_MS, MAIN_DOM_DEFAULT_RELEASE_GRACE_MS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Lock primitive backing MainDom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MainDomLockKind {
    /// Exclusive file lock, arbitrates between processes on one host
    #[default]
    File,
    /// In-process named lock, arbitrates between runtimes in one process
    Memory,
}

impl fmt::Display for MainDomLockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// MainDom configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainDomConfig {
    /// Lock primitive
    pub lock: MainDomLockKind,
    /// Lock name shared by every instance of the application
    pub lock_name: String,
    /// Directory holding lock files (system temp dir when unset)
    pub lock_dir: Option<PathBuf>,
    /// How long a starting instance waits for the lock
    pub acquire_timeout_ms: u64,
    /// How long a superseded holder has to run release callbacks
    pub release_grace_ms: u64,
    /// Polling interval of the lock primitive
    pub poll_interval_ms: u64,
}

impl MainDomConfig {
    /// Acquisition timeout
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Release grace period
    pub fn release_grace(&self) -> Duration {
        Duration::from_millis(self.release_grace_ms)
    }

    /// Lock primitive polling interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Effective lock directory
    pub fn resolved_lock_dir(&self) -> PathBuf {
        self.lock_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(MAIN_DOM_LOCK_DIR_NAME))
    }
}

impl Default for MainDomConfig {
    fn default() -> Self {
        Self {
            lock: MainDomLockKind::default(),
            lock_name: MAIN_DOM_DEFAULT_LOCK_NAME.to_string(),
            lock_dir: None,
            acquire_timeout_ms: MAIN_DOM_DEFAULT_ACQUIRE_TIMEOUT_MS,
            release_grace_ms: MAIN_DOM_DEFAULT_RELEASE_GRACE_MS,
            poll_interval_ms: MAIN_DOM_DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Global application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Application identifier, part of the runtime hash
    pub application_id: String,
    /// MainDom settings
    pub main_dom: MainDomConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            application_id: DEFAULT_APPLICATION_ID.to_string(),
            main_dom: MainDomConfig::default(),
        }
    }
}

/// Hosting environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostingConfig {
    /// Root folder of the site content
    pub content_root: PathBuf,
    /// Debug mode
    pub debug: bool,
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from("."),
            debug: false,
        }
    }
}

/// Type discovery settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeFinderConfig {
    /// Module path prefixes whose components are ignored
    pub excluded_modules: Vec<String>,
    /// Folders whose file listing feeds the runtime hash
    ///
    /// Relative paths are resolved against the content root.
    pub hash_paths: Vec<PathBuf>,
}

/// Database selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Provider name (`sqlserver`, `sqlite`, ...)
    pub provider: Option<String>,
    /// Connection string; the database is not configured when unset
    pub connection_string: Option<String>,
}

impl DatabaseConfig {
    /// Whether a connection string is present
    pub fn is_configured(&self) -> bool {
        self.connection_string
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}
