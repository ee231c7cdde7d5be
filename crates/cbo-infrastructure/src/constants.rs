//! Infrastructure layer constants
//!
//! Contains constants that are part of the infrastructure implementation.
//! Domain-specific constants are defined in `cbo_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "cbo.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "cbo";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "CBO";

/// Separator between nested keys in environment variables
pub const CONFIG_ENV_SEPARATOR: &str = "__";

/// Default application identifier
pub const DEFAULT_APPLICATION_ID: &str = "cbo";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Environment variable overriding the log filter
pub const LOG_FILTER_ENV: &str = "CBO_LOG";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// File stem used when the log file path has none
pub const DEFAULT_LOG_FILE_STEM: &str = "cbo";

// ============================================================================
// MAINDOM CONSTANTS
// ============================================================================

/// Directory below the system temp dir holding lock files
pub const MAIN_DOM_LOCK_DIR_NAME: &str = "cbo-locks";

/// Lock file extension
pub const MAIN_DOM_LOCK_EXT: &str = "lock";

/// Takeover request marker extension
pub const MAIN_DOM_RELEASE_REQUEST_EXT: &str = "release";

/// Lock metadata extension
pub const MAIN_DOM_META_EXT: &str = "lock.meta";

// ============================================================================
// DATABASE CONSTANTS
// ============================================================================

/// Provider name of the server database
pub const DATABASE_PROVIDER_SQLSERVER: &str = "sqlserver";

/// Provider name of the embedded file database
pub const DATABASE_PROVIDER_SQLITE: &str = "sqlite";
