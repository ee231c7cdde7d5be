//! Main application configuration

use serde::{Deserialize, Serialize};

pub use super::logging::LoggingConfig;
pub use super::runtime::{
    DatabaseConfig, GlobalConfig, HostingConfig, MainDomConfig, MainDomLockKind,
    TypeFinderConfig,
};

/// Main application configuration
///
/// The loaded snapshot is immutable; the runtime shares it as
/// `Arc<AppConfig>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Global settings
    pub global: GlobalConfig,
    /// Hosting environment
    pub hosting: HostingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Type discovery settings
    pub type_finder: TypeFinderConfig,
    /// Database selection
    pub database: DatabaseConfig,
}
