//! Configuration loader
//!
//! Handles loading configuration from TOML files, environment variables and
//! default values, then validates the merged snapshot.

use crate::config::AppConfig;
use crate::config::types::{DatabaseConfig, GlobalConfig, HostingConfig, LoggingConfig, MainDomConfig, TypeFinderConfig};
use crate::constants::*;
use crate::error_ext::ErrorContext;
use crate::logging::{log_config_loaded, parse_log_level};
use cbo_domain::error::{Error, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader service
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources
    ///
    /// Configuration sources are merged in this order (later sources override earlier):
    /// 1. Default values from `AppConfig::default()`
    /// 2. TOML configuration file (if exists)
    /// 3. Environment variables with prefix (e.g., `CBO_HOSTING__DEBUG`)
    ///
    /// An explicit configuration path that does not exist is an error; a
    /// missing discovered file is not.
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(config_path) = &self.config_path {
            if !config_path.exists() {
                log_config_loaded(config_path, false);
                return Err(Error::configuration(format!(
                    "Configuration file not found: {}",
                    config_path.display()
                )));
            }
            figment = figment.merge(Toml::file(config_path));
            log_config_loaded(config_path, true);
        } else if let Some(default_path) = Self::find_default_config_path() {
            figment = figment.merge(Toml::file(&default_path));
            log_config_loaded(&default_path, true);
        }

        figment = figment.merge(
            Env::prefixed(&format!("{}_", self.env_prefix)).split(CONFIG_ENV_SEPARATOR),
        );

        let app_config: AppConfig = figment
            .extract()
            .config_context("Failed to extract configuration")?;

        validate_app_config(&app_config)?;

        Ok(app_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &AppConfig, path: P) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(config).context("Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), toml_string).io_context("Failed to write config file")?;

        Ok(())
    }

    /// Get the current configuration file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Find the first existing default configuration file
    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;

        let candidates = [
            Some(current_dir.join(DEFAULT_CONFIG_FILENAME)),
            Some(
                current_dir
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILENAME),
            ),
            dirs::config_dir().map(|d| d.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME)),
        ];

        candidates.into_iter().flatten().find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate application configuration
///
/// Missing or malformed required settings are `Configuration` errors.
pub fn validate_app_config(config: &AppConfig) -> Result<()> {
    validate_global_config(&config.global)?;
    validate_hosting_config(&config.hosting)?;
    validate_logging_config(&config.logging)?;
    validate_database_config(&config.database)?;
    Ok(())
}

fn validate_global_config(global: &GlobalConfig) -> Result<()> {
    if global.application_id.trim().is_empty() {
        return Err(Error::configuration("Application id cannot be empty"));
    }
    validate_main_dom_config(&global.main_dom)
}

fn validate_main_dom_config(main_dom: &MainDomConfig) -> Result<()> {
    if main_dom.lock_name.is_empty() {
        return Err(Error::configuration("MainDom lock name cannot be empty"));
    }
    // the name becomes a file name for file locks
    if !main_dom
        .lock_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::configuration(format!(
            "MainDom lock name '{}' may only contain ASCII letters, digits, '-', '_' and '.'",
            main_dom.lock_name
        )));
    }
    if main_dom.poll_interval_ms == 0 {
        return Err(Error::configuration(
            "MainDom poll interval cannot be 0",
        ));
    }
    if main_dom.release_grace_ms == 0 {
        return Err(Error::configuration(
            "MainDom release grace period cannot be 0",
        ));
    }
    Ok(())
}

fn validate_hosting_config(hosting: &HostingConfig) -> Result<()> {
    if hosting.content_root.as_os_str().is_empty() {
        return Err(Error::configuration("Hosting content root cannot be empty"));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> Result<()> {
    parse_log_level(&logging.level).map(drop)
}

fn validate_database_config(database: &DatabaseConfig) -> Result<()> {
    if database
        .provider
        .as_deref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(Error::configuration(
            "Database provider name cannot be empty when set",
        ));
    }
    Ok(())
}

/// Configuration builder for programmatic configuration
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: AppConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set global configuration
    pub fn with_global(mut self, global: GlobalConfig) -> Self {
        self.config.global = global;
        self
    }

    /// Set MainDom configuration
    pub fn with_main_dom(mut self, main_dom: MainDomConfig) -> Self {
        self.config.global.main_dom = main_dom;
        self
    }

    /// Set hosting configuration
    pub fn with_hosting(mut self, hosting: HostingConfig) -> Self {
        self.config.hosting = hosting;
        self
    }

    /// Set logging configuration
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Set type discovery configuration
    pub fn with_type_finder(mut self, type_finder: TypeFinderConfig) -> Self {
        self.config.type_finder = type_finder;
        self
    }

    /// Set database configuration
    pub fn with_database(mut self, database: DatabaseConfig) -> Self {
        self.config.database = database;
        self
    }

    /// Build the configuration
    pub fn build(self) -> AppConfig {
        self.config
    }
}
