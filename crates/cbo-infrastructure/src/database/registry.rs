//! Database provider registry
//!
//! Providers are linked at compile time into [`DATABASE_PROVIDERS`] and
//! selected by `database.provider`. Each entry answers whether it can run on
//! this host; the answer is evaluated once and logged, never swallowed.

use crate::config::DatabaseConfig;
use crate::constants::DATABASE_PROVIDER_SQLSERVER;
use cbo_domain::error::{Error, Result};
use cbo_domain::ports::{DatabaseProvider, ProviderAvailability};
use std::sync::Arc;
use tracing::{info, warn};

/// Registry entry for database providers
pub struct DatabaseProviderEntry {
    /// Unique provider name (e.g., "sqlserver", "sqlite")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Whether the provider can run on this host
    pub availability: fn() -> ProviderAvailability,
    /// Factory function to create the provider
    pub factory: fn() -> Arc<dyn DatabaseProvider>,
}

impl std::fmt::Debug for DatabaseProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseProviderEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// Every database provider linked into the binary
#[linkme::distributed_slice]
pub static DATABASE_PROVIDERS: [DatabaseProviderEntry] = [..];

/// List all linked providers as (name, description) pairs
pub fn list_database_providers() -> Vec<(&'static str, &'static str)> {
    DATABASE_PROVIDERS
        .iter()
        .map(|e| (e.name, e.description))
        .collect()
}

/// Selects the configured provider among the linked ones
#[derive(Debug)]
pub struct DatabaseProviderResolver {
    entries: Vec<(&'static DatabaseProviderEntry, ProviderAvailability)>,
}

impl DatabaseProviderResolver {
    /// Resolver over every linked provider
    pub fn new() -> Self {
        Self::with_entries(DATABASE_PROVIDERS.iter().collect())
    }

    /// Resolver over an explicit entry set
    ///
    /// Availability of every entry is evaluated here, once.
    pub fn with_entries(entries: Vec<&'static DatabaseProviderEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| {
                let availability = (entry.availability)();
                match &availability {
                    ProviderAvailability::Present => {
                        info!(provider = entry.name, "Database provider available");
                    }
                    ProviderAvailability::Absent { reason } => {
                        warn!(provider = entry.name, %reason, "Database provider not available");
                    }
                }
                (entry, availability)
            })
            .collect();
        Self { entries }
    }

    /// Availability of `name`, `None` when no such provider is linked
    pub fn availability(&self, name: &str) -> Option<&ProviderAvailability> {
        self.entries
            .iter()
            .find(|(e, _)| e.name == name)
            .map(|(_, availability)| availability)
    }

    /// Names of linked providers
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(e, _)| e.name).collect()
    }

    /// Create the configured provider
    ///
    /// Returns `Ok(None)` when no connection string is configured. The
    /// provider defaults to `sqlserver` when unnamed. Unknown and absent
    /// providers are `ProviderUnavailable` errors.
    pub fn resolve(&self, config: &DatabaseConfig) -> Result<Option<Arc<dyn DatabaseProvider>>> {
        if !config.is_configured() {
            info!("Database is not configured, continuing without a database provider");
            return Ok(None);
        }
        let name = config
            .provider
            .as_deref()
            .unwrap_or(DATABASE_PROVIDER_SQLSERVER);

        let Some((entry, availability)) = self.entries.iter().find(|(e, _)| e.name == name) else {
            return Err(Error::provider_unavailable(
                name,
                format!("not linked into this build. Available providers: {:?}", self.names()),
            ));
        };
        match availability {
            ProviderAvailability::Present => {
                let provider = (entry.factory)();
                info!(provider = name, syntax = provider.syntax_name(), "Database provider selected");
                Ok(Some(provider))
            }
            ProviderAvailability::Absent { reason } => {
                Err(Error::provider_unavailable(name, reason.clone()))
            }
        }
    }
}

impl Default for DatabaseProviderResolver {
    fn default() -> Self {
        Self::new()
    }
}
