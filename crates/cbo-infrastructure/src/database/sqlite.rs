//! Embedded SQLite provider

use super::registry::{DATABASE_PROVIDERS, DatabaseProviderEntry};
use crate::constants::DATABASE_PROVIDER_SQLITE;
use crate::error_ext::ErrorContext;
use cbo_domain::error::Result;
use cbo_domain::ports::{DatabaseProvider, ProviderAvailability};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// File-backed embedded database
#[derive(Debug, Default)]
pub struct SqliteProvider;

impl DatabaseProvider for SqliteProvider {
    fn name(&self) -> &str {
        DATABASE_PROVIDER_SQLITE
    }

    fn syntax_name(&self) -> &str {
        "sqlite"
    }

    fn is_embedded(&self) -> bool {
        true
    }

    /// An empty file is a valid empty SQLite database
    fn create_embedded_database(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .io_context(format!("Failed to create database directory {}", dir.display()))?;
        }
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .io_context(format!("Failed to create database file {}", path.display()))?;
        info!(path = %path.display(), "Embedded database created");
        Ok(())
    }
}

#[linkme::distributed_slice(DATABASE_PROVIDERS)]
static SQLITE_PROVIDER: DatabaseProviderEntry = DatabaseProviderEntry {
    name: DATABASE_PROVIDER_SQLITE,
    description: "Embedded SQLite database file",
    availability: || ProviderAvailability::Present,
    factory: || Arc::new(SqliteProvider),
};
