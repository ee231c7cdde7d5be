//! SQL Server provider

use super::registry::{DATABASE_PROVIDERS, DatabaseProviderEntry};
use crate::constants::DATABASE_PROVIDER_SQLSERVER;
use cbo_domain::ports::{DatabaseProvider, ProviderAvailability};
use std::sync::Arc;

/// Server database reached over a connection string
#[derive(Debug, Default)]
pub struct SqlServerProvider;

impl DatabaseProvider for SqlServerProvider {
    fn name(&self) -> &str {
        DATABASE_PROVIDER_SQLSERVER
    }

    fn syntax_name(&self) -> &str {
        "tsql"
    }
}

#[linkme::distributed_slice(DATABASE_PROVIDERS)]
static SQLSERVER_PROVIDER: DatabaseProviderEntry = DatabaseProviderEntry {
    name: DATABASE_PROVIDER_SQLSERVER,
    description: "Microsoft SQL Server",
    availability: || ProviderAvailability::Present,
    factory: || Arc::new(SqlServerProvider),
};
