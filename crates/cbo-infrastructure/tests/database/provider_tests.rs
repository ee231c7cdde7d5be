//! Provider registry, resolver and embedded databases

use cbo_domain::error::Error;
use cbo_domain::ports::{DatabaseProvider, ProviderAvailability};
use cbo_infrastructure::config::DatabaseConfig;
use cbo_infrastructure::database::{
    DatabaseProviderEntry, DatabaseProviderResolver, SqlServerProvider, SqliteProvider,
    embedded_database_path, list_database_providers,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

static SERVER: DatabaseProviderEntry = DatabaseProviderEntry {
    name: "sqlserver",
    description: "Server under test",
    availability: || ProviderAvailability::Present,
    factory: || Arc::new(SqlServerProvider),
};

static MISSING_DRIVER: DatabaseProviderEntry = DatabaseProviderEntry {
    name: "postgres",
    description: "Provider whose native driver is not installed",
    availability: || ProviderAvailability::Absent {
        reason: "libpq not found".to_string(),
    },
    factory: || Arc::new(SqlServerProvider),
};

fn configured(provider: Option<&str>) -> DatabaseConfig {
    DatabaseConfig {
        provider: provider.map(ToString::to_string),
        connection_string: Some("Server=db;Database=site".to_string()),
    }
}

fn resolver() -> DatabaseProviderResolver {
    DatabaseProviderResolver::with_entries(vec![&SERVER, &MISSING_DRIVER])
}

#[test]
fn test_linked_providers() {
    let names: Vec<&str> = list_database_providers().into_iter().map(|(name, _)| name).collect();
    assert!(names.contains(&"sqlserver"));
    assert!(names.contains(&"sqlite"));
}

#[test]
fn test_unconfigured_database_has_no_provider() {
    assert!(resolver().resolve(&DatabaseConfig::default()).unwrap().is_none());
}

#[test]
fn test_provider_defaults_to_sqlserver() {
    let provider = resolver().resolve(&configured(None)).unwrap().unwrap();
    assert_eq!(provider.name(), "sqlserver");
    assert_eq!(provider.syntax_name(), "tsql");
    assert!(!provider.is_embedded());
}

#[test]
fn test_absent_provider_is_reported() {
    let resolver = resolver();
    assert!(!resolver.availability("postgres").unwrap().is_present());
    assert!(resolver.availability("sqlserver").unwrap().is_present());
    assert!(resolver.availability("oracle").is_none());

    match resolver.resolve(&configured(Some("postgres"))) {
        Err(Error::ProviderUnavailable { provider, reason }) => {
            assert_eq!(provider, "postgres");
            assert!(reason.contains("libpq"));
        }
        _ => panic!("Expected ProviderUnavailable error"),
    }
}

#[test]
fn test_unknown_provider_lists_alternatives() {
    match resolver().resolve(&configured(Some("oracle"))) {
        Err(Error::ProviderUnavailable { reason, .. }) => assert!(reason.contains("sqlserver")),
        _ => panic!("Expected ProviderUnavailable error"),
    }
}

#[test]
fn test_embedded_database_path() {
    let root = Path::new("/srv/site");
    assert_eq!(
        embedded_database_path("Data Source=data/cbo.db;Cache=Shared", root),
        Some(PathBuf::from("/srv/site/data/cbo.db"))
    );
    assert_eq!(
        embedded_database_path("cache=shared; data source = /var/db/cbo.db", root),
        Some(PathBuf::from("/var/db/cbo.db"))
    );
    assert_eq!(embedded_database_path("Data Source=", root), None);
    assert_eq!(embedded_database_path("Server=db", root), None);
}

#[test]
fn test_sqlite_creates_empty_database_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app_data").join("site.db");
    let provider = SqliteProvider;

    assert!(provider.is_embedded());
    provider.create_embedded_database(&path).unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    assert!(provider.create_embedded_database(&path).is_err());
}
