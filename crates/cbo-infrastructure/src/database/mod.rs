//! Database providers
//!
//! | Provider | Linked | Kind |
//! |----------|--------|------|
//! | `sqlserver` | always | server |
//! | `sqlite` | `embedded-db` feature | embedded file |

mod registry;
#[cfg(feature = "embedded-db")]
mod sqlite;
mod sqlserver;

pub use registry::{
    DATABASE_PROVIDERS, DatabaseProviderEntry, DatabaseProviderResolver, list_database_providers,
};
#[cfg(feature = "embedded-db")]
pub use sqlite::SqliteProvider;
pub use sqlserver::SqlServerProvider;

use std::path::{Path, PathBuf};

/// File path named by an embedded connection string
///
/// Reads the `Data Source` key (case-insensitive); relative paths resolve
/// against `content_root`.
pub fn embedded_database_path(connection_string: &str, content_root: &Path) -> Option<PathBuf> {
    let source = connection_string.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("data source")
            .then(|| value.trim())
    })?;
    if source.is_empty() {
        return None;
    }
    let path = Path::new(source);
    Some(if path.is_absolute() {
        path.to_path_buf()
    } else {
        content_root.join(path)
    })
}
