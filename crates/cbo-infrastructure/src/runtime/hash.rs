//! Runtime hash
//!
//! A SHA-256 digest over everything that defines the runtime surface: the
//! application id, the crate version, the discovered components and the file
//! listing (relative path, size, modification time) of the configured hash
//! folders. Any deploy that changes one of them changes the hash.

use crate::error_ext::ErrorContext;
use cbo_domain::error::Result;
use cbo_domain::value_objects::{DiscoveredTypes, RuntimeHash};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;
use walkdir::WalkDir;

/// Builder for [`RuntimeHash`]
#[derive(Debug, Default, Clone)]
pub struct RuntimeHashBuilder {
    application_id: String,
    components: Vec<String>,
    paths: Vec<PathBuf>,
}

impl RuntimeHashBuilder {
    /// Start a hash for `application_id`
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            ..Self::default()
        }
    }

    /// Include discovered component identities
    pub fn with_components(mut self, discovered: &DiscoveredTypes) -> Self {
        self.components = discovered
            .components
            .iter()
            .map(|c| {
                let capabilities: Vec<String> =
                    c.capabilities.iter().map(ToString::to_string).collect();
                format!("{}::{}[{}]", c.module, c.name, capabilities.join(","))
            })
            .collect();
        self
    }

    /// Include the file listing under `path`
    ///
    /// Missing folders contribute nothing.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Compute the digest
    pub fn build(&self) -> Result<RuntimeHash> {
        let mut hasher = Sha256::new();
        hasher.update(format!("app:{}\n", self.application_id));
        hasher.update(format!("version:{}\n", env!("CARGO_PKG_VERSION")));

        let mut components = self.components.clone();
        components.sort();
        for component in &components {
            hasher.update(format!("component:{component}\n"));
        }

        for root in &self.paths {
            hash_folder(&mut hasher, root)?;
        }

        Ok(RuntimeHash::new(hex::encode(hasher.finalize())))
    }
}

fn hash_folder(hasher: &mut Sha256, root: &Path) -> Result<()> {
    if !root.exists() {
        debug!(path = %root.display(), "Hash folder does not exist, skipped");
        return Ok(());
    }
    hasher.update(format!("folder:{}\n", root.display()));

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.io_context(format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let metadata = entry
            .metadata()
            .io_context(format!("Failed to stat {}", entry.path().display()))?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs());
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        hasher.update(format!(
            "file:{}:{}:{}\n",
            relative.display(),
            metadata.len(),
            modified
        ));
    }
    Ok(())
}
