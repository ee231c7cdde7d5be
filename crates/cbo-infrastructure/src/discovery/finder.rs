//! Type finder over the component registry

use super::registry::{COMPONENTS, ComponentEntry};
use crate::config::TypeFinderConfig;
use cbo_domain::error::{Error, Result};
use cbo_domain::ports::TypeDiscovery;
use cbo_domain::value_objects::DiscoveredTypes;
use std::collections::HashSet;
use tracing::{debug, info};

/// Discovers linked components, skipping excluded modules
#[derive(Debug, Clone)]
pub struct TypeFinder {
    entries: Vec<&'static ComponentEntry>,
    excluded_modules: Vec<String>,
}

impl TypeFinder {
    /// Finder over every linked component
    pub fn new(config: &TypeFinderConfig) -> Self {
        Self::with_entries(COMPONENTS.iter().collect(), config)
    }

    /// Finder over an explicit entry set
    pub fn with_entries(entries: Vec<&'static ComponentEntry>, config: &TypeFinderConfig) -> Self {
        Self {
            entries,
            excluded_modules: config.excluded_modules.clone(),
        }
    }

    /// Included entries, in registry order
    ///
    /// Fails when two included entries share a name.
    pub fn entries(&self) -> Result<Vec<&'static ComponentEntry>> {
        let mut seen = HashSet::new();
        let mut included = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if self.is_excluded(entry.module) {
                debug!(component = entry.name, module = entry.module, "Component excluded");
                continue;
            }
            if !seen.insert(entry.name) {
                return Err(Error::type_discovery(format!(
                    "component name '{}' is declared more than once (last in {})",
                    entry.name, entry.module
                )));
            }
            included.push(*entry);
        }
        Ok(included)
    }

    /// Find an included entry by name
    pub fn find(&self, name: &str) -> Option<&'static ComponentEntry> {
        self.entries
            .iter()
            .find(|e| e.name == name && !self.is_excluded(e.module))
            .copied()
    }

    fn is_excluded(&self, module: &str) -> bool {
        self.excluded_modules.iter().any(|prefix| {
            module == prefix
                || module
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with("::"))
        })
    }
}

impl TypeDiscovery for TypeFinder {
    fn discover(&self) -> Result<DiscoveredTypes> {
        let entries = self.entries()?;
        let discovered = DiscoveredTypes::new(entries.iter().map(|e| e.descriptor()).collect());
        info!(components = discovered.len(), "Type discovery completed");
        Ok(discovered)
    }
}
