//! Database Provider Port
//!
//! Providers are linked at compile time and selected through configuration.
//! Whether a provider can run is an explicit, observable answer rather than a
//! swallowed load failure.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Whether a linked provider can be used on this host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderAvailability {
    /// Provider can be used
    Present,
    /// Provider cannot be used
    Absent {
        /// Why the provider is unavailable
        reason: String,
    },
}

impl ProviderAvailability {
    /// Whether the provider is usable
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }
}

/// Database provider contract
pub trait DatabaseProvider: Send + Sync {
    /// Provider name as used in configuration
    fn name(&self) -> &str;

    /// SQL dialect name used by the syntax layer
    fn syntax_name(&self) -> &str;

    /// Whether the provider stores its data in a local file
    fn is_embedded(&self) -> bool {
        false
    }

    /// Create an empty embedded database at `path`
    ///
    /// Server providers have nothing to create and succeed without effect.
    fn create_embedded_database(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
