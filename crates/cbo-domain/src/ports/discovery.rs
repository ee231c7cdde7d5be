//! Type Discovery Port

use crate::error::Result;
use crate::value_objects::DiscoveredTypes;

/// Discovers components carrying recognized capability markers
pub trait TypeDiscovery: Send + Sync {
    /// Discover components
    ///
    /// Discovery errors are fatal to boot: later phases depend on the result.
    fn discover(&self) -> Result<DiscoveredTypes>;
}
