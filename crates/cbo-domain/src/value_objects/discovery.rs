//! Capability markers and type discovery results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability a discoverable component declares
///
/// Capabilities replace runtime type inspection: the container auto-registers
/// discovered components by the markers they carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    /// Participates in application startup and shutdown
    Component,
    /// Reports health of a dependency
    HealthCheck,
    /// Runs recurring background work (main-only by nature)
    BackgroundTask,
    /// Writes to a search index (main-only by nature)
    IndexPopulator,
    /// Resolves inbound content requests
    ContentFinder,
}

impl Capability {
    /// Whether the capability needs exclusive resources held by MainDom
    pub fn requires_main_dom(self) -> bool {
        matches!(self, Self::BackgroundTask | Self::IndexPopulator)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Component => "component",
            Self::HealthCheck => "health-check",
            Self::BackgroundTask => "background-task",
            Self::IndexPopulator => "index-populator",
            Self::ContentFinder => "content-finder",
        };
        f.write_str(s)
    }
}

/// A component found by type discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Unique component name
    pub name: String,
    /// Module the component was declared in
    pub module: String,
    /// Declared capability markers
    pub capabilities: Vec<Capability>,
}

impl ComponentDescriptor {
    /// Whether the component declares `capability`
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Whether any declared capability needs MainDom
    pub fn is_main_only(&self) -> bool {
        self.capabilities.iter().any(|c| c.requires_main_dom())
    }
}

/// Result of type discovery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredTypes {
    /// Discovered components, sorted by name
    pub components: Vec<ComponentDescriptor>,
}

impl DiscoveredTypes {
    /// Build a result, sorting components by name
    pub fn new(mut components: Vec<ComponentDescriptor>) -> Self {
        components.sort_by(|a, b| a.name.cmp(&b.name));
        Self { components }
    }

    /// Components declaring `capability`
    pub fn with_capability(&self, capability: Capability) -> impl Iterator<Item = &ComponentDescriptor> {
        self.components.iter().filter(move |c| c.has(capability))
    }

    /// Number of discovered components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether nothing was discovered
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Digest identifying the discovered runtime surface
///
/// Changes whenever the set of linked components or the watched runtime
/// folders change; caches keyed on it are invalidated across deploys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeHash(String);

impl RuntimeHash {
    /// Wrap a hex digest
    pub fn new(hex_digest: impl Into<String>) -> Self {
        Self(hex_digest.into())
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuntimeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
