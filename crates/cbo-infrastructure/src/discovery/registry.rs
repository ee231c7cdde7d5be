//! Component Registry
//!
//! Components register themselves at compile time through a `linkme`
//! distributed slice and declare their capabilities as data:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. Component defines: #[linkme::distributed_slice(COMPONENTS)]│
//! │                       static ENTRY: ComponentEntry = ...      │
//! │ 2. TypeFinder reads:  COMPONENTS.iter()                       │
//! │ 3. Boot registers:    ComponentCollectionBuilder::append      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```ignore
//! #[linkme::distributed_slice(COMPONENTS)]
//! static SCHEDULED_PUBLISHING: ComponentEntry = ComponentEntry {
//!     name: "scheduled-publishing",
//!     module: module_path!(),
//!     capabilities: &[Capability::Component, Capability::BackgroundTask],
//!     factory: |resolver| Ok(Arc::new(ScheduledPublishing::inject(resolver)?)),
//! };
//! ```

use crate::di::Resolver;
use cbo_domain::error::Result;
use cbo_domain::ports::Component;
use cbo_domain::value_objects::{Capability, ComponentDescriptor};
use std::sync::Arc;

/// Registry entry for a discoverable component
pub struct ComponentEntry {
    /// Unique component name
    pub name: &'static str,
    /// Declaring module, matched against excluded module prefixes
    pub module: &'static str,
    /// Capability markers
    pub capabilities: &'static [Capability],
    /// Build the component from the frozen container
    pub factory: fn(&mut Resolver<'_>) -> Result<Arc<dyn Component>>,
}

impl ComponentEntry {
    /// Descriptor of this entry
    pub fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor {
            name: self.name.to_string(),
            module: self.module.to_string(),
            capabilities: self.capabilities.to_vec(),
        }
    }

    /// Whether the component may only run in the MainDom process
    pub fn is_main_only(&self) -> bool {
        self.capabilities.iter().any(|c| c.requires_main_dom())
    }
}

impl std::fmt::Debug for ComponentEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentEntry")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Every component linked into the binary
#[linkme::distributed_slice]
pub static COMPONENTS: [ComponentEntry] = [..];

/// List all linked components as (name, module) pairs
pub fn list_components() -> Vec<(&'static str, &'static str)> {
    COMPONENTS.iter().map(|e| (e.name, e.module)).collect()
}
