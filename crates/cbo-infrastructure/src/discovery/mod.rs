//! Type discovery
//!
//! Capability-based auto-registration without runtime type inspection:
//! components are linked into [`COMPONENTS`] with their capability markers,
//! [`TypeFinder`] turns the registry into [`DiscoveredTypes`] and
//! [`ComponentCollectionBuilder`] carries them into the container.
//!
//! [`DiscoveredTypes`]: cbo_domain::value_objects::DiscoveredTypes

pub mod builtin;
mod collection;
mod finder;
mod registry;

pub use collection::{ComponentCollection, ComponentCollectionBuilder, ComponentItem};
pub use finder::TypeFinder;
pub use registry::{COMPONENTS, ComponentEntry, list_components};
