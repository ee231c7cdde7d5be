//! Domain Port Interfaces
//!
//! Boundary contracts between the bootstrap core and its external
//! collaborators. Implementations live in the infrastructure layer.
//!
//! ## Organization
//!
//! - **main_dom** - Cross-process lock primitive used for MainDom arbitration
//! - **discovery** - Type discovery over capability markers
//! - **database** - Database provider contract with explicit availability
//! - **lifecycle** - Host shutdown signal and startup components

/// Database provider port
pub mod database;
/// Type discovery port
pub mod discovery;
/// Lifecycle ports (shutdown, components)
pub mod lifecycle;
/// MainDom lock primitive port
pub mod main_dom;

pub use database::{DatabaseProvider, ProviderAvailability};
pub use discovery::TypeDiscovery;
pub use lifecycle::{Component, ShutdownCoordinator};
pub use main_dom::MainDomLock;
