//! Domain Value Objects
//!
//! Immutable value objects shared by the composition and bootstrap layers.
//!
//! ## Value Objects
//!
//! | Value Object | Description |
//! |--------------|-------------|
//! | [`ServiceKey`] | Identity of a registration: service type plus optional name |
//! | [`Lifetime`] | Instance lifetime policy of a registration |
//! | [`BootPhase`] | Ordered runtime boot stage |
//! | [`BootState`] | Current boot phase and failure record |
//! | [`MainDomState`] | State of the cross-process MainDom lock |
//! | [`Capability`] | Capability marker declared by a discoverable component |
//! | [`RuntimeHash`] | Digest identifying the discovered runtime surface |

/// Boot phase and boot state types
pub mod boot;
/// Capability markers and discovered component descriptors
pub mod discovery;
/// MainDom lock state
pub mod main_dom;
/// Service keys and lifetimes
pub mod service;

pub use boot::{BootFailure, BootPhase, BootState};
pub use discovery::{Capability, ComponentDescriptor, DiscoveredTypes, RuntimeHash};
pub use main_dom::MainDomState;
pub use service::{Lifetime, ServiceKey};
