//! # CBO
//!
//! Composition and bootstrap core of a content management back office: a
//! registration container, a fail-fast boot sequencer and the cross-process
//! MainDom lock.
//!
//! ## Example
//!
//! ```ignore
//! use cbo::infrastructure::config::ConfigLoader;
//! use cbo::infrastructure::runtime::BootSequencer;
//! use std::sync::Arc;
//!
//! let config = Arc::new(ConfigLoader::new().load()?);
//! let runtime = BootSequencer::new(config).boot().await?;
//! if runtime.is_main_dom() {
//!     // main-only subsystems are running
//! }
//! runtime.shutdown().await?;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - Error taxonomy, value objects and ports
//! - `infrastructure` - Container, MainDom, boot sequencer, configuration, logging

/// Domain layer - core types and ports
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use cbo_domain::*;
}

/// Infrastructure layer - composition and bootstrap
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use cbo_infrastructure::*;
}

pub mod cli;

// Re-export commonly used domain types at the crate root
pub use domain::*;

// Re-export the boot entry points at the crate root
pub use infrastructure::di::{Container, Factory};
pub use infrastructure::runtime::{BootSequencer, BootedRuntime};
