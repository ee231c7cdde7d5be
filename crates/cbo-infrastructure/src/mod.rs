//! # Infrastructure Layer
//!
//! The composition and bootstrap core of the back office.
//!
//! ## Module Categories
//!
//! ### Composition
//! | Module | Description |
//! |--------|-------------|
//! | [`di`] | Registration container, frozen factory, scopes, collection builders |
//! | [`discovery`] | Compile-time component registry and type finder |
//! | [`database`] | Compile-time database provider registry |
//!
//! ### Bootstrap
//! | Module | Description |
//! |--------|-------------|
//! | [`runtime`] | Boot sequencer and runtime hash |
//! | [`main_dom`] | Cross-process MainDom coordinator and lock primitives |
//! | [`lifecycle`] | Host shutdown signalling |
//!
//! ### Configuration & Observability
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Layered TOML and environment configuration |
//! | [`logging`] | Structured logging with tracing |
//! | [`constants`] | Centralized infrastructure constants |

pub mod config;
pub mod constants;
pub mod database;
pub mod di;
pub mod discovery;
pub mod error_ext;
pub mod lifecycle;
pub mod logging;
pub mod main_dom;
pub mod runtime;

// Re-export commonly used types
pub use error_ext::ErrorContext;
