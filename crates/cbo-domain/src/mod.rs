//! # CBO Domain
//!
//! Core types of the back office composition and bootstrap layer.
//!
//! - [`error`] - Error taxonomy and `Result` alias
//! - [`value_objects`] - Service keys, lifetimes, boot and MainDom state
//! - [`ports`] - Contracts implemented by the infrastructure layer
//! - [`constants`] - Domain constants

/// Domain constants
pub mod constants;
/// Error handling types
pub mod error;
/// Port interfaces
pub mod ports;
/// Value objects
pub mod value_objects;

pub use error::{Error, Result};
