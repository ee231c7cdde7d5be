//! Configuration
//!
//! Layered loading with figment:
//!
//! | Order | Source |
//! |-------|--------|
//! | 1 | `AppConfig::default()` |
//! | 2 | `cbo.toml` (explicit path or discovered) |
//! | 3 | `CBO_` environment variables, nested keys split on `__` |
//!
//! Example: `CBO_GLOBAL__MAIN_DOM__ACQUIRE_TIMEOUT_MS=2000`.

pub mod loader;
pub mod types;

pub use loader::{ConfigBuilder, ConfigLoader, validate_app_config};
pub use types::*;
