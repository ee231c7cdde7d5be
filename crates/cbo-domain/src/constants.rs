//! Domain layer constants
//!
//! Infrastructure-specific constants remain in `cbo_infrastructure::constants`.

// ============================================================================
// MAINDOM CONSTANTS
// ============================================================================

/// Default MainDom lock name
pub const MAIN_DOM_DEFAULT_LOCK_NAME: &str = "cbo-main-dom";

/// Default time to wait for the MainDom lock (milliseconds)
pub const MAIN_DOM_DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 10_000;

/// Default grace period for a superseded holder to release (milliseconds)
pub const MAIN_DOM_DEFAULT_RELEASE_GRACE_MS: u64 = 5_000;

/// Default polling interval of lock primitives (milliseconds)
pub const MAIN_DOM_DEFAULT_POLL_INTERVAL_MS: u64 = 250;

// ============================================================================
// COMPOSITION CONSTANTS
// ============================================================================

/// Weight used for release callbacks registered without an explicit weight
pub const MAIN_DOM_DEFAULT_CALLBACK_WEIGHT: i32 = 100;
