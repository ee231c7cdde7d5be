//! MainDom state

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of this process with respect to the MainDom lock
///
/// ```text
/// Idle -> Acquiring -> Acquired -> Releasing -> Released
///              \           \
///               \           -> Superseded -> Releasing
///                -> NonMain -> Acquiring (retry)
///
/// release() before the lock is held: Idle | Acquiring | NonMain -> Released
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MainDomState {
    /// No acquisition attempted yet
    #[default]
    Idle,
    /// Waiting on the lock primitive
    Acquiring,
    /// This process is MainDom
    Acquired,
    /// Another instance asked for the lock; release is under way
    Superseded,
    /// Release callbacks are running
    Releasing,
    /// Ownership was given up, or released before it was ever held
    Released,
    /// Acquisition timed out; the process runs without main-only subsystems
    /// until a later attempt succeeds
    NonMain,
}

impl MainDomState {
    /// Whether the process currently owns main-only resources
    pub fn is_main(self) -> bool {
        matches!(self, Self::Acquired)
    }

    /// Whether the state can no longer change
    pub fn is_final(self) -> bool {
        matches!(self, Self::Released)
    }
}

impl fmt::Display for MainDomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Acquiring => "acquiring",
            Self::Acquired => "acquired",
            Self::Superseded => "superseded",
            Self::Releasing => "releasing",
            Self::Released => "released",
            Self::NonMain => "non-main",
        };
        f.write_str(s)
    }
}
