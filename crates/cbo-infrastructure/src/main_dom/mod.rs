//! MainDom
//!
//! Guarantees that, across overlapping instances of the application, only
//! one considers itself the owner of exclusive resources.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MainDom`] | Coordinator: acquisition, release callbacks, takeover |
//! | [`FileMainDomLock`] | Exclusive file lock shared by processes on one host |
//! | [`MemoryMainDomLock`] | Named in-process lock |

mod coordinator;
mod file_lock;
mod memory_lock;

pub use coordinator::{MainDom, MainDomSettings};
pub use file_lock::{FileMainDomLock, LockMetadata};
pub use memory_lock::{MemoryLockRegistry, MemoryMainDomLock};

use crate::config::{MainDomConfig, MainDomLockKind};
use cbo_domain::ports::MainDomLock;
use std::sync::Arc;

/// Build the lock primitive selected by configuration
pub fn create_lock(config: &MainDomConfig) -> Arc<dyn MainDomLock> {
    match config.lock {
        MainDomLockKind::File => Arc::new(FileMainDomLock::new(
            config.resolved_lock_dir(),
            config.lock_name.clone(),
            config.poll_interval(),
        )),
        MainDomLockKind::Memory => Arc::new(MemoryMainDomLock::new(
            config.lock_name.clone(),
            config.poll_interval(),
        )),
    }
}
