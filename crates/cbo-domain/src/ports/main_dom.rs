//! MainDom Lock Port
//!
//! Defines the arbitration primitive behind the MainDom coordinator. The
//! primitive itself provides mutual exclusion (a file lock, a lease row, a
//! named OS lock); the coordinator never invents consensus on top of it.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Exclusive, process-spanning lock primitive
///
/// At most one holder exists per lock name at any instant. Holding is a
/// lease: the holder gives it up through [`MainDomLock::release`] or by
/// exiting.
#[async_trait]
pub trait MainDomLock: Send + Sync {
    /// Lock name, for diagnostics
    fn name(&self) -> &str;

    /// Try to become the holder
    ///
    /// When another instance holds the lock, a takeover request is posted to
    /// it and the call waits up to `timeout` for the lock to be released.
    /// Returns `Ok(false)` when the timeout elapses. Acquiring a lock this
    /// instance already holds returns `Ok(true)`.
    async fn acquire(&self, timeout: Duration) -> Result<bool>;

    /// Complete once another instance requests a takeover
    ///
    /// Only meaningful while holding the lock.
    async fn wait_for_release_request(&self) -> Result<()>;

    /// Give up the lock
    ///
    /// Releasing a lock that is not held is a no-op.
    async fn release(&self) -> Result<()>;
}
