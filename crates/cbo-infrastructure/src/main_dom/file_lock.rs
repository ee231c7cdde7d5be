//! File-backed MainDom lock
//!
//! Arbitration uses an exclusive advisory lock (fs2) on `<name>.lock`. Three
//! files live in the lock directory:
//!
//! | File | Purpose |
//! |------|---------|
//! | `<name>.lock` | Locked exclusively by the holder; never deleted |
//! | `<name>.lock.meta` | JSON [`LockMetadata`] of the holder, for diagnostics |
//! | `<name>.release` | Takeover request posted by a waiting instance |
//!
//! The operating system drops the lock when the holder exits, so an abrupt
//! exit never leaves the lock held.

use crate::constants::{MAIN_DOM_LOCK_EXT, MAIN_DOM_META_EXT, MAIN_DOM_RELEASE_REQUEST_EXT};
use crate::error_ext::ErrorContext;
use async_trait::async_trait;
use cbo_domain::error::{Error, Result};
use cbo_domain::ports::MainDomLock;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Holder information written next to the lock file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMetadata {
    /// Instance identifier of the holder
    pub instance_id: String,
    /// Process id of the holder
    pub pid: u32,
    /// RFC 3339 timestamp of acquisition
    pub acquired_at: String,
    /// Crate version of the holder
    pub version: String,
}

impl LockMetadata {
    fn current(instance_id: &str) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            pid: std::process::id(),
            acquired_at: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// MainDom lock over an exclusive file lock
pub struct FileMainDomLock {
    name: String,
    instance_id: String,
    lock_path: PathBuf,
    meta_path: PathBuf,
    release_path: PathBuf,
    poll_interval: Duration,
    held: Mutex<Option<File>>,
}

impl FileMainDomLock {
    /// Create a lock named `name` inside `lock_dir`
    ///
    /// The directory is created on first acquisition.
    pub fn new(lock_dir: impl AsRef<Path>, name: impl Into<String>, poll_interval: Duration) -> Self {
        let name = name.into();
        let dir = lock_dir.as_ref();
        Self {
            lock_path: dir.join(format!("{name}.{MAIN_DOM_LOCK_EXT}")),
            meta_path: dir.join(format!("{name}.{MAIN_DOM_META_EXT}")),
            release_path: dir.join(format!("{name}.{MAIN_DOM_RELEASE_REQUEST_EXT}")),
            instance_id: uuid::Uuid::new_v4().to_string(),
            poll_interval,
            held: Mutex::new(None),
            name,
        }
    }

    /// Identifier this instance writes into metadata and takeover requests
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Path of the lock file
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Metadata of the current holder, if any is recorded
    pub fn read_metadata(&self) -> Result<Option<LockMetadata>> {
        match fs::read_to_string(&self.meta_path) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::io_with_source(
                format!("Failed to read lock metadata {}", self.meta_path.display()),
                err,
            )),
        }
    }

    /// Whether a takeover request is pending
    pub fn is_release_requested(&self) -> bool {
        self.release_path.exists()
    }

    fn try_lock(&self) -> Result<Option<File>> {
        if let Some(dir) = self.lock_path.parent() {
            fs::create_dir_all(dir)
                .io_context(format!("Failed to create lock directory {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .io_context(format!("Failed to open lock file {}", self.lock_path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(file)),
            Err(err) if err.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(err) => Err(Error::io_with_source(
                format!("Failed to lock {}", self.lock_path.display()),
                err,
            )),
        }
    }

    fn post_release_request(&self) -> Result<()> {
        fs::write(&self.release_path, &self.instance_id).io_context(format!(
            "Failed to post takeover request {}",
            self.release_path.display()
        ))
    }

    /// Remove the takeover request if it is ours
    fn withdraw_release_request(&self) {
        if fs::read_to_string(&self.release_path).is_ok_and(|owner| owner == self.instance_id) {
            remove_if_exists(&self.release_path);
        }
    }

    fn write_metadata(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&LockMetadata::current(&self.instance_id))?;
        fs::write(&self.meta_path, json).io_context(format!(
            "Failed to write lock metadata {}",
            self.meta_path.display()
        ))
    }
}

#[async_trait]
impl MainDomLock for FileMainDomLock {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire(&self, timeout: Duration) -> Result<bool> {
        let mut held = self.held.lock().await;
        if held.is_some() {
            return Ok(true);
        }

        let deadline = Instant::now() + timeout;
        let mut requested = false;
        loop {
            if let Some(file) = self.try_lock()? {
                // a request left by us or a previous contender is satisfied now
                remove_if_exists(&self.release_path);
                self.write_metadata()?;
                *held = Some(file);
                info!(lock = %self.name, path = %self.lock_path.display(), "File lock acquired");
                return Ok(true);
            }

            if !requested {
                self.post_release_request()?;
                requested = true;
                debug!(lock = %self.name, "Lock is held elsewhere, takeover requested");
            }

            let now = Instant::now();
            if now >= deadline {
                self.withdraw_release_request();
                return Ok(false);
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    async fn wait_for_release_request(&self) -> Result<()> {
        loop {
            match fs::read_to_string(&self.release_path) {
                Ok(owner) if owner != self.instance_id => return Ok(()),
                Ok(_) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(Error::io_with_source(
                        format!("Failed to read takeover request {}", self.release_path.display()),
                        err,
                    ));
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn release(&self) -> Result<()> {
        let Some(file) = self.held.lock().await.take() else {
            return Ok(());
        };
        remove_if_exists(&self.meta_path);
        file.unlock()
            .io_context(format!("Failed to unlock {}", self.lock_path.display()))?;
        info!(lock = %self.name, "File lock released");
        Ok(())
    }
}

impl std::fmt::Debug for FileMainDomLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileMainDomLock")
            .field("name", &self.name)
            .field("lock_path", &self.lock_path)
            .field("instance_id", &self.instance_id)
            .finish()
    }
}

fn remove_if_exists(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "Failed to remove lock file");
        }
    }
}
