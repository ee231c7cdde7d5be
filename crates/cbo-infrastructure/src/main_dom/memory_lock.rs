//! In-process MainDom lock
//!
//! Named slots in a [`MemoryLockRegistry`] stand in for an OS-level named
//! lock. Every runtime booted in the same process with the same lock name
//! arbitrates through the same slot, which is what the file lock does across
//! processes.

use async_trait::async_trait;
use cbo_domain::error::Result;
use cbo_domain::ports::MainDomLock;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

static PROCESS_REGISTRY: Lazy<Arc<MemoryLockRegistry>> =
    Lazy::new(|| Arc::new(MemoryLockRegistry::new()));

#[derive(Debug, Default)]
struct SlotState {
    holder: Option<Uuid>,
    requested_by: Option<Uuid>,
}

#[derive(Default)]
struct Slot {
    state: Mutex<SlotState>,
    changed: Notify,
}

impl Slot {
    fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Named lock slots shared by [`MemoryMainDomLock`] instances
#[derive(Default)]
pub struct MemoryLockRegistry {
    slots: DashMap<String, Arc<Slot>>,
}

impl MemoryLockRegistry {
    /// Create an isolated registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry shared by the whole process
    pub fn process() -> Arc<Self> {
        Arc::clone(&PROCESS_REGISTRY)
    }

    /// Whether any instance holds `name`
    pub fn is_held(&self, name: &str) -> bool {
        self.slots
            .get(name)
            .is_some_and(|slot| slot.state().holder.is_some())
    }

    fn slot(&self, name: &str) -> Arc<Slot> {
        Arc::clone(self.slots.entry(name.to_string()).or_default().value())
    }
}

impl std::fmt::Debug for MemoryLockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLockRegistry")
            .field("slots", &self.slots.len())
            .finish()
    }
}

/// MainDom lock over an in-process named slot
pub struct MemoryMainDomLock {
    name: String,
    id: Uuid,
    slot: Arc<Slot>,
    poll_interval: Duration,
}

impl MemoryMainDomLock {
    /// Lock named `name` in the process-wide registry
    pub fn new(name: impl Into<String>, poll_interval: Duration) -> Self {
        Self::with_registry(&MemoryLockRegistry::process(), name, poll_interval)
    }

    /// Lock named `name` in `registry`
    pub fn with_registry(
        registry: &MemoryLockRegistry,
        name: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        let name = name.into();
        Self {
            slot: registry.slot(&name),
            id: Uuid::new_v4(),
            poll_interval,
            name,
        }
    }

    /// Whether this instance is the holder
    pub fn is_held(&self) -> bool {
        self.slot.state().holder == Some(self.id)
    }

    async fn wait_for_change(&self, limit: Duration) {
        // the notify is polled with a bound so a missed wake costs one interval
        let _ = tokio::time::timeout(limit, self.slot.changed.notified()).await;
    }
}

#[async_trait]
impl MainDomLock for MemoryMainDomLock {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire(&self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut state = self.slot.state();
                match state.holder {
                    Some(holder) if holder == self.id => return Ok(true),
                    None => {
                        state.holder = Some(self.id);
                        if state.requested_by == Some(self.id) {
                            state.requested_by = None;
                        }
                        info!(lock = %self.name, "Memory lock acquired");
                        return Ok(true);
                    }
                    Some(_) => {
                        if state.requested_by != Some(self.id) {
                            debug!(lock = %self.name, "Lock is held elsewhere, takeover requested");
                        }
                        state.requested_by = Some(self.id);
                    }
                }
            }
            self.slot.changed.notify_waiters();

            let now = Instant::now();
            if now >= deadline {
                let mut state = self.slot.state();
                if state.requested_by == Some(self.id) {
                    state.requested_by = None;
                }
                return Ok(false);
            }
            self.wait_for_change(self.poll_interval.min(deadline - now))
                .await;
        }
    }

    async fn wait_for_release_request(&self) -> Result<()> {
        loop {
            {
                let state = self.slot.state();
                if state.holder == Some(self.id)
                    && state.requested_by.is_some_and(|requester| requester != self.id)
                {
                    return Ok(());
                }
            }
            self.wait_for_change(self.poll_interval).await;
        }
    }

    async fn release(&self) -> Result<()> {
        {
            let mut state = self.slot.state();
            if state.holder != Some(self.id) {
                return Ok(());
            }
            state.holder = None;
        }
        self.slot.changed.notify_waiters();
        info!(lock = %self.name, "Memory lock released");
        Ok(())
    }
}

impl std::fmt::Debug for MemoryMainDomLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMainDomLock")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}
