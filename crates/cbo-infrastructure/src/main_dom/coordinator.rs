//! MainDom coordinator
//!
//! Decides whether this process is the single "main" owner of exclusive
//! resources (schedulers, index writers, file watchers), and hands ownership
//! over when a newer instance asks for it.
//!
//! ```text
//!   new instance                         current holder
//!   ────────────                         ──────────────
//!   acquire(timeout) ── takeover req ──▶ listener wakes, state = Superseded
//!        │ waits                          release callbacks (weight order)
//!        │                                lock.release()     [within grace]
//!        ◀──────────── lock free ──────── state = Released
//!   state = Acquired
//!
//!   timeout elapsed first => state = NonMain (degraded, not fatal)
//! ```

use cbo_domain::constants::MAIN_DOM_DEFAULT_CALLBACK_WEIGHT;
use cbo_domain::error::{Error, Result};
use cbo_domain::ports::{MainDomLock, ShutdownCoordinator};
use cbo_domain::value_objects::MainDomState;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::MainDomConfig;

type ReleaseFn = Box<dyn FnOnce() + Send + 'static>;

struct ReleaseCallback {
    name: String,
    weight: i32,
    seq: u64,
    release: ReleaseFn,
}

/// Timing settings of the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainDomSettings {
    /// How long acquisition waits for the current holder
    pub acquire_timeout: Duration,
    /// How long release callbacks may take before the release is reported late
    pub release_grace: Duration,
}

impl From<&MainDomConfig> for MainDomSettings {
    fn from(config: &MainDomConfig) -> Self {
        Self {
            acquire_timeout: config.acquire_timeout(),
            release_grace: config.release_grace(),
        }
    }
}

/// Cross-process MainDom coordinator
pub struct MainDom {
    lock: Arc<dyn MainDomLock>,
    settings: MainDomSettings,
    state: watch::Sender<MainDomState>,
    callbacks: Mutex<Vec<ReleaseCallback>>,
    next_seq: AtomicU64,
    acquire_guard: tokio::sync::Mutex<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    self_ref: Weak<MainDom>,
}

impl MainDom {
    /// Create a coordinator over `lock`
    pub fn new(lock: Arc<dyn MainDomLock>, settings: MainDomSettings) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            lock,
            settings,
            state: watch::Sender::new(MainDomState::Idle),
            callbacks: Mutex::new(Vec::new()),
            next_seq: AtomicU64::new(0),
            acquire_guard: tokio::sync::Mutex::new(()),
            tasks: Mutex::new(Vec::new()),
            self_ref: self_ref.clone(),
        })
    }

    /// Lock name
    pub fn lock_name(&self) -> &str {
        self.lock.name()
    }

    /// Current state
    pub fn state(&self) -> MainDomState {
        *self.state.borrow()
    }

    /// Whether this process currently is MainDom
    pub fn is_main_dom(&self) -> bool {
        self.state().is_main()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<MainDomState> {
        self.state.subscribe()
    }

    /// Timing settings
    pub fn settings(&self) -> MainDomSettings {
        self.settings
    }

    // ========================================================================
    // Acquisition
    // ========================================================================

    /// Try to become MainDom within the configured timeout
    ///
    /// Returns `Ok(true)` when acquired (immediately when already acquired)
    /// and `Ok(false)` when the timeout elapsed, which leaves the process in
    /// non-main mode. Once released, the coordinator never acquires again.
    /// Errors of the lock primitive leave the process non-main as well.
    pub async fn acquire(&self) -> Result<bool> {
        let _guard = self.acquire_guard.lock().await;
        let started = self.transition(|state| match state {
            MainDomState::Idle | MainDomState::Acquiring | MainDomState::NonMain => {
                Some(MainDomState::Acquiring)
            }
            _ => None,
        });
        if !started {
            let state = self.state();
            if state.is_main() {
                return Ok(true);
            }
            debug!(lock = %self.lock_name(), %state, "MainDom was given up, not acquiring");
            return Ok(false);
        }

        let timeout = self.settings.acquire_timeout;
        let outcome = self.lock.acquire(timeout).await;
        let next = if matches!(outcome, Ok(true)) {
            MainDomState::Acquired
        } else {
            MainDomState::NonMain
        };
        if !self.transition(|state| (state == MainDomState::Acquiring).then_some(next)) {
            // released while the primitive was still waiting
            info!(lock = %self.lock_name(), "MainDom released during acquisition");
            return match outcome {
                Ok(true) => self.lock.release().await.map(|()| false),
                Ok(false) => Ok(false),
                Err(err) => Err(err),
            };
        }

        match outcome {
            Ok(true) => {
                self.spawn_takeover_listener();
                Ok(true)
            }
            Ok(false) => {
                let err = Error::main_dom_acquisition_timeout(
                    self.lock_name(),
                    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                );
                warn!(lock = %self.lock_name(), "{err}; continuing without main-only subsystems");
                Ok(false)
            }
            Err(err) => {
                error!(lock = %self.lock_name(), error = %err, "MainDom lock primitive failed");
                Err(err)
            }
        }
    }

    // ========================================================================
    // Callbacks
    // ========================================================================

    /// Register a release callback with the default weight
    ///
    /// Returns `false` without registering when this process is not MainDom.
    pub fn register<R>(&self, name: &str, release: R) -> bool
    where
        R: FnOnce() + Send + 'static,
    {
        self.register_with_install(name, MAIN_DOM_DEFAULT_CALLBACK_WEIGHT, || {}, release)
    }

    /// Run `install` and register `release`, only when this process is MainDom
    ///
    /// Release callbacks run once, in ascending weight order (registration
    /// order among equal weights), on whichever thread performs the release.
    /// `install` and a concurrent release never interleave.
    pub fn register_with_install<I, R>(&self, name: &str, weight: i32, install: I, release: R) -> bool
    where
        I: FnOnce(),
        R: FnOnce() + Send + 'static,
    {
        let mut callbacks = self.callbacks();
        if !self.is_main_dom() {
            debug!(callback = name, state = %self.state(), "Not MainDom, callback not registered");
            return false;
        }
        install();
        callbacks.push(ReleaseCallback {
            name: name.to_string(),
            weight,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            release: Box::new(release),
        });
        debug!(callback = name, weight, "MainDom release callback registered");
        true
    }

    /// Number of pending release callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks().len()
    }

    // ========================================================================
    // Release
    // ========================================================================

    /// Give up MainDom: run release callbacks, then release the lock
    ///
    /// Only the first call performs the release; concurrent calls wait for
    /// it. When the work exceeds the grace period every waiting caller gets
    /// `MainDomReleaseTimeout` while the release finishes in the background.
    /// A coordinator that never held the lock moves straight to `Released`,
    /// and an acquisition still in flight gives the lock back as soon as the
    /// primitive grants it.
    pub async fn release(&self) -> Result<()> {
        let mut observed = MainDomState::Idle;
        self.transition(|state| {
            observed = state;
            match state {
                MainDomState::Acquired | MainDomState::Superseded => Some(MainDomState::Releasing),
                MainDomState::Idle | MainDomState::Acquiring | MainDomState::NonMain => {
                    Some(MainDomState::Released)
                }
                MainDomState::Releasing | MainDomState::Released => None,
            }
        });
        match observed {
            MainDomState::Acquired | MainDomState::Superseded => {}
            MainDomState::Releasing => return self.wait_for_release().await,
            state => {
                debug!(lock = %self.lock_name(), %state, "Nothing to release");
                return Ok(());
            }
        }

        let Some(this) = self.self_ref.upgrade() else {
            return Err(Error::internal("MainDom coordinator dropped during release"));
        };
        let work = tokio::spawn(async move { this.run_release().await });

        match tokio::time::timeout(self.settings.release_grace, work).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(Error::internal(format!(
                "MainDom release task failed: {join_err}"
            ))),
            Err(_) => Err(self.release_timeout()),
        }
    }

    /// Release MainDom when the host signals graceful shutdown
    pub fn attach_shutdown(&self, shutdown: Arc<dyn ShutdownCoordinator>) {
        let weak = self.self_ref.clone();
        self.track(tokio::spawn(async move {
            shutdown.wait_for_shutdown().await;
            if let Some(main_dom) = weak.upgrade() {
                info!(lock = %main_dom.lock_name(), "Shutdown signalled, releasing MainDom");
                if let Err(err) = main_dom.release().await {
                    error!(error = %err, "MainDom release on shutdown failed");
                }
            }
        }));
    }

    async fn wait_for_release(&self) -> Result<()> {
        let mut state = self.state.subscribe();
        let released = state.wait_for(|s| *s == MainDomState::Released);
        match tokio::time::timeout(self.settings.release_grace, released).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(Error::internal("MainDom coordinator dropped during release")),
            Err(_) => Err(self.release_timeout()),
        }
    }

    fn release_timeout(&self) -> Error {
        let err = Error::main_dom_release_timeout(
            self.lock_name(),
            u64::try_from(self.settings.release_grace.as_millis()).unwrap_or(u64::MAX),
        );
        error!(lock = %self.lock_name(), "{err}");
        err
    }

    async fn run_release(&self) -> Result<()> {
        let mut callbacks = std::mem::take(&mut *self.callbacks());
        callbacks.sort_by_key(|c| (c.weight, c.seq));

        let lock = self.lock_name().to_string();
        let ran = tokio::task::spawn_blocking(move || {
            let count = callbacks.len();
            for callback in callbacks {
                debug!(callback = %callback.name, weight = callback.weight, "Running MainDom release callback");
                if catch_unwind(AssertUnwindSafe(callback.release)).is_err() {
                    error!(lock = %lock, callback = %callback.name, "MainDom release callback panicked");
                }
            }
            count
        })
        .await
        .map_err(|err| Error::internal(format!("MainDom release callbacks failed: {err}")))?;

        self.lock.release().await?;
        self.transition(|_| Some(MainDomState::Released));
        info!(lock = %self.lock_name(), callbacks = ran, "MainDom released");
        Ok(())
    }

    fn spawn_takeover_listener(&self) {
        let weak = self.self_ref.clone();
        let lock = Arc::clone(&self.lock);
        self.track(tokio::spawn(async move {
            if let Err(err) = lock.wait_for_release_request().await {
                error!(lock = %lock.name(), error = %err, "Watching for takeover requests failed");
                return;
            }
            let Some(main_dom) = weak.upgrade() else {
                return;
            };
            let superseded = main_dom
                .transition(|state| (state == MainDomState::Acquired).then_some(MainDomState::Superseded));
            if !superseded {
                return;
            }
            if let Err(err) = main_dom.release().await {
                // the new instance proceeds on its own timeout
                warn!(lock = %main_dom.lock_name(), error = %err, "Superseded MainDom released late");
            }
        }));
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    fn callbacks(&self) -> MutexGuard<'_, Vec<ReleaseCallback>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `step` to the current state atomically
    ///
    /// Returns whether `step` produced a next state.
    fn transition(&self, step: impl FnOnce(MainDomState) -> Option<MainDomState>) -> bool {
        let mut change = None;
        self.state.send_if_modified(|state| match step(*state) {
            Some(next) => {
                change = Some((*state, next));
                *state = next;
                true
            }
            None => false,
        });
        let Some((from, to)) = change else {
            return false;
        };
        if from != to {
            info!(lock = %self.lock_name(), %from, %to, "MainDom state changed");
        }
        true
    }
}

impl Drop for MainDom {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

impl std::fmt::Debug for MainDom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainDom")
            .field("lock", &self.lock_name())
            .field("state", &self.state())
            .field("settings", &self.settings)
            .finish()
    }
}
