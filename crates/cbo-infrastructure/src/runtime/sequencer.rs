//! Boot Sequencer
//!
//! Drives startup through strictly ordered phases:
//!
//! | Phase | Work | Failure |
//! |-------|------|---------|
//! | `Configuring` | validate configuration, install logging | fatal |
//! | `Resolving` | type discovery, runtime hash, database provider, registrations | fatal |
//! | `AcquiringMainDom` | acquire the MainDom lock | degrades to non-main |
//! | `Finalizing` | freeze the container, initialize components | fatal |
//! | `Running` | hand the frozen [`Factory`] to the host | |
//!
//! A fatal failure moves the state to `Failed` and surfaces as
//! `Error::Boot { phase, source }`. Application code either receives a
//! [`BootedRuntime`] over a frozen, consistent container or nothing.
//!
//! In debug hosting mode each phase is timed (see [`BootProfiler`]).

use crate::config::{AppConfig, validate_app_config};
use crate::database::{DatabaseProviderResolver, embedded_database_path};
use crate::di::{Container, Factory};
use crate::discovery::{ComponentCollection, ComponentCollectionBuilder, ComponentEntry, TypeFinder};
use crate::lifecycle::DefaultShutdownCoordinator;
use crate::logging::init_logging;
use crate::main_dom::{MainDom, MainDomSettings, create_lock};
use crate::runtime::hash::RuntimeHashBuilder;
use crate::runtime::profiler::{BootProfiler, PhaseTiming};
use cbo_domain::error::{Error, Result};
use cbo_domain::ports::{DatabaseProvider, MainDomLock, ShutdownCoordinator, TypeDiscovery};
use cbo_domain::value_objects::{BootPhase, BootState, DiscoveredTypes, RuntimeHash};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{error, info, warn};

type Composer = Box<dyn FnOnce(&Container) -> Result<()> + Send>;

/// Ordered, fail-fast runtime startup
pub struct BootSequencer {
    config: Arc<AppConfig>,
    container: Arc<Container>,
    state: BootState,
    type_finder: Option<TypeFinder>,
    database: Option<DatabaseProviderResolver>,
    lock: Option<Arc<dyn MainDomLock>>,
    shutdown: Arc<DefaultShutdownCoordinator>,
    init_logging: bool,
    composers: Vec<Composer>,
    main_dom: Option<Arc<MainDom>>,
    profiler: BootProfiler,
}

impl BootSequencer {
    /// Sequencer over a configuration snapshot
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            profiler: BootProfiler::new(config.hosting.debug),
            config,
            container: Container::new(),
            state: BootState::new(),
            type_finder: None,
            database: None,
            lock: None,
            shutdown: Arc::new(DefaultShutdownCoordinator::new()),
            init_logging: true,
            composers: Vec::new(),
            main_dom: None,
        }
    }

    /// Discover components with `finder` instead of the linked registry
    pub fn with_type_finder(mut self, finder: TypeFinder) -> Self {
        self.type_finder = Some(finder);
        self
    }

    /// Select database providers with `resolver`
    pub fn with_database_resolver(mut self, resolver: DatabaseProviderResolver) -> Self {
        self.database = Some(resolver);
        self
    }

    /// Arbitrate MainDom through `lock` instead of the configured primitive
    pub fn with_main_dom_lock(mut self, lock: Arc<dyn MainDomLock>) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Use the host's shutdown coordinator
    pub fn with_shutdown_coordinator(mut self, shutdown: Arc<DefaultShutdownCoordinator>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Whether `Configuring` installs the logging subscriber
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    /// Add host registrations, applied last during `Resolving`
    ///
    /// Later registrations shadow the core ones.
    pub fn compose<F>(mut self, composer: F) -> Self
    where
        F: FnOnce(&Container) -> Result<()> + Send + 'static,
    {
        self.composers.push(Box::new(composer));
        self
    }

    /// Current boot state
    pub fn state(&self) -> &BootState {
        &self.state
    }

    /// Container populated by this sequencer
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Phase timings recorded in debug hosting mode
    pub fn phase_timings(&self) -> &[PhaseTiming] {
        self.profiler.timings()
    }

    /// Run the boot sequence
    ///
    /// A sequencer boots once; further calls fail.
    pub async fn boot(&mut self) -> Result<BootedRuntime> {
        if self.state.phase() != BootPhase::NotStarted {
            return Err(Error::internal(format!(
                "boot was already attempted (phase {})",
                self.state.phase()
            )));
        }

        let started = Instant::now();
        match self.run().await {
            Ok(runtime) => {
                info!(
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    is_main_dom = runtime.is_main_dom(),
                    runtime_hash = %runtime.runtime_hash(),
                    "Runtime booted"
                );
                Ok(runtime)
            }
            Err(err) => {
                self.profiler.finish();
                let err = Error::boot(self.state.phase(), err);
                let failure = self.state.fail(err.to_string());
                error!(phase = %failure.phase, error = %err, "Boot failed");
                if let Some(main_dom) = self.main_dom.take() {
                    if let Err(release_err) = main_dom.release().await {
                        warn!(error = %release_err, "MainDom release after failed boot did not complete");
                    }
                }
                Err(err)
            }
        }
    }

    async fn run(&mut self) -> Result<BootedRuntime> {
        self.enter(BootPhase::Configuring)?;
        validate_app_config(&self.config)?;
        if self.init_logging {
            init_logging(&self.config.logging)?;
        }

        self.enter(BootPhase::Resolving)?;
        let finder = self
            .type_finder
            .take()
            .unwrap_or_else(|| TypeFinder::new(&self.config.type_finder));
        let discovered = finder.discover()?;
        let runtime_hash = self.runtime_hash(&discovered)?;
        info!(%runtime_hash, "Runtime hash computed");

        let database = self
            .database
            .take()
            .unwrap_or_default()
            .resolve(&self.config.database)?;
        if let Some(provider) = &database {
            self.prepare_embedded_database(provider.as_ref())?;
        }

        let main_dom_config = &self.config.global.main_dom;
        let lock = self.lock.take().unwrap_or_else(|| create_lock(main_dom_config));
        let main_dom = MainDom::new(lock, MainDomSettings::from(main_dom_config));
        self.main_dom = Some(Arc::clone(&main_dom));

        self.register_core(&main_dom, &runtime_hash, discovered, database)?;
        let builder = self
            .container
            .register_collection_builder::<ComponentCollectionBuilder>()?;
        for entry in finder.entries()? {
            builder.append(entry);
        }
        for composer in self.composers.drain(..) {
            composer(&self.container)?;
        }

        self.enter(BootPhase::AcquiringMainDom)?;
        let is_main_dom = match main_dom.acquire().await {
            Ok(acquired) => acquired,
            Err(err) => {
                warn!(error = %err, "MainDom acquisition failed, continuing as non-main");
                false
            }
        };
        main_dom.attach_shutdown(self.shutdown.clone());

        self.enter(BootPhase::Finalizing)?;
        if !is_main_dom {
            let skipped = builder.remove_where(ComponentEntry::is_main_only);
            if !skipped.is_empty() {
                warn!(?skipped, "Not MainDom, main-only components skipped");
            }
        }
        let factory = self.container.freeze()?;
        let components = factory.get_instance::<ComponentCollection>()?;
        initialize_components(&components, &main_dom)?;

        self.enter(BootPhase::Running)?;
        self.main_dom = None;
        Ok(BootedRuntime {
            phase_timings: self.profiler.timings().to_vec(),
            factory,
            main_dom,
            runtime_hash,
            components,
            shutdown: Arc::clone(&self.shutdown),
            state: self.state.clone(),
            stopped: AtomicBool::new(false),
        })
    }

    fn enter(&mut self, phase: BootPhase) -> Result<()> {
        self.state.advance(phase)?;
        if phase == BootPhase::Running {
            self.profiler.finish();
        } else {
            self.profiler.enter(phase);
        }
        info!(phase = %phase, "Boot phase");
        Ok(())
    }

    fn runtime_hash(&self, discovered: &DiscoveredTypes) -> Result<RuntimeHash> {
        let content_root = &self.config.hosting.content_root;
        self.config
            .type_finder
            .hash_paths
            .iter()
            .fold(
                RuntimeHashBuilder::new(&self.config.global.application_id)
                    .with_components(discovered),
                |builder, path| builder.with_path(content_root.join(path)),
            )
            .build()
    }

    fn prepare_embedded_database(&self, provider: &dyn DatabaseProvider) -> Result<()> {
        if !provider.is_embedded() {
            return Ok(());
        }
        let Some(path) = self
            .config
            .database
            .connection_string
            .as_deref()
            .and_then(|cs| embedded_database_path(cs, &self.config.hosting.content_root))
        else {
            return Err(Error::configuration(format!(
                "Embedded database provider '{}' needs a 'Data Source' in the connection string",
                provider.name()
            )));
        };
        if path.exists() {
            return Ok(());
        }
        provider.create_embedded_database(&path)
    }

    fn register_core(
        &self,
        main_dom: &Arc<MainDom>,
        runtime_hash: &RuntimeHash,
        discovered: DiscoveredTypes,
        database: Option<Arc<dyn DatabaseProvider>>,
    ) -> Result<()> {
        let container = &self.container;
        container.register_instance(Arc::clone(&self.config))?;
        container.register_instance(Arc::clone(main_dom))?;
        container.register_instance(Arc::new(runtime_hash.clone()))?;
        container.register_instance(Arc::new(discovered))?;
        container.register_instance(Arc::clone(&self.shutdown))?;
        container.register_instance::<dyn ShutdownCoordinator>(self.shutdown.clone())?;
        if let Some(provider) = database {
            container.register_instance::<dyn DatabaseProvider>(provider)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for BootSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootSequencer")
            .field("state", &self.state)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

/// Initialize components in order
///
/// When one fails, the components started before it are terminated in
/// reverse order. Main-only ones stop with the MainDom release of the failed
/// boot.
fn initialize_components(components: &ComponentCollection, main_dom: &MainDom) -> Result<()> {
    for (index, item) in components.iter().enumerate() {
        let name = item.descriptor.name.as_str();
        if let Err(err) = item.component.initialize() {
            error!(component = name, error = %err, "Component failed to initialize");
            for started in components
                .iter()
                .take(index)
                .rev()
                .filter(|started| !started.descriptor.is_main_only())
            {
                started.component.terminate();
                info!(component = started.descriptor.name.as_str(), "Component terminated");
            }
            return Err(err);
        }
        info!(component = name, "Component initialized");

        if item.descriptor.is_main_only() {
            let component = Arc::clone(&item.component);
            if !main_dom.register(name, move || component.terminate()) {
                // MainDom was lost after acquisition
                warn!(component = name, "MainDom lost, stopping main-only component");
                item.component.terminate();
            }
        }
    }
    Ok(())
}

/// A booted runtime
///
/// Main-only components stop when MainDom is released; the others stop on
/// [`BootedRuntime::shutdown`].
pub struct BootedRuntime {
    factory: Factory,
    main_dom: Arc<MainDom>,
    runtime_hash: RuntimeHash,
    components: Arc<ComponentCollection>,
    shutdown: Arc<DefaultShutdownCoordinator>,
    state: BootState,
    phase_timings: Vec<PhaseTiming>,
    stopped: AtomicBool,
}

impl BootedRuntime {
    /// Frozen resolver
    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    /// MainDom coordinator
    pub fn main_dom(&self) -> &Arc<MainDom> {
        &self.main_dom
    }

    /// Whether this process is currently MainDom
    pub fn is_main_dom(&self) -> bool {
        self.main_dom.is_main_dom()
    }

    /// Runtime hash
    pub fn runtime_hash(&self) -> &RuntimeHash {
        &self.runtime_hash
    }

    /// Initialized components
    pub fn components(&self) -> &ComponentCollection {
        &self.components
    }

    /// Shutdown coordinator of this runtime
    pub fn shutdown_coordinator(&self) -> &Arc<DefaultShutdownCoordinator> {
        &self.shutdown
    }

    /// Final boot state
    pub fn state(&self) -> &BootState {
        &self.state
    }

    /// Time spent per boot phase; empty unless `hosting.debug` is set
    pub fn phase_timings(&self) -> &[PhaseTiming] {
        &self.phase_timings
    }

    /// Stop the runtime: release MainDom, then terminate the other components
    ///
    /// Only the first call has an effect.
    pub async fn shutdown(&self) -> Result<()> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.shutdown.signal_shutdown();
        let released = self.main_dom.release().await;
        for item in self
            .components
            .iter()
            .rev()
            .filter(|item| !item.descriptor.is_main_only())
        {
            item.component.terminate();
        }
        info!("Runtime stopped");
        released
    }
}

impl std::fmt::Debug for BootedRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootedRuntime")
            .field("state", &self.state)
            .field("main_dom", &self.main_dom)
            .field("runtime_hash", &self.runtime_hash)
            .field("components", &self.components.len())
            .finish()
    }
}
