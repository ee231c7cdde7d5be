//! Registration Container
//!
//! The container is mutable while the runtime boots and frozen afterwards:
//!
//! ```text
//! Container::new()  ──register*──▶  Mutable  ──freeze()──▶  Frozen ──▶ Factory
//!                                      │                       │
//!                                 get/create              get/create only,
//!                                                       register* => ContainerFrozen
//! ```
//!
//! Registration is single-writer (the boot sequencer). Freezing moves the
//! registrations into an immutable [`Factory`] that unlimited readers share
//! without further locking.

use super::collection::{CollectionBuilder, Registrar};
use super::factory::Factory;
use super::registration::{
    FactoryFn, Implementation, Registration, RegistrationSource, Registry, erase,
};
use super::resolver::{Arguments, Injectable, Resolver};
use cbo_domain::error::{Error, Result};
use cbo_domain::value_objects::{Lifetime, ServiceKey};
use once_cell::sync::OnceCell;
use std::any::TypeId;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::{debug, info};

/// Service registry populated during boot
pub struct Container {
    registry: RwLock<Registry>,
    frozen: OnceCell<Arc<Registry>>,
    self_ref: Weak<Container>,
}

impl Container {
    /// Create an empty, mutable container
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            registry: RwLock::new(Registry::default()),
            frozen: OnceCell::new(),
            self_ref: self_ref.clone(),
        })
    }

    /// Whether the registration window is closed
    pub fn is_frozen(&self) -> bool {
        self.frozen.get().is_some()
    }

    /// Number of registrations recorded
    pub fn len(&self) -> usize {
        self.with_registry(Registry::len)
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register an injectable type as its own service
    pub fn register<T: Injectable>(&self, lifetime: Lifetime) -> Result<()> {
        self.insert(
            ServiceKey::of::<T>(),
            lifetime,
            Implementation::Factory {
                factory: Arc::new(|resolver: &mut Resolver<'_>| {
                    T::inject(resolver).map(|value| erase(Arc::new(value)))
                }),
                implementation: std::any::type_name::<T>(),
            },
            false,
        )
        .map(drop)
    }

    /// Register a factory for service `S`
    ///
    /// Later registrations of the same key shadow earlier ones.
    pub fn register_factory<S, F>(&self, lifetime: Lifetime, factory: F) -> Result<()>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> Result<Arc<S>> + Send + Sync + 'static,
    {
        self.insert(ServiceKey::of::<S>(), lifetime, factory_of(factory), false)
            .map(drop)
    }

    /// Register a named factory for service `S`
    pub fn register_named_factory<S, F>(
        &self,
        name: &str,
        lifetime: Lifetime,
        factory: F,
    ) -> Result<()>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> Result<Arc<S>> + Send + Sync + 'static,
    {
        self.insert(ServiceKey::named::<S>(name), lifetime, factory_of(factory), false)
            .map(drop)
    }

    /// Bind a pre-built instance as a permanent singleton
    pub fn register_instance<S: ?Sized + Send + Sync + 'static>(&self, instance: Arc<S>) -> Result<()> {
        self.insert(ServiceKey::of::<S>(), Lifetime::Singleton, instance_of(instance), false)
            .map(drop)
    }

    /// Bind a pre-built instance under a registration name
    pub fn register_named_instance<S: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
        instance: Arc<S>,
    ) -> Result<()> {
        self.insert(
            ServiceKey::named::<S>(name),
            Lifetime::Singleton,
            instance_of(instance),
            false,
        )
        .map(drop)
    }

    /// Register, initialize and return a collection builder
    ///
    /// Collection builders exist exactly once per container: the call fails
    /// with `DuplicateRegistration` when `B` already has any registration.
    /// The builder is registered as a singleton built from a [`Registrar`]
    /// over this container, then resolved once so callers receive the
    /// initialized instance.
    pub fn register_collection_builder<B: CollectionBuilder>(&self) -> Result<Arc<B>> {
        let key = ServiceKey::of::<B>();
        if !self.get_registered::<B>().is_empty() {
            return Err(Error::duplicate_registration(key.to_string()));
        }

        let registrar = Registrar::new(self.self_ref.clone());
        let factory: FactoryFn = Arc::new(move |_resolver: &mut Resolver<'_>| {
            B::create(registrar.clone()).map(|builder| erase(Arc::new(builder)))
        });
        self.insert(
            key,
            Lifetime::Singleton,
            Implementation::Factory {
                factory,
                implementation: std::any::type_name::<B>(),
            },
            true,
        )?;

        self.get_instance::<B>()
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve the unnamed registration of `S`
    pub fn get_instance<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>> {
        Resolver::new(self, None).get::<S>()
    }

    /// Resolve a named registration of `S`
    pub fn get_named_instance<S: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<S>> {
        Resolver::new(self, None).get_named::<S>(name)
    }

    /// Resolve `S` if registered
    pub fn try_get_instance<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<S>>> {
        Resolver::new(self, None).try_get::<S>()
    }

    /// Construct a fresh `T`
    ///
    /// `args` take precedence over container resolution for constructor
    /// parameters of matching type.
    pub fn create_instance<T: Injectable>(&self, args: Arguments) -> Result<T> {
        Resolver::new(self, None).with_overrides(&args).create::<T>()
    }

    /// Every registration of service type `S`, in registration order
    pub fn get_registered<S: ?Sized + 'static>(&self) -> Vec<Arc<Registration>> {
        RegistrationSource::registered(self, TypeId::of::<S>())
    }

    // ========================================================================
    // Freezing
    // ========================================================================

    /// Close the registration window and return the read-only resolver
    ///
    /// Every singleton is constructed before the factory is handed out; a
    /// singleton that cannot be built fails the freeze. The container stays
    /// frozen either way. Freezing again returns a factory over the same
    /// registrations and retries the singletons that are not built yet, so
    /// an unbuildable singleton fails every freeze.
    pub fn freeze(&self) -> Result<Factory> {
        let (registry, first) = {
            let mut guard = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            match self.frozen.get() {
                Some(registry) => (Arc::clone(registry), false),
                None => {
                    let registry = Arc::new(std::mem::take(&mut *guard));
                    // the write guard is still held, so no reader sees the emptied registry
                    let _ = self.frozen.set(Arc::clone(&registry));
                    (registry, true)
                }
            }
        };

        let factory = Factory::new(registry);
        let constructed = factory.construct_singletons()?;
        if first {
            info!(
                registrations = factory.len(),
                singletons = constructed,
                "Container frozen"
            );
        }
        Ok(factory)
    }

    fn insert(
        &self,
        key: ServiceKey,
        lifetime: Lifetime,
        implementation: Implementation,
        register_once: bool,
    ) -> Result<Arc<Registration>> {
        let mut guard = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if self.is_frozen() {
            return Err(Error::container_frozen(key.to_string()));
        }
        debug!(service = %key, %lifetime, "Registering service");
        guard.insert(key, lifetime, implementation, register_once)
    }

    fn with_registry<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        if let Some(registry) = self.frozen.get() {
            return f(registry);
        }
        let guard = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        // freezing may have completed while we waited for the lock
        match self.frozen.get() {
            Some(registry) => f(registry),
            None => f(&guard),
        }
    }
}

impl RegistrationSource for Container {
    fn lookup(&self, key: &ServiceKey) -> Option<Arc<Registration>> {
        self.with_registry(|registry| registry.lookup(key))
    }

    fn registered(&self, type_id: TypeId) -> Vec<Arc<Registration>> {
        self.with_registry(|registry| registry.registered(type_id))
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("registrations", &self.len())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

fn factory_of<S, F>(factory: F) -> Implementation
where
    S: ?Sized + Send + Sync + 'static,
    F: Fn(&mut Resolver<'_>) -> Result<Arc<S>> + Send + Sync + 'static,
{
    Implementation::Factory {
        factory: Arc::new(move |resolver: &mut Resolver<'_>| factory(resolver).map(erase)),
        implementation: std::any::type_name::<F>(),
    }
}

fn instance_of<S: ?Sized + Send + Sync + 'static>(instance: Arc<S>) -> Implementation {
    Implementation::Instance {
        instance: erase(instance),
        implementation: std::any::type_name::<S>(),
    }
}
