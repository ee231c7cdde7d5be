//! Collection builders
//!
//! A collection builder accumulates an ordered set of items during boot and is
//! registered exactly once per container (see
//! [`Container::register_collection_builder`]). Builders receive a
//! [`Registrar`] so they can add their own registrations while the container
//! is still mutable.
//!
//! [`Container::register_collection_builder`]: super::Container::register_collection_builder

use super::container::Container;
use super::resolver::Resolver;
use cbo_domain::error::{Error, Result};
use cbo_domain::value_objects::Lifetime;
use std::sync::{Arc, Weak};

/// A singleton that assembles an ordered collection during boot
pub trait CollectionBuilder: Sized + Send + Sync + 'static {
    /// Initialize the builder against the container it is registered in
    fn create(registrar: Registrar) -> Result<Self>;
}

/// Registration handle onto a mutable container
///
/// Holds the container weakly; using it after the container is dropped is an
/// `Internal` error, using it after freeze is `ContainerFrozen`.
#[derive(Clone)]
pub struct Registrar {
    container: Weak<Container>,
}

impl Registrar {
    pub(crate) fn new(container: Weak<Container>) -> Self {
        Self { container }
    }

    /// Register a factory for service `S`
    pub fn register_factory<S, F>(&self, lifetime: Lifetime, factory: F) -> Result<()>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> Result<Arc<S>> + Send + Sync + 'static,
    {
        self.container()?.register_factory(lifetime, factory)
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
        self.container()?.register_named_factory(name, lifetime, factory)
    }

    /// Bind a pre-built instance
    pub fn register_instance<S: ?Sized + Send + Sync + 'static>(&self, instance: Arc<S>) -> Result<()> {
        self.container()?.register_instance(instance)
    }

    /// Whether the underlying container still accepts registrations
    pub fn is_open(&self) -> bool {
        self.container
            .upgrade()
            .is_some_and(|container| !container.is_frozen())
    }

    fn container(&self) -> Result<Arc<Container>> {
        self.container
            .upgrade()
            .ok_or_else(|| Error::internal("container dropped before registration"))
    }
}

impl std::fmt::Debug for Registrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrar")
            .field("open", &self.is_open())
            .finish()
    }
}
