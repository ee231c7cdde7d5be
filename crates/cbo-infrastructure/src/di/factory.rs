//! Frozen, read-only resolver
//!
//! A [`Factory`] is what the rest of the runtime sees after boot. It is cheap
//! to clone and safe to share across threads; concurrent first resolution of
//! a singleton yields one instance to every caller.

use super::registration::{Registration, RegistrationSource, Registry};
use super::resolver::{Arguments, Injectable, Resolver};
use super::scope::Scope;
use cbo_domain::error::Result;
use std::any::TypeId;
use std::sync::Arc;
use tracing::debug;

/// Read-only service resolver produced by [`Container::freeze`]
///
/// [`Container::freeze`]: super::Container::freeze
#[derive(Clone)]
pub struct Factory {
    registry: Arc<Registry>,
}

impl Factory {
    pub(crate) fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Resolve the unnamed registration of `S`
    pub fn get_instance<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>> {
        self.resolver().get::<S>()
    }

    /// Resolve a named registration of `S`
    pub fn get_named_instance<S: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<S>> {
        self.resolver().get_named::<S>(name)
    }

    /// Resolve `S` if registered
    pub fn try_get_instance<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<S>>> {
        self.resolver().try_get::<S>()
    }

    /// Resolve every registration of `S` in registration order
    pub fn get_all_instances<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<S>>> {
        self.resolver().get_all::<S>()
    }

    /// Construct a fresh `T` with `args` overriding matching dependencies
    pub fn create_instance<T: Injectable>(&self, args: Arguments) -> Result<T> {
        self.resolver().with_overrides(&args).create::<T>()
    }

    /// Every registration of service type `S`
    pub fn get_registered<S: ?Sized + 'static>(&self) -> Vec<Arc<Registration>> {
        self.registry.registered(TypeId::of::<S>())
    }

    /// Begin a unit of work for `Scoped` services
    pub fn begin_scope(&self) -> Scope {
        Scope::new(Arc::clone(&self.registry))
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build every singleton not constructed yet, in registration order
    pub(crate) fn construct_singletons(&self) -> Result<usize> {
        let pending = self.registry.pending_singletons();
        for registration in &pending {
            debug!(service = %registration.key(), "Constructing singleton");
            self.resolver().resolve_registration(registration)?;
        }
        Ok(pending.len())
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.registry.as_ref(), None)
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("registrations", &self.len())
            .finish()
    }
}
