//! Caller-owned resolution scopes
//!
//! A scope is one logical unit of work (typically one inbound request). The
//! container never opens or closes scopes itself: the caller begins a scope
//! from the [`Factory`], resolves through it and drops it when the unit of
//! work ends.
//!
//! [`Factory`]: super::Factory

use super::registration::{Instance, Registry};
use super::resolver::Resolver;
use cbo_domain::error::Result;
use cbo_domain::value_objects::ServiceKey;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// One unit of work holding its own `Scoped` instances
pub struct Scope {
    registry: Arc<Registry>,
    instances: DashMap<ServiceKey, Arc<OnceCell<Instance>>>,
}

impl Scope {
    pub(crate) fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            instances: DashMap::new(),
        }
    }

    /// Resolve the unnamed registration of `S` within this scope
    pub fn get_instance<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>> {
        Resolver::new(self.registry.as_ref(), Some(self)).get::<S>()
    }

    /// Resolve a named registration of `S` within this scope
    pub fn get_named_instance<S: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Arc<S>> {
        Resolver::new(self.registry.as_ref(), Some(self)).get_named::<S>(name)
    }

    /// Number of scoped instances built so far
    pub fn len(&self) -> usize {
        self.instances
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    /// Whether no scoped instance was built yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the scope's instance for `key`, building it once
    ///
    /// Construction of one key is serialized; the map shard is not held while
    /// the factory runs, so factories may resolve other scoped keys.
    pub(crate) fn get_or_try_init<F>(&self, key: &ServiceKey, init: F) -> Result<Instance>
    where
        F: FnOnce() -> Result<Instance>,
    {
        let cell = Arc::clone(
            self.instances
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .value(),
        );
        cell.get_or_try_init(init).map(Arc::clone)
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("instances", &self.len())
            .finish_non_exhaustive()
    }
}
