//! Registrations and the registry that owns them
//!
//! A [`Registration`] binds a [`ServiceKey`] to an implementation (a factory
//! or a pre-built instance) and a [`Lifetime`]. The [`Registry`] keeps every
//! registration per service type in registration order; lookups by key return
//! the most recent registration (last wins).

use super::resolver::Resolver;
use cbo_domain::error::{Error, Result};
use cbo_domain::value_objects::{Lifetime, ServiceKey};
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-erased resolved value
///
/// The concrete value stored is always an `Arc<S>` for the service type `S`,
/// which lets unsized services (`dyn Trait`) travel through `Any`.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// Type-erased factory
pub(crate) type FactoryFn = Arc<dyn Fn(&mut Resolver<'_>) -> Result<Instance> + Send + Sync>;

/// Erase a service handle
pub(crate) fn erase<S: ?Sized + Send + Sync + 'static>(service: Arc<S>) -> Instance {
    Arc::new(service)
}

/// Recover a service handle from an erased value
pub(crate) fn downcast<S: ?Sized + Send + Sync + 'static>(
    key: &ServiceKey,
    instance: &Instance,
) -> Result<Arc<S>> {
    instance.downcast_ref::<Arc<S>>().cloned().ok_or_else(|| {
        Error::resolution(
            key.to_string(),
            format!("registered value is not an {}", std::any::type_name::<Arc<S>>()),
        )
    })
}

/// How a registration produces its value
#[derive(Clone)]
pub(crate) enum Implementation {
    /// Built by a factory on resolution
    Factory {
        factory: FactoryFn,
        implementation: &'static str,
    },
    /// Pre-built permanent instance
    Instance {
        instance: Instance,
        implementation: &'static str,
    },
}

/// A recorded service registration
pub struct Registration {
    key: ServiceKey,
    lifetime: Lifetime,
    implementation: Implementation,
    order: u64,
    register_once: bool,
    singleton: OnceCell<Instance>,
}

impl Registration {
    /// Service key
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    /// Lifetime policy
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Type name of the implementation
    pub fn implementation_name(&self) -> &'static str {
        match &self.implementation {
            Implementation::Factory { implementation, .. }
            | Implementation::Instance { implementation, .. } => implementation,
        }
    }

    /// Position in registration order, starting at zero
    pub fn order(&self) -> u64 {
        self.order
    }

    /// Whether the registration binds a pre-built instance
    pub fn is_instance(&self) -> bool {
        matches!(self.implementation, Implementation::Instance { .. })
    }

    /// Whether the service may only ever be registered once
    pub fn is_register_once(&self) -> bool {
        self.register_once
    }

    /// Whether a singleton value has been constructed
    pub fn is_constructed(&self) -> bool {
        self.is_instance() || self.singleton.get().is_some()
    }

    pub(crate) fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    pub(crate) fn singleton_cell(&self) -> &OnceCell<Instance> {
        &self.singleton
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key.to_string())
            .field("lifetime", &self.lifetime)
            .field("implementation", &self.implementation_name())
            .field("order", &self.order)
            .field("register_once", &self.register_once)
            .finish()
    }
}

/// Read access to registrations, shared by the mutable container and the
/// frozen factory
pub(crate) trait RegistrationSource: Send + Sync {
    /// Most recent registration matching `key`
    fn lookup(&self, key: &ServiceKey) -> Option<Arc<Registration>>;

    /// Every registration of a service type, named or not, in registration order
    fn registered(&self, type_id: TypeId) -> Vec<Arc<Registration>>;
}

/// Registrations grouped by service type
#[derive(Default)]
pub(crate) struct Registry {
    by_type: HashMap<TypeId, Vec<Arc<Registration>>>,
    next_order: u64,
}

impl Registry {
    /// Record a registration
    ///
    /// Fails when the service type already carries a register-once
    /// registration, or when a register-once registration is added to a type
    /// that is already registered.
    pub(crate) fn insert(
        &mut self,
        key: ServiceKey,
        lifetime: Lifetime,
        implementation: Implementation,
        register_once: bool,
    ) -> Result<Arc<Registration>> {
        let existing = self.by_type.entry(key.type_id()).or_default();
        if existing.iter().any(|r| r.register_once) || (register_once && !existing.is_empty()) {
            return Err(Error::duplicate_registration(key.to_string()));
        }

        let registration = Arc::new(Registration {
            key,
            lifetime,
            implementation,
            order: self.next_order,
            register_once,
            singleton: OnceCell::new(),
        });
        self.next_order += 1;
        existing.push(Arc::clone(&registration));
        Ok(registration)
    }

    /// Every singleton registration that still needs construction
    pub(crate) fn pending_singletons(&self) -> Vec<Arc<Registration>> {
        let mut pending: Vec<_> = self
            .by_type
            .values()
            .flatten()
            .filter(|r| r.lifetime == Lifetime::Singleton && !r.is_constructed())
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.order);
        pending
    }

    /// Total number of registrations
    pub(crate) fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }
}

impl RegistrationSource for Registry {
    fn lookup(&self, key: &ServiceKey) -> Option<Arc<Registration>> {
        self.by_type
            .get(&key.type_id())?
            .iter()
            .rev()
            .find(|r| r.key == *key)
            .cloned()
    }

    fn registered(&self, type_id: TypeId) -> Vec<Arc<Registration>> {
        self.by_type.get(&type_id).cloned().unwrap_or_default()
    }
}
