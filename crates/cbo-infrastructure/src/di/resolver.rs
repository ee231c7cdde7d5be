//! Resolution context and constructor-style injection
//!
//! Every resolution walks the registration graph through a [`Resolver`]. The
//! resolver carries the chain of keys currently under construction: asking
//! for a key that is already in the chain is a dependency cycle and fails
//! immediately instead of recursing.
//!
//! ```text
//! get::<A>()  chain = []
//!   A factory -> get::<B>()  chain = [A]
//!     B factory -> get::<A>()  chain = [A, B]  => ResolutionError "A -> B -> A"
//! ```

use super::registration::{
    Implementation, Instance, Registration, RegistrationSource, downcast, erase,
};
use super::scope::Scope;
use cbo_domain::error::{Error, Result};
use cbo_domain::value_objects::{Lifetime, ServiceKey};
use std::any::TypeId;
use std::sync::Arc;

/// A type the container can construct from its dependencies
///
/// Implementations pull their constructor arguments from the resolver.
///
/// ```ignore
/// struct UserService {
///     repository: Arc<dyn UserRepository>,
/// }
///
/// impl Injectable for UserService {
///     fn inject(resolver: &mut Resolver<'_>) -> Result<Self> {
///         Ok(Self { repository: resolver.get()? })
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Build the value from resolved dependencies
    fn inject(resolver: &mut Resolver<'_>) -> Result<Self>;
}

/// Typed dependency overrides for [`Container::create_instance`]
///
/// Values are matched by their exact handle type: an `Arc<dyn Trait>` value
/// answers requests for `dyn Trait`, an `Arc<Concrete>` value answers requests
/// for `Concrete`. When several values share a type the last one wins.
///
/// [`Container::create_instance`]: super::Container::create_instance
#[derive(Clone, Default)]
pub struct Arguments {
    values: Vec<(TypeId, Instance)>,
}

impl Arguments {
    /// Empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value
    pub fn with<S: ?Sized + Send + Sync + 'static>(mut self, value: Arc<S>) -> Self {
        self.values.push((TypeId::of::<S>(), erase(value)));
        self
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values were supplied
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn get<S: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<S>> {
        let wanted = TypeId::of::<S>();
        self.values
            .iter()
            .rev()
            .find(|(type_id, _)| *type_id == wanted)
            .and_then(|(_, value)| value.downcast_ref::<Arc<S>>().cloned())
    }
}

impl std::fmt::Debug for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arguments")
            .field("len", &self.values.len())
            .finish()
    }
}

/// Resolution context handed to factories
pub struct Resolver<'a> {
    source: &'a dyn RegistrationSource,
    scope: Option<&'a Scope>,
    overrides: Option<&'a Arguments>,
    chain: Vec<ServiceKey>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(source: &'a dyn RegistrationSource, scope: Option<&'a Scope>) -> Self {
        Self {
            source,
            scope,
            overrides: None,
            chain: Vec::new(),
        }
    }

    pub(crate) fn with_overrides(mut self, overrides: &'a Arguments) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Resolve the unnamed registration of `S`
    ///
    /// Overrides supplied to `create_instance` take precedence over the
    /// container for the value being created.
    pub fn get<S: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<S>> {
        if let Some(value) = self.overrides.and_then(Arguments::get::<S>) {
            return Ok(value);
        }
        let key = ServiceKey::of::<S>();
        let instance = self.resolve_key(&key)?;
        downcast(&key, &instance)
    }

    /// Resolve a named registration of `S`
    pub fn get_named<S: ?Sized + Send + Sync + 'static>(&mut self, name: &str) -> Result<Arc<S>> {
        let key = ServiceKey::named::<S>(name);
        let instance = self.resolve_key(&key)?;
        downcast(&key, &instance)
    }

    /// Resolve `S` if it is registered
    ///
    /// Missing registrations give `None`; construction failures still error.
    pub fn try_get<S: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Option<Arc<S>>> {
        if let Some(value) = self.overrides.and_then(Arguments::get::<S>) {
            return Ok(Some(value));
        }
        let key = ServiceKey::of::<S>();
        match self.source.lookup(&key) {
            Some(registration) => {
                let instance = self.resolve_registration(&registration)?;
                downcast(&key, &instance).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Resolve every registration of `S`, named or not, in registration order
    pub fn get_all<S: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Vec<Arc<S>>> {
        let registrations = self.source.registered(TypeId::of::<S>());
        let mut values = Vec::with_capacity(registrations.len());
        for registration in registrations {
            let instance = self.resolve_registration(&registration)?;
            values.push(downcast(registration.key(), &instance)?);
        }
        Ok(values)
    }

    /// Resolve `T` from its registration, or construct it when unregistered
    pub fn get_or_create<T: Injectable>(&mut self) -> Result<Arc<T>> {
        match self.try_get::<T>()? {
            Some(value) => Ok(value),
            None => self.create::<T>().map(Arc::new),
        }
    }

    /// Construct a fresh `T`, bypassing any registration of it
    pub fn create<T: Injectable>(&mut self) -> Result<T> {
        let key = ServiceKey::of::<T>();
        self.guard_cycle(&key)?;
        let mut child = self.child(key, self.scope);
        // overrides target the constructor of the created value only
        child.overrides = self.overrides;
        T::inject(&mut child)
    }

    /// Keys currently under construction, outermost first
    pub fn chain(&self) -> &[ServiceKey] {
        &self.chain
    }

    pub(crate) fn resolve_key(&mut self, key: &ServiceKey) -> Result<Instance> {
        let registration = self.source.lookup(key).ok_or_else(|| {
            Error::resolution(
                key.to_string(),
                "no registration exists for this service",
            )
        })?;
        self.resolve_registration(&registration)
    }

    pub(crate) fn resolve_registration(&mut self, registration: &Registration) -> Result<Instance> {
        let key = registration.key();
        let factory = match registration.implementation() {
            Implementation::Instance { instance, .. } => return Ok(Arc::clone(instance)),
            Implementation::Factory { factory, .. } => Arc::clone(factory),
        };
        self.guard_cycle(key)?;

        match registration.lifetime() {
            Lifetime::Transient => {
                let mut child = self.child(key.clone(), self.scope);
                factory(&mut child)
            }
            Lifetime::Singleton => registration
                .singleton_cell()
                .get_or_try_init(|| {
                    // singletons outlive any scope, so scoped dependencies are unreachable
                    let mut child = self.child(key.clone(), None);
                    factory(&mut child)
                })
                .map(Arc::clone),
            Lifetime::Scoped => {
                let scope = self.scope.ok_or_else(|| {
                    Error::resolution(
                        key.to_string(),
                        "scoped service resolved outside of a scope",
                    )
                })?;
                scope.get_or_try_init(key, || {
                    let mut child = self.child(key.clone(), Some(scope));
                    factory(&mut child)
                })
            }
        }
    }

    fn guard_cycle(&self, key: &ServiceKey) -> Result<()> {
        if !self.chain.contains(key) {
            return Ok(());
        }
        let path = self
            .chain
            .iter()
            .chain(std::iter::once(key))
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        Err(Error::resolution(
            key.to_string(),
            format!("dependency cycle detected: {path}"),
        ))
    }

    fn child(&self, key: ServiceKey, scope: Option<&'a Scope>) -> Resolver<'a> {
        let mut chain = Vec::with_capacity(self.chain.len() + 1);
        chain.extend(self.chain.iter().cloned());
        chain.push(key);
        Resolver {
            source: self.source,
            scope,
            overrides: None,
            chain,
        }
    }
}
