//! Service identity value objects

use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Lifetime policy of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Lifetime {
    /// A new instance on every resolution
    #[default]
    Transient,
    /// One instance for the lifetime of the container, built on first resolution
    Singleton,
    /// One instance per caller-provided scope
    Scoped,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Transient => "transient",
            Self::Singleton => "singleton",
            Self::Scoped => "scoped",
        };
        f.write_str(s)
    }
}

/// Identity of a registration
///
/// Two keys are equal when they name the same service type and the same
/// optional registration name. The type name is carried for diagnostics only.
#[derive(Debug, Clone)]
pub struct ServiceKey {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<String>,
}

impl ServiceKey {
    /// Key for the unnamed registration of `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: None,
        }
    }

    /// Key for a named registration of `T`
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::of::<T>()
        }
    }

    /// Same service type, without the registration name
    pub fn unnamed(&self) -> Self {
        Self {
            name: None,
            ..self.clone()
        }
    }

    /// Type identifier of the service
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Type name of the service
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Registration name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}[{}]", self.type_name, name),
            None => f.write_str(self.type_name),
        }
    }
}
