//! Component collection
//!
//! [`ComponentCollectionBuilder`] is the collection builder of discovered
//! components. It registers [`ComponentCollection`] as a singleton, so the
//! components are built when the container freezes, in the order they were
//! appended.

use super::registry::ComponentEntry;
use crate::di::{CollectionBuilder, Registrar};
use cbo_domain::error::Result;
use cbo_domain::ports::Component;
use cbo_domain::value_objects::{ComponentDescriptor, Lifetime};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

type Entries = Arc<Mutex<Vec<&'static ComponentEntry>>>;

fn lock(entries: &Entries) -> MutexGuard<'_, Vec<&'static ComponentEntry>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Collection builder for discovered components
#[derive(Debug)]
pub struct ComponentCollectionBuilder {
    entries: Entries,
    registrar: Registrar,
}

impl CollectionBuilder for ComponentCollectionBuilder {
    fn create(registrar: Registrar) -> Result<Self> {
        let entries: Entries = Arc::default();
        let pending = Arc::clone(&entries);
        registrar.register_factory::<ComponentCollection, _>(Lifetime::Singleton, move |resolver| {
            let snapshot = lock(&pending).clone();
            let mut items = Vec::with_capacity(snapshot.len());
            for entry in snapshot {
                debug!(component = entry.name, "Building component");
                items.push(ComponentItem {
                    descriptor: entry.descriptor(),
                    component: (entry.factory)(resolver)?,
                });
            }
            Ok(Arc::new(ComponentCollection { items }))
        })?;
        Ok(Self { entries, registrar })
    }
}

impl ComponentCollectionBuilder {
    /// Append a component; appending a name twice keeps the first position
    pub fn append(&self, entry: &'static ComponentEntry) {
        let mut entries = lock(&self.entries);
        if !entries.iter().any(|e| e.name == entry.name) {
            entries.push(entry);
        }
    }

    /// Remove every component matching `predicate`, returning their names
    pub fn remove_where(&self, predicate: impl Fn(&ComponentEntry) -> bool) -> Vec<&'static str> {
        let mut entries = lock(&self.entries);
        let mut removed = Vec::new();
        entries.retain(|e| {
            if predicate(*e) {
                removed.push(e.name);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Names of the appended components, in order
    pub fn names(&self) -> Vec<&'static str> {
        lock(&self.entries).iter().map(|e| e.name).collect()
    }

    /// Number of appended components
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether nothing was appended
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether changes can still affect the built collection
    pub fn is_open(&self) -> bool {
        self.registrar.is_open()
    }
}

/// A built component with its descriptor
#[derive(Clone)]
pub struct ComponentItem {
    /// Descriptor of the component
    pub descriptor: ComponentDescriptor,
    /// Component instance
    pub component: Arc<dyn Component>,
}

impl std::fmt::Debug for ComponentItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentItem")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Components built at freeze, in append order
#[derive(Debug, Default)]
pub struct ComponentCollection {
    items: Vec<ComponentItem>,
}

impl ComponentCollection {
    /// Components in order
    pub fn iter(&self) -> std::slice::Iter<'_, ComponentItem> {
        self.items.iter()
    }

    /// Component by name
    pub fn get(&self, name: &str) -> Option<&ComponentItem> {
        self.items.iter().find(|i| i.descriptor.name == name)
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
