//! Component collection builder

use cbo_domain::error::{Error, Result};
use cbo_domain::ports::Component;
use cbo_domain::value_objects::Capability;
use cbo_infrastructure::di::Container;
use cbo_infrastructure::discovery::{ComponentCollection, ComponentCollectionBuilder, ComponentEntry};
use std::sync::Arc;

struct Named(&'static str);

impl Component for Named {
    fn name(&self) -> &str {
        self.0
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }
}

static SEARCH: ComponentEntry = ComponentEntry {
    name: "search",
    module: "site::search",
    capabilities: &[Capability::Component],
    factory: |_| Ok(Arc::new(Named("search"))),
};

static INDEXER: ComponentEntry = ComponentEntry {
    name: "indexer",
    module: "site::search::indexer",
    capabilities: &[Capability::Component, Capability::IndexPopulator],
    factory: |_| Ok(Arc::new(Named("indexer"))),
};

static NEEDS_SERVICE: ComponentEntry = ComponentEntry {
    name: "needs-service",
    module: "site::broken",
    capabilities: &[Capability::Component],
    factory: |resolver| {
        let _missing: Arc<String> = resolver.get()?;
        Ok(Arc::new(Named("needs-service")))
    },
};

#[test]
fn test_components_built_at_freeze_in_append_order() {
    let container = Container::new();
    let builder = container
        .register_collection_builder::<ComponentCollectionBuilder>()
        .unwrap();
    builder.append(&SEARCH);
    builder.append(&INDEXER);
    builder.append(&SEARCH);
    assert_eq!(builder.names(), ["search", "indexer"]);

    let factory = container.freeze().unwrap();
    let collection = factory.get_instance::<ComponentCollection>().unwrap();
    let names: Vec<&str> = collection.iter().map(|item| item.component.name()).collect();
    assert_eq!(names, ["search", "indexer"]);
    assert!(collection.get("indexer").unwrap().descriptor.is_main_only());
    assert!(!builder.is_open());
}

#[test]
fn test_remove_where_drops_matching_components() {
    let container = Container::new();
    let builder = container
        .register_collection_builder::<ComponentCollectionBuilder>()
        .unwrap();
    builder.append(&SEARCH);
    builder.append(&INDEXER);

    let removed = builder.remove_where(ComponentEntry::is_main_only);
    assert_eq!(removed, ["indexer"]);
    assert_eq!(builder.len(), 1);

    let collection = container
        .freeze()
        .unwrap()
        .get_instance::<ComponentCollection>()
        .unwrap();
    assert_eq!(collection.len(), 1);
    assert!(collection.get("indexer").is_none());
}

#[test]
fn test_empty_collection() {
    let container = Container::new();
    let builder = container
        .register_collection_builder::<ComponentCollectionBuilder>()
        .unwrap();
    assert!(builder.is_empty());

    let collection = container
        .freeze()
        .unwrap()
        .get_instance::<ComponentCollection>()
        .unwrap();
    assert!(collection.is_empty());
}

#[test]
fn test_component_dependency_failure_fails_freeze() {
    let container = Container::new();
    let builder = container
        .register_collection_builder::<ComponentCollectionBuilder>()
        .unwrap();
    builder.append(&NEEDS_SERVICE);

    assert!(matches!(container.freeze(), Err(Error::Resolution { .. })));
}
