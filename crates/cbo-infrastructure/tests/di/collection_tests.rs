//! Collection builders

use cbo_domain::error::{Error, Result};
use cbo_domain::value_objects::Lifetime;
use cbo_infrastructure::di::{CollectionBuilder, Container, Registrar};
use std::sync::{Arc, Mutex};

/// Ordered list of route names assembled during boot
struct Routes(Vec<String>);

struct RouteCollectionBuilder {
    names: Arc<Mutex<Vec<String>>>,
    registrar: Registrar,
}

impl CollectionBuilder for RouteCollectionBuilder {
    fn create(registrar: Registrar) -> Result<Self> {
        let names: Arc<Mutex<Vec<String>>> = Arc::default();
        let pending = Arc::clone(&names);
        registrar.register_factory::<Routes, _>(Lifetime::Singleton, move |_| {
            Ok(Arc::new(Routes(pending.lock().unwrap().clone())))
        })?;
        Ok(Self { names, registrar })
    }
}

impl RouteCollectionBuilder {
    fn add(&self, name: &str) {
        self.names.lock().unwrap().push(name.to_string());
    }
}

#[test]
fn test_builder_is_returned_initialized() {
    let container = Container::new();
    let builder = container
        .register_collection_builder::<RouteCollectionBuilder>()
        .unwrap();

    assert!(builder.registrar.is_open());
    assert_eq!(container.get_registered::<Routes>().len(), 1);
    let resolved = container.get_instance::<RouteCollectionBuilder>().unwrap();
    assert!(Arc::ptr_eq(&builder, &resolved));
}

#[test]
fn test_duplicate_builder_registration_fails() {
    let container = Container::new();
    container
        .register_collection_builder::<RouteCollectionBuilder>()
        .unwrap();

    match container.register_collection_builder::<RouteCollectionBuilder>() {
        Err(Error::DuplicateRegistration { service }) => {
            assert!(service.contains("RouteCollectionBuilder"));
        }
        _ => panic!("Expected DuplicateRegistration error"),
    }
}

#[test]
fn test_builder_type_cannot_be_shadowed() {
    let container = Container::new();
    let builder = container
        .register_collection_builder::<RouteCollectionBuilder>()
        .unwrap();

    let shadow = Arc::new(RouteCollectionBuilder {
        names: Arc::default(),
        registrar: builder.registrar.clone(),
    });
    assert!(matches!(
        container.register_instance(shadow),
        Err(Error::DuplicateRegistration { .. })
    ));
}

#[test]
fn test_collection_is_built_at_freeze_in_order() {
    let container = Container::new();
    let builder = container
        .register_collection_builder::<RouteCollectionBuilder>()
        .unwrap();
    builder.add("home");
    builder.add("search");

    let factory = container.freeze().unwrap();
    let routes = factory.get_instance::<Routes>().unwrap();
    assert_eq!(routes.0, ["home", "search"]);
}

#[test]
fn test_registrar_closes_with_container() {
    let container = Container::new();
    let builder = container
        .register_collection_builder::<RouteCollectionBuilder>()
        .unwrap();
    container.freeze().unwrap();

    assert!(!builder.registrar.is_open());
    assert!(matches!(
        builder.registrar.register_instance(Arc::new(7_u32)),
        Err(Error::ContainerFrozen { .. })
    ));
}

#[test]
fn test_registrar_outliving_container_fails() {
    let container = Container::new();
    let builder = container
        .register_collection_builder::<RouteCollectionBuilder>()
        .unwrap();
    let registrar = builder.registrar.clone();
    drop(builder);
    drop(container);

    assert!(!registrar.is_open());
    assert!(matches!(
        registrar.register_instance(Arc::new(7_u32)),
        Err(Error::Internal { .. })
    ));
}
