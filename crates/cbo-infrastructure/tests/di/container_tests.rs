//! Container registration, resolution and freezing

use super::services::{Clock, English, French, Greeter, Left, Right, Welcome};
use cbo_domain::error::Error;
use cbo_domain::value_objects::Lifetime;
use cbo_infrastructure::di::{Arguments, Container};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn test_singleton_resolves_to_same_instance() {
    let container = Container::new();
    container.register::<Clock>(Lifetime::Singleton).unwrap();

    let first = container.get_instance::<Clock>().unwrap();
    let second = container.get_instance::<Clock>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_transient_resolves_to_distinct_instances() {
    let container = Container::new();
    container
        .register_factory::<Vec<u8>, _>(Lifetime::Transient, |_| Ok(Arc::new(vec![1, 2, 3])))
        .unwrap();

    let first = container.get_instance::<Vec<u8>>().unwrap();
    let second = container.get_instance::<Vec<u8>>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *second);
}

#[test]
fn test_trait_object_registration() {
    let container = Container::new();
    container.register_instance::<dyn Greeter>(Arc::new(English)).unwrap();
    container.register::<Welcome>(Lifetime::Transient).unwrap();

    let welcome = container.get_instance::<Welcome>().unwrap();
    assert_eq!(welcome.greeter.greet(), "hello");
}

#[test]
fn test_last_registration_wins() {
    let container = Container::new();
    container.register_instance::<dyn Greeter>(Arc::new(English)).unwrap();
    container.register_instance::<dyn Greeter>(Arc::new(French)).unwrap();

    let greeter = container.get_instance::<dyn Greeter>().unwrap();
    assert_eq!(greeter.greet(), "bonjour");
    assert_eq!(container.get_registered::<dyn Greeter>().len(), 2);
}

#[test]
fn test_named_registrations_are_separate() {
    let container = Container::new();
    container.register_instance::<dyn Greeter>(Arc::new(English)).unwrap();
    container
        .register_named_instance::<dyn Greeter>("fr", Arc::new(French))
        .unwrap();

    assert_eq!(container.get_instance::<dyn Greeter>().unwrap().greet(), "hello");
    assert_eq!(
        container
            .get_named_instance::<dyn Greeter>("fr")
            .unwrap()
            .greet(),
        "bonjour"
    );
    assert!(container.get_named_instance::<dyn Greeter>("de").is_err());
}

#[test]
fn test_missing_service_is_resolution_error() {
    let container = Container::new();
    match container.get_instance::<Clock>() {
        Err(Error::Resolution { message, .. }) => {
            assert!(message.contains("no registration"));
        }
        _ => panic!("Expected Resolution error"),
    }
    assert!(container.try_get_instance::<Clock>().unwrap().is_none());
}

#[test]
fn test_dependency_cycle_is_detected() {
    let container = Container::new();
    container.register::<Left>(Lifetime::Singleton).unwrap();
    container.register::<Right>(Lifetime::Singleton).unwrap();

    match container.get_instance::<Left>() {
        Err(Error::Resolution { message, .. }) => {
            assert!(message.contains("cycle"), "unexpected message: {message}");
            assert!(message.contains("Left"));
            assert!(message.contains("Right"));
        }
        Err(other) => panic!("Expected Resolution error, got {other}"),
        Ok(_) => panic!("Expected a cycle error"),
    }
}

#[test]
fn test_create_instance_uses_arguments() {
    let container = Container::new();
    container.register_instance::<dyn Greeter>(Arc::new(English)).unwrap();

    let welcome = container
        .create_instance::<Welcome>(Arguments::new().with::<dyn Greeter>(Arc::new(French)))
        .unwrap();
    assert_eq!(welcome.greeter.greet(), "bonjour");

    let plain = container.create_instance::<Welcome>(Arguments::new()).unwrap();
    assert_eq!(plain.greeter.greet(), "hello");
}

#[test]
fn test_create_instance_without_registration() {
    let container = Container::new();
    let welcome = container
        .create_instance::<Welcome>(Arguments::new().with::<dyn Greeter>(Arc::new(English)))
        .unwrap();
    assert_eq!(welcome.greeter.greet(), "hello");
}

#[test]
fn test_register_after_freeze_is_rejected() {
    let container = Container::new();
    container.register::<Clock>(Lifetime::Singleton).unwrap();
    container.freeze().unwrap();

    assert!(container.is_frozen());
    match container.register_instance::<dyn Greeter>(Arc::new(English)) {
        Err(Error::ContainerFrozen { .. }) => {}
        _ => panic!("Expected ContainerFrozen error"),
    }
    // resolution keeps working
    assert!(container.get_instance::<Clock>().is_ok());
}

#[test]
fn test_freeze_constructs_singletons_eagerly() {
    let built = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    {
        let built = Arc::clone(&built);
        container
            .register_factory::<Clock, _>(Lifetime::Singleton, move |_| {
                built.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Clock))
            })
            .unwrap();
    }
    assert_eq!(built.load(Ordering::SeqCst), 0);

    let factory = container.freeze().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);

    factory.get_instance::<Clock>().unwrap();
    factory.get_instance::<Clock>().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn test_freeze_keeps_singletons_built_before() {
    let container = Container::new();
    container.register::<Clock>(Lifetime::Singleton).unwrap();
    let before = container.get_instance::<Clock>().unwrap();

    let factory = container.freeze().unwrap();
    let after = factory.get_instance::<Clock>().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn test_freeze_fails_on_unbuildable_singleton() {
    let container = Container::new();
    container.register::<Welcome>(Lifetime::Singleton).unwrap();

    assert!(matches!(container.freeze(), Err(Error::Resolution { .. })));
    assert!(container.is_frozen());
    // a repeated freeze does not hand out a factory missing the singleton
    assert!(matches!(container.freeze(), Err(Error::Resolution { .. })));
}

#[test]
fn test_freeze_twice_shares_registrations() {
    let container = Container::new();
    container.register::<Clock>(Lifetime::Singleton).unwrap();

    let first = container.freeze().unwrap();
    let second = container.freeze().unwrap();
    assert_eq!(first.len(), second.len());
    assert!(Arc::ptr_eq(
        &first.get_instance::<Clock>().unwrap(),
        &second.get_instance::<Clock>().unwrap()
    ));
}

#[test]
fn test_factory_get_all_in_registration_order() {
    let container = Container::new();
    container.register_instance::<dyn Greeter>(Arc::new(English)).unwrap();
    container
        .register_named_instance::<dyn Greeter>("fr", Arc::new(French))
        .unwrap();
    let factory = container.freeze().unwrap();

    let greetings: Vec<String> = factory
        .get_all_instances::<dyn Greeter>()
        .unwrap()
        .iter()
        .map(|g| g.greet())
        .collect();
    assert_eq!(greetings, ["hello", "bonjour"]);
}

#[test]
fn test_registration_metadata() {
    let container = Container::new();
    container.register::<Clock>(Lifetime::Singleton).unwrap();
    container.register_instance(Arc::new(English)).unwrap();

    let registrations = container.get_registered::<Clock>();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].lifetime(), Lifetime::Singleton);
    assert!(!registrations[0].is_instance());
    assert!(!registrations[0].is_register_once());
    assert!(container.get_registered::<English>()[0].is_instance());
    assert_eq!(container.len(), 2);
}
