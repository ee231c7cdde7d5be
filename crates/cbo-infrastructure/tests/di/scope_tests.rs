//! Scoped lifetimes

use super::services::Clock;
use cbo_domain::error::Error;
use cbo_domain::error::Result;
use cbo_domain::value_objects::Lifetime;
use cbo_infrastructure::di::{Container, Injectable, Resolver};
use std::sync::Arc;

/// Per-request state
struct RequestContext;

/// Singleton that wrongly depends on request state
struct Audit {
    _context: Arc<RequestContext>,
}

impl Injectable for Audit {
    fn inject(resolver: &mut Resolver<'_>) -> Result<Self> {
        Ok(Self {
            _context: resolver.get()?,
        })
    }
}

fn scoped_container() -> Arc<Container> {
    let container = Container::new();
    container
        .register_factory::<RequestContext, _>(Lifetime::Scoped, |_| Ok(Arc::new(RequestContext)))
        .unwrap();
    container
}

#[test]
fn test_scoped_is_shared_within_scope() {
    let factory = scoped_container().freeze().unwrap();
    let scope = factory.begin_scope();
    assert!(scope.is_empty());

    let first = scope.get_instance::<RequestContext>().unwrap();
    let second = scope.get_instance::<RequestContext>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(scope.len(), 1);
}

#[test]
fn test_scopes_are_isolated() {
    let factory = scoped_container().freeze().unwrap();
    let one = factory.begin_scope().get_instance::<RequestContext>().unwrap();
    let two = factory.begin_scope().get_instance::<RequestContext>().unwrap();
    assert!(!Arc::ptr_eq(&one, &two));
}

#[test]
fn test_scoped_outside_scope_fails() {
    let factory = scoped_container().freeze().unwrap();
    match factory.get_instance::<RequestContext>() {
        Err(Error::Resolution { message, .. }) => assert!(message.contains("outside of a scope")),
        _ => panic!("Expected Resolution error"),
    }
}

#[test]
fn test_singleton_cannot_capture_scoped_dependency() {
    let container = scoped_container();
    container.register::<Audit>(Lifetime::Singleton).unwrap();
    assert!(matches!(container.freeze(), Err(Error::Resolution { .. })));
}

#[test]
fn test_scope_resolves_singletons_from_container() {
    let container = scoped_container();
    container.register::<Clock>(Lifetime::Singleton).unwrap();
    let factory = container.freeze().unwrap();

    let from_scope = factory.begin_scope().get_instance::<Clock>().unwrap();
    let from_factory = factory.get_instance::<Clock>().unwrap();
    assert!(Arc::ptr_eq(&from_scope, &from_factory));
}
