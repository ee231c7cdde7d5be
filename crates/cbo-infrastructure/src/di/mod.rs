//! Dependency Injection
//!
//! A registration container built for the boot window of the runtime:
//!
//! | Type | Role |
//! |------|------|
//! | [`Container`] | Mutable registry, single writer during boot |
//! | [`Factory`] | Frozen read-only resolver shared after boot |
//! | [`Scope`] | Caller-owned unit of work for `Scoped` services |
//! | [`Resolver`] | Resolution context handed to factories |
//! | [`CollectionBuilder`] | Register-once ordered collection singleton |
//!
//! ## Lifetimes
//!
//! - `Transient`: a new value per resolution
//! - `Singleton`: one value per container, constructed at most once even
//!   under concurrent first resolution
//! - `Scoped`: one value per [`Scope`]

mod collection;
mod container;
mod factory;
mod registration;
mod resolver;
mod scope;

pub use collection::{CollectionBuilder, Registrar};
pub use container::Container;
pub use factory::Factory;
pub use registration::Registration;
pub use resolver::{Arguments, Injectable, Resolver};
pub use scope::Scope;
