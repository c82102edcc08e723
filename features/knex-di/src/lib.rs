//! Synchronous dependency resolution registry
//!
//! Descriptors declare how an implementation of a capability (usually a
//! `dyn Trait`) is constructed, either structurally through an injector fed
//! with resolved dependency slots, or through a [Provider] function.
//! A [Registry] resolves them on request by capability, by id or as the
//! collection of all implementations, caches them per [Scope] and falls back
//! to parent registries for anything it does not declare itself.
//!
//! See [Registry] for the threading contract.

mod builder;
mod config;
mod cycle_guard;
mod descriptor;
mod errors;
mod provider;
mod registry;
mod resolution;
mod resolver;
mod scope;
mod types;

pub use builder::{Resource, Slot};
pub use config::{DuplicateIdPolicy, RegistryConfig};
pub use cycle_guard::CycleGuard;
pub use descriptor::{
    DependencySlot, Descriptor, IntoDescriptor, ProviderSource, Source, StructuralSource,
};
pub use errors::KnexError;
pub use provider::Provider;
pub use registry::Registry;
pub use resolver::{Dependencies, Dependency, Resolve};
pub use scope::{ProviderKey, Scope, ScopeCache, ScopeKey};
pub use types::{DynError, Injectable, Instance, ResourceKey, TypeInfo};
