use std::sync::Arc;

use thiserror::Error;

use crate::types::{DynError, ResourceKey, TypeInfo};

/// Errors raised while registering descriptors or resolving instances
#[derive(Error, Debug, Clone)]
pub enum KnexError {
    /// Nothing in the local-then-parent chain matches the request
    #[error("Undeclared resource {0}")]
    UndeclaredResource(ResourceKey),
    /// An unqualified singular request matched more than one descriptor
    #[error("Multiple implementations for type '{0}' declared")]
    MultipleImplementationsDeclared(TypeInfo),
    /// Structural self-reference, or a parent chain that loops back
    #[error("Circular dependency detected with '{identity}' through {chain:?}")]
    CircularDependency {
        identity: String,
        chain: Vec<String>,
    },
    /// A structural descriptor has no construction function
    #[error("Resource '{0}' missing injector")]
    MissingInjector(TypeInfo),

    #[error("Invalid require value '{0}'")]
    InvalidRequireValue(String),
    #[error("Invalid provide value '{0}'")]
    InvalidProvideValue(String),
    #[error("Invalid scope value '{0}'")]
    InvalidScopeValue(String),
    /// Registration input did not name the capability it provides
    #[error("Provider must have an interface type")]
    MissingCapabilityType,
    /// Only raised when the registry rejects duplicate ids
    #[error("A resource with id '{0}' is already registered")]
    DuplicateId(String),

    /// The caller supplied provider function failed
    #[error("Provider for '{capability}' failed - error: {error}")]
    ProviderInstance {
        capability: TypeInfo,
        error: Arc<DynError>,
    },
    /// The caller supplied injector failed
    #[error("Injector of '{implementation}' failed - error: {error}")]
    Injector {
        implementation: TypeInfo,
        error: Arc<DynError>,
    },

    #[error("Failed to downcast, required: '{required}' actual: '{actual}'")]
    DowncastFailed {
        required: &'static str,
        actual: &'static str,
    },
    /// An injector read more dependencies than were declared
    #[error("All declared dependencies were already taken")]
    DependencyExhausted,
    /// An injector read a dependency in another shape than it was declared
    #[error("Dependency on '{capability}' was declared as {declared} but read as {requested}")]
    DependencyMismatch {
        capability: TypeInfo,
        declared: &'static str,
        requested: &'static str,
    },
}

impl KnexError {
    /// Undeclared errors let the search continue with the next parent registry
    pub fn is_undeclared(&self) -> bool {
        matches!(self, KnexError::UndeclaredResource(_))
    }

    pub(crate) fn circular(identity: impl Into<String>, chain: Vec<String>) -> Self {
        KnexError::CircularDependency {
            identity: identity.into(),
            chain,
        }
    }
}
