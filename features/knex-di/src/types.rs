use std::{
    any::{Any, TypeId},
    fmt::Debug,
    sync::Arc,
};

use crate::errors::KnexError;

/// All errors must be Send + Sync so they can be wrapped in [KnexError]
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Type-erased shared value
pub type AnyArc = Arc<dyn Any + Send + Sync + 'static>;

/// Anything stored in or handed out by a registry must be shareable across threads
/// So anything injectable needs to be Send + Sync + 'static
///
/// Trait objects qualify as long as their trait has `Send + Sync` supertraits.
pub trait Injectable: Send + Sync + 'static {}
impl<T: ?Sized + Send + Sync + 'static> Injectable for T {}

/// Type Name and Type Id
///
/// Used both as the capability key a descriptor is indexed under and as the
/// identity of a structural implementation.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// A resolved value
///
/// `value` always holds an `Arc<C>` for the capability `C` it was resolved as.
/// `concrete` holds the implementation's own `Arc<I>` so a cached structural
/// instance can be viewed through another capability it was registered for.
#[derive(Clone)]
pub struct Instance {
    pub implementation: TypeInfo,
    pub capability: TypeInfo,
    pub(crate) concrete: AnyArc,
    pub(crate) value: AnyArc,
}
impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("implementation", &self.implementation.type_name)
            .field("capability", &self.capability.type_name)
            .finish()
    }
}

impl Instance {
    /// Wraps an already built capability value, e.g. the result of a provider
    pub fn new<C: ?Sized + Injectable>(instance: Arc<C>) -> Self {
        let value: AnyArc = Arc::new(instance);
        Instance {
            implementation: TypeInfo::of::<C>(),
            capability: TypeInfo::of::<C>(),
            concrete: value.clone(),
            value,
        }
    }

    /// Views a concrete implementation through one of its capabilities
    pub(crate) fn from_parts<I: Injectable, C: ?Sized + Injectable>(
        concrete: Arc<I>,
        capability: Arc<C>,
    ) -> Self {
        Instance {
            implementation: TypeInfo::of::<I>(),
            capability: TypeInfo::of::<C>(),
            concrete,
            value: Arc::new(capability),
        }
    }

    /// Gets the instance as the capability it was resolved for
    pub fn downcast<C: ?Sized + Injectable>(&self) -> Result<Arc<C>, KnexError> {
        self.value
            .downcast_ref::<Arc<C>>()
            .cloned()
            .ok_or(KnexError::DowncastFailed {
                required: std::any::type_name::<C>(),
                actual: self.capability.type_name,
            })
    }

    /// True if both handles refer to the very same constructed value
    pub fn same(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.concrete, &other.concrete)
    }
}

/// What a registry lookup is keyed by
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum ResourceKey {
    Type(TypeInfo),
    Id(String),
}
impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKey::Type(info) => write!(f, "'{info}'"),
            ResourceKey::Id(id) => write!(f, "with id '{id}'"),
        }
    }
}
