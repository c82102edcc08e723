use std::sync::Arc;

use crate::{
    errors::KnexError,
    resolver::{Dependency, Resolve},
    types::{Injectable, TypeInfo},
};

impl<C: ?Sized + Injectable> Resolve for Arc<C> {
    fn resolve(capability: TypeInfo, dependency: Dependency) -> Result<Self, KnexError> {
        match dependency {
            Dependency::Instance(instance) => instance.downcast(),
            other => Err(KnexError::DependencyMismatch {
                capability,
                declared: other.shape(),
                requested: "single",
            }),
        }
    }
}

impl<C: ?Sized + Injectable> Resolve for Option<Arc<C>> {
    fn resolve(capability: TypeInfo, dependency: Dependency) -> Result<Self, KnexError> {
        match dependency {
            Dependency::Instance(instance) => instance.downcast::<C>().map(Some),
            // Optional slot with nothing registered does not fail
            Dependency::Absent => Ok(None),
            other => Err(KnexError::DependencyMismatch {
                capability,
                declared: other.shape(),
                requested: "optional",
            }),
        }
    }
}

impl<C: ?Sized + Injectable> Resolve for Vec<Arc<C>> {
    fn resolve(capability: TypeInfo, dependency: Dependency) -> Result<Self, KnexError> {
        match dependency {
            Dependency::Collection(instances) => {
                instances.iter().map(|instance| instance.downcast::<C>()).collect()
            }
            other => Err(KnexError::DependencyMismatch {
                capability,
                declared: other.shape(),
                requested: "collection",
            }),
        }
    }
}
