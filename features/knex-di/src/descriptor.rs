use std::{fmt::Debug, sync::Arc};

use crate::{
    errors::KnexError,
    resolver::Dependencies,
    scope::{ProviderKey, Scope, ScopeKey},
    types::{AnyArc, DynError, Instance, TypeInfo},
};

/// Allocates an implementation, fills it from the resolved dependencies and
/// returns it as its concrete `Arc<I>`
pub(crate) type InjectFn = Arc<dyn Fn(Dependencies) -> Result<AnyArc, DynError> + Send + Sync>;
/// Views a concrete `Arc<I>` as the capability of a descriptor
pub(crate) type ViewFn = Arc<dyn Fn(AnyArc) -> Result<Instance, KnexError> + Send + Sync>;
/// A caller supplied zero argument factory
pub(crate) type InstanceFn = Arc<dyn Fn() -> Result<Instance, DynError> + Send + Sync>;

/// One declared input of a structural descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySlot {
    /// The required capability
    pub capability: TypeInfo,
    /// If it is required or optional
    pub required: bool,
    /// Resolve by id instead of by capability
    pub id: Option<String>,
    /// If all implementations are injected as a collection
    pub collection: bool,
}

impl DependencySlot {
    pub fn required(capability: TypeInfo) -> Self {
        Self {
            capability,
            required: true,
            id: None,
            collection: false,
        }
    }

    pub fn optional(capability: TypeInfo) -> Self {
        Self {
            required: false,
            ..Self::required(capability)
        }
    }

    pub fn collection(capability: TypeInfo) -> Self {
        Self {
            collection: true,
            ..Self::required(capability)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Construction through an injector filling a freshly allocated implementation
#[derive(Clone)]
pub struct StructuralSource {
    pub implementation: TypeInfo,
    pub slots: Vec<DependencySlot>,
    pub(crate) injector: Option<InjectFn>,
    pub(crate) view: ViewFn,
}

impl StructuralSource {
    pub fn has_injector(&self) -> bool {
        self.injector.is_some()
    }
}

/// Construction through a caller supplied factory
#[derive(Clone)]
pub struct ProviderSource {
    pub key: ProviderKey,
    pub(crate) factory: InstanceFn,
}

#[derive(Clone)]
pub enum Source {
    Structural(StructuralSource),
    Provider(ProviderSource),
}

/// Canonical registration record
///
/// Built once by [IntoDescriptor] and never mutated afterwards.
#[derive(Clone)]
pub struct Descriptor {
    pub capability: TypeInfo,
    pub id: Option<String>,
    pub scope: Scope,
    pub source: Source,
}

impl Debug for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Descriptor");
        debug
            .field("capability", &self.capability.type_name)
            .field("id", &self.id)
            .field("scope", &self.scope);
        match &self.source {
            Source::Structural(structural) => debug
                .field("implementation", &structural.implementation.type_name)
                .field("slots", &structural.slots.len())
                .field("injector", &structural.has_injector()),
            Source::Provider(provider) => debug.field("provider", &provider.key),
        };
        debug.finish()
    }
}

impl Descriptor {
    /// Key of the scoped caches
    pub fn scope_key(&self) -> ScopeKey {
        match &self.source {
            Source::Structural(structural) => ScopeKey::Implementation(structural.implementation),
            Source::Provider(provider) => ScopeKey::Provider(provider.key),
        }
    }

    /// Human readable name of what gets constructed
    pub fn identity(&self) -> &'static str {
        match &self.source {
            Source::Structural(structural) => structural.implementation.type_name,
            Source::Provider(_) => self.capability.type_name,
        }
    }

    /// Presents a (possibly cached) instance as this descriptor's capability
    ///
    /// A structural implementation registered for several capabilities shares
    /// one cached value, which has to be re-viewed when requested through
    /// another capability.
    pub(crate) fn view(&self, instance: Instance) -> Result<Instance, KnexError> {
        if instance.capability == self.capability {
            return Ok(instance);
        }
        match &self.source {
            Source::Structural(structural) => (structural.view)(instance.concrete),
            Source::Provider(_) => Ok(instance),
        }
    }
}

/// Anything which can be validated into a [Descriptor]
pub trait IntoDescriptor {
    fn into_descriptor(self) -> Result<Descriptor, KnexError>;
}

impl IntoDescriptor for Descriptor {
    fn into_descriptor(self) -> Result<Descriptor, KnexError> {
        Ok(self)
    }
}
