use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::{
    descriptor::{Descriptor, InstanceFn, IntoDescriptor, ProviderSource, Source},
    errors::KnexError,
    scope::{ProviderKey, Scope},
    types::{DynError, Injectable, Instance, TypeInfo},
};

static NEXT_PROVIDER_KEY: AtomicU64 = AtomicU64::new(1);

/// A custom constructor for a capability
///
/// Every registration of a provider gets its own identity, so scoped caching
/// never mixes up two providers even if they were cloned from one another.
#[derive(Clone)]
pub struct Provider {
    /// The provided capability - registration fails without one
    pub capability: Option<TypeInfo>,
    pub id: Option<String>,
    /// Raw scope metadata: `""`, `"FACTORY"` or `"GRAPH"`
    pub scope: String,
    instance: InstanceFn,
}
impl Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("capability", &self.capability.map(|c| c.type_name))
            .field("id", &self.id)
            .field("scope", &self.scope)
            .finish()
    }
}

impl Provider {
    /// Provides capability `C` through `instance`
    pub fn of<C, F>(instance: F) -> Self
    where
        C: ?Sized + Injectable,
        F: Fn() -> Result<Arc<C>, DynError> + Send + Sync + 'static,
    {
        Provider {
            capability: Some(TypeInfo::of::<C>()),
            id: None,
            scope: String::new(),
            instance: Arc::new(move || instance().map(Instance::new::<C>)),
        }
    }

    /// A provider whose capability is given as plain metadata
    ///
    /// The instances returned by `instance` should be built for `capability`,
    /// otherwise typed access on them fails with a downcast error.
    pub fn raw<F>(capability: Option<TypeInfo>, instance: F) -> Self
    where
        F: Fn() -> Result<Instance, DynError> + Send + Sync + 'static,
    {
        Provider {
            capability,
            id: None,
            scope: String::new(),
            instance: Arc::new(instance),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn scope(mut self, value: impl Into<String>) -> Self {
        self.scope = value.into();
        self
    }

    pub fn with_scope(self, scope: Scope) -> Self {
        self.scope(scope.as_str())
    }
}

impl IntoDescriptor for Provider {
    fn into_descriptor(self) -> Result<Descriptor, KnexError> {
        let capability = self.capability.ok_or(KnexError::MissingCapabilityType)?;
        let scope: Scope = self.scope.parse()?;

        Ok(Descriptor {
            capability,
            id: self.id.filter(|id| !id.trim().is_empty()),
            scope,
            source: Source::Provider(ProviderSource {
                key: ProviderKey(NEXT_PROVIDER_KEY.fetch_add(1, Ordering::Relaxed)),
                factory: self.instance,
            }),
        })
    }
}
