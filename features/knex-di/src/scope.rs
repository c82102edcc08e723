use std::{collections::HashMap, str::FromStr};

use crate::{
    cycle_guard::CycleGuard,
    errors::KnexError,
    types::{Instance, TypeInfo},
};

/// How long a constructed instance is reused
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Always construct a fresh instance
    #[default]
    None,
    /// Reuse for the lifetime of the owning registry (`"FACTORY"`)
    Container,
    /// Reuse within one top level query (`"GRAPH"`)
    Resolution,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::None => "",
            Scope::Container => "FACTORY",
            Scope::Resolution => "GRAPH",
        }
    }
}

impl FromStr for Scope {
    type Err = KnexError;

    /// Metadata values are trimmed and case insensitive
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        match normalized.as_str() {
            "" => Ok(Scope::None),
            "FACTORY" => Ok(Scope::Container),
            "GRAPH" => Ok(Scope::Resolution),
            _ => Err(KnexError::InvalidScopeValue(normalized)),
        }
    }
}

/// Identity of a provider function, minted once per built provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderKey(pub(crate) u64);

/// What scoped caches are keyed by
///
/// Never the capability type, so one implementation is shared by every
/// type or id lookup that reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    Implementation(TypeInfo),
    Provider(ProviderKey),
}

/// Instances kept alive for a scope
#[derive(Debug, Default)]
pub struct ScopeCache {
    instances: HashMap<ScopeKey, Instance>,
}

impl ScopeCache {
    pub fn get(&self, key: &ScopeKey) -> Option<&Instance> {
        self.instances.get(key)
    }

    /// Stores the instance unless one is already cached, returning the cached one
    pub fn store(&mut self, key: ScopeKey, instance: Instance) -> Instance {
        self.instances.entry(key).or_insert(instance).clone()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// State of one top level query
///
/// Created fresh by every query and dropped when it returns, so nothing
/// cached in here is ever seen by another query.
#[derive(Debug, Default)]
pub(crate) struct ResolutionContext {
    pub guard: CycleGuard,
    pub cache: ScopeCache,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }
}
