use std::{any::TypeId, collections::HashMap, fmt::Debug, sync::Arc};

use parking_lot::{Mutex, RwLock};

use crate::{
    config::{DuplicateIdPolicy, RegistryConfig},
    descriptor::{Descriptor, IntoDescriptor},
    errors::KnexError,
    provider::Provider,
    scope::{ResolutionContext, ScopeCache},
    types::{Injectable, Instance, ResourceKey, TypeInfo},
};

/// Registry of descriptors, resolving fully constructed instances on request
///
/// The registry is a cheap to clone handle: clones share descriptors, parents
/// and the container scope cache, which lets one registry be the parent of
/// many others.
///
/// # Usage contract
///
/// Resolution is synchronous and runs on the calling thread. Locks are held
/// only while reading or writing the indices and caches, never while
/// constructing, so injectors and providers may query the registry again.
/// Registration and resolution are not ordered against each other: register
/// everything and add parents before resolving from several threads. Two
/// threads racing on the first construction of a `FACTORY` scoped descriptor
/// may both construct it; the first stored instance is handed to both.
#[derive(Clone)]
pub struct Registry(Arc<RegistryInner>);

struct RegistryInner {
    config: RegistryConfig,
    descriptors: RwLock<Descriptors>,
    parents: RwLock<Vec<Registry>>,
    container_cache: Mutex<ScopeCache>,
}

#[derive(Default)]
struct Descriptors {
    by_type: HashMap<TypeId, Registered>,
    by_id: HashMap<String, Arc<Descriptor>>,
}

/// A capability starts with one descriptor and turns into a list on the second
enum Registered {
    Single(Arc<Descriptor>),
    Multiple(Vec<Arc<Descriptor>>),
}

/// Snapshot of the local descriptors of a capability
pub(crate) enum Lookup {
    Undeclared,
    Single(Arc<Descriptor>),
    Multiple(Vec<Arc<Descriptor>>),
}

impl Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let descriptors = self.0.descriptors.read();
        let mut capabilities = descriptors
            .by_type
            .values()
            .map(|registered| match registered {
                Registered::Single(descriptor) => (descriptor.capability.type_name, 1),
                Registered::Multiple(list) => (list[0].capability.type_name, list.len()),
            })
            .collect::<Vec<_>>();
        capabilities.sort();

        f.debug_struct("Registry")
            .field("name", &self.name())
            .field("capabilities", &capabilities)
            .field("ids", &descriptors.by_id.len())
            .field("parents", &self.0.parents.read().len())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::with_config(RegistryConfig::new().name(name))
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Registry(Arc::new(RegistryInner {
            config,
            descriptors: RwLock::new(Descriptors::default()),
            parents: RwLock::new(Vec::new()),
            container_cache: Mutex::new(ScopeCache::default()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.config.name
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.0.config
    }

    /// True if both handles refer to the same registry
    pub fn same(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// Registration
impl Registry {
    /// Validates `source` and indexes it by capability and, if present, by id
    pub fn register(&self, source: impl IntoDescriptor) -> Result<(), KnexError> {
        let descriptor = Arc::new(source.into_descriptor()?);
        let mut descriptors = self.0.descriptors.write();

        if let Some(id) = &descriptor.id {
            if let Some(existing) = descriptors.by_id.get(id) {
                match self.0.config.duplicate_ids {
                    DuplicateIdPolicy::Reject => return Err(KnexError::DuplicateId(id.clone())),
                    DuplicateIdPolicy::Overwrite => tracing::warn!(
                        registry = self.name(),
                        id = id.as_str(),
                        replaced = existing.identity(),
                        "Id registered again - the last registration wins"
                    ),
                }
            }
            descriptors.by_id.insert(id.clone(), descriptor.clone());
        }

        let type_id = descriptor.capability.type_id;
        let registered = match descriptors.by_type.remove(&type_id) {
            None => Registered::Single(descriptor.clone()),
            Some(Registered::Single(existing)) => {
                Registered::Multiple(vec![existing, descriptor.clone()])
            }
            Some(Registered::Multiple(mut list)) => {
                list.push(descriptor.clone());
                Registered::Multiple(list)
            }
        };
        descriptors.by_type.insert(type_id, registered);

        tracing::debug!(
            registry = self.name(),
            capability = descriptor.capability.type_name,
            id = ?descriptor.id,
            scope = descriptor.scope.as_str(),
            "Registered {}",
            descriptor.identity()
        );
        Ok(())
    }

    /// Registers a custom constructor
    pub fn register_provider(&self, provider: Provider) -> Result<(), KnexError> {
        self.register(provider)
    }

    /// Adds a registry to fall back to when something is not declared locally
    ///
    /// Parents are searched in the order they were added. Fails without
    /// changing anything if `parent` already has this registry among its
    /// ancestors, or is this registry.
    pub fn add_parent(&self, parent: &Registry) -> Result<(), KnexError> {
        if self.same(parent) || parent.has_ancestor(self) {
            return Err(KnexError::circular(
                parent.name(),
                vec![
                    self.name().to_string(),
                    parent.name().to_string(),
                    self.name().to_string(),
                ],
            ));
        }

        self.0.parents.write().push(parent.clone());
        tracing::debug!(registry = self.name(), parent = parent.name(), "Added parent");
        Ok(())
    }

    /// Depth first walk of the parent chain
    fn has_ancestor(&self, target: &Registry) -> bool {
        self.parents()
            .iter()
            .any(|parent| parent.same(target) || parent.has_ancestor(target))
    }

    /// The parents in search order
    pub fn parents(&self) -> Vec<Registry> {
        self.0.parents.read().clone()
    }
}

// Queries
impl Registry {
    /// Resolves the single implementation of `capability`
    ///
    /// Fails with [KnexError::MultipleImplementationsDeclared] if more than one
    /// is registered locally, without consulting parents. A parent holding
    /// several implementations is skipped.
    pub fn get_by_type(&self, capability: TypeInfo) -> Result<Instance, KnexError> {
        let mut context = ResolutionContext::new();
        self.find_by_type(capability, &mut context)?
            .ok_or(KnexError::UndeclaredResource(ResourceKey::Type(capability)))
    }

    /// Resolves the implementation registered under `id`
    pub fn get_by_id(&self, id: &str) -> Result<Instance, KnexError> {
        let mut context = ResolutionContext::new();
        self.find_by_id(id, &mut context)?
            .ok_or_else(|| KnexError::UndeclaredResource(ResourceKey::Id(id.to_string())))
    }

    /// Resolves every implementation of `capability` in registration order
    ///
    /// Nothing registered anywhere is an empty collection, not an error. One
    /// failing construction fails the whole call.
    pub fn get_all_of_type(&self, capability: TypeInfo) -> Result<Vec<Instance>, KnexError> {
        let mut context = ResolutionContext::new();
        self.find_all(capability, &mut context)
    }

    /// Typed [Registry::get_by_type]
    pub fn get<C: ?Sized + Injectable>(&self) -> Result<Arc<C>, KnexError> {
        self.get_by_type(TypeInfo::of::<C>())?.downcast::<C>()
    }

    /// Typed [Registry::get_by_id]
    pub fn get_id<C: ?Sized + Injectable>(&self, id: &str) -> Result<Arc<C>, KnexError> {
        self.get_by_id(id)?.downcast::<C>()
    }

    /// Typed [Registry::get_all_of_type]
    pub fn get_all<C: ?Sized + Injectable>(&self) -> Result<Vec<Arc<C>>, KnexError> {
        self.get_all_of_type(TypeInfo::of::<C>())?
            .iter()
            .map(|instance| instance.downcast::<C>())
            .collect()
    }

    /// True if `capability` has a local descriptor, parents are not consulted
    pub fn contains_type(&self, capability: TypeInfo) -> bool {
        self.0.descriptors.read().by_type.contains_key(&capability.type_id)
    }

    /// True if `id` has a local descriptor, parents are not consulted
    pub fn contains_id(&self, id: &str) -> bool {
        self.0.descriptors.read().by_id.contains_key(id)
    }

    /// Number of local descriptors
    pub fn len(&self) -> usize {
        self.0
            .descriptors
            .read()
            .by_type
            .values()
            .map(|registered| match registered {
                Registered::Single(_) => 1,
                Registered::Multiple(list) => list.len(),
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.descriptors.read().by_type.is_empty()
    }
}

// Lookups used by the resolution algorithm - locks are released on return
impl Registry {
    pub(crate) fn lookup_type(&self, capability: TypeInfo) -> Lookup {
        match self.0.descriptors.read().by_type.get(&capability.type_id) {
            None => Lookup::Undeclared,
            Some(Registered::Single(descriptor)) => Lookup::Single(descriptor.clone()),
            Some(Registered::Multiple(list)) => Lookup::Multiple(list.clone()),
        }
    }

    pub(crate) fn lookup_id(&self, id: &str) -> Option<Arc<Descriptor>> {
        self.0.descriptors.read().by_id.get(id).cloned()
    }

    pub(crate) fn container_cache(&self) -> &Mutex<ScopeCache> {
        &self.0.container_cache
    }
}
