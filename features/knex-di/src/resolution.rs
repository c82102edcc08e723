//! The resolution algorithm
//!
//! Every `find_*` returns `Ok(None)` when nothing is declared in this registry
//! or any of its parents. Callers decide what that means: an error for the
//! top level queries, a fallback value for dependency slots.

use std::sync::Arc;

use crate::{
    descriptor::{DependencySlot, Descriptor, InjectFn, Source, StructuralSource},
    errors::KnexError,
    registry::{Lookup, Registry},
    resolver::{Dependencies, Dependency},
    scope::{ResolutionContext, Scope},
    types::{AnyArc, Instance, ResourceKey, TypeInfo},
};

impl Registry {
    pub(crate) fn find_by_type(
        &self,
        capability: TypeInfo,
        context: &mut ResolutionContext,
    ) -> Result<Option<Instance>, KnexError> {
        match self.lookup_type(capability) {
            // Ambiguous locally, parents are never consulted
            Lookup::Multiple(_) => Err(KnexError::MultipleImplementationsDeclared(capability)),
            Lookup::Single(descriptor) => self.construct(&descriptor, context).map(Some),
            Lookup::Undeclared => self.search_parents(&ResourceKey::Type(capability), |parent| {
                parent.find_single(capability, context)
            }),
        }
    }

    /// Lookup on behalf of a child: only a single implementation counts as declared
    ///
    /// A parent with several implementations of `capability` is searched
    /// through like one without any.
    fn find_single(
        &self,
        capability: TypeInfo,
        context: &mut ResolutionContext,
    ) -> Result<Option<Instance>, KnexError> {
        match self.lookup_type(capability) {
            Lookup::Single(descriptor) => self.construct(&descriptor, context).map(Some),
            Lookup::Multiple(_) | Lookup::Undeclared => {
                self.search_parents(&ResourceKey::Type(capability), |parent| {
                    parent.find_single(capability, context)
                })
            }
        }
    }

    pub(crate) fn find_by_id(
        &self,
        id: &str,
        context: &mut ResolutionContext,
    ) -> Result<Option<Instance>, KnexError> {
        match self.lookup_id(id) {
            Some(descriptor) => self.construct(&descriptor, context).map(Some),
            None => self.search_parents(&ResourceKey::Id(id.to_string()), |parent| {
                parent.find_by_id(id, context)
            }),
        }
    }

    pub(crate) fn find_all(
        &self,
        capability: TypeInfo,
        context: &mut ResolutionContext,
    ) -> Result<Vec<Instance>, KnexError> {
        match self.lookup_type(capability) {
            Lookup::Multiple(descriptors) => descriptors
                .iter()
                .map(|descriptor| self.construct(descriptor, context))
                .collect(),
            Lookup::Single(descriptor) => Ok(vec![self.construct(&descriptor, context)?]),
            Lookup::Undeclared => {
                // Any parent error ends the search, not only a non empty result
                for parent in self.parents() {
                    let found = parent.find_all(capability, context)?;
                    if !found.is_empty() {
                        return Ok(found);
                    }
                }
                Ok(Vec::new())
            }
        }
    }

    /// Asks every parent in order, skipping the ones which know nothing about `key`
    fn search_parents<T>(
        &self,
        key: &ResourceKey,
        mut find: impl FnMut(&Registry) -> Result<Option<T>, KnexError>,
    ) -> Result<Option<T>, KnexError> {
        let parents = self.parents();
        if parents.is_empty() {
            return Ok(None);
        }

        tracing::debug!(
            registry = self.name(),
            resource = %key,
            parents = parents.len(),
            "Not declared locally, searching parents"
        );
        for parent in &parents {
            match find(parent) {
                Ok(Some(found)) => return Ok(Some(found)),
                Ok(None) => continue,
                Err(err) if err.is_undeclared() => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    /// Resolves one slot, applying the fallback once the whole chain was searched
    ///
    /// Id slots have no fallback: an undeclared id fails whatever the slot's
    /// `required` and `collection` flags say.
    fn resolve_slot(
        &self,
        slot: &DependencySlot,
        context: &mut ResolutionContext,
    ) -> Result<Dependency, KnexError> {
        if let Some(id) = &slot.id {
            return match self.find_by_id(id, context)? {
                Some(instance) => Ok(shape_slot(slot, instance)),
                None => Err(KnexError::UndeclaredResource(ResourceKey::Id(id.clone()))),
            };
        }

        let capability = ResourceKey::Type(slot.capability);
        match self.find_slot(slot, context)? {
            Some(dependency) => Ok(dependency),
            None if slot.collection => Ok(Dependency::Collection(Vec::new())),
            None if slot.required => Err(KnexError::UndeclaredResource(capability)),
            None => Ok(Dependency::Absent),
        }
    }

    fn find_slot(
        &self,
        slot: &DependencySlot,
        context: &mut ResolutionContext,
    ) -> Result<Option<Dependency>, KnexError> {
        match self.lookup_type(slot.capability) {
            Lookup::Multiple(descriptors) if slot.collection => {
                let instances = descriptors
                    .iter()
                    .map(|descriptor| self.construct(descriptor, context))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(Dependency::Collection(instances)))
            }
            Lookup::Multiple(_) => Err(KnexError::MultipleImplementationsDeclared(slot.capability)),
            Lookup::Single(descriptor) => {
                let instance = self.construct(&descriptor, context)?;
                Ok(Some(shape_slot(slot, instance)))
            }
            Lookup::Undeclared => {
                self.search_parents(&ResourceKey::Type(slot.capability), |parent| {
                    parent.find_slot(slot, context)
                })
            }
        }
    }

    /// Turns one descriptor into an instance, honoring its scope
    pub(crate) fn construct(
        &self,
        descriptor: &Descriptor,
        context: &mut ResolutionContext,
    ) -> Result<Instance, KnexError> {
        let key = descriptor.scope_key();
        let cached = match descriptor.scope {
            Scope::None => None,
            Scope::Container => self.container_cache().lock().get(&key).cloned(),
            Scope::Resolution => context.cache.get(&key).cloned(),
        };
        if let Some(instance) = cached {
            tracing::trace!(
                registry = self.name(),
                scope = descriptor.scope.as_str(),
                "Cache hit for {}",
                descriptor.identity()
            );
            return descriptor.view(instance);
        }

        let instance = match &descriptor.source {
            Source::Structural(structural) => {
                let concrete = self.construct_structural(descriptor, structural, context)?;
                (structural.view)(concrete)?
            }
            Source::Provider(provider) => {
                (provider.factory)().map_err(|error| KnexError::ProviderInstance {
                    capability: descriptor.capability,
                    error: Arc::new(error),
                })?
            }
        };
        tracing::trace!(
            registry = self.name(),
            scope = descriptor.scope.as_str(),
            "Constructed {}",
            descriptor.identity()
        );

        let instance = match descriptor.scope {
            Scope::None => return Ok(instance),
            Scope::Container => self.container_cache().lock().store(key, instance),
            Scope::Resolution => context.cache.store(key, instance),
        };
        tracing::trace!(
            registry = self.name(),
            scope = descriptor.scope.as_str(),
            "Cached {}",
            descriptor.identity()
        );
        descriptor.view(instance)
    }

    fn construct_structural(
        &self,
        descriptor: &Descriptor,
        structural: &StructuralSource,
        context: &mut ResolutionContext,
    ) -> Result<AnyArc, KnexError> {
        let injector = structural
            .injector
            .as_ref()
            .ok_or(KnexError::MissingInjector(descriptor.capability))?;

        context.guard.enter(structural.implementation)?;
        let result = self.inject(structural, injector, context);
        // Success or not, only the active chain is tracked
        context.guard.leave(structural.implementation);
        result
    }

    fn inject(
        &self,
        structural: &StructuralSource,
        injector: &InjectFn,
        context: &mut ResolutionContext,
    ) -> Result<AnyArc, KnexError> {
        let mut resolved = Vec::with_capacity(structural.slots.len());
        for slot in &structural.slots {
            resolved.push((slot.capability, self.resolve_slot(slot, context)?));
        }

        injector(Dependencies::new(resolved)).map_err(|error| KnexError::Injector {
            implementation: structural.implementation,
            error: Arc::new(error),
        })
    }
}

fn shape_slot(slot: &DependencySlot, instance: Instance) -> Dependency {
    if slot.collection {
        Dependency::Collection(vec![instance])
    } else {
        Dependency::Instance(instance)
    }
}
