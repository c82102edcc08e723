use std::{marker::PhantomData, sync::Arc};

use crate::{
    descriptor::{
        DependencySlot, Descriptor, InjectFn, IntoDescriptor, Source, StructuralSource, ViewFn,
    },
    errors::KnexError,
    resolver::Dependencies,
    scope::Scope,
    types::{AnyArc, DynError, Injectable, Instance, TypeInfo},
};

/// The only recognized `provide` metadata value
const RESOURCE_VALUE: &str = "RESOURCE";

type UserInjector<I> = Arc<dyn Fn(&mut I, &mut Dependencies) -> Result<(), DynError> + Send + Sync>;

/// Raw metadata of one dependency slot
///
/// The `require` value is kept as written and only validated when the
/// owning [Resource] is turned into a [Descriptor].
#[derive(Debug, Clone)]
pub struct Slot {
    capability: TypeInfo,
    require: String,
    id: Option<String>,
    collection: bool,
}

impl Slot {
    /// A required slot for capability `C`
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            capability: TypeInfo::of::<C>(),
            require: "true".to_string(),
            id: None,
            collection: false,
        }
    }

    /// `"true"` or `"false"`, case insensitive
    ///
    /// An empty value marks the slot as not injectable, it is then skipped.
    pub fn require(mut self, value: impl Into<String>) -> Self {
        self.require = value.into();
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn collection(mut self) -> Self {
        self.collection = true;
        self
    }

    fn validate(self) -> Result<Option<DependencySlot>, KnexError> {
        let required = match self.require.trim().to_uppercase().as_str() {
            "" => return Ok(None),
            "TRUE" => true,
            "FALSE" => false,
            other => return Err(KnexError::InvalidRequireValue(other.to_string())),
        };

        Ok(Some(DependencySlot {
            capability: self.capability,
            required,
            id: self.id.filter(|id| !id.trim().is_empty()),
            collection: self.collection,
        }))
    }
}

/// Declares how an implementation `I` fulfills a capability
///
/// `I` is allocated with [Default] and populated by the injector from the
/// resolved slots, in declared order.
///
/// ```
/// use std::sync::Arc;
/// use knex_di::{Registry, Resource};
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
/// #[derive(Default)]
/// struct Fixed;
/// impl Clock for Fixed {
///     fn now(&self) -> u64 {
///         42
///     }
/// }
///
/// let registry = Registry::new();
/// registry
///     .register(
///         Resource::<Fixed>::new()
///             .provides::<dyn Clock>(|fixed| fixed as Arc<dyn Clock>)
///             .injector(|_, _| Ok(())),
///     )
///     .unwrap();
///
/// assert_eq!(registry.get::<dyn Clock>().unwrap().now(), 42);
/// ```
pub struct Resource<I: Injectable> {
    capability: Option<(TypeInfo, String, ViewFn)>,
    id: Option<String>,
    scope: String,
    slots: Vec<Slot>,
    injector: Option<UserInjector<I>>,
    _implementation: PhantomData<fn() -> I>,
}

impl<I: Injectable + Default> Default for Resource<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Injectable + Default> Resource<I> {
    pub fn new() -> Self {
        Resource {
            capability: None,
            id: None,
            scope: String::new(),
            slots: Vec::new(),
            injector: None,
            _implementation: PhantomData,
        }
    }

    /// Declares the provided capability with a raw `provide` value
    ///
    /// `view` turns the implementation into the capability, usually a plain
    /// unsizing cast like `|imp| imp as Arc<dyn Capability>`.
    pub fn provide<C: ?Sized + Injectable>(
        mut self,
        value: impl Into<String>,
        view: impl Fn(Arc<I>) -> Arc<C> + Send + Sync + 'static,
    ) -> Self {
        let view: ViewFn = Arc::new(move |concrete: AnyArc| -> Result<Instance, KnexError> {
            let concrete = concrete
                .downcast::<I>()
                .map_err(|_| KnexError::DowncastFailed {
                    required: std::any::type_name::<I>(),
                    actual: "a different implementation",
                })?;
            let capability = view(concrete.clone());
            Ok(Instance::from_parts(concrete, capability))
        });
        self.capability = Some((TypeInfo::of::<C>(), value.into(), view));
        self
    }

    /// Declares the provided capability
    pub fn provides<C: ?Sized + Injectable>(
        self,
        view: impl Fn(Arc<I>) -> Arc<C> + Send + Sync + 'static,
    ) -> Self {
        self.provide("resource", view)
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Raw scope metadata: `""`, `"FACTORY"` or `"GRAPH"`
    pub fn scope(mut self, value: impl Into<String>) -> Self {
        self.scope = value.into();
        self
    }

    pub fn with_scope(self, scope: Scope) -> Self {
        self.scope(scope.as_str())
    }

    pub fn slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn requires<C: ?Sized + 'static>(self) -> Self {
        self.slot(Slot::of::<C>())
    }

    pub fn optional<C: ?Sized + 'static>(self) -> Self {
        self.slot(Slot::of::<C>().require("false"))
    }

    pub fn collection<C: ?Sized + 'static>(self) -> Self {
        self.slot(Slot::of::<C>().collection())
    }

    pub fn requires_id<C: ?Sized + 'static>(self, id: impl Into<String>) -> Self {
        self.slot(Slot::of::<C>().id(id))
    }

    /// Populates a freshly allocated `I` from its dependencies
    pub fn injector<F>(mut self, injector: F) -> Self
    where
        F: Fn(&mut I, &mut Dependencies) -> Result<(), DynError> + Send + Sync + 'static,
    {
        self.injector = Some(Arc::new(injector));
        self
    }
}

impl<I: Injectable + Default> IntoDescriptor for Resource<I> {
    fn into_descriptor(self) -> Result<Descriptor, KnexError> {
        let Resource {
            capability,
            id,
            scope,
            slots,
            injector,
            ..
        } = self;

        let slots = slots
            .into_iter()
            .filter_map(|slot| slot.validate().transpose())
            .collect::<Result<Vec<_>, _>>()?;

        let (capability, provide, view) = capability.ok_or(KnexError::MissingCapabilityType)?;
        let provide = provide.trim().to_uppercase();
        if provide != RESOURCE_VALUE {
            return Err(KnexError::InvalidProvideValue(provide));
        }

        let scope: Scope = scope.parse()?;

        let injector = injector.map(|inject| -> InjectFn {
            Arc::new(move |mut dependencies: Dependencies| -> Result<AnyArc, DynError> {
                let mut instance = I::default();
                inject(&mut instance, &mut dependencies)?;
                Ok(Arc::new(instance) as AnyArc)
            })
        });

        Ok(Descriptor {
            capability,
            id: id.filter(|id| !id.trim().is_empty()),
            scope,
            source: Source::Structural(StructuralSource {
                implementation: TypeInfo::of::<I>(),
                slots,
                injector,
                view,
            }),
        })
    }
}
