mod common;

use std::sync::Arc;

use common::*;
use knex_di::{
    DuplicateIdPolicy, KnexError, Provider, Registry, RegistryConfig, Resource, ResourceKey, Slot,
};
use rstest::rstest;

#[test]
fn picks_one_of_several_implementations() {
    init_logging();
    let registry = Registry::new();
    registry.register(english().id("en")).unwrap();
    registry.register(german().id("de")).unwrap();

    assert_eq!(registry.get_id::<dyn Greeter>("de").unwrap().greet(), "hallo");
    assert_eq!(registry.get_id::<dyn Greeter>("en").unwrap().greet(), "hello");
    // Still ambiguous by type
    assert!(registry.get::<dyn Greeter>().is_err());
}

#[test]
fn unknown_id_is_undeclared() {
    init_logging();
    let registry = Registry::new();
    registry.register(english().id("en")).unwrap();

    let err = registry.get_by_id("fr").unwrap_err();
    assert!(matches!(&err, KnexError::UndeclaredResource(ResourceKey::Id(id)) if id == "fr"));
    assert_eq!(err.to_string(), "Undeclared resource with id 'fr'");
}

#[test]
fn last_registration_wins() {
    init_logging();
    let registry = Registry::new();
    registry.register(english().id("greeter")).unwrap();
    registry.register(german().id("greeter")).unwrap();

    assert_eq!(registry.get_id::<dyn Greeter>("greeter").unwrap().greet(), "hallo");
}

#[test]
fn duplicates_can_be_rejected() {
    init_logging();
    let registry =
        Registry::with_config(RegistryConfig::new().duplicate_ids(DuplicateIdPolicy::Reject));
    registry.register(english().id("greeter")).unwrap();

    let err = registry.register(german().id("greeter")).unwrap_err();
    assert!(matches!(err, KnexError::DuplicateId(id) if id == "greeter"));
    assert_eq!(registry.get_id::<dyn Greeter>("greeter").unwrap().greet(), "hello");
    // Nothing of the rejected registration was indexed
    assert_eq!(registry.get::<dyn Greeter>().unwrap().greet(), "hello");
}

#[test]
fn providers_can_have_ids() {
    init_logging();
    let registry = Registry::new();
    registry
        .register_provider(
            Provider::of::<dyn Greeter, _>(|| Ok(Arc::new(German) as Arc<dyn Greeter>)).id("de"),
        )
        .unwrap();

    assert_eq!(registry.get_id::<dyn Greeter>("de").unwrap().greet(), "hallo");
}

#[test]
fn falls_back_to_parents() {
    init_logging();
    let grandparent = Registry::named("grandparent");
    grandparent.register(german().id("de")).unwrap();
    let parent = Registry::named("parent");
    parent.add_parent(&grandparent).unwrap();
    let child = Registry::named("child");
    child.add_parent(&parent).unwrap();

    assert_eq!(child.get_id::<dyn Greeter>("de").unwrap().greet(), "hallo");
    assert!(child.get_by_id("en").unwrap_err().is_undeclared());
}

#[test]
fn wrong_capability_fails_the_downcast() {
    init_logging();
    let registry = Registry::new();
    registry.register(english().id("en")).unwrap();

    let err = registry.get_id::<dyn Store>("en").err().unwrap();
    assert!(matches!(err, KnexError::DowncastFailed { .. }));
}

fn recording_with(slot: Slot) -> Resource<Recording> {
    Resource::<Recording>::new()
        .provides::<dyn Greeter>(|greeter| greeter as Arc<dyn Greeter>)
        .slot(slot)
        .injector(|recording, dependencies| {
            recording.store = dependencies.next()?;
            Ok(())
        })
}

#[test]
fn id_slot_selects_the_implementation() {
    init_logging();
    let registry = Registry::new();
    registry.register(memory_store().id("primary")).unwrap();
    registry
        .register_provider(
            Provider::of::<dyn Store, _>(|| {
                let store = MemoryStore::default();
                store.put("secondary");
                Ok(Arc::new(store) as Arc<dyn Store>)
            })
            .id("secondary"),
        )
        .unwrap();
    registry
        .register(recording_with(Slot::of::<dyn Store>().require("false").id("secondary")))
        .unwrap();

    // Two stores registered, the id slot is still unambiguous
    assert_eq!(registry.get::<dyn Greeter>().unwrap().greet(), "recorded 2");
}

#[rstest]
#[case::required("true")]
#[case::optional("false")]
fn undeclared_id_slot_fails_whatever_the_require_value(#[case] require: &str) {
    init_logging();
    let registry = Registry::new();
    // A store is registered by type, an id slot never falls back to it
    registry.register(memory_store()).unwrap();
    registry
        .register(recording_with(Slot::of::<dyn Store>().require(require).id("missing")))
        .unwrap();

    let err = registry.get::<dyn Greeter>().err().unwrap();
    assert!(matches!(err, KnexError::UndeclaredResource(ResourceKey::Id(id)) if id == "missing"));
}

pub trait Link: Send + Sync {}

#[derive(Default)]
struct Loop {
    _next: Option<Arc<dyn Link>>,
}
impl Link for Loop {}

#[test]
fn self_reference_through_an_id_is_circular() {
    init_logging();
    let registry = Registry::new();
    registry
        .register(
            Resource::<Loop>::new()
                .provides::<dyn Link>(|link| link as Arc<dyn Link>)
                .id("loop")
                .slot(Slot::of::<dyn Link>().id("loop"))
                .injector(|link, dependencies| {
                    link._next = Some(dependencies.next()?);
                    Ok(())
                }),
        )
        .unwrap();

    let err = registry.get_by_id("loop").unwrap_err();
    assert!(matches!(err, KnexError::CircularDependency { .. }));
}
