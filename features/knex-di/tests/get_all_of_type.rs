mod common;

use std::sync::Arc;

use common::*;
use knex_di::{KnexError, Provider, Registry, Resource, Slot, TypeInfo};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn greeter_registry(count: usize) -> Registry {
    let registry = Registry::new();
    for n in 0..count {
        if n % 2 == 0 {
            registry.register(english()).unwrap();
        } else {
            registry.register(german()).unwrap();
        }
    }
    registry
}

#[rstest]
#[case(0, vec![])]
#[case(1, vec!["hello"])]
#[case(2, vec!["hello", "hallo"])]
#[case(5, vec!["hello", "hallo", "hello", "hallo", "hello"])]
fn returns_every_implementation_in_registration_order(
    #[case] count: usize,
    #[case] expected: Vec<&str>,
) {
    init_logging();
    let registry = greeter_registry(count);

    let greetings: Vec<String> = registry
        .get_all::<dyn Greeter>()
        .unwrap()
        .iter()
        .map(|greeter| greeter.greet())
        .collect();
    assert_eq!(greetings, expected);
}

#[test]
fn one_failing_implementation_fails_the_call() {
    init_logging();
    let registry = Registry::new();
    registry.register(english()).unwrap();
    registry
        .register(
            Resource::<German>::new()
                .provides::<dyn Greeter>(|greeter| greeter as Arc<dyn Greeter>)
                .injector(|_, _| Err("kaputt".into())),
        )
        .unwrap();
    registry.register(english()).unwrap();

    let err = registry.get_all_of_type(TypeInfo::of::<dyn Greeter>()).unwrap_err();
    let german = TypeInfo::of::<German>();
    assert!(matches!(err, KnexError::Injector { implementation, .. } if implementation == german));
}

#[test]
fn providers_and_structural_descriptors_mix() {
    init_logging();
    let registry = Registry::new();
    registry
        .register_provider(Provider::of::<dyn Greeter, _>(|| {
            Ok(Arc::new(German) as Arc<dyn Greeter>)
        }))
        .unwrap();
    registry.register(english()).unwrap();

    let instances = registry.get_all_of_type(TypeInfo::of::<dyn Greeter>()).unwrap();
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].implementation, TypeInfo::of::<dyn Greeter>());
    assert_eq!(instances[1].implementation, TypeInfo::of::<English>());
}

#[test]
fn falls_back_to_the_first_parent_with_implementations() {
    init_logging();
    let empty = Registry::named("empty");
    let english_parent = Registry::named("english");
    english_parent.register(english()).unwrap();
    let german_parent = Registry::named("german");
    german_parent.register(german()).unwrap();
    german_parent.register(german()).unwrap();

    let child = Registry::named("child");
    child.add_parent(&empty).unwrap();
    child.add_parent(&german_parent).unwrap();
    child.add_parent(&english_parent).unwrap();

    let greetings: Vec<String> = child
        .get_all::<dyn Greeter>()
        .unwrap()
        .iter()
        .map(|greeter| greeter.greet())
        .collect();
    assert_eq!(greetings, vec!["hallo", "hallo"]);
}

#[test]
fn local_implementations_hide_the_parents() {
    init_logging();
    let parent = greeter_registry(3);
    let child = Registry::new();
    child.register(german()).unwrap();
    child.add_parent(&parent).unwrap();

    assert_eq!(child.get_all::<dyn Greeter>().unwrap().len(), 1);
}

#[test]
fn parent_errors_stop_the_search() {
    init_logging();
    let failing = Registry::named("failing");
    // Undeclared store dependency - an error even though it is "undeclared"
    failing.register(recording()).unwrap();
    let working = greeter_registry(1);

    let child = Registry::named("child");
    child.add_parent(&failing).unwrap();
    child.add_parent(&working).unwrap();

    let err = child.get_all::<dyn Greeter>().err().unwrap();
    assert!(err.is_undeclared());
}

#[test]
fn nothing_anywhere_is_empty() {
    init_logging();
    let parent = Registry::new();
    let child = Registry::new();
    child.add_parent(&parent).unwrap();

    assert!(child.get_all_of_type(TypeInfo::of::<dyn Greeter>()).unwrap().is_empty());
}

pub trait Choir: Send + Sync {
    fn sing(&self) -> String;
}

/// Holds every greeter it was built with
#[derive(Default)]
struct Chorus {
    greeters: Vec<Arc<dyn Greeter>>,
}
impl Choir for Chorus {
    fn sing(&self) -> String {
        self.greeters
            .iter()
            .map(|greeter| greeter.greet())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn chorus(slot: Slot) -> Resource<Chorus> {
    Resource::<Chorus>::new()
        .provides::<dyn Choir>(|chorus| chorus as Arc<dyn Choir>)
        .slot(slot)
        .injector(|chorus, dependencies| {
            chorus.greeters = dependencies.next()?;
            Ok(())
        })
}

#[rstest]
#[case(0, "")]
#[case(1, "hello")]
#[case(3, "hello hallo hello")]
fn collection_slot_takes_every_implementation(#[case] count: usize, #[case] expected: &str) {
    init_logging();
    let registry = greeter_registry(count);
    registry.register(chorus(Slot::of::<dyn Greeter>().collection())).unwrap();

    assert_eq!(registry.get::<dyn Choir>().unwrap().sing(), expected);
}

#[rstest]
#[case("true")]
#[case("false")]
fn empty_collection_slot_ignores_required(#[case] require: &str) {
    init_logging();
    let registry = Registry::new();
    registry
        .register(chorus(Slot::of::<dyn Greeter>().collection().require(require)))
        .unwrap();

    assert_eq!(registry.get::<dyn Choir>().unwrap().sing(), "");
}

#[test]
fn collection_slot_falls_back_to_parents() {
    init_logging();
    let parent = greeter_registry(2);
    let child = Registry::new();
    child.register(chorus(Slot::of::<dyn Greeter>().collection())).unwrap();
    child.add_parent(&parent).unwrap();

    assert_eq!(child.get::<dyn Choir>().unwrap().sing(), "hello hallo");
}
