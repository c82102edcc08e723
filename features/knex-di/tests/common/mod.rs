//! Shared fixtures of the integration tests
#![allow(dead_code)]

use std::sync::Arc;

use knex_di::Resource;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

/// Routes library logs through the test writer, `RUST_LOG` overrides the filter
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("knex_di=trace")),
        )
        .with_test_writer()
        .try_init();
}

/// True if both handles point at the same allocation
pub fn same<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

pub trait Store: Send + Sync {
    fn put(&self, value: &str);
    fn values(&self) -> Vec<String>;
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<Vec<String>>,
}
impl Store for MemoryStore {
    fn put(&self, value: &str) {
        self.values.lock().push(value.to_string());
    }

    fn values(&self) -> Vec<String> {
        self.values.lock().clone()
    }
}

pub trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

/// Gives access to the store a service was built with
pub trait Audited: Send + Sync {
    fn store(&self) -> Option<Arc<dyn Store>>;
}

#[derive(Default)]
pub struct English;
impl Greeter for English {
    fn greet(&self) -> String {
        "hello".to_string()
    }
}

#[derive(Default)]
pub struct German;
impl Greeter for German {
    fn greet(&self) -> String {
        "hallo".to_string()
    }
}

/// Greets and records every greeting in its store
#[derive(Default)]
pub struct Recording {
    pub store: Option<Arc<dyn Store>>,
}
impl Greeter for Recording {
    fn greet(&self) -> String {
        match &self.store {
            Some(store) => {
                store.put("greeted");
                format!("recorded {}", store.values().len())
            }
            None => "unrecorded".to_string(),
        }
    }
}
impl Audited for Recording {
    fn store(&self) -> Option<Arc<dyn Store>> {
        self.store.clone()
    }
}

pub fn memory_store() -> Resource<MemoryStore> {
    Resource::<MemoryStore>::new()
        .provides::<dyn Store>(|store| store as Arc<dyn Store>)
        .injector(|_, _| Ok(()))
}

pub fn english() -> Resource<English> {
    Resource::<English>::new()
        .provides::<dyn Greeter>(|greeter| greeter as Arc<dyn Greeter>)
        .injector(|_, _| Ok(()))
}

pub fn german() -> Resource<German> {
    Resource::<German>::new()
        .provides::<dyn Greeter>(|greeter| greeter as Arc<dyn Greeter>)
        .injector(|_, _| Ok(()))
}

/// A greeter with one required store slot
pub fn recording() -> Resource<Recording> {
    Resource::<Recording>::new()
        .provides::<dyn Greeter>(|greeter| greeter as Arc<dyn Greeter>)
        .requires::<dyn Store>()
        .injector(|recording, dependencies| {
            recording.store = Some(dependencies.next()?);
            Ok(())
        })
}

/// The same implementation as [recording], registered for [Audited]
pub fn audited_recording() -> Resource<Recording> {
    Resource::<Recording>::new()
        .provides::<dyn Audited>(|audited| audited as Arc<dyn Audited>)
        .requires::<dyn Store>()
        .injector(|recording, dependencies| {
            recording.store = Some(dependencies.next()?);
            Ok(())
        })
}
