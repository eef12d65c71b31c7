#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, OnceLock,
};

use hearth_di::{Injector, Instance, ObjectAllocator, Resolver, TypeInfo, TypeRegistry};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

fn next_id() -> usize {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

pub trait Reader: Send + Sync {
    fn read(&self) -> String;
    fn id(&self) -> usize;
}

pub trait Closeable: Send + Sync {
    fn close(&self) -> bool;
}

/// Declared on [BaseReader] only
pub trait Named: Send + Sync {
    fn name(&self) -> &'static str;
}

#[derive(Debug)]
pub struct MockReader {
    pub id: usize,
}
impl MockReader {
    pub fn new() -> Self {
        MockReader { id: next_id() }
    }
}
impl Reader for MockReader {
    fn read(&self) -> String {
        "mock".to_string()
    }

    fn id(&self) -> usize {
        self.id
    }
}
impl Closeable for MockReader {
    fn close(&self) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct FileReader {
    pub id: usize,
}
impl Reader for FileReader {
    fn read(&self) -> String {
        "file".to_string()
    }

    fn id(&self) -> usize {
        self.id
    }
}

pub struct BaseReader;
impl Named for BaseReader {
    fn name(&self) -> &'static str {
        "base"
    }
}

/// Extends [BaseReader]
pub struct BufferedReader {
    pub base: Arc<BaseReader>,
    pub id: usize,
}
impl Reader for BufferedReader {
    fn read(&self) -> String {
        "buffered".to_string()
    }

    fn id(&self) -> usize {
        self.id
    }
}

/// Registered without a constructor
pub struct Unconstructible;

/// Gets a reader injected after construction
#[derive(Default)]
pub struct Document {
    pub reader: OnceLock<Arc<dyn Reader>>,
}

/// Keeps the container's resolver and injector around
#[derive(Default)]
pub struct Service {
    pub resolver: OnceLock<Arc<dyn Resolver>>,
    pub injector: OnceLock<Arc<dyn Injector>>,
}

/// Describes every fixture class
pub fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry
        .register_class::<MockReader>()
        .implements::<dyn Reader>(|reader| reader)
        .implements::<dyn Closeable>(|reader| reader)
        .constructor(MockReader::new);
    registry
        .register_class::<FileReader>()
        .implements::<dyn Reader>(|reader| reader)
        .constructor(|| FileReader { id: next_id() });
    registry
        .register_class::<BaseReader>()
        .implements::<dyn Named>(|base| base)
        .constructor(|| BaseReader);
    registry
        .register_class::<BufferedReader>()
        .extends::<BaseReader>(|buffered| buffered.base.clone())
        .implements::<dyn Reader>(|reader| reader)
        .constructor(|| BufferedReader {
            base: Arc::new(BaseReader),
            id: next_id(),
        });
    registry.register_class::<Unconstructible>();
    registry
        .register_class::<Document>()
        .constructor(Document::default)
        .init_dependencies(|document: &Document, reader: Arc<dyn Reader>| {
            let _ = document.reader.set(reader);
        });
    registry
        .register_class::<Service>()
        .constructor(Service::default)
        .init_dependencies(
            |service: &Service, (resolver, injector): (Arc<dyn Resolver>, Arc<dyn Injector>)| {
                let _ = service.resolver.set(resolver);
                let _ = service.injector.set(injector);
            },
        );
    registry
}

pub fn shared_registry() -> Arc<TypeRegistry> {
    Arc::new(registry())
}

/// Counts every construction it forwards to the registry
pub struct CountingAllocator {
    pub registry: Arc<TypeRegistry>,
    pub constructed: AtomicUsize,
}
impl CountingAllocator {
    pub fn new(registry: Arc<TypeRegistry>) -> Arc<Self> {
        Arc::new(CountingAllocator {
            registry,
            constructed: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }
}
impl ObjectAllocator for CountingAllocator {
    fn construct_new(&self, class: TypeInfo, outer: Option<&Instance>) -> Option<Instance> {
        self.constructed.fetch_add(1, Ordering::SeqCst);
        self.registry.construct_new(class, outer)
    }
}
