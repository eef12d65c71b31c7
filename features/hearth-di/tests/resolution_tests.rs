mod common;

use std::sync::Arc;

use common::*;
use hearth_di::{
    Factory, Injector, InjectorProvider, Instance, Lazy, ObjectContainer, ObjectContainerBuilder,
    ObjectsCollection, ResolveError, Resolver, ResolverExt, TypeInfo,
};

fn container(register: impl FnOnce(&mut ObjectContainerBuilder)) -> Arc<ObjectContainer> {
    init_tracing();
    let mut builder = ObjectContainerBuilder::new(shared_registry());
    register(&mut builder);
    builder.build().unwrap()
}

#[test]
fn strict_calls_fail_on_missing_registration() {
    let container = container(|_| {});
    let missing = ResolveError::NotRegistered(TypeInfo::of::<dyn Reader>());

    assert_eq!(container.resolve::<dyn Reader>().err(), Some(missing.clone()));
    assert_eq!(container.resolve_all::<dyn Reader>().err(), Some(missing.clone()));
    assert_eq!(container.resolve_factory::<dyn Reader>().err(), Some(missing));
    assert!(!container.is_registered::<dyn Reader>());
}

#[test]
fn soft_calls_return_empty_on_missing_registration() {
    let container = container(|_| {});

    assert!(container.try_resolve::<dyn Reader>().is_none());
    assert!(container.try_resolve_factory::<dyn Reader>().is_none());

    let all = container.try_resolve_all::<dyn Reader>();
    assert!(all.is_empty());
    assert_eq!(all.iter().count(), 0);
}

#[test]
fn resolves_through_the_root_key() {
    let container = container(|builder| {
        builder.register_type::<MockReader>();
    });

    let object = container.resolve_key(TypeInfo::of::<MockReader>()).unwrap();
    assert_eq!(object.info, TypeInfo::of::<MockReader>());
    assert_eq!(object.downcast::<MockReader>().unwrap().read(), "mock");
}

#[test]
fn container_resolves_itself() {
    let container = container(|_| {});

    let resolver = container.resolve::<dyn Resolver>().unwrap();
    let injector = container.resolve::<dyn Injector>().unwrap();
    let provider = container.resolve::<dyn InjectorProvider>().unwrap();
    let this = container.resolve::<ObjectContainer>().err();

    assert!(resolver.is_registered::<dyn Resolver>());
    assert!(injector.can_inject(TypeInfo::of::<Document>()));
    assert!(!injector.can_inject(TypeInfo::of::<MockReader>()));
    assert!(provider.get_injector(&hearth_di::Instance::new(Document::default())).is_some());
    assert_eq!(this, Some(ResolveError::NotRegistered(TypeInfo::of::<ObjectContainer>())));
}

#[test]
fn self_registration_does_not_keep_container_alive() {
    let container = container(|_| {});
    let weak = Arc::downgrade(&container);

    let resolver = container.resolve::<dyn Resolver>().unwrap();
    drop(resolver);
    drop(container);

    assert!(weak.upgrade().is_none());
}

#[test]
fn singleton_holding_its_resolver_does_not_keep_container_alive() {
    let container = container(|builder| {
        builder
            .register_type::<Service>()
            .single_instance(true)
            .auto_create();
        builder.register_type::<Document>();
    });
    let weak = Arc::downgrade(&container);

    let service = container.resolve::<Service>().unwrap();
    let resolver = service.resolver.get().unwrap().clone();
    assert!(resolver.is_registered::<Service>());
    assert!(Arc::ptr_eq(&resolver.resolve::<Service>().unwrap(), &service));

    drop(container);
    assert!(weak.upgrade().is_none());

    assert_eq!(resolver.resolve::<Service>().err(), Some(ResolveError::ContainerDropped));
    assert!(resolver.try_resolve::<Service>().is_none());
    assert!(!resolver.is_registered::<Service>());
    assert!(resolver.try_resolve_all::<Service>().is_empty());

    let injector = service.injector.get().unwrap();
    assert!(injector.can_inject(TypeInfo::of::<Document>()));
    assert_eq!(
        injector.inject(&Instance::new(Document::default())).err(),
        Some(ResolveError::ContainerDropped)
    );
}

#[test]
fn accessed_lazy_resolver_does_not_keep_container_alive() {
    let container = container(|builder| {
        builder.register_type::<MockReader>().as_interface::<dyn Reader>();
    });
    let weak = Arc::downgrade(&container);

    let lazy = container
        .invoke_with_dependencies(|resolver: Lazy<dyn Resolver>| resolver)
        .unwrap();
    assert_eq!(lazy.resolve::<dyn Reader>().unwrap().read(), "mock");

    drop(container);
    assert!(weak.upgrade().is_none());
    assert_eq!(lazy.resolve::<dyn Reader>().err(), Some(ResolveError::ContainerDropped));
}

#[test]
fn resolve_key_shares_singletons_only() {
    let container = container(|builder| {
        builder.register_type::<MockReader>().single_instance(true);
        builder.register_type::<FileReader>();
    });

    let mock = TypeInfo::of::<MockReader>();
    let first = container.resolve_key(mock).unwrap();
    assert!(first.ptr_eq(&container.resolve_key(mock).unwrap()));

    let file = TypeInfo::of::<FileReader>();
    let first = container.resolve_key(file).unwrap();
    assert!(!first.ptr_eq(&container.resolve_key(file).unwrap()));
}

#[test]
fn factory_creates_on_every_call() {
    let container = container(|builder| {
        builder.register_type::<MockReader>().as_interface::<dyn Reader>();
    });

    let factory: Factory<dyn Reader> = container.resolve_factory().unwrap();
    assert_eq!(factory.effective_class(), TypeInfo::of::<MockReader>());

    let first = factory.create().unwrap();
    let second = factory.create().unwrap();
    assert_ne!(first.id(), second.id());
}

#[test]
fn factory_of_singleton_returns_cached_instance() {
    let container = container(|builder| {
        builder
            .register_type::<MockReader>()
            .as_interface::<dyn Reader>()
            .single_instance(true);
    });

    let resolved = container.resolve::<dyn Reader>().unwrap();
    let factory = container.try_resolve_factory::<dyn Reader>().unwrap();
    assert_eq!(factory.create().unwrap().id(), resolved.id());
}

#[test]
fn factory_fails_after_container_dropped() {
    let container = container(|builder| {
        builder.register_type::<MockReader>();
    });
    let factory = container.resolve_factory::<MockReader>().unwrap();
    drop(container);

    assert_eq!(factory.create().unwrap_err(), ResolveError::ContainerDropped);
    assert!(factory.try_create().is_none());
}

#[test]
fn collection_is_lazy() {
    let registry = shared_registry();
    let allocator = CountingAllocator::new(registry.clone());
    let mut builder = ObjectContainerBuilder::new(registry);
    builder.with_allocator(allocator.clone());
    builder.register_type::<MockReader>().as_interface::<dyn Reader>();
    builder.register_type::<FileReader>().as_interface::<dyn Reader>();
    let container = builder.build().unwrap();

    let readers: ObjectsCollection<dyn Reader> = container.resolve_all().unwrap();
    assert_eq!(readers.len(), 2);
    assert_eq!(allocator.count(), 0);

    let mut iter = readers.iter();
    assert_eq!(iter.next().unwrap().read(), "mock");
    assert_eq!(allocator.count(), 1);
    assert_eq!(iter.next().unwrap().read(), "file");
    assert!(iter.next().is_none());
    assert_eq!(allocator.count(), 2);
}

#[test]
fn collection_skips_failing_registrations() {
    let container = container(|builder| {
        builder
            .register_factory::<MockReader>(|_| None)
            .as_interface::<dyn Reader>();
        builder.register_type::<FileReader>().as_interface::<dyn Reader>();
    });

    let readers = container.try_resolve_all::<dyn Reader>();
    assert_eq!(readers.len(), 2);

    let reads: Vec<_> = readers.to_vec().iter().map(|reader| reader.read()).collect();
    assert_eq!(reads, vec!["file"]);
}

#[test]
fn collection_matches_key_exactly() {
    let container = container(|builder| {
        builder.register_type::<BufferedReader>();
        builder.register_type::<BaseReader>();
    });

    // BufferedReader extends BaseReader, but is registered under its own key
    assert_eq!(container.try_resolve_all::<BaseReader>().len(), 1);
}

#[test]
fn invokes_with_resolved_arguments() {
    let container = container(|builder| {
        builder.register_type::<MockReader>().as_interface::<dyn Reader>();
        builder.register_type::<FileReader>().as_interface::<dyn Reader>();
    });

    let result = container
        .invoke_with_dependencies(
            |reader: Arc<dyn Reader>,
             all: ObjectsCollection<dyn Reader>,
             missing: Option<Arc<dyn Closeable>>| {
                format!("{} {} {}", reader.read(), all.len(), missing.is_none())
            },
        )
        .unwrap();
    assert_eq!(result, "mock 2 true");

    assert_eq!(container.invoke_with_dependencies(|| 42).unwrap(), 42);

    let failed = container.invoke_with_dependencies(|_: Arc<dyn Closeable>| ());
    assert_eq!(
        failed.unwrap_err(),
        ResolveError::NotRegistered(TypeInfo::of::<dyn Closeable>())
    );
}

#[test]
fn optional_dependency_propagates_construction_failures() {
    let container = container(|builder| {
        builder.register_type::<Unconstructible>();
    });

    let result = container.invoke_with_dependencies(|_: Option<Arc<Unconstructible>>| ());
    assert_eq!(
        result.unwrap_err(),
        ResolveError::ConstructionFailed(TypeInfo::of::<Unconstructible>())
    );
}
