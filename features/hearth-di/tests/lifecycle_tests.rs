mod common;

use std::sync::{Arc, Mutex};

use common::*;
use hearth_di::{Instance, ObjectContainer, ObjectContainerBuilder, ResolverExt};

type Events = Arc<Mutex<Vec<String>>>;

fn record(
    events: &Events,
    stage: &'static str,
) -> impl Fn(&Instance, &ObjectContainer) + Send + Sync + 'static {
    let events = events.clone();
    move |instance: &Instance, _container: &ObjectContainer| {
        let class = instance.info.type_name.rsplit("::").next().unwrap_or_default();
        events.lock().unwrap().push(format!("{stage} {class}"));
    }
}

fn observed(events: &Events) -> Vec<String> {
    std::mem::take(&mut *events.lock().unwrap())
}

fn observing_builder(events: &Events) -> ObjectContainerBuilder {
    init_tracing();
    let mut builder = ObjectContainerBuilder::new(shared_registry());
    builder
        .on_object_constructed(record(events, "constructed"))
        .on_object_injected(record(events, "injected"))
        .on_object_created(record(events, "created"));
    builder
}

#[test]
fn class_construction_emits_every_stage() {
    let events = Events::default();
    let mut builder = observing_builder(&events);
    builder.register_type::<MockReader>().as_interface::<dyn Reader>();
    builder.register_type::<Document>();
    let container = builder.build().unwrap();
    assert!(observed(&events).is_empty());

    container.resolve::<Document>().unwrap();
    assert_eq!(
        observed(&events),
        vec![
            "constructed Document",
            "constructed MockReader",
            "injected MockReader",
            "created MockReader",
            "injected Document",
            "created Document",
        ]
    );
}

#[test]
fn factories_and_instances_emit_created_only() {
    let events = Events::default();
    let mut builder = observing_builder(&events);
    builder.register_factory(|_| Some(MockReader::new()));
    builder.register_instance(Arc::new(FileReader { id: 0 }));
    let container = builder.build().unwrap();

    container.resolve::<MockReader>().unwrap();
    container.resolve::<FileReader>().unwrap();
    assert_eq!(observed(&events), vec!["created MockReader"]);
}

#[test]
fn singletons_emit_once() {
    let events = Events::default();
    let mut builder = observing_builder(&events);
    builder.register_type::<MockReader>().single_instance(true);
    let container = builder.build().unwrap();

    container.resolve::<MockReader>().unwrap();
    container.resolve::<MockReader>().unwrap();
    assert_eq!(observed(&events).len(), 3);
}

#[test]
fn nested_containers_inherit_listeners() {
    let parent_events = Events::default();
    let child_events = Events::default();

    let mut builder = observing_builder(&parent_events);
    builder.register_type::<MockReader>();
    let parent = builder.build().unwrap();

    let mut builder = ObjectContainerBuilder::new(shared_registry());
    builder.on_object_created(record(&child_events, "created"));
    builder.register_type::<FileReader>();
    let child = builder.build_nested(&parent).unwrap();

    child.resolve::<FileReader>().unwrap();
    assert_eq!(
        observed(&parent_events),
        vec![
            "constructed FileReader",
            "injected FileReader",
            "created FileReader"
        ]
    );
    assert_eq!(observed(&child_events), vec!["created FileReader"]);

    // Registrations of the parent are created by the parent
    child.resolve::<MockReader>().unwrap();
    assert_eq!(observed(&parent_events).len(), 3);
    assert!(observed(&child_events).is_empty());
}
