use std::sync::{Arc, Mutex};

use hearth_di::{prelude::*, BuildError};
use tracing_subscriber::EnvFilter;

trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

struct Polite;
impl Greeter for Polite {
    fn greet(&self, name: &str) -> String {
        format!("Good day, {name}")
    }
}

struct Casual;
impl Greeter for Casual {
    fn greet(&self, name: &str) -> String {
        format!("Hey {name}")
    }
}

#[derive(Default)]
struct Reception {
    greeter: Mutex<Option<Arc<dyn Greeter>>>,
}
impl Reception {
    fn welcome(&self, name: &str) -> String {
        match self.greeter.lock().ok().and_then(|g| g.clone()) {
            Some(greeter) => greeter.greet(name),
            None => format!("{name} is ignored"),
        }
    }
}

fn main() -> Result<(), BuildError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut registry = TypeRegistry::new();
    registry
        .register_class::<Polite>()
        .implements::<dyn Greeter>(|polite| polite)
        .constructor(|| Polite);
    registry
        .register_class::<Casual>()
        .implements::<dyn Greeter>(|casual| casual)
        .constructor(|| Casual);
    registry
        .register_class::<Reception>()
        .constructor(Reception::default)
        .init_dependencies(|reception: &Reception, greeter: Arc<dyn Greeter>| {
            if let Ok(mut slot) = reception.greeter.lock() {
                *slot = Some(greeter);
            }
        });
    let registry = Arc::new(registry);

    let mut builder = ObjectContainerBuilder::new(registry.clone());
    builder.register_type::<Polite>().by_interfaces(Default::default());
    builder.register_type::<Reception>().single_instance(true);
    let root = builder.build()?;

    let mut builder = ObjectContainerBuilder::new(registry);
    builder
        .register_type::<Casual>()
        .as_interface::<dyn Greeter>()
        .single_instance(true);
    let nested = builder.build_nested(&root)?;

    let welcome = |container: &ObjectContainer| {
        container
            .invoke_with_dependencies(|reception: Arc<Reception>| reception.welcome("Ada"))
    };
    println!("root:   {:?}", welcome(&root));
    println!("nested: {:?}", welcome(&nested));

    let greeters = nested.try_resolve_all::<dyn Greeter>();
    println!("{} greeters in the chain:", greeters.len());
    for greeter in &greeters {
        println!("  {}", greeter.greet("Grace"));
    }

    println!("{:?}", nested);
    Ok(())
}
