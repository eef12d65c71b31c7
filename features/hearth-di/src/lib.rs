//! Object container with registrations, lifetimes and nested containers.
//!
//! Classes are described once in a [TypeRegistry]. An [ObjectContainerBuilder] then registers
//! types, instances or factories under their own class or under interfaces (`dyn Trait`) and
//! builds an immutable [ObjectContainer] which resolves them.

mod builder;
mod collection;
mod container;
mod errors;
mod initiator;
mod iterator;
mod lifecycle;
mod lifetimes;
mod reflection;
mod registrations;
mod resolver;
mod types;

pub use builder::{ObjectContainerBuilder, RegistrationConfigurator};
pub use collection::{Factory, ObjectsCollection, ObjectsIter};
pub use container::{
    ContainerHandle, Injector, InjectorProvider, ObjectContainer, Resolver, ResolverExt,
};
pub use errors::{BuildError, ResolveError};
pub use iterator::{IterationScope, ObjectContainerIterator};
pub use lifecycle::{LifecycleListener, ObjectLifecycle};
pub use reflection::{ClassBuilder, Initializer, ObjectAllocator, Reflection, TypeRegistry};
pub use resolver::{
    lazy::{Lazy, LazyOption},
    Dependency, InvokeWithDependencies,
};
pub use types::{Injectable, Instance, InterfaceScope, Object, TypeInfo};

pub mod prelude {
    pub use crate::{
        Dependency, Factory, IterationScope, Lazy, LazyOption, ObjectContainer,
        ObjectContainerBuilder, ObjectsCollection, Resolver, ResolverExt, TypeRegistry,
    };
}
