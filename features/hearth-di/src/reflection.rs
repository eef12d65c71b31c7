//! Class and interface metadata consumed by the container.
//!
//! The container never inspects types on its own. Everything it needs to know about a class
//! (which interfaces it implements, what it derives from, how to construct it and how to inject
//! its dependencies) comes through [Reflection] and [ObjectAllocator].
//! [TypeRegistry] is a manual registration table implementing both.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    marker::PhantomData,
    sync::Arc,
};

use crate::{
    container::{ContainerHandle, Injector, InjectorProvider, Resolver},
    errors::ResolveError,
    resolver::Dependency,
    types::{Injectable, Instance, InterfaceScope, Object, TypeInfo},
};

/// Injects dependencies into an already constructed instance
pub type Initializer =
    Arc<dyn Fn(&Instance, &dyn Resolver) -> Result<(), ResolveError> + Send + Sync>;

type CastFn = Arc<dyn Fn(Arc<Object>) -> Option<Box<dyn Any>> + Send + Sync>;
type UpcastFn = Arc<dyn Fn(Arc<Object>) -> Option<Instance> + Send + Sync>;
type ConstructFn = Arc<dyn Fn(Option<&Instance>) -> Instance + Send + Sync>;

/// Answers identity and hierarchy questions about keys
///
/// Implementations must describe [ContainerHandle] as implementing [Resolver], [Injector] and
/// [InjectorProvider], as every container registers its handle under those keys.
pub trait Reflection: Send + Sync {
    /// True if `key` equals `of`, `of` is the root object key, or `of` is an ancestor class of `key`
    fn is_subtype(&self, key: TypeInfo, of: TypeInfo) -> bool;

    /// True if `class` or one of its ancestors declares `interface`
    fn implements(&self, class: TypeInfo, interface: TypeInfo) -> bool;

    /// Interfaces declared by `class`, deduplicated and in declaration order
    fn implemented_interfaces(&self, class: TypeInfo, scope: InterfaceScope) -> Vec<TypeInfo>;

    /// Casts the instance to `to`, returning a boxed `Arc<To>`
    fn cast(&self, instance: &Instance, to: TypeInfo) -> Option<Box<dyn Any>>;

    /// Dependency initializer of `class`, if it has one
    fn initializer(&self, class: TypeInfo) -> Option<Initializer>;
}

/// Constructs new managed instances by class
pub trait ObjectAllocator: Send + Sync {
    fn construct_new(&self, class: TypeInfo, outer: Option<&Instance>) -> Option<Instance>;
}

struct ClassDescriptor {
    super_class: Option<(TypeInfo, UpcastFn)>,
    interfaces: Vec<TypeInfo>,
    casts: HashMap<TypeId, CastFn>,
    constructor: Option<ConstructFn>,
    initializer: Option<Initializer>,
}

/// Manually populated class table
pub struct TypeRegistry {
    classes: HashMap<TypeId, ClassDescriptor>,
}
impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates a registry which already knows the container handle
    pub fn new() -> Self {
        let mut registry = TypeRegistry {
            classes: HashMap::new(),
        };

        registry
            .register_class::<ContainerHandle>()
            .implements::<dyn Resolver>(|handle| handle)
            .implements::<dyn Injector>(|handle| handle)
            .implements::<dyn InjectorProvider>(|handle| handle);

        registry
    }

    /// Describes class `C`, extending the description if `C` is already known
    pub fn register_class<C: Injectable>(&mut self) -> ClassBuilder<'_, C> {
        let descriptor = self
            .classes
            .entry(TypeId::of::<C>())
            .or_insert_with(|| ClassDescriptor {
                super_class: None,
                interfaces: Vec::new(),
                casts: HashMap::new(),
                constructor: None,
                initializer: None,
            });

        ClassBuilder {
            descriptor,
            _marker: PhantomData,
        }
    }

    fn super_class(&self, class: TypeInfo) -> Option<TypeInfo> {
        self.classes
            .get(&class.type_id)?
            .super_class
            .as_ref()
            .map(|(info, _)| *info)
    }
}

impl Reflection for TypeRegistry {
    fn is_subtype(&self, key: TypeInfo, of: TypeInfo) -> bool {
        if key == of || of == TypeInfo::object() {
            return true;
        }

        let mut current = self.super_class(key);
        while let Some(class) = current {
            if class == of {
                return true;
            }
            current = self.super_class(class);
        }

        false
    }

    fn implements(&self, class: TypeInfo, interface: TypeInfo) -> bool {
        self.implemented_interfaces(class, InterfaceScope::CurrentAndAncestors)
            .contains(&interface)
    }

    fn implemented_interfaces(&self, class: TypeInfo, scope: InterfaceScope) -> Vec<TypeInfo> {
        let mut interfaces = Vec::new();
        let mut current = Some(class);

        while let Some(class) = current {
            let Some(descriptor) = self.classes.get(&class.type_id) else {
                break;
            };

            for interface in &descriptor.interfaces {
                if !interfaces.contains(interface) {
                    interfaces.push(*interface);
                }
            }

            if scope == InterfaceScope::CurrentClass {
                break;
            }
            current = descriptor.super_class.as_ref().map(|(info, _)| *info);
        }

        interfaces
    }

    fn cast(&self, instance: &Instance, to: TypeInfo) -> Option<Box<dyn Any>> {
        let mut current = instance.clone();

        loop {
            if current.info == to {
                return Some(current.identity_boxed());
            }

            let descriptor = self.classes.get(&current.info.type_id)?;
            if let Some(cast) = descriptor.casts.get(&to.type_id) {
                return cast(current.instance.clone());
            }

            let (_, upcast) = descriptor.super_class.as_ref()?;
            current = upcast(current.instance.clone())?;
        }
    }

    fn initializer(&self, class: TypeInfo) -> Option<Initializer> {
        self.classes.get(&class.type_id)?.initializer.clone()
    }
}

impl ObjectAllocator for TypeRegistry {
    fn construct_new(&self, class: TypeInfo, outer: Option<&Instance>) -> Option<Instance> {
        let constructor = self
            .classes
            .get(&class.type_id)
            .and_then(|descriptor| descriptor.constructor.as_ref());

        match constructor {
            Some(constructor) => Some(constructor(outer)),
            None => {
                tracing::warn!("No constructor registered for '{}'", class);
                None
            }
        }
    }
}

/// Describes a single class of the [TypeRegistry]
pub struct ClassBuilder<'a, C: Injectable> {
    descriptor: &'a mut ClassDescriptor,
    _marker: PhantomData<fn() -> C>,
}

impl<'a, C: Injectable> ClassBuilder<'a, C> {
    /// Declares `B` as the superclass of `C`
    ///
    /// `upcast` returns the `B` part of a `C`, which is used for casts to `B` and to anything
    /// `B` implements.
    pub fn extends<B: Injectable>(
        self,
        upcast: impl Fn(Arc<C>) -> Arc<B> + Send + Sync + 'static,
    ) -> Self {
        let upcast: UpcastFn = Arc::new(move |object| {
            let typed = Arc::downcast::<C>(object).ok()?;
            Some(Instance::from_arc(upcast(typed)))
        });
        self.descriptor.super_class = Some((TypeInfo::of::<B>(), upcast));
        self
    }

    /// Declares that `C` implements interface `I`
    pub fn implements<I: ?Sized + 'static>(self, cast: fn(Arc<C>) -> Arc<I>) -> Self {
        let info = TypeInfo::of::<I>();
        if !self.descriptor.interfaces.contains(&info) {
            self.descriptor.interfaces.push(info);
        }
        self.descriptor.casts.insert(info.type_id, typed_cast(cast));
        self
    }

    /// Allows the allocator to construct `C`
    pub fn constructor(self, constructor: impl Fn() -> C + Send + Sync + 'static) -> Self {
        self.constructor_with_outer(move |_| constructor())
    }

    /// Allows the allocator to construct `C`, receiving the owner scope of the container
    pub fn constructor_with_outer(
        self,
        constructor: impl Fn(Option<&Instance>) -> C + Send + Sync + 'static,
    ) -> Self {
        self.descriptor.constructor = Some(Arc::new(move |outer| Instance::new(constructor(outer))));
        self
    }

    /// Sets the function dependencies are injected with after construction
    ///
    /// Every element of `D` is resolved from the injecting container.
    pub fn init_dependencies<D: Dependency>(
        self,
        init: impl Fn(&C, D) + Send + Sync + 'static,
    ) -> Self {
        let initializer: Initializer = Arc::new(move |instance, resolver| {
            let this = instance
                .downcast::<C>()
                .map_err(|_| ResolveError::CastFailed {
                    required_type: TypeInfo::of::<C>(),
                    actual_type: instance.info,
                })?;
            let dependencies = D::resolve(resolver)?;
            init(&*this, dependencies);
            Ok(())
        });
        self.descriptor.initializer = Some(initializer);
        self
    }
}

fn typed_cast<C: Injectable, I: ?Sized + 'static>(cast: fn(Arc<C>) -> Arc<I>) -> CastFn {
    Arc::new(move |object| {
        let typed = Arc::downcast::<C>(object).ok()?;
        Some(Box::new(cast(typed)) as Box<dyn Any>)
    })
}
