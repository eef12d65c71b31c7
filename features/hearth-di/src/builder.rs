use std::sync::Arc;

use crate::{
    container::{ObjectContainer, Resolver},
    errors::BuildError,
    initiator::ContainerInitiator,
    lifecycle::ObjectLifecycle,
    lifetimes::{
        FactoryFn, InstanceLifetime, LifetimeHandler, Producer, SingletonLifetime,
        TransientLifetime,
    },
    reflection::{ObjectAllocator, Reflection, TypeRegistry},
    types::{Injectable, Instance, InterfaceScope, TypeInfo},
};

/// Collects registrations and builds an [ObjectContainer] from them
///
/// ```ignore
/// let mut builder = ObjectContainerBuilder::new(registry);
/// builder
///     .register_type::<FileReader>()
///     .as_interface::<dyn Reader>()
///     .single_instance(true);
/// let container = builder.build()?;
/// ```
pub struct ObjectContainerBuilder {
    pub(crate) reflection: Arc<dyn Reflection>,
    pub(crate) allocator: Arc<dyn ObjectAllocator>,
    /// Registrations in the order they were made
    pub(crate) registrations: Vec<PendingRegistration>,
    pub(crate) outer: Option<Instance>,
    pub(crate) lifecycle: ObjectLifecycle,
}

impl ObjectContainerBuilder {
    /// Builder using `registry` for reflection and for constructing objects
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_reflection(registry.clone(), registry)
    }

    pub fn with_reflection(
        reflection: Arc<dyn Reflection>,
        allocator: Arc<dyn ObjectAllocator>,
    ) -> Self {
        ObjectContainerBuilder {
            reflection,
            allocator,
            registrations: Vec::new(),
            outer: None,
            lifecycle: ObjectLifecycle::default(),
        }
    }

    /// Replaces the allocator new objects are constructed with
    pub fn with_allocator(&mut self, allocator: Arc<dyn ObjectAllocator>) -> &mut Self {
        self.allocator = allocator;
        self
    }

    /// Owner scope handed to the allocator. Nested containers inherit their parent's if unset
    pub fn outer_for_new_objects(&mut self, outer: Instance) -> &mut Self {
        self.outer = Some(outer);
        self
    }

    pub fn on_object_constructed(
        &mut self,
        listener: impl Fn(&Instance, &ObjectContainer) + Send + Sync + 'static,
    ) -> &mut Self {
        self.lifecycle.on_constructed(Arc::new(listener));
        self
    }

    pub fn on_object_injected(
        &mut self,
        listener: impl Fn(&Instance, &ObjectContainer) + Send + Sync + 'static,
    ) -> &mut Self {
        self.lifecycle.on_injected(Arc::new(listener));
        self
    }

    pub fn on_object_created(
        &mut self,
        listener: impl Fn(&Instance, &ObjectContainer) + Send + Sync + 'static,
    ) -> &mut Self {
        self.lifecycle.on_created(Arc::new(listener));
        self
    }

    /// Registers class `T`, constructed by the allocator whenever an instance is needed
    pub fn register_type<T: Injectable>(&mut self) -> RegistrationConfigurator<'_> {
        self.add(RegistrationKind::Type, TypeInfo::of::<T>())
    }

    /// Registers an already existing instance
    ///
    /// Always handed out as is, the registration can't be transient.
    pub fn register_instance<T: Injectable>(
        &mut self,
        instance: Arc<T>,
    ) -> RegistrationConfigurator<'_> {
        self.add(
            RegistrationKind::Instance(Instance::from_arc(instance)),
            TypeInfo::of::<T>(),
        )
    }

    /// Registers a factory producing `T`
    ///
    /// The factory receives the container owning the registration. Returning None fails the
    /// resolve. Products are not injected, only the created listeners are notified.
    pub fn register_factory<T: Injectable>(
        &mut self,
        factory: impl Fn(&dyn Resolver) -> Option<T> + Send + Sync + 'static,
    ) -> RegistrationConfigurator<'_> {
        let factory: FactoryFn = Arc::new(move |container: &ObjectContainer| {
            factory(container as &dyn Resolver).map(Instance::new)
        });
        self.add(RegistrationKind::Factory(factory), TypeInfo::of::<T>())
    }

    pub fn build(self) -> Result<Arc<ObjectContainer>, BuildError> {
        ContainerInitiator::new(self).initiate(None)
    }

    /// Builds a container falling back to `parent` for everything it does not register itself
    pub fn build_nested(
        self,
        parent: &Arc<ObjectContainer>,
    ) -> Result<Arc<ObjectContainer>, BuildError> {
        ContainerInitiator::new(self).initiate(Some(parent.clone()))
    }

    fn add(
        &mut self,
        kind: RegistrationKind,
        implementation: TypeInfo,
    ) -> RegistrationConfigurator<'_> {
        tracing::trace!("Registering {}", implementation);
        self.registrations.push(PendingRegistration {
            kind,
            implementation,
            interfaces: Vec::new(),
            single_instance: false,
            auto_create: false,
            errors: Vec::new(),
        });

        let index = self.registrations.len() - 1;
        RegistrationConfigurator {
            registration: &mut self.registrations[index],
            reflection: self.reflection.as_ref(),
        }
    }
}

pub(crate) enum RegistrationKind {
    Type,
    Instance(Instance),
    Factory(FactoryFn),
}

/// A registration as configured on the builder
pub(crate) struct PendingRegistration {
    pub kind: RegistrationKind,
    pub implementation: TypeInfo,
    /// Keys to bind under - the implementation itself if empty
    pub interfaces: Vec<TypeInfo>,
    pub single_instance: bool,
    pub auto_create: bool,
    pub errors: Vec<BuildError>,
}

impl PendingRegistration {
    /// Key used for auto creation
    pub(crate) fn primary_key(&self) -> TypeInfo {
        self.interfaces
            .first()
            .copied()
            .unwrap_or(self.implementation)
    }

    pub(crate) fn create_lifetime_handler(&self) -> Arc<dyn LifetimeHandler> {
        let producer = match &self.kind {
            RegistrationKind::Instance(instance) => {
                return Arc::new(InstanceLifetime::new(instance.clone()));
            }
            RegistrationKind::Type => Producer::Class(self.implementation),
            RegistrationKind::Factory(factory) => Producer::Factory(factory.clone()),
        };

        match self.single_instance {
            true => Arc::new(SingletonLifetime::new(producer)),
            false => Arc::new(TransientLifetime::new(producer)),
        }
    }

    fn add_interface(&mut self, interface: TypeInfo) {
        if !self.interfaces.contains(&interface) {
            self.interfaces.push(interface);
        }
    }
}

/// Configures the registration just made on an [ObjectContainerBuilder]
pub struct RegistrationConfigurator<'a> {
    registration: &'a mut PendingRegistration,
    reflection: &'a dyn Reflection,
}

impl RegistrationConfigurator<'_> {
    /// Also binds under the implementation class itself
    pub fn as_self(self) -> Self {
        let implementation = self.registration.implementation;
        self.registration.add_interface(implementation);
        self
    }

    /// Binds under `I`, which must be a superclass or an interface of the implementation
    ///
    /// Invalid interfaces fail [ObjectContainerBuilder::build].
    pub fn as_interface<I: ?Sized + 'static>(self) -> Self {
        let implementation = self.registration.implementation;
        let interface = TypeInfo::of::<I>();

        if !self.reflection.is_subtype(implementation, interface)
            && !self.reflection.implements(implementation, interface)
        {
            tracing::error!(
                "'{}' can't be registered as '{}'",
                implementation,
                interface
            );
            self.registration
                .errors
                .push(BuildError::InvalidRegistration {
                    implementation,
                    interface,
                });
            return self;
        }

        self.registration.add_interface(interface);
        self
    }

    /// Binds under every interface the implementation declares
    pub fn by_interfaces(self, scope: InterfaceScope) -> Self {
        let interfaces = self
            .reflection
            .implemented_interfaces(self.registration.implementation, scope);
        for interface in interfaces {
            self.registration.add_interface(interface);
        }
        self
    }

    /// Keep a single instance instead of creating a new one on every resolve
    ///
    /// Has no effect on instance registrations.
    pub fn single_instance(self, single_instance: bool) -> Self {
        self.registration.single_instance = single_instance;
        self
    }

    /// Resolve once while the container is built
    pub fn auto_create(self) -> Self {
        self.registration.auto_create = true;
        self
    }
}
