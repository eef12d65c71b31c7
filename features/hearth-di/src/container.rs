use std::{
    fmt::Debug,
    sync::{Arc, Weak},
};

use crate::{
    collection::{Factory, ObjectsCollection},
    errors::ResolveError,
    iterator::{IterationScope, KeyMatch, ObjectContainerIterator},
    lifecycle::ObjectLifecycle,
    reflection::{ObjectAllocator, Reflection},
    registrations::{Registration, RegistrationList, Registrations},
    resolver::InvokeWithDependencies,
    types::{Instance, Object, TypeInfo},
};

/// Resolves objects by key
///
/// The `*_key` methods are the dynamic core, [ResolverExt] adds the typed variants on top.
pub trait Resolver: Send + Sync {
    /// Returns an instance for `key`, failing if it is not registered
    fn resolve_key(&self, key: TypeInfo) -> Result<Instance, ResolveError>;

    /// Returns an instance for `key` if it is registered and could be created
    fn try_resolve_key(&self, key: TypeInfo) -> Option<Instance>;

    /// All registrations of `key` in the whole container chain, failing if there are none
    fn resolve_all_key(&self, key: TypeInfo) -> Result<ObjectsCollection<Object>, ResolveError>;

    /// All registrations of `key` in the whole container chain, possibly none
    fn try_resolve_all_key(&self, key: TypeInfo) -> ObjectsCollection<Object>;

    /// A factory bound to the registration `resolve_key` would use
    fn resolve_factory_key(&self, key: TypeInfo) -> Result<Factory<Object>, ResolveError>;

    fn try_resolve_factory_key(&self, key: TypeInfo) -> Option<Factory<Object>>;

    /// Whether `key` is registered anywhere in the container chain
    fn is_registered_key(&self, key: TypeInfo) -> bool;

    /// Reflection used to cast resolved instances
    fn reflection(&self) -> &dyn Reflection;
}

/// Typed resolution on top of any [Resolver]
pub trait ResolverExt: Resolver {
    /// Returns an instance of `T`. `T` may be a class or an interface (`dyn Trait`)
    fn resolve<T: ?Sized + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        let instance = self.resolve_key(TypeInfo::of::<T>())?;
        instance
            .cast::<T>(self.reflection())
            .ok_or(ResolveError::CastFailed {
                required_type: TypeInfo::of::<T>(),
                actual_type: instance.info,
            })
    }

    fn try_resolve<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.try_resolve_key(TypeInfo::of::<T>())?
            .cast::<T>(self.reflection())
    }

    fn resolve_all<T: ?Sized + 'static>(&self) -> Result<ObjectsCollection<T>, ResolveError> {
        Ok(self.resolve_all_key(TypeInfo::of::<T>())?.cast())
    }

    fn try_resolve_all<T: ?Sized + 'static>(&self) -> ObjectsCollection<T> {
        self.try_resolve_all_key(TypeInfo::of::<T>()).cast()
    }

    fn resolve_factory<T: ?Sized + 'static>(&self) -> Result<Factory<T>, ResolveError> {
        Ok(self.resolve_factory_key(TypeInfo::of::<T>())?.cast())
    }

    fn try_resolve_factory<T: ?Sized + 'static>(&self) -> Option<Factory<T>> {
        Some(self.try_resolve_factory_key(TypeInfo::of::<T>())?.cast())
    }

    fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.is_registered_key(TypeInfo::of::<T>())
    }

    /// Resolves every argument of `function` and calls it
    ///
    /// ```ignore
    /// container.invoke_with_dependencies(|reader: Arc<dyn Reader>, log: Option<Arc<Log>>| {
    ///     // use dependencies
    /// })?;
    /// ```
    fn invoke_with_dependencies<Args, F: InvokeWithDependencies<Args>>(
        &self,
        function: F,
    ) -> Result<F::Output, ResolveError> {
        function.invoke(self)
    }
}
impl<R: Resolver + ?Sized> ResolverExt for R {}

/// Injects dependencies into existing objects
pub trait Injector: Send + Sync {
    /// Runs the dependency initializer of the object's class
    ///
    /// Returns false if the class has nothing to inject.
    fn inject(&self, object: &Instance) -> Result<bool, ResolveError>;

    fn can_inject(&self, class: TypeInfo) -> bool;
}

/// Selects the [Injector] used for a newly constructed object
pub trait InjectorProvider: Send + Sync {
    fn get_injector(&self, target: &Instance) -> Option<Arc<dyn Injector>>;
}

/// Container of registrations, resolving objects with their configured lifetime
///
/// Containers are immutable once built, only singleton caches get filled afterwards.
/// A nested container keeps its parent alive and falls back to it for every key it does not
/// register itself.
pub struct ObjectContainer {
    pub(crate) this: Weak<ObjectContainer>,
    /// Handed out under the built-in keys
    pub(crate) handle: Arc<ContainerHandle>,
    pub(crate) parent: Option<Arc<ObjectContainer>>,
    /// Every ancestor, starting with the root
    pub(crate) ancestors: Vec<Arc<ObjectContainer>>,
    pub(crate) registrations: Registrations,
    pub(crate) reflection: Arc<dyn Reflection>,
    pub(crate) allocator: Arc<dyn ObjectAllocator>,
    /// Owner scope handed to the allocator for new objects
    pub(crate) outer: Option<Instance>,
    pub(crate) lifecycle: ObjectLifecycle,
}
impl Debug for ObjectContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("ObjectContainer");
        for index in 0..self.registrations.key_count() {
            if let Some((key, list)) = self.registrations.get_index(index) {
                map.field(key.type_name, &list.len());
            }
        }
        map.field("depth", &self.ancestors.len());
        map.finish()
    }
}

impl ObjectContainer {
    pub fn parent(&self) -> Option<&Arc<ObjectContainer>> {
        self.parent.as_ref()
    }

    pub fn outer_for_new_objects(&self) -> Option<&Instance> {
        self.outer.as_ref()
    }

    /// Containers from the root ancestor down to this one
    pub fn inheritance_chain(&self) -> Vec<Arc<ObjectContainer>> {
        self.ancestors
            .iter()
            .cloned()
            .chain(self.this.upgrade())
            .collect()
    }

    /// Iterates over all registrations whose key is `T` or a subtype of it
    ///
    /// With [IterationScope::IncludeParents] registrations of the ancestors come first.
    pub fn create_iterator<T: ?Sized + 'static>(
        &self,
        scope: IterationScope,
    ) -> ObjectContainerIterator<T> {
        let containers = match scope {
            IterationScope::CurrentContainer => self.this.upgrade().into_iter().collect(),
            IterationScope::IncludeParents => self.inheritance_chain(),
        };

        ObjectContainerIterator::new(containers, TypeInfo::of::<T>(), KeyMatch::Subtype)
    }

    pub(crate) fn lifecycle(&self) -> &ObjectLifecycle {
        &self.lifecycle
    }

    /// Nearest registration list for `key`, together with the container owning it
    ///
    /// A child's list fully shadows the lists of its ancestors.
    pub(crate) fn find_registration_list(
        &self,
        key: TypeInfo,
    ) -> Option<(&RegistrationList, &ObjectContainer)> {
        match self.registrations.get(&key) {
            Some(list) if !list.is_empty() => Some((list, self)),
            _ => self.parent.as_deref()?.find_registration_list(key),
        }
    }

    /// The registration single resolves use - the first one of the nearest list
    pub(crate) fn find_registration(
        &self,
        key: TypeInfo,
    ) -> Option<(&Registration, &ObjectContainer)> {
        let (list, owner) = self.find_registration_list(key)?;
        Some((list.first()?, owner))
    }

    /// Gets an instance from the registration, which must be owned by this container
    pub(crate) fn resolve_registration(
        &self,
        registration: &Registration,
    ) -> Result<Instance, ResolveError> {
        tracing::trace!(
            "Resolving '{}' as '{}'",
            registration.key,
            registration.effective_class
        );

        registration.lifetime.get(self).ok_or_else(|| {
            tracing::warn!(
                "Failed to create '{}' for '{}'",
                registration.effective_class,
                registration.key
            );
            ResolveError::ConstructionFailed(registration.effective_class)
        })
    }

    /// Constructs a new object through the allocator and injects its dependencies
    pub(crate) fn construct_object(&self, class: TypeInfo) -> Option<Instance> {
        let instance = self.allocator.construct_new(class, self.outer.as_ref())?;
        tracing::trace!("Constructed instance of {}", class);
        self.lifecycle.notify_constructed(&instance, self);

        if let Err(error) = self.inject_on_construction(&instance) {
            tracing::error!(
                "Injecting dependencies into '{}' failed - error: {}",
                class,
                error
            );
            return None;
        }
        self.lifecycle.notify_injected(&instance, self);
        self.lifecycle.notify_created(&instance, self);

        Some(instance)
    }

    fn inject_on_construction(&self, instance: &Instance) -> Result<bool, ResolveError> {
        // Injector providers are injected directly, resolving one might construct this very object
        let provider_key = TypeInfo::of::<dyn InjectorProvider>();
        if !self.reflection.implements(instance.info, provider_key) {
            let injector = self
                .try_resolve::<dyn InjectorProvider>()
                .and_then(|provider| provider.get_injector(instance));

            if let Some(injector) = injector {
                return injector.inject(instance);
            }
        }

        self.inject(instance)
    }

    fn not_registered(key: TypeInfo) -> ResolveError {
        tracing::error!("Tried to resolve an unregistered type: {}", key);
        ResolveError::NotRegistered(key)
    }
}

impl Resolver for ObjectContainer {
    fn resolve_key(&self, key: TypeInfo) -> Result<Instance, ResolveError> {
        let (registration, owner) = self
            .find_registration(key)
            .ok_or_else(|| Self::not_registered(key))?;

        owner.resolve_registration(registration)
    }

    fn try_resolve_key(&self, key: TypeInfo) -> Option<Instance> {
        let (registration, owner) = self.find_registration(key)?;
        owner.resolve_registration(registration).ok()
    }

    fn resolve_all_key(&self, key: TypeInfo) -> Result<ObjectsCollection<Object>, ResolveError> {
        if !self.is_registered_key(key) {
            return Err(Self::not_registered(key));
        }

        Ok(self.try_resolve_all_key(key))
    }

    fn try_resolve_all_key(&self, key: TypeInfo) -> ObjectsCollection<Object> {
        ObjectsCollection::new(self.this.clone(), key)
    }

    fn resolve_factory_key(&self, key: TypeInfo) -> Result<Factory<Object>, ResolveError> {
        self.try_resolve_factory_key(key)
            .ok_or_else(|| Self::not_registered(key))
    }

    fn try_resolve_factory_key(&self, key: TypeInfo) -> Option<Factory<Object>> {
        let (registration, owner) = self.find_registration(key)?;
        Some(Factory::new(registration.clone(), owner.this.clone()))
    }

    fn is_registered_key(&self, key: TypeInfo) -> bool {
        self.find_registration_list(key).is_some()
    }

    fn reflection(&self) -> &dyn Reflection {
        self.reflection.as_ref()
    }
}

impl Injector for ObjectContainer {
    fn inject(&self, object: &Instance) -> Result<bool, ResolveError> {
        let Some(initializer) = self.reflection.initializer(object.info) else {
            return Ok(false);
        };

        initializer(object, self)?;
        tracing::trace!("Injected dependencies into {}", object.info);
        Ok(true)
    }

    fn can_inject(&self, class: TypeInfo) -> bool {
        self.reflection.initializer(class).is_some()
    }
}

impl InjectorProvider for ObjectContainer {
    fn get_injector(&self, _target: &Instance) -> Option<Arc<dyn Injector>> {
        Some(self.handle.clone())
    }
}

/// Weak handle to an [ObjectContainer], resolved under [Resolver], [Injector] and
/// [InjectorProvider]
///
/// Objects holding on to the handle do not keep the container alive, so a singleton can depend
/// on its own container. Once the container is dropped every call fails with
/// [ResolveError::ContainerDropped] or yields nothing.
pub struct ContainerHandle {
    container: Weak<ObjectContainer>,
    reflection: Arc<dyn Reflection>,
}
impl Debug for ContainerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerHandle")
            .field("alive", &(self.container.strong_count() > 0))
            .finish()
    }
}

impl ContainerHandle {
    pub(crate) fn new(container: Weak<ObjectContainer>, reflection: Arc<dyn Reflection>) -> Self {
        ContainerHandle {
            container,
            reflection,
        }
    }

    /// The container, if it is still alive
    pub fn container(&self) -> Option<Arc<ObjectContainer>> {
        self.container.upgrade()
    }

    fn require(&self) -> Result<Arc<ObjectContainer>, ResolveError> {
        self.container().ok_or(ResolveError::ContainerDropped)
    }
}

impl Resolver for ContainerHandle {
    fn resolve_key(&self, key: TypeInfo) -> Result<Instance, ResolveError> {
        self.require()?.resolve_key(key)
    }

    fn try_resolve_key(&self, key: TypeInfo) -> Option<Instance> {
        self.container()?.try_resolve_key(key)
    }

    fn resolve_all_key(&self, key: TypeInfo) -> Result<ObjectsCollection<Object>, ResolveError> {
        self.require()?.resolve_all_key(key)
    }

    fn try_resolve_all_key(&self, key: TypeInfo) -> ObjectsCollection<Object> {
        ObjectsCollection::new(self.container.clone(), key)
    }

    fn resolve_factory_key(&self, key: TypeInfo) -> Result<Factory<Object>, ResolveError> {
        self.require()?.resolve_factory_key(key)
    }

    fn try_resolve_factory_key(&self, key: TypeInfo) -> Option<Factory<Object>> {
        self.container()?.try_resolve_factory_key(key)
    }

    fn is_registered_key(&self, key: TypeInfo) -> bool {
        self.container()
            .is_some_and(|container| container.is_registered_key(key))
    }

    fn reflection(&self) -> &dyn Reflection {
        self.reflection.as_ref()
    }
}

impl Injector for ContainerHandle {
    fn inject(&self, object: &Instance) -> Result<bool, ResolveError> {
        self.require()?.inject(object)
    }

    fn can_inject(&self, class: TypeInfo) -> bool {
        self.reflection.initializer(class).is_some()
    }
}

impl InjectorProvider for ContainerHandle {
    fn get_injector(&self, target: &Instance) -> Option<Arc<dyn Injector>> {
        self.container()?.get_injector(target)
    }
}
