use std::sync::{Arc, Weak};

use crate::{
    builder::{ObjectContainerBuilder, PendingRegistration},
    container::{ContainerHandle, Injector, InjectorProvider, ObjectContainer, Resolver},
    errors::BuildError,
    lifecycle::ObjectLifecycle,
    lifetimes::{InstanceLifetime, LifetimeHandler},
    registrations::Registrations,
    types::{Instance, TypeInfo},
};

/// Turns an [ObjectContainerBuilder] into an [ObjectContainer]
pub(crate) struct ContainerInitiator {
    blueprint: ObjectContainerBuilder,
}
impl ContainerInitiator {
    pub(crate) fn new(blueprint: ObjectContainerBuilder) -> ContainerInitiator {
        ContainerInitiator { blueprint }
    }

    pub(crate) fn initiate(
        self,
        parent: Option<Arc<ObjectContainer>>,
    ) -> Result<Arc<ObjectContainer>, BuildError> {
        let ObjectContainerBuilder {
            reflection,
            allocator,
            registrations: pending,
            outer,
            lifecycle: own_lifecycle,
        } = self.blueprint;

        // Registrations configured with an invalid interface abort the build
        if let Some(error) = pending.iter().flat_map(|p| p.errors.iter()).next() {
            tracing::error!("Invalid registration - error: {}", error);
            return Err(error.clone());
        }

        tracing::debug!(
            "Building container with {} registrations{}",
            pending.len(),
            if parent.is_some() { " nested in parent" } else { "" }
        );

        let outer = outer.or_else(|| parent.as_ref().and_then(|p| p.outer.clone()));
        let lifecycle = inherited_lifecycle(parent.as_deref(), &own_lifecycle);
        let ancestors = parent
            .as_ref()
            .map(|p| p.inheritance_chain())
            .unwrap_or_default();

        let container = Arc::new_cyclic(|this: &Weak<ObjectContainer>| {
            let handle = Arc::new(ContainerHandle::new(this.clone(), reflection.clone()));

            let mut registrations = Registrations::default();
            add_pending_registrations(&mut registrations, &pending);
            add_builtin_registrations(&mut registrations, &handle, parent.as_deref());

            ObjectContainer {
                this: this.clone(),
                handle,
                parent,
                ancestors,
                registrations,
                reflection,
                allocator,
                outer,
                lifecycle,
            }
        });
        tracing::debug!(
            "Finalized container with {} registrations under {} keys",
            container.registrations.registration_count(),
            container.registrations.key_count()
        );

        auto_create(&container, &pending);

        Ok(container)
    }
}

/// Binds every pending registration under its interfaces, or its own class if it has none
fn add_pending_registrations(registrations: &mut Registrations, pending: &[PendingRegistration]) {
    for registration in pending {
        // One handler for all keys - a singleton stays single across interfaces
        let lifetime = registration.create_lifetime_handler();
        let class = registration.implementation;

        if registration.interfaces.is_empty() {
            registrations.add(class, class, lifetime);
            continue;
        }

        for interface in &registration.interfaces {
            tracing::trace!("Binding '{}' as '{}'", class, interface);
            registrations.add(*interface, class, lifetime.clone());
        }
    }
}

/// Registers the container's handle as resolver, injector and - unless the user
/// replaced it - as injector provider
///
/// The registrations report the container class, the handle is what gets resolved.
fn add_builtin_registrations(
    registrations: &mut Registrations,
    handle: &Arc<ContainerHandle>,
    parent: Option<&ObjectContainer>,
) {
    let container_class = TypeInfo::of::<ObjectContainer>();
    let lifetime: Arc<dyn LifetimeHandler> =
        Arc::new(InstanceLifetime::new(Instance::from_arc(handle.clone())));

    registrations.add(TypeInfo::of::<dyn Resolver>(), container_class, lifetime.clone());
    registrations.add(TypeInfo::of::<dyn Injector>(), container_class, lifetime.clone());

    let provider_key = TypeInfo::of::<dyn InjectorProvider>();
    let current_provider = match registrations.get(&provider_key).and_then(|l| l.first()) {
        Some(registration) => Some(registration.effective_class),
        None => parent
            .and_then(|parent| parent.find_registration(provider_key))
            .map(|(registration, _)| registration.effective_class),
    };

    match current_provider {
        Some(class) if class != container_class => {
            tracing::debug!("Using custom injector provider '{}'", class);
        }
        _ => registrations.add(provider_key, container_class, lifetime),
    }
}

/// Resolves every auto created registration once
///
/// Failures leave the registration in place, resolving it later tries again.
fn auto_create(container: &ObjectContainer, pending: &[PendingRegistration]) {
    for registration in pending.iter().filter(|r| r.auto_create) {
        let key = registration.primary_key();
        tracing::debug!("Auto creating '{}'", key);

        if let Err(error) = container.resolve_key(key) {
            tracing::warn!("Auto creation of '{}' failed - error: {}", key, error);
        }
    }
}

/// Lifecycle listeners of `parent` followed by `own`
fn inherited_lifecycle(parent: Option<&ObjectContainer>, own: &ObjectLifecycle) -> ObjectLifecycle {
    let mut lifecycle = parent.map(|p| p.lifecycle.clone()).unwrap_or_default();
    lifecycle.extend(own);
    lifecycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::TypeRegistry;

    struct Provider;
    impl InjectorProvider for Provider {
        fn get_injector(&self, _target: &crate::Instance) -> Option<Arc<dyn Injector>> {
            None
        }
    }

    fn registry() -> Arc<TypeRegistry> {
        let mut registry = TypeRegistry::new();
        registry
            .register_class::<Provider>()
            .implements::<dyn InjectorProvider>(|provider| provider);
        Arc::new(registry)
    }

    fn provider_classes(container: &ObjectContainer) -> Vec<TypeInfo> {
        container
            .registrations
            .get(&TypeInfo::of::<dyn InjectorProvider>())
            .map(|list| list.iter().map(|r| r.effective_class).collect())
            .unwrap_or_default()
    }

    #[test]
    fn registers_builtins_after_user_registrations() {
        let mut builder = ObjectContainerBuilder::new(registry());
        builder.register_type::<Provider>();
        let container = builder.build().unwrap();

        let keys: Vec<_> = (0..container.registrations.key_count())
            .filter_map(|index| container.registrations.get_index(index))
            .map(|(key, _)| *key)
            .collect();
        assert_eq!(
            keys,
            vec![
                TypeInfo::of::<Provider>(),
                TypeInfo::of::<dyn Resolver>(),
                TypeInfo::of::<dyn Injector>(),
                TypeInfo::of::<dyn InjectorProvider>(),
            ]
        );
        assert!(container.ancestors.is_empty());
    }

    #[test]
    fn keeps_user_injector_provider() {
        let mut builder = ObjectContainerBuilder::new(registry());
        builder
            .register_instance(Arc::new(Provider))
            .as_interface::<dyn InjectorProvider>();
        let parent = builder.build().unwrap();
        assert_eq!(provider_classes(&parent), vec![TypeInfo::of::<Provider>()]);

        let child = ObjectContainerBuilder::new(registry())
            .build_nested(&parent)
            .unwrap();
        assert!(provider_classes(&child).is_empty());
        assert_eq!(child.ancestors.len(), 1);
    }

    #[test]
    fn container_provider_in_parent_is_replaced_in_child() {
        let parent = ObjectContainerBuilder::new(registry()).build().unwrap();
        let child = ObjectContainerBuilder::new(registry())
            .build_nested(&parent)
            .unwrap();

        let container_class = TypeInfo::of::<ObjectContainer>();
        assert_eq!(provider_classes(&parent), vec![container_class]);
        assert_eq!(provider_classes(&child), vec![container_class]);
    }
}
