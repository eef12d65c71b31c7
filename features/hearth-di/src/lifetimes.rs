use std::sync::{Arc, OnceLock};

use crate::{
    container::ObjectContainer,
    types::{Instance, TypeInfo},
};

/// User supplied function producing instances
pub(crate) type FactoryFn = Arc<dyn Fn(&ObjectContainer) -> Option<Instance> + Send + Sync>;

/// How an instance for a registration is obtained
///
/// Handlers are shared between every registration of the same pending registration, so a
/// singleton bound under several keys is only created once.
pub(crate) trait LifetimeHandler: Send + Sync {
    /// The already existing instance - never constructs
    fn existing(&self) -> Option<Instance>;

    /// Returns an instance, constructing it through `owner` if required
    fn get(&self, owner: &ObjectContainer) -> Option<Instance>;
}

/// Where new instances come from
#[derive(Clone)]
pub(crate) enum Producer {
    /// Constructed by the allocator, then injected
    Class(TypeInfo),
    /// Created by a user supplied factory
    Factory(FactoryFn),
}
impl Producer {
    fn produce(&self, owner: &ObjectContainer) -> Option<Instance> {
        match self {
            Producer::Class(class) => owner.construct_object(*class),
            Producer::Factory(factory) => {
                let instance = factory(owner)?;
                owner.lifecycle().notify_created(&instance, owner);
                Some(instance)
            }
        }
    }
}

/// Creates the instance on first use and caches it
///
/// The cache is filled with a check-then-set and no lock is held while producing:
/// concurrent first resolves may run the producer more than once, only the first result is kept.
pub(crate) struct SingletonLifetime {
    producer: Producer,
    cache: OnceLock<Instance>,
}
impl SingletonLifetime {
    pub(crate) fn new(producer: Producer) -> Self {
        Self {
            producer,
            cache: OnceLock::new(),
        }
    }
}
impl LifetimeHandler for SingletonLifetime {
    fn existing(&self) -> Option<Instance> {
        self.cache.get().cloned()
    }

    fn get(&self, owner: &ObjectContainer) -> Option<Instance> {
        if let Some(instance) = self.cache.get() {
            return Some(instance.clone());
        }

        let created = self.producer.produce(owner)?;
        Some(self.cache.get_or_init(|| created).clone())
    }
}

/// Creates a new instance every time
pub(crate) struct TransientLifetime {
    producer: Producer,
}
impl TransientLifetime {
    pub(crate) fn new(producer: Producer) -> Self {
        Self { producer }
    }
}
impl LifetimeHandler for TransientLifetime {
    fn existing(&self) -> Option<Instance> {
        None
    }

    fn get(&self, owner: &ObjectContainer) -> Option<Instance> {
        self.producer.produce(owner)
    }
}

/// Hands out an instance created outside of the container, keeping it alive
pub(crate) struct InstanceLifetime {
    instance: Instance,
}
impl InstanceLifetime {
    pub(crate) fn new(instance: Instance) -> Self {
        Self { instance }
    }
}
impl LifetimeHandler for InstanceLifetime {
    fn existing(&self) -> Option<Instance> {
        Some(self.instance.clone())
    }

    fn get(&self, _owner: &ObjectContainer) -> Option<Instance> {
        self.existing()
    }
}
