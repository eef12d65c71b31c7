use std::sync::Arc;

use crate::{container::ObjectContainer, types::Instance};

/// Listener called with the affected instance and the container that created it
pub type LifecycleListener = Arc<dyn Fn(&Instance, &ObjectContainer) + Send + Sync>;

/// Listeners notified while the container creates objects
///
/// A nested container starts out with the listeners of its parent.
#[derive(Clone, Default)]
pub struct ObjectLifecycle {
    /// Right after the allocator constructed the object, before dependencies are injected
    constructed: Vec<LifecycleListener>,
    /// After dependencies have been injected into the object
    injected: Vec<LifecycleListener>,
    /// When the object is fully created and ready
    created: Vec<LifecycleListener>,
}

impl ObjectLifecycle {
    pub fn on_constructed(&mut self, listener: LifecycleListener) {
        self.constructed.push(listener);
    }

    pub fn on_injected(&mut self, listener: LifecycleListener) {
        self.injected.push(listener);
    }

    pub fn on_created(&mut self, listener: LifecycleListener) {
        self.created.push(listener);
    }

    /// Appends all listeners of `other`
    pub(crate) fn extend(&mut self, other: &ObjectLifecycle) {
        self.constructed.extend(other.constructed.iter().cloned());
        self.injected.extend(other.injected.iter().cloned());
        self.created.extend(other.created.iter().cloned());
    }

    pub(crate) fn notify_constructed(&self, instance: &Instance, container: &ObjectContainer) {
        notify(&self.constructed, instance, container);
    }

    pub(crate) fn notify_injected(&self, instance: &Instance, container: &ObjectContainer) {
        notify(&self.injected, instance, container);
    }

    pub(crate) fn notify_created(&self, instance: &Instance, container: &ObjectContainer) {
        notify(&self.created, instance, container);
    }
}

fn notify(listeners: &[LifecycleListener], instance: &Instance, container: &ObjectContainer) {
    for listener in listeners {
        listener(instance, container);
    }
}
