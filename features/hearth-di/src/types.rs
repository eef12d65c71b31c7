use std::{
    any::{Any, TypeId},
    fmt::Debug,
    sync::Arc,
};

use crate::reflection::Reflection;

/// Any managed object, shared between the container and its consumers
pub type Object = dyn Any + Send + Sync;

/// Anything the container hands out must be shareable across threads and live for 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

/// Type Name and Type Id
///
/// Used as the key for every registration, class or interface alike.
/// Interfaces are trait objects, so `TypeInfo::of::<dyn Reader>()` is a valid key.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }

    /// The root key - every other key is a subtype of it
    pub fn object() -> TypeInfo {
        TypeInfo::of::<Object>()
    }
}

/// Which interfaces `by_interfaces` collects from an implementation class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InterfaceScope {
    /// Only interfaces declared on the implementation class itself
    #[default]
    CurrentClass,
    /// Interfaces declared on the implementation class and all of its ancestors
    CurrentAndAncestors,
}

/// A managed object together with its concrete class
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    pub instance: Arc<Object>,
    identity: fn(&Arc<Object>) -> Box<dyn Any>,
}
impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Instance").field(&self.info.type_name).finish()
    }
}

impl Instance {
    pub fn new<T: Injectable>(instance: T) -> Self {
        Self::from_arc(Arc::new(instance))
    }

    pub fn from_arc<T: Injectable>(instance: Arc<T>) -> Self {
        Instance {
            info: TypeInfo::of::<T>(),
            instance,
            identity: identity_cast::<T>,
        }
    }

    /// Downcasts to the concrete class of the instance
    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match Arc::downcast::<T>(self.instance.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }

    /// Views the instance as `T`
    ///
    /// `T` may be the root [Object], the concrete class itself, or anything
    /// `reflection` knows how to cast the class to (interfaces, superclasses).
    pub fn cast<T: ?Sized + 'static>(&self, reflection: &dyn Reflection) -> Option<Arc<T>> {
        let target = TypeInfo::of::<T>();

        let boxed: Box<dyn Any> = if target == TypeInfo::object() {
            Box::new(self.instance.clone())
        } else if target == self.info {
            self.identity_boxed()
        } else {
            reflection.cast(self, target)?
        };

        boxed.downcast::<Arc<T>>().ok().map(|arc| *arc)
    }

    pub(crate) fn identity_boxed(&self) -> Box<dyn Any> {
        (self.identity)(&self.instance)
    }

    /// Whether both point to the same allocation
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }
}

fn identity_cast<T: Injectable>(object: &Arc<Object>) -> Box<dyn Any> {
    match Arc::downcast::<T>(object.clone()) {
        Ok(typed) => Box::new(typed),
        Err(_) => Box::new(()),
    }
}
