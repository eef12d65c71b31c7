use std::{
    fmt::Debug,
    marker::PhantomData,
    sync::{Arc, Weak},
};

use crate::{
    container::ObjectContainer,
    errors::ResolveError,
    iterator::{KeyMatch, ObjectContainerIterator},
    registrations::Registration,
    types::TypeInfo,
};

/// Every registration of a key across a container chain
///
/// Lazy: instances are resolved one by one while iterating, ancestors first.
/// Registrations which fail to produce a `T` are skipped.
pub struct ObjectsCollection<T: ?Sized> {
    container: Weak<ObjectContainer>,
    key: TypeInfo,
    _marker: PhantomData<fn() -> Arc<T>>,
}
impl<T: ?Sized> Clone for ObjectsCollection<T> {
    fn clone(&self) -> Self {
        ObjectsCollection {
            container: self.container.clone(),
            key: self.key,
            _marker: PhantomData,
        }
    }
}
impl<T: ?Sized> Debug for ObjectsCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectsCollection")
            .field("key", &self.key.type_name)
            .finish()
    }
}

impl<T: ?Sized + 'static> ObjectsCollection<T> {
    pub(crate) fn new(container: Weak<ObjectContainer>, key: TypeInfo) -> Self {
        ObjectsCollection {
            container,
            key,
            _marker: PhantomData,
        }
    }

    /// Same registrations, viewed as `U`
    pub fn cast<U: ?Sized + 'static>(self) -> ObjectsCollection<U> {
        ObjectsCollection::new(self.container, self.key)
    }

    pub fn key(&self) -> TypeInfo {
        self.key
    }

    /// Number of registrations - does not construct anything
    pub fn len(&self) -> usize {
        let Some(container) = self.container.upgrade() else {
            return 0;
        };

        container
            .inheritance_chain()
            .iter()
            .filter_map(|container| container.registrations.get(&self.key))
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> ObjectsIter<T> {
        let cursor = match self.container.upgrade() {
            Some(container) => Some(ObjectContainerIterator::new(
                container.inheritance_chain(),
                self.key,
                KeyMatch::Exact,
            )),
            None => {
                tracing::warn!(
                    "Iterating '{}' of a dropped container yields nothing",
                    self.key
                );
                None
            }
        };

        ObjectsIter { cursor }
    }

    /// Resolves every registration at once
    pub fn to_vec(&self) -> Vec<Arc<T>> {
        self.iter().collect()
    }
}

impl<'a, T: ?Sized + 'static> IntoIterator for &'a ObjectsCollection<T> {
    type Item = Arc<T>;
    type IntoIter = ObjectsIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over an [ObjectsCollection]
pub struct ObjectsIter<T: ?Sized> {
    cursor: Option<ObjectContainerIterator<T>>,
}

impl<T: ?Sized + 'static> Iterator for ObjectsIter<T> {
    type Item = Arc<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;

        while cursor.has_value() {
            let item = cursor.get(true);
            let class = cursor.effective_class();
            cursor.advance();

            match item {
                Some(item) => return Some(item),
                None => tracing::warn!(
                    "Skipping registration of '{}' which did not produce an instance",
                    class.map_or("unknown", |class| class.type_name)
                ),
            }
        }

        None
    }
}

/// Creates instances from one fixed registration
///
/// Every call to [Factory::create] goes through the registration's lifetime again: transient
/// registrations produce a new instance each time, singletons keep returning the cached one.
pub struct Factory<T: ?Sized> {
    registration: Registration,
    owner: Weak<ObjectContainer>,
    _marker: PhantomData<fn() -> Arc<T>>,
}
impl<T: ?Sized> Clone for Factory<T> {
    fn clone(&self) -> Self {
        Factory {
            registration: self.registration.clone(),
            owner: self.owner.clone(),
            _marker: PhantomData,
        }
    }
}
impl<T: ?Sized> Debug for Factory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Factory").field(&self.registration).finish()
    }
}

impl<T: ?Sized + 'static> Factory<T> {
    pub(crate) fn new(registration: Registration, owner: Weak<ObjectContainer>) -> Self {
        Factory {
            registration,
            owner,
            _marker: PhantomData,
        }
    }

    /// Same registration, producing `U`
    pub fn cast<U: ?Sized + 'static>(self) -> Factory<U> {
        Factory::new(self.registration, self.owner)
    }

    /// Class instances are created as
    pub fn effective_class(&self) -> TypeInfo {
        self.registration.effective_class
    }

    pub fn create(&self) -> Result<Arc<T>, ResolveError> {
        let owner = self.owner.upgrade().ok_or(ResolveError::ContainerDropped)?;
        let instance = owner.resolve_registration(&self.registration)?;

        instance
            .cast::<T>(owner.reflection.as_ref())
            .ok_or(ResolveError::CastFailed {
                required_type: TypeInfo::of::<T>(),
                actual_type: instance.info,
            })
    }

    pub fn try_create(&self) -> Option<Arc<T>> {
        self.create().ok()
    }
}
