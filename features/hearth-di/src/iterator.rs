use std::{fmt::Debug, marker::PhantomData, sync::Arc};

use crate::{
    container::ObjectContainer,
    registrations::Registration,
    types::TypeInfo,
};

/// Which containers an iterator visits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IterationScope {
    /// Only the container the iterator was created from
    #[default]
    CurrentContainer,
    /// The root ancestor first, down to the container the iterator was created from
    IncludeParents,
}

/// How registration keys are compared with the desired key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyMatch {
    Exact,
    Subtype,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Position {
    container: usize,
    key: usize,
    entry: usize,
}

/// Cursor over the registrations of one or more containers
///
/// Visits containers in order, keys in their registration order and every registration of a
/// matching key. Nothing is constructed while advancing.
pub struct ObjectContainerIterator<T: ?Sized> {
    containers: Vec<Arc<ObjectContainer>>,
    desired: TypeInfo,
    key_match: KeyMatch,
    position: Option<Position>,
    _marker: PhantomData<fn() -> Arc<T>>,
}
impl<T: ?Sized> Debug for ObjectContainerIterator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectContainerIterator")
            .field("desired", &self.desired.type_name)
            .field("key_match", &self.key_match)
            .field("position", &self.position)
            .finish()
    }
}

impl<T: ?Sized + 'static> ObjectContainerIterator<T> {
    pub(crate) fn new(
        containers: Vec<Arc<ObjectContainer>>,
        desired: TypeInfo,
        key_match: KeyMatch,
    ) -> Self {
        let mut iterator = ObjectContainerIterator {
            containers,
            desired,
            key_match,
            position: None,
            _marker: PhantomData,
        };
        iterator.position = iterator.seek(Position::default());
        iterator
    }

    /// True while the iterator points at a registration
    pub fn has_value(&self) -> bool {
        self.position.is_some()
    }

    /// Moves to the next matching registration. Does nothing once exhausted
    pub fn advance(&mut self) {
        if let Some(position) = self.position {
            self.position = self.seek(Position {
                entry: position.entry + 1,
                ..position
            });
        }
    }

    /// Instance of the current registration
    ///
    /// Without `create_if_not_exists` only already existing instances are returned: external
    /// instances and singletons that have been resolved before.
    /// Returns None if the iterator is exhausted or the instance is not a `T`.
    pub fn get(&self, create_if_not_exists: bool) -> Option<Arc<T>> {
        let (registration, owner) = self.current()?;

        let instance = match registration.lifetime.existing() {
            Some(instance) => instance,
            None if create_if_not_exists => owner.resolve_registration(registration).ok()?,
            None => return None,
        };

        instance.cast::<T>(owner.reflection.as_ref())
    }

    /// Key of the current registration
    pub fn key(&self) -> Option<TypeInfo> {
        Some(self.current()?.0.key)
    }

    /// Class the current registration produces
    pub fn effective_class(&self) -> Option<TypeInfo> {
        Some(self.current()?.0.effective_class)
    }

    /// Container owning the current registration
    pub fn container(&self) -> Option<&Arc<ObjectContainer>> {
        self.containers.get(self.position?.container)
    }

    fn current(&self) -> Option<(&Registration, &ObjectContainer)> {
        let position = self.position?;
        let container = self.containers.get(position.container)?;
        let (_, list) = container.registrations.get_index(position.key)?;

        Some((list.get(position.entry)?, container.as_ref()))
    }

    fn matches(&self, container: &ObjectContainer, key: TypeInfo) -> bool {
        match self.key_match {
            KeyMatch::Exact => key == self.desired,
            KeyMatch::Subtype => container.reflection.is_subtype(key, self.desired),
        }
    }

    /// First valid position at or after `from`
    fn seek(&self, mut from: Position) -> Option<Position> {
        while let Some(container) = self.containers.get(from.container) {
            while let Some((key, list)) = container.registrations.get_index(from.key) {
                if from.entry < list.len() && self.matches(container, *key) {
                    return Some(from);
                }
                from.key += 1;
                from.entry = 0;
            }
            from.container += 1;
            from.key = 0;
            from.entry = 0;
        }

        None
    }
}
