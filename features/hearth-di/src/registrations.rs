use std::{fmt::Debug, sync::Arc};

use indexmap::IndexMap;

use crate::{lifetimes::LifetimeHandler, types::TypeInfo};

/// One binding: resolving `key` may produce an `effective_class` obtained through `lifetime`
#[derive(Clone)]
pub(crate) struct Registration {
    pub key: TypeInfo,
    pub effective_class: TypeInfo,
    pub lifetime: Arc<dyn LifetimeHandler>,
}
impl Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key.type_name)
            .field("effective_class", &self.effective_class.type_name)
            .finish()
    }
}

/// All registrations of a single key, in insertion order
pub(crate) type RegistrationList = Vec<Registration>;

/// Registrations of a single container
///
/// Keys keep the order they were first registered in, which makes iteration stable.
#[derive(Default)]
pub(crate) struct Registrations {
    map: IndexMap<TypeInfo, RegistrationList>,
}

impl Registrations {
    pub fn add(
        &mut self,
        key: TypeInfo,
        effective_class: TypeInfo,
        lifetime: Arc<dyn LifetimeHandler>,
    ) {
        self.map.entry(key).or_default().push(Registration {
            key,
            effective_class,
            lifetime,
        });
    }

    pub fn get(&self, key: &TypeInfo) -> Option<&RegistrationList> {
        self.map.get(key)
    }

    /// Key and list at position `index`
    pub fn get_index(&self, index: usize) -> Option<(&TypeInfo, &RegistrationList)> {
        self.map.get_index(index)
    }

    pub fn key_count(&self) -> usize {
        self.map.len()
    }

    pub fn registration_count(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }
}
