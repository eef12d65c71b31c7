use std::{any::TypeId, collections::HashMap, sync::Arc};

use hearth_di::{Object, ObjectContainerBuilder, TypeInfo};

use crate::errors::ConfigError;

/// A provider to register all configs.
///
/// Configs can be registered and retrieved based on type.
/// Once filled, [ConfigProvider::install] hands it to a container builder, after which configs
/// can be injected as [Config](crate::config::Config).
#[derive(Default)]
pub struct ConfigProvider {
    configs: HashMap<TypeId, (TypeInfo, Arc<Object>)>,
}

impl ConfigProvider {
    /// Initializes an empty Config Provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a config with specified type.
    ///
    /// Returns None if no config of that type was added.
    pub fn get_config<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let (_, config) = self.configs.get(&TypeId::of::<T>())?;
        config.clone().downcast().ok()
    }

    /// Retrieve a config with specified type, failing with [ConfigError::ConfigMissing]
    pub fn require_config<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ConfigError> {
        self.get_config()
            .ok_or(ConfigError::ConfigMissing(TypeInfo::of::<T>()))
    }

    /// Add a config to the registry.
    ///
    /// If the config type is already registered, it will return a
    /// [`ConfigError`] runtime error
    pub fn add_config<T: Send + Sync + 'static>(
        &mut self,
        config: T,
    ) -> Result<&mut Self, ConfigError> {
        let info = TypeInfo::of::<T>();

        if self.configs.contains_key(&info.type_id) {
            return Err(ConfigError::ConfigAlreadyRegistered(info));
        }

        tracing::debug!("Adding config {}", info);
        self.configs.insert(info.type_id, (info, Arc::new(config)));
        Ok(self)
    }

    /// Can optionally add a config to the registry.
    ///
    /// If the config provided is `Some(T)`, it will be the same as calling [`ConfigProvider::add_config`]
    /// If the config provided is `None`, then the function just returns `Ok(self)` for chaining
    pub fn maybe_add_config<T: Send + Sync + 'static>(
        &mut self,
        config: Option<T>,
    ) -> Result<&mut Self, ConfigError> {
        match config {
            Some(c) => self.add_config(c),
            None => Ok(self),
        }
    }

    /// Types of all added configs
    pub fn config_types(&self) -> impl Iterator<Item = TypeInfo> + '_ {
        self.configs.values().map(|(info, _)| *info)
    }

    /// Registers this provider as a single instance on `builder`
    ///
    /// A provider installed on a nested container shadows the one of its parent.
    pub fn install(self, builder: &mut ObjectContainerBuilder) -> Arc<ConfigProvider> {
        let provider = Arc::new(self);
        tracing::debug!("Installing {} configs", provider.configs.len());
        builder.register_instance(provider.clone());
        provider
    }
}
