use std::{ops::Deref, sync::Arc};

use hearth_di::{Dependency, ResolveError, Resolver, ResolverExt, TypeInfo};

use crate::provider::ConfigProvider;

/// A wrapper type to allow for config injections
///
/// This provides a simple way to retrieve configs from the installed [ConfigProvider],
/// and inject them as a dependency
///
/// # Example
/// ```ignore
/// #[derive(Clone)]
/// pub struct MyModuleConfig {
///     enabled: bool,
/// }
///
/// let mut config_provider = ConfigProvider::new();
/// config_provider.add_config(MyModuleConfig { enabled: true })?;
///
/// let mut builder = ObjectContainerBuilder::new(registry);
/// config_provider.install(&mut builder);
/// let container = builder.build()?;
///
/// let enabled = container.invoke_with_dependencies(|config: Config<MyModuleConfig>| config.enabled)?;
/// ```
///
/// A missing config resolves as [ResolveError::NotRegistered], so `Option<Config<T>>` can be
/// used for optional configs.
pub struct Config<T> {
    inner: Arc<T>,
}
impl<T> Clone for Config<T> {
    fn clone(&self) -> Self {
        Config {
            inner: self.inner.clone(),
        }
    }
}
impl<T> Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl<T> Config<T> {
    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}

impl<T: Send + Sync + 'static> Dependency for Config<T> {
    fn resolve<R: Resolver + ?Sized>(resolver: &R) -> Result<Self, ResolveError> {
        let config_provider = resolver.resolve::<ConfigProvider>()?;

        let inner = config_provider.require_config::<T>().map_err(|e| {
            tracing::error!("{}", e);
            ResolveError::NotRegistered(TypeInfo::of::<T>())
        })?;

        Ok(Config { inner })
    }
}
