use std::{
    fmt::Debug,
    ops::Deref,
    sync::{Arc, OnceLock, Weak},
};

use crate::{
    container::{Resolver, ResolverExt},
    errors::ResolveError,
    resolver::Dependency,
    types::TypeInfo,
};

/// Lazily resolved dependency
///
/// The registration is checked when the dependency is injected, the instance itself is only
/// resolved on first access. Useful to break construction cycles between singletons.
///
/// ### Panics
///
/// [Lazy::get] and [Deref] panic if resolving fails on access, e.g. because the container has
/// been dropped in the meantime. Use [Lazy::try_get] to handle that case.
pub struct Lazy<T: ?Sized>(Arc<LazyInner<T>>);
impl<T: ?Sized> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Lazy(self.0.clone())
    }
}
impl<T: ?Sized + Debug> Debug for Lazy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.once.get() {
            Some(Ok(instance)) => f.debug_tuple("Lazy").field(instance).finish(),
            Some(Err(e)) => f.debug_tuple("Lazy").field(e).finish(),
            None => f.debug_tuple("Lazy").field(&"unresolved").finish(),
        }
    }
}
struct LazyInner<T: ?Sized> {
    once: OnceLock<Result<Arc<T>, ResolveError>>,
    resolver: Weak<dyn Resolver>,
}
impl<T: ?Sized + 'static> Deref for Lazy<T> {
    type Target = Arc<T>;

    fn deref(&self) -> &Self::Target {
        self.get()
    }
}
impl<T: ?Sized + 'static> Dependency for Lazy<T> {
    fn resolve<R: Resolver + ?Sized>(resolver: &R) -> Result<Self, ResolveError> {
        if !resolver.is_registered::<T>() {
            tracing::error!("Lazy dependency on unregistered type: {}", TypeInfo::of::<T>());
            return Err(ResolveError::NotRegistered(TypeInfo::of::<T>()));
        }

        // The resolving container registers itself, so this is the nearest container of the chain
        let handle = resolver.resolve::<dyn Resolver>()?;

        Ok(Lazy(Arc::new(LazyInner {
            once: OnceLock::new(),
            resolver: Arc::downgrade(&handle),
        })))
    }
}
impl<T: ?Sized + 'static> Lazy<T> {
    /// Accesses the Lazy Dependency
    ///
    /// # Panics
    /// - When the dependency could not be resolved
    pub fn get(&self) -> &Arc<T> {
        self.try_get()
            .expect("Lazy dependency failed to resolve")
    }

    /// Accesses the lazy dependency, resolving it on first access
    ///
    /// The outcome of the first access is kept, failures are not retried.
    pub fn try_get(&self) -> Result<&Arc<T>, &ResolveError> {
        self.0
            .once
            .get_or_init(|| match self.0.resolver.upgrade() {
                Some(resolver) => resolver.resolve::<T>(),
                None => Err(ResolveError::ContainerDropped),
            })
            .as_ref()
    }

    /// Whether the dependency has been accessed already
    pub fn is_resolved(&self) -> bool {
        self.0.once.get().is_some()
    }
}

/// Lazily resolved optional dependency
///
/// Injection succeeds even if `T` is not registered, [LazyOption::get] then returns None.
pub struct LazyOption<T: ?Sized> {
    lazy: Option<Lazy<T>>,
}
impl<T: ?Sized> Clone for LazyOption<T> {
    fn clone(&self) -> Self {
        LazyOption {
            lazy: self.lazy.clone(),
        }
    }
}
impl<T: ?Sized + Debug> Debug for LazyOption<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.lazy {
            Some(lazy) => f.debug_tuple("LazyOption").field(lazy).finish(),
            None => f.debug_tuple("LazyOption").field(&"None").finish(),
        }
    }
}
impl<T: ?Sized + 'static> Dependency for LazyOption<T> {
    fn resolve<R: Resolver + ?Sized>(resolver: &R) -> Result<Self, ResolveError> {
        Ok(LazyOption {
            lazy: Option::<Lazy<T>>::resolve(resolver)?,
        })
    }
}
impl<T: ?Sized + 'static> LazyOption<T> {
    /// Accesses the Lazy Dependency - returning an error on access
    pub fn try_get(&self) -> Option<Result<&Arc<T>, &ResolveError>> {
        self.lazy.as_ref().map(Lazy::try_get)
    }

    /// Accesses the Lazy Dependency
    ///
    /// # Panics
    /// - When `T` is registered but could not be resolved
    pub fn get(&self) -> Option<&Arc<T>> {
        self.lazy.as_ref().map(Lazy::get)
    }
}
