use std::sync::Arc;

use crate::{
    collection::{Factory, ObjectsCollection},
    container::{Resolver, ResolverExt},
    errors::ResolveError,
    resolver::Dependency,
};

impl<T: ?Sized + 'static> Dependency for Arc<T> {
    fn resolve<R: Resolver + ?Sized>(resolver: &R) -> Result<Self, ResolveError> {
        resolver.resolve::<T>()
    }
}

impl<D: Dependency> Dependency for Option<D> {
    fn resolve<R: Resolver + ?Sized>(resolver: &R) -> Result<Self, ResolveError> {
        match D::resolve(resolver) {
            Ok(resolved) => Ok(Some(resolved)),
            // Missing registrations are fine for an Option, broken ones are not
            Err(ResolveError::NotRegistered(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Every registration of `T`, possibly none
impl<T: ?Sized + 'static> Dependency for ObjectsCollection<T> {
    fn resolve<R: Resolver + ?Sized>(resolver: &R) -> Result<Self, ResolveError> {
        Ok(resolver.try_resolve_all::<T>())
    }
}

impl<T: ?Sized + 'static> Dependency for Factory<T> {
    fn resolve<R: Resolver + ?Sized>(resolver: &R) -> Result<Self, ResolveError> {
        resolver.resolve_factory::<T>()
    }
}
