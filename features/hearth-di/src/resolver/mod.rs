use crate::{container::Resolver, errors::ResolveError};

pub mod arc;
pub mod lazy;

/// Something that can be pulled out of a [Resolver]
///
/// Implemented for `Arc<T>` (required), `Option<D>` (optional), [Lazy](lazy::Lazy),
/// [ObjectsCollection](crate::ObjectsCollection), [Factory](crate::Factory) and tuples of up to
/// eight dependencies.
pub trait Dependency: Sized {
    fn resolve<R: Resolver + ?Sized>(resolver: &R) -> Result<Self, ResolveError>;
}

macro_rules! impl_dependency_tuple {
    ($($dep:ident),*) => {
        impl<$($dep: Dependency),*> Dependency for ($($dep,)*) {
            #[allow(unused_variables)]
            fn resolve<R: Resolver + ?Sized>(resolver: &R) -> Result<Self, ResolveError> {
                Ok(($($dep::resolve(resolver)?,)*))
            }
        }
    };
}

impl_dependency_tuple!();
impl_dependency_tuple!(A);
impl_dependency_tuple!(A, B);
impl_dependency_tuple!(A, B, C);
impl_dependency_tuple!(A, B, C, D);
impl_dependency_tuple!(A, B, C, D, E);
impl_dependency_tuple!(A, B, C, D, E, F);
impl_dependency_tuple!(A, B, C, D, E, F, G);
impl_dependency_tuple!(A, B, C, D, E, F, G, H);

/// Functions whose arguments are all [Dependency]s
///
/// `Args` is the tuple of argument types and only exists to tell the impls apart.
pub trait InvokeWithDependencies<Args> {
    type Output;

    fn invoke<R: Resolver + ?Sized>(self, resolver: &R) -> Result<Self::Output, ResolveError>;
}

macro_rules! impl_invoke {
    ($($dep:ident $arg:ident),*) => {
        impl<Func, Out, $($dep: Dependency),*> InvokeWithDependencies<($($dep,)*)> for Func
        where
            Func: FnOnce($($dep),*) -> Out,
        {
            type Output = Out;

            #[allow(unused_variables)]
            fn invoke<R: Resolver + ?Sized>(self, resolver: &R) -> Result<Out, ResolveError> {
                $(let $arg = $dep::resolve(resolver)?;)*
                Ok(self($($arg),*))
            }
        }
    };
}

impl_invoke!();
impl_invoke!(A a);
impl_invoke!(A a, B b);
impl_invoke!(A a, B b, C c);
impl_invoke!(A a, B b, C c, D d);
impl_invoke!(A a, B b, C c, D d, E e);
impl_invoke!(A a, B b, C c, D d, E e, F f);
impl_invoke!(A a, B b, C c, D d, E e, F f, G g);
impl_invoke!(A a, B b, C c, D d, E e, F f, G g, H h);
