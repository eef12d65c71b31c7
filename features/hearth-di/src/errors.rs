use thiserror::Error;

use crate::types::TypeInfo;

/// Errors when trying to resolve a certain type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No container in the reachable chain has a registration for the key
    #[error("The requested type '{0}' is not registered.")]
    NotRegistered(TypeInfo),
    /// The lifetime handler could not produce an instance
    #[error("Failed to construct an instance of '{0}'")]
    ConstructionFailed(TypeInfo),

    #[error("Failed to cast, required: '{required_type}' actual: '{actual_type}'")]
    CastFailed {
        required_type: TypeInfo,
        actual_type: TypeInfo,
    },
    /// A weak handle outlived the container it was created from
    #[error("The container was dropped, did you keep a handle after releasing it?")]
    ContainerDropped,
}

/// Errors while building a container
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// `as_interface` was used with a type the implementation can't be viewed as
    #[error("'{implementation}' can not be registered as '{interface}'")]
    InvalidRegistration {
        implementation: TypeInfo,
        interface: TypeInfo,
    },
}
