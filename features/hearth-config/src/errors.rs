use hearth_di::TypeInfo;

/// Errors when trying to register or acquire a config
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The required Config is not known
    #[error("The required Config type '{0}' is not known")]
    ConfigMissing(TypeInfo),
    /// The Config type is already registered
    #[error("The Config type '{0}' is already registered")]
    ConfigAlreadyRegistered(TypeInfo),
}
