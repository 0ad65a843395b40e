use wrapp_ioc::TypeInfo;

/// Errors of the config registry
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigError {
    /// The required config is not registered
    #[error("The config '{0}' is not registered")]
    Missing(TypeInfo),
    /// A config of the same type is already registered
    #[error("The config '{0}' is already registered")]
    AlreadyRegistered(TypeInfo),
}
