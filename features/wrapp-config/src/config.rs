use std::{fmt, ops::Deref, sync::Arc};

use wrapp_ioc::{Dependency, Injectable, ResolveError, Resolver, Value};

/// A shared handle to a registered config
///
/// Configs registered with a [ConfigProvider](crate::provider::ConfigProvider) are provided
/// as `Config<T>`, so providers can take them as parameters.
///
/// # Example
/// ```rust
/// use std::convert::Infallible;
/// use wrapp_config::{config::Config, provider::ConfigProvider};
/// use wrapp_ioc::{Container, ContainerOptions, Provider};
///
/// struct ServerConfig {
///     port: u16,
/// }
/// struct Server {
///     address: String,
/// }
///
/// let mut configs = ConfigProvider::new();
/// configs.add_config(ServerConfig { port: 8080 }).unwrap();
///
/// let module = configs.to_module().provide(Provider::func(|config: Config<ServerConfig>| {
///     Ok::<_, Infallible>(Server {
///         address: format!("0.0.0.0:{}", config.port),
///     })
/// }));
/// let container = Container::new(&module, ContainerOptions::default()).unwrap();
///
/// let server = container.value_of::<Server>().execute().unwrap();
/// assert_eq!(server.address, "0.0.0.0:8080");
/// ```
pub struct Config<T> {
    inner: Arc<T>,
}
impl<T> Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl<T> Clone for Config<T> {
    fn clone(&self) -> Self {
        Config {
            inner: self.inner.clone(),
        }
    }
}
impl<T: fmt::Debug> fmt::Debug for Config<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Config").field(&self.inner).finish()
    }
}

impl<T> Config<T> {
    pub(crate) fn new(inner: Arc<T>) -> Self {
        Config { inner }
    }

    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}

impl<T: Injectable> Resolver for Config<T> {
    fn dependency() -> Dependency {
        Dependency::on::<Config<T>>()
    }

    fn extract(value: &Value) -> Result<Self, ResolveError> {
        let config = Arc::<Config<T>>::extract(value)?;
        Ok(Config::clone(&config))
    }
}
