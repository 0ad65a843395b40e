use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use wrapp_ioc::{Injectable, Module, Provider, TypeInfo};

use crate::{config::Config, errors::ConfigError};

struct Entry {
    config: Arc<dyn Any + Send + Sync + 'static>,
    /// Constant provider of the `Config<T>` handle
    provider: Provider,
}

/// A registry of all configs
///
/// Configs are registered and retrieved by type, at most one config per type.
#[derive(Default)]
pub struct ConfigProvider {
    configs: HashMap<TypeId, Entry>,
    /// Registration order
    order: Vec<TypeId>,
}
impl std::fmt::Debug for ConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for type_id in &self.order {
            if let Some(entry) = self.configs.get(type_id) {
                list.entry(&entry.provider.label());
            }
        }
        list.finish()
    }
}

impl ConfigProvider {
    /// Initializes an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves the config of type `T`
    pub fn get_config<T: Injectable>(&self) -> Result<Arc<T>, ConfigError> {
        self.configs
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.config.clone().downcast().ok())
            .ok_or(ConfigError::Missing(TypeInfo::of::<T>()))
    }

    /// Adds a config to the registry
    ///
    /// Fails if a config of the same type is already registered.
    #[track_caller]
    pub fn add_config<T: Injectable>(&mut self, config: T) -> Result<&mut Self, ConfigError> {
        let type_id = TypeId::of::<T>();
        if self.configs.contains_key(&type_id) {
            return Err(ConfigError::AlreadyRegistered(TypeInfo::of::<T>()));
        }

        let config = Arc::new(config);
        let provider = Provider::constant(Config::new(config.clone()))
            .labelled(format!("config {}", std::any::type_name::<T>()));
        tracing::debug!("Registered config {}", std::any::type_name::<T>());

        self.configs.insert(type_id, Entry { config, provider });
        self.order.push(type_id);
        Ok(self)
    }

    /// Adds a config to the registry, if there is one
    ///
    /// `None` leaves the registry as it is.
    #[track_caller]
    pub fn maybe_add_config<T: Injectable>(
        &mut self,
        config: Option<T>,
    ) -> Result<&mut Self, ConfigError> {
        match config {
            Some(config) => self.add_config(config),
            None => Ok(self),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// A module providing a [Config] for every registered config, in registration order
    pub fn to_module(&self) -> Module {
        self.order
            .iter()
            .filter_map(|type_id| self.configs.get(type_id))
            .fold(Module::new("config"), |module, entry| {
                module.provide(entry.provider.clone())
            })
    }
}
