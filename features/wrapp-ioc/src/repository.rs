use std::{collections::HashSet, fmt, sync::Arc};

use crate::{
    dependency::Criteria,
    errors::ComponentError,
    module::Module,
    provider::{Output, Provider},
    scope::Scope,
    types::{next_id, TypeInfo},
};

/// Identifies a component
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ComponentId(u64);

/// A single output of a provider
pub struct Component {
    id: ComponentId,
    provider: Arc<Provider>,
    index: usize,
}
impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("type", &self.type_info().type_name)
            .field("name", &self.name())
            .field("provider", &self.provider.label())
            .finish()
    }
}
impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_info())?;
        if let Some(name) = self.name() {
            write!(f, " '{name}'")?;
        }
        write!(f, " from {}", self.provider)
    }
}

impl Component {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn provider(&self) -> &Arc<Provider> {
        &self.provider
    }

    /// Position within the provider's outputs
    pub fn index(&self) -> usize {
        self.index
    }

    fn output(&self) -> &Output {
        &self.provider.outputs()[self.index]
    }

    pub fn type_info(&self) -> TypeInfo {
        self.output().type_info
    }

    pub fn name(&self) -> Option<&str> {
        self.output().name.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.output().tags
    }

    pub fn is_hidden(&self) -> bool {
        self.output().hidden
    }

    pub fn is_ignored(&self) -> bool {
        self.output().ignored
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.provider.scope()
    }

    pub fn validate(&self) -> Result<(), ComponentError> {
        match self.name() {
            Some(name) if name.trim().is_empty() => Err(ComponentError::EmptyName {
                provider: self.provider.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Flattened view of every component a module declares
#[derive(Debug)]
pub struct Repository {
    providers: Vec<Arc<Provider>>,
    components: Vec<Arc<Component>>,
}

impl Repository {
    pub fn new(module: &Module) -> Self {
        let providers: Vec<Arc<Provider>> = module
            .providers()
            .into_iter()
            .map(|p| Arc::new(p.clone()))
            .collect();

        let components = providers
            .iter()
            .flat_map(|provider| {
                (0..provider.outputs().len()).map(|index| {
                    Arc::new(Component {
                        id: ComponentId(next_id()),
                        provider: provider.clone(),
                        index,
                    })
                })
            })
            .collect();

        Repository {
            providers,
            components,
        }
    }

    /// Checks the declarations for consistency
    pub fn validate(&self) -> Result<(), ComponentError> {
        for provider in &self.providers {
            if provider.outputs().is_empty() {
                return Err(ComponentError::NoOutputs {
                    provider: provider.to_string(),
                });
            }
        }

        let mut named = HashSet::new();
        for component in &self.components {
            component.validate()?;
            if component.is_ignored() {
                continue;
            }
            if let Some(name) = component.name() {
                if !named.insert((component.type_info(), name)) {
                    return Err(ComponentError::Duplicate {
                        type_name: component.type_info().type_name,
                        name: name.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn providers(&self) -> &[Arc<Provider>] {
        &self.providers
    }

    /// All components in declaration order
    pub fn all_components(&self) -> &[Arc<Component>] {
        &self.components
    }

    /// Components satisfying `criteria`, in declaration order
    pub fn components_matching<'a>(
        &'a self,
        criteria: &'a Criteria,
    ) -> impl Iterator<Item = &'a Arc<Component>> + 'a {
        self.components.iter().filter(|c| criteria.matches(c))
    }
}
