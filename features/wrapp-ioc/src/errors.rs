use std::sync::Arc;

use thiserror::Error;

use crate::types::DynError;

/// Errors when trying to create a [Container](crate::container::Container)
#[derive(Error, Debug, Clone)]
pub enum BuildError {
    /// The declared providers are inconsistent
    #[error(transparent)]
    Invalid(#[from] ComponentError),
    /// There are issues with the dependency graph
    #[error(transparent)]
    Graph(#[from] GraphErrors),
}

/// Errors found while validating the declared components
#[derive(Error, Debug, Clone)]
pub enum ComponentError {
    #[error("The component '{type_name}' named '{name}' has been registered twice")]
    Duplicate {
        type_name: &'static str,
        name: String,
    },
    #[error("'{provider}' declares a component with an empty name")]
    EmptyName { provider: String },
    #[error("'{provider}' does not provide any component")]
    NoOutputs { provider: String },
}

/// Errors when trying to enter a scope
#[derive(Error, Debug, Clone)]
pub enum ScopeError {
    #[error("Scope '{scope}' can not be entered from '{current}'")]
    CannotEnter { scope: String, current: String },
}

/// Configuration errors of the dependency graph
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error("'{required_by}' needs '{dependency}' but it is missing")]
    MissingDependency {
        dependency: String,
        required_by: String,
    },
    #[error("'{required_by}' needs '{dependency}' but it matches {candidates:?} - Consider naming or tagging it")]
    UncertainDependency {
        dependency: String,
        required_by: String,
        candidates: Vec<String>,
    },
    #[error("A Circular Dependency exists through {chain:?}")]
    CircularDependency { chain: Vec<String> },
}
impl std::fmt::Display for GraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

#[derive(Error, Debug, Clone)]
pub struct GraphErrors {
    pub errors: Vec<GraphError>,
}
impl GraphErrors {
    pub fn missing(&self) -> impl Iterator<Item = &GraphError> {
        self.errors
            .iter()
            .filter(|e| matches!(e, GraphError::MissingDependency { .. }))
    }

    pub fn uncertain(&self) -> impl Iterator<Item = &GraphError> {
        self.errors
            .iter()
            .filter(|e| matches!(e, GraphError::UncertainDependency { .. }))
    }

    pub fn cycles(&self) -> impl Iterator<Item = &GraphError> {
        self.errors
            .iter()
            .filter(|e| matches!(e, GraphError::CircularDependency { .. }))
    }
}

/// Errors while resolving a request
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// The requested node, or one it needs, is part of a dependency cycle
    #[error("'{node}' is part of a dependency cycle: {}", display_cycles(.cycles))]
    Cycle {
        node: String,
        cycles: Vec<Vec<String>>,
    },
    /// A component lives in a scope which has not been entered
    #[error("Scope '{scope}' has not been entered")]
    ScopeNotEntered { scope: String },
    /// No component matches a required dependency
    #[error("No component matches '{dependency}'")]
    Missing { dependency: String },
    /// The business logic of a provider failed
    #[error("Provider '{provider}' failed - error: {error}")]
    Provider {
        provider: String,
        /// Nodes which were being resolved when the provider failed, outermost first
        path: Vec<String>,
        error: Arc<DynError>,
    },
    /// A dependency of the provider failed
    #[error("'{provider}' could not be satisfied: {source}")]
    Dependency {
        provider: String,
        source: Box<ResolveError>,
    },
    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    Downcast {
        required_type: &'static str,
        actual_type: &'static str,
    },
    /// A non optional access to the zero value of a type without default
    #[error("'{type_name}' is absent")]
    Absent { type_name: &'static str },
    /// The graph of the request has configuration errors
    #[error(transparent)]
    Invalid(#[from] GraphErrors),
    /// Malformed wiring - a defect of this crate, not of the caller
    #[error("Internal error (this is a bug in wrapp-ioc): {0}")]
    Internal(String),
}

fn display_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|cycle| {
            let mut chain = cycle.clone();
            if let Some(first) = cycle.first() {
                chain.push(first.clone());
            }
            format!("[{}]", chain.join(" -> "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl ResolveError {
    pub(crate) fn provider_failed(provider: String, error: DynError) -> Self {
        ResolveError::Provider {
            provider,
            path: Vec::new(),
            error: Arc::new(error),
        }
    }

    /// Attributes the error to the provider owning the failing dependency
    ///
    /// Consecutive attributions to the same provider are collapsed.
    pub(crate) fn attributed_to(self, provider: &str) -> Self {
        let attributed = match &self {
            ResolveError::Dependency { provider: owner, .. }
            | ResolveError::Provider { provider: owner, .. } => owner == provider,
            _ => false,
        };
        if attributed {
            return self;
        }

        ResolveError::Dependency {
            provider: provider.to_string(),
            source: Box::new(self),
        }
    }

    /// Records the resolution path on a provider failure, if none is recorded yet
    pub(crate) fn with_path(self, path: impl FnOnce() -> Vec<String>) -> Self {
        match self {
            ResolveError::Provider {
                provider,
                path: recorded,
                error,
            } if recorded.is_empty() => ResolveError::Provider {
                provider,
                path: path(),
                error,
            },
            other => other,
        }
    }

    /// The innermost error, skipping attributions
    pub fn root_cause(&self) -> &ResolveError {
        match self {
            ResolveError::Dependency { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
