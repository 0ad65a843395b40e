use std::{fmt, sync::Arc};

use crate::{
    dependency::Dependency,
    errors::ResolveError,
    provider::Provider,
    repository::Component,
    scope::Scope,
    types::next_id,
    value::{Args, Value},
};

/// Identity of a node in the dependence graph
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(u64);
impl NodeId {
    pub(crate) fn next() -> Self {
        NodeId(next_id())
    }
}
impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a dependency is satisfied - fixed when the graph is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Optional and unmatched: the zero value of the dependency
    Zero,
    /// Required and unmatched: always an error
    Missing,
    /// Exactly one candidate
    Single,
    /// Several candidates for a single value: the first candidate that resolves
    OneOf,
    /// Every candidate, in declaration order
    Collector,
}

#[derive(Debug)]
pub struct DependencyNode {
    pub dependency: Dependency,
    pub owner: Arc<Provider>,
    /// Position within the owner's dependencies
    pub index: usize,
    pub policy: Policy,
}

#[derive(Debug)]
pub enum Node {
    Provider(Arc<Provider>),
    Component(Arc<Component>),
    Dependency(DependencyNode),
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Provider(provider) => write!(f, "{provider}"),
            Node::Component(component) => write!(f, "{component}"),
            Node::Dependency(node) => write!(
                f,
                "{} (argument {} of {})",
                node.dependency,
                node.index,
                node.owner.label()
            ),
        }
    }
}

impl Node {
    /// Scope whose frame caches this node - `None` for nodes of a consumer
    pub fn scope(&self) -> Option<&Scope> {
        match self {
            Node::Provider(provider) => provider.scope(),
            Node::Component(component) => component.scope(),
            Node::Dependency(node) => node.owner.scope(),
        }
    }

    pub fn is_provider(&self) -> bool {
        matches!(self, Node::Provider(_))
    }

    pub fn is_component(&self) -> bool {
        matches!(self, Node::Component(_))
    }

    /// The provider failures of this node are attributed to
    pub fn owner(&self) -> Option<&Arc<Provider>> {
        match self {
            Node::Provider(_) => None,
            Node::Component(component) => Some(component.provider()),
            Node::Dependency(node) => Some(&node.owner),
        }
    }

    /// Computes the value of this node from its (possibly deferred) inputs
    pub fn compute(&self, inputs: Vec<Value>) -> Value {
        match self {
            Node::Provider(provider) => compute_provider(provider, inputs),
            Node::Component(component) => compute_component(component, inputs),
            Node::Dependency(node) => compute_dependency(node, inputs),
        }
    }
}

fn compute_provider(provider: &Provider, inputs: Vec<Value>) -> Value {
    let mut resolved = Vec::with_capacity(inputs.len());
    for input in inputs {
        match input.force() {
            Value::Error(error) => return Value::Error(error),
            value => resolved.push(value),
        }
    }

    match provider.produce(&Args::new(resolved)) {
        Ok(instances) => Value::Array(instances),
        Err(error) => Value::Error(error),
    }
}

fn compute_component(component: &Component, inputs: Vec<Value>) -> Value {
    let Some(produced) = inputs.first() else {
        return internal(format!("component '{component}' is not wired to its provider"));
    };

    match produced.force() {
        Value::Array(instances) => match instances.get(component.index()) {
            Some(instance) => Value::Single(instance.clone()),
            None => internal(format!(
                "'{component}' has index {} but its provider produced {} values",
                component.index(),
                instances.len()
            )),
        },
        Value::Error(error) => Value::Error(error),
        other => internal(format!("provider of '{component}' produced {other:?}")),
    }
}

fn compute_dependency(node: &DependencyNode, inputs: Vec<Value>) -> Value {
    match node.policy {
        Policy::Zero => Value::Single(node.dependency.zero()),
        Policy::Missing => Value::Error(ResolveError::Missing {
            dependency: node.dependency.to_string(),
        }),
        Policy::Single => match inputs.first() {
            Some(input) => input.force(),
            None => internal(format!("'{}' has no candidate", node.dependency)),
        },
        Policy::OneOf => {
            let mut last_error = None;
            for input in inputs {
                match input.force() {
                    Value::Error(error) => last_error = Some(error),
                    value => return value,
                }
            }
            match last_error {
                Some(error) => Value::Error(error),
                None => internal(format!("'{}' has no candidates", node.dependency)),
            }
        }
        Policy::Collector => {
            let mut collected = Vec::with_capacity(inputs.len());
            for input in inputs {
                match input.force() {
                    Value::Single(instance) => collected.push(instance),
                    Value::Error(error) => return Value::Error(error),
                    other => {
                        return internal(format!(
                            "'{}' collected a non single value {other:?}",
                            node.dependency
                        ))
                    }
                }
            }
            Value::Array(collected)
        }
    }
}

fn internal(message: String) -> Value {
    Value::Error(ResolveError::Internal(message))
}
