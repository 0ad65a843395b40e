use std::{fmt, sync::Arc};

use crate::{
    builder::ContainerOptions,
    errors::ResolveError,
    graph::{
        cycles::CycleInfo,
        node::{Node, NodeId},
        DependenceGraph,
    },
    storage::ScopeStorage,
    types::Instance,
    value::Value,
};

/// Nodes being resolved, innermost last
///
/// Only used to describe failures - cycles are detected on the graph, never on the path.
#[derive(Clone, Default)]
pub(crate) struct ResolutionPath(Option<Arc<PathEntry>>);
struct PathEntry {
    node: NodeId,
    parent: ResolutionPath,
}

impl ResolutionPath {
    fn push(&self, node: NodeId) -> ResolutionPath {
        ResolutionPath(Some(Arc::new(PathEntry {
            node,
            parent: self.clone(),
        })))
    }

    /// Outermost first
    fn nodes(&self) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        let mut cursor = self.0.as_ref();
        while let Some(entry) = cursor {
            nodes.push(entry.node);
            cursor = entry.parent.0.as_ref();
        }
        nodes.reverse();
        nodes
    }
}

/// Recursive, memoized resolution of nodes through a chain of frames
#[derive(Clone)]
pub(crate) struct Resolution {
    graph: Arc<DependenceGraph>,
    storage: ScopeStorage,
    cycles: Arc<CycleInfo>,
}

impl Resolution {
    pub(crate) fn new(graph: Arc<DependenceGraph>, storage: ScopeStorage) -> Self {
        let cycles = graph.cycles();
        Resolution {
            graph,
            storage,
            cycles,
        }
    }

    /// The deferred value of `node`
    ///
    /// Nodes on a cycle fail right away, before anything is resolved through them.
    pub(crate) fn resolve(&self, node: NodeId, path: &ResolutionPath) -> Value {
        if self.cycles.is_cyclic(node) {
            return Value::error(ResolveError::Cycle {
                node: self.graph.label(node),
                cycles: self.graph.describe_cycles(node),
            });
        }

        let Some(target) = self.graph.node(node).cloned() else {
            return Value::error(ResolveError::Internal(format!(
                "{node} is not part of the graph"
            )));
        };

        let resolution = self.clone();
        let path = path.push(node);
        let scope = target.scope().cloned();
        self.storage.get_or_else(node, scope.as_ref(), move || {
            resolution.compute(node, &target, &path)
        })
    }

    fn compute(&self, node: NodeId, target: &Node, path: &ResolutionPath) -> Value {
        let inputs = self
            .graph
            .inputs(node)
            .iter()
            .map(|input| self.resolve(*input, path))
            .collect();

        match target.compute(inputs) {
            Value::Error(error) => Value::error(self.annotate(error, target, path)),
            value => value,
        }
    }

    /// Records where a provider failed and which provider a failing dependency belongs to
    fn annotate(&self, error: ResolveError, target: &Node, path: &ResolutionPath) -> ResolveError {
        let error = error.with_path(|| self.describe(path));
        match target.owner() {
            Some(owner) => error.attributed_to(&owner.to_string()),
            None => error,
        }
    }

    fn describe(&self, path: &ResolutionPath) -> Vec<String> {
        path.nodes()
            .into_iter()
            .filter_map(|id| match self.graph.node(id).map(|n| &**n) {
                Some(Node::Provider(provider)) => Some(provider.to_string()),
                _ => None,
            })
            .collect()
    }
}

/// A prepared request against a container
///
/// Holds the graph derived for the request and the frames entered when it was created.
/// [Executor::execute] may be called any number of times - every call resolves through
/// the same frames, so cached components are reused and failures are retried.
pub struct Executor<T> {
    graph: Arc<DependenceGraph>,
    consumer: NodeId,
    request: String,
    storage: ScopeStorage,
    options: ContainerOptions,
    extract: fn(&Instance) -> Result<T, ResolveError>,
}

impl<T> fmt::Debug for Executor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("request", &self.request)
            .field("scope", self.storage.scope())
            .field("options", &self.options)
            .finish()
    }
}

impl<T> Executor<T> {
    pub(crate) fn new(
        graph: Arc<DependenceGraph>,
        consumer: NodeId,
        request: String,
        storage: ScopeStorage,
        options: ContainerOptions,
        extract: fn(&Instance) -> Result<T, ResolveError>,
    ) -> Self {
        Executor {
            graph,
            consumer,
            request,
            storage,
            options,
            extract,
        }
    }

    /// The graph derived for this request
    pub fn graph(&self) -> &Arc<DependenceGraph> {
        &self.graph
    }

    /// Validates the request, resolves it and returns its result
    pub fn execute(&self) -> Result<T, ResolveError> {
        self.graph.check(&self.options)?;

        let resolution = Resolution::new(self.graph.clone(), self.storage.clone());
        match resolution
            .resolve(self.consumer, &ResolutionPath::default())
            .force()
        {
            Value::Array(instances) => match instances.first() {
                Some(instance) => (self.extract)(instance),
                None => Err(ResolveError::Internal(format!(
                    "'{}' produced no result",
                    self.request
                ))),
            },
            Value::Error(error) => Err(self.detach(error)),
            other => Err(ResolveError::Internal(format!(
                "'{}' produced {other:?}",
                self.request
            ))),
        }
    }

    /// Drops the attribution to the request itself, the caller knows what it asked for
    fn detach(&self, error: ResolveError) -> ResolveError {
        match error {
            ResolveError::Dependency { provider, source } if provider == self.request => *source,
            other => other,
        }
    }
}
