use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use crate::{
    builder::ContainerOptions,
    errors::{GraphError, GraphErrors},
    provider::ProviderId,
    repository::{Component, ComponentId},
};

use self::{
    cycles::{Cycle, CycleInfo},
    layer::{read_through, visible_keys, Layer},
    node::{Node, NodeId},
};

pub mod builder;
pub mod cycles;
pub(crate) mod layer;
pub mod node;

/// Graph of every component, provider and dependency of a container
///
/// The graph of a container is the *base*. Every request derives a throw-away graph from
/// it, which only holds the nodes of the request and reads through to the base for
/// everything else. The base is never modified by a derived graph.
#[derive(Default)]
pub struct DependenceGraph {
    parent: Option<Arc<DependenceGraph>>,
    nodes: Layer<NodeId, Arc<Node>>,
    /// Ordered inputs of a node - a provider's dependencies, a dependency's candidates
    inputs: Layer<NodeId, Vec<NodeId>>,
    components: Layer<ComponentId, NodeId>,
    providers: Layer<ProviderId, NodeId>,
    /// Nodes added to this layer, in insertion order
    order: Vec<NodeId>,
    missing: Vec<NodeId>,
    uncertain: Vec<NodeId>,
    adds_components: bool,
    cycles: OnceLock<Arc<CycleInfo>>,
}

impl fmt::Debug for DependenceGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependenceGraph")
            .field("depth", &self.chain().count())
            .field("local_nodes", &self.nodes.len())
            .field("missing", &self.missing.len())
            .field("uncertain", &self.uncertain.len())
            .finish()
    }
}

impl DependenceGraph {
    /// An empty graph layer reading through to `self`
    pub fn derive(self: &Arc<Self>) -> DependenceGraph {
        DependenceGraph {
            parent: Some(self.clone()),
            ..Default::default()
        }
    }

    pub fn parent(&self) -> Option<&Arc<DependenceGraph>> {
        self.parent.as_ref()
    }

    /// This layer followed by its ancestors
    fn chain(&self) -> impl Iterator<Item = &DependenceGraph> {
        std::iter::successors(Some(self), |graph| graph.parent.as_deref())
    }

    pub fn node(&self, id: NodeId) -> Option<&Arc<Node>> {
        read_through(&id, self.chain().map(|graph| &graph.nodes))
    }

    /// Ordered inputs of a node
    pub fn inputs(&self, id: NodeId) -> &[NodeId] {
        read_through(&id, self.chain().map(|graph| &graph.inputs))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Nodes having `id` among their inputs
    pub fn dependents(&self, id: NodeId) -> Vec<NodeId> {
        self.node_ids()
            .into_iter()
            .filter(|node| self.inputs(*node).contains(&id))
            .collect()
    }

    pub fn component_node(&self, id: ComponentId) -> Option<NodeId> {
        read_through(&id, self.chain().map(|graph| &graph.components)).copied()
    }

    pub fn provider_node(&self, id: ProviderId) -> Option<NodeId> {
        read_through(&id, self.chain().map(|graph| &graph.providers)).copied()
    }

    /// Every node visible through this layer
    pub fn node_ids(&self) -> Vec<NodeId> {
        visible_keys(self.chain().map(|graph| &graph.nodes))
    }

    pub fn len(&self) -> usize {
        self.node_ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Describes a node for diagnostics
    pub fn label(&self, id: NodeId) -> String {
        match self.node(id) {
            Some(node) => node.to_string(),
            None => format!("unknown node {id}"),
        }
    }

    /// Hides a node of this layer or of an ancestor from this layer
    pub fn remove_node(&mut self, id: NodeId) {
        self.nodes.remove(id);
        self.inputs.remove(id);
        self.order.retain(|node| *node != id);
    }
}

// Mutation, only ever on the topmost layer
impl DependenceGraph {
    pub(crate) fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId::next();
        if node.is_component() {
            self.adds_components = true;
        }
        self.nodes.insert(id, Arc::new(node));
        self.order.push(id);
        id
    }

    pub(crate) fn register_component(&mut self, component: ComponentId, node: NodeId) {
        self.components.insert(component, node);
    }

    pub(crate) fn register_provider(&mut self, provider: ProviderId, node: NodeId) {
        self.providers.insert(provider, node);
    }

    /// Appends `input` to the inputs of `to`
    ///
    /// Inputs owned by an ancestor are copied into this layer first.
    pub(crate) fn connect(&mut self, input: NodeId, to: NodeId) {
        if let Some(inputs) = self.inputs.local_mut(&to) {
            inputs.push(input);
            return;
        }

        let mut inputs = self.inputs(to).to_vec();
        inputs.push(input);
        self.inputs.insert(to, inputs);
    }

    pub(crate) fn mark_missing(&mut self, node: NodeId) {
        self.missing.push(node);
    }

    pub(crate) fn mark_uncertain(&mut self, node: NodeId) {
        self.uncertain.push(node);
    }
}

// Validation
impl DependenceGraph {
    /// Cycle membership of every node, computed once per graph
    ///
    /// A derived graph which adds no components shares the cycles of its parent: nothing
    /// depends on the nodes of a request, so they can not close a cycle.
    pub fn cycles(&self) -> Arc<CycleInfo> {
        if !self.adds_components {
            if let Some(parent) = &self.parent {
                return parent.cycles();
            }
        }

        self.cycles
            .get_or_init(|| Arc::new(CycleInfo::build(self.edges())))
            .clone()
    }

    /// Every `(node, input)` pair visible through this layer
    fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.node_ids()
            .into_iter()
            .flat_map(|node| self.inputs(node).iter().map(move |input| (node, *input)))
            .collect()
    }

    /// Reports every configuration error of this graph and its ancestors
    ///
    /// Error classes ignored by `options` are left out.
    pub fn check(&self, options: &ContainerOptions) -> Result<(), GraphErrors> {
        let mut layers: Vec<&DependenceGraph> = self.chain().collect();
        layers.reverse();

        let mut errors = Vec::new();
        if !options.ignore_missing {
            for id in layers.iter().flat_map(|graph| &graph.missing) {
                if let Some(Node::Dependency(dependency)) = self.node(*id).map(|n| &**n) {
                    errors.push(GraphError::MissingDependency {
                        dependency: dependency.dependency.to_string(),
                        required_by: dependency.owner.to_string(),
                    });
                }
            }
        }

        if !options.ignore_uncertain {
            for id in layers.iter().flat_map(|graph| &graph.uncertain) {
                if let Some(Node::Dependency(dependency)) = self.node(*id).map(|n| &**n) {
                    errors.push(GraphError::UncertainDependency {
                        dependency: dependency.dependency.to_string(),
                        required_by: dependency.owner.to_string(),
                        candidates: self
                            .inputs(*id)
                            .iter()
                            .map(|input| self.label(*input))
                            .collect(),
                    });
                }
            }
        }

        if !options.ignore_cycle {
            for cycle in self.cycles().all() {
                errors.push(GraphError::CircularDependency {
                    chain: self.component_chain(cycle),
                });
            }
        }

        if !errors.is_empty() {
            return Err(GraphErrors { errors });
        }

        Ok(())
    }

    /// The components of a cycle, leaving out the provider and dependency nodes between them
    pub fn component_chain(&self, cycle: &Cycle) -> Vec<String> {
        cycle
            .nodes()
            .iter()
            .filter_map(|id| match self.node(*id).map(|n| &**n) {
                Some(Node::Component(component)) => Some(component_label(component)),
                _ => None,
            })
            .collect()
    }

    /// Every cycle through `node`, rotated to start at it
    pub fn describe_cycles(&self, node: NodeId) -> Vec<Vec<String>> {
        self.cycles()
            .cycles_of(node)
            .map(|cycle| cycle.iter_from(node).map(|id| self.label(id)).collect())
            .collect()
    }
}

fn component_label(component: &Component) -> String {
    match component.name() {
        Some(name) => format!("{} '{name}'", component.type_info()),
        None => component.type_info().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::{builder::GraphBuilder, *};
    use crate::{
        dependency::Dependency,
        module::Module,
        provider::Provider,
        repository::Repository,
    };

    struct A;
    struct B;

    fn build(module: &Module) -> (Repository, Arc<DependenceGraph>) {
        let repository = Repository::new(module);
        let mut graph = DependenceGraph::default();
        GraphBuilder::new(&repository, &mut graph).add_components();
        (repository, Arc::new(graph))
    }

    #[test]
    fn derived_graphs_leave_the_base_untouched() {
        let (repository, base) = build(&Module::new("test").provide(Provider::constant(1_u8)));
        let base_len = base.len();

        let consumer = Arc::new(Provider::consumer("request".into(), vec![Dependency::on::<u8>()], |args| {
            Ok(args.instance(0)?.clone())
        }));
        let mut derived = base.derive();
        let id = GraphBuilder::new(&repository, &mut derived).add_consumer(&consumer);

        assert!(derived.node(id).is_some());
        assert!(base.node(id).is_none());
        assert_eq!(base.len(), base_len);
        assert_eq!(derived.len(), base_len + 2);
        assert!(Arc::ptr_eq(&derived.cycles(), &base.cycles()));
    }

    #[test]
    fn removed_nodes_are_masked_in_the_derived_graph_only() {
        let (repository, base) = build(&Module::new("test").provide(Provider::constant(1_u8)));
        let component = base
            .component_node(repository.all_components()[0].id())
            .unwrap();

        let mut derived = base.derive();
        derived.remove_node(component);

        assert!(derived.node(component).is_none());
        assert!(base.node(component).is_some());
    }

    #[test]
    fn check_reports_every_issue() {
        let (_, graph) = build(
            &Module::new("test")
                .provide(Provider::func(|_: Arc<B>| Ok::<_, Infallible>(A)))
                .provide(Provider::func(|_: Arc<A>, _: Arc<u16>| Ok::<_, Infallible>(B)))
                .provide(Provider::func(|_: Arc<u8>| Ok::<_, Infallible>(1_u32)))
                .provide(Provider::constant(1_u8))
                .provide(Provider::constant(2_u8)),
        );

        let errors = graph.check(&ContainerOptions::default()).unwrap_err();

        assert_eq!(errors.missing().count(), 1);
        assert_eq!(errors.uncertain().count(), 1);
        let cycles: Vec<_> = errors.cycles().collect();
        assert_eq!(cycles.len(), 1);
        assert!(matches!(cycles[0], GraphError::CircularDependency { chain } if chain.len() == 2));

        let ignore_all = ContainerOptions {
            ignore_missing: true,
            ignore_uncertain: true,
            ignore_cycle: true,
        };
        assert!(graph.check(&ignore_all).is_ok());
    }

    #[test]
    fn cycles_are_described_from_the_requested_node() {
        let (repository, graph) = build(
            &Module::new("test")
                .provide(Provider::func(|_: Arc<B>| Ok::<_, Infallible>(A)))
                .provide(Provider::func(|_: Arc<A>| Ok::<_, Infallible>(B))),
        );
        let a = graph
            .component_node(repository.all_components()[0].id())
            .unwrap();

        let described = graph.describe_cycles(a);

        assert_eq!(described.len(), 1);
        assert_eq!(described[0][0], graph.label(a));
    }
}
