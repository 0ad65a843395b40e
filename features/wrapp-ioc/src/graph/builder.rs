use std::sync::Arc;

use crate::{
    dependency::Dependency,
    provider::Provider,
    repository::{Component, Repository},
};

use super::{
    node::{DependencyNode, Node, NodeId, Policy},
    DependenceGraph,
};

/// Wires the components of a repository into a [DependenceGraph]
///
/// Nodes are registered before the builder recurses into their inputs, so a component
/// reached again while it is still being wired is simply referenced. This is what lets
/// the builder terminate on cyclic configurations.
pub struct GraphBuilder<'a> {
    repository: &'a Repository,
    graph: &'a mut DependenceGraph,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(repository: &'a Repository, graph: &'a mut DependenceGraph) -> Self {
        GraphBuilder { repository, graph }
    }

    /// Adds a node for every component of the repository
    pub fn add_components(&mut self) {
        for component in self.repository.all_components() {
            self.component_node(component);
        }

        tracing::debug!(
            "Built dependence graph with {} nodes for {} components - {} missing and {} uncertain dependencies",
            self.graph.order.len(),
            self.repository.all_components().len(),
            self.graph.missing.len(),
            self.graph.uncertain.len()
        );
    }

    /// Adds an ad hoc request and returns its node
    pub fn add_consumer(&mut self, consumer: &Arc<Provider>) -> NodeId {
        self.provider_node(consumer)
    }

    fn component_node(&mut self, component: &Arc<Component>) -> NodeId {
        if let Some(id) = self.graph.component_node(component.id()) {
            return id;
        }

        let id = self.graph.add_node(Node::Component(component.clone()));
        self.graph.register_component(component.id(), id);

        let provider = self.provider_node(component.provider());
        self.graph.connect(provider, id);
        id
    }

    fn provider_node(&mut self, provider: &Arc<Provider>) -> NodeId {
        if let Some(id) = self.graph.provider_node(provider.id()) {
            return id;
        }

        let id = self.graph.add_node(Node::Provider(provider.clone()));
        self.graph.register_provider(provider.id(), id);

        for (index, dependency) in provider.dependencies().iter().enumerate() {
            let input = self.dependency_node(provider, index, dependency);
            self.graph.connect(input, id);
        }
        id
    }

    fn dependency_node(
        &mut self,
        owner: &Arc<Provider>,
        index: usize,
        dependency: &Dependency,
    ) -> NodeId {
        let candidates: Vec<Arc<Component>> = self
            .repository
            .components_matching(dependency.criteria())
            .filter(|candidate| is_visible(owner, candidate))
            .cloned()
            .collect();

        let policy = match candidates.len() {
            _ if dependency.is_collector() => Policy::Collector,
            0 if dependency.is_optional() => Policy::Zero,
            0 => Policy::Missing,
            1 => Policy::Single,
            _ => Policy::OneOf,
        };

        let id = self.graph.add_node(Node::Dependency(DependencyNode {
            dependency: dependency.clone(),
            owner: owner.clone(),
            index,
            policy,
        }));
        match policy {
            Policy::Missing => self.graph.mark_missing(id),
            Policy::OneOf => self.graph.mark_uncertain(id),
            _ => {}
        }

        for candidate in &candidates {
            let input = self.component_node(candidate);
            self.graph.connect(input, id);
        }
        id
    }
}

/// A component is visible to a provider living in its scope or in a descendant of it
///
/// Requests have no scope and see every component.
fn is_visible(owner: &Provider, candidate: &Component) -> bool {
    match (owner.scope(), candidate.scope()) {
        (Some(scope), Some(candidate_scope)) => candidate_scope.encloses(scope),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::{module::Module, scope::Scope};

    fn build(module: Module) -> (Repository, DependenceGraph) {
        let repository = Repository::new(&module);
        let mut graph = DependenceGraph::default();
        GraphBuilder::new(&repository, &mut graph).add_components();
        (repository, graph)
    }

    fn policies(graph: &DependenceGraph) -> Vec<Policy> {
        graph
            .order
            .iter()
            .filter_map(|id| match graph.node(*id).map(|n| &**n) {
                Some(Node::Dependency(node)) => Some(node.policy),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn policy_follows_the_candidate_count() {
        let (_, graph) = build(
            Module::new("test")
                .provide(Provider::constant(1_u8))
                .provide(Provider::constant(1_u16))
                .provide(Provider::constant(2_u16))
                .provide(Provider::func(
                    |_: Arc<u8>, _: Arc<u16>, _: Vec<Arc<u16>>, _: Option<Arc<u32>>, _: Arc<u64>| {
                        Ok::<_, Infallible>("all")
                    },
                )),
        );

        assert_eq!(
            policies(&graph),
            vec![
                Policy::Single,
                Policy::OneOf,
                Policy::Collector,
                Policy::Zero,
                Policy::Missing
            ]
        );
        assert_eq!(graph.missing.len(), 1);
        assert_eq!(graph.uncertain.len(), 1);
    }

    #[test]
    fn components_are_shared_between_dependents() {
        let (repository, graph) = build(
            Module::new("test")
                .provide(Provider::constant(1_u8))
                .provide(Provider::func(|_: Arc<u8>| Ok::<_, Infallible>(1_u16)))
                .provide(Provider::func(|_: Arc<u8>| Ok::<_, Infallible>(1_u32))),
        );

        // one node per component and provider, one per declared dependency
        assert_eq!(graph.len(), 3 + 3 + 2);
        let byte = graph
            .component_node(repository.all_components()[0].id())
            .unwrap();
        assert_eq!(graph.dependents(byte).len(), 2);
    }

    #[test]
    fn terminates_on_cycles() {
        struct A;
        let (_, graph) = build(
            Module::new("test").provide(Provider::func(|_: Arc<A>| Ok::<_, Infallible>(A))),
        );

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.cycles().all().len(), 1);
    }

    #[test]
    fn inner_scopes_are_invisible_to_outer_providers() {
        let request = Scope::new("request", &Scope::global());
        let (_, graph) = build(
            Module::new("test")
                .provide(Provider::constant(1_u8).in_scope(&request))
                .provide(Provider::func(|_: Arc<u8>| Ok::<_, Infallible>(1_u16)))
                .provide(Provider::func(|_: Arc<u8>| Ok::<_, Infallible>(1_u32)).in_scope(&request)),
        );

        assert_eq!(policies(&graph), vec![Policy::Missing, Policy::Single]);
    }
}
