use std::collections::{BTreeSet, HashMap};

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};

use super::node::NodeId;

/// An elementary cycle of the graph
///
/// Stored rooted at its smallest node. Each node needs the next one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cycle {
    nodes: Vec<NodeId>,
}

impl Cycle {
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Walks the cycle once around, starting at `start`
    ///
    /// Yields nothing if `start` is not part of the cycle.
    pub fn iter_from(&self, start: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let offset = self.nodes.iter().position(|node| *node == start);
        let len = offset.map_or(0, |_| self.nodes.len());
        self.nodes
            .iter()
            .cycle()
            .skip(offset.unwrap_or(0))
            .take(len)
            .copied()
    }
}

/// Every elementary cycle among the given edges
///
/// An edge `(from, to)` means `from` needs `to`. Strongly connected components are found with
/// Tarjan's algorithm, then every cycle inside a non-trivial component is walked.
pub fn find_cycles(edges: impl IntoIterator<Item = (NodeId, NodeId)>) -> Vec<Cycle> {
    let graph: DiGraphMap<NodeId, ()> = DiGraphMap::from_edges(edges);

    let mut cycles = Vec::new();
    for component in tarjan_scc(&graph) {
        if let [node] = component.as_slice() {
            if graph.contains_edge(*node, *node) {
                cycles.push(Cycle { nodes: vec![*node] });
            }
            continue;
        }

        let members: BTreeSet<NodeId> = component.into_iter().collect();
        for start in &members {
            let mut path = vec![*start];
            walk(&graph, &members, *start, *start, &mut path, &mut cycles);
        }
    }

    cycles.sort();
    cycles
}

/// Depth first search for paths back to `start`, only through members larger than `start`
///
/// Restricting the walk this way finds each cycle exactly once, from its smallest node.
fn walk(
    graph: &DiGraphMap<NodeId, ()>,
    members: &BTreeSet<NodeId>,
    start: NodeId,
    current: NodeId,
    path: &mut Vec<NodeId>,
    cycles: &mut Vec<Cycle>,
) {
    for next in graph.neighbors(current) {
        if next == start {
            if path.len() > 1 {
                cycles.push(Cycle {
                    nodes: path.clone(),
                });
            }
            continue;
        }
        if next < start || !members.contains(&next) || path.contains(&next) {
            continue;
        }

        path.push(next);
        walk(graph, members, start, next, path, cycles);
        path.pop();
    }
}

/// Cycle membership of every node of a graph
#[derive(Debug, Default)]
pub struct CycleInfo {
    cycles: Vec<Cycle>,
    by_node: HashMap<NodeId, Vec<usize>>,
}

impl CycleInfo {
    pub fn build(edges: impl IntoIterator<Item = (NodeId, NodeId)>) -> Self {
        let cycles = find_cycles(edges);

        let mut by_node: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (index, cycle) in cycles.iter().enumerate() {
            for node in cycle.nodes() {
                by_node.entry(*node).or_default().push(index);
            }
        }

        tracing::debug!(
            "Found {} dependency cycles through {} nodes",
            cycles.len(),
            by_node.len()
        );
        CycleInfo { cycles, by_node }
    }

    /// Cycles `node` is part of
    pub fn cycles_of(&self, node: NodeId) -> impl Iterator<Item = &Cycle> {
        self.by_node
            .get(&node)
            .into_iter()
            .flatten()
            .map(|index| &self.cycles[*index])
    }

    pub fn is_cyclic(&self, node: NodeId) -> bool {
        self.by_node.contains_key(&node)
    }

    pub fn all(&self) -> &[Cycle] {
        &self.cycles
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }
}
