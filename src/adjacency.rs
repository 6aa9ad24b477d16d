use std::sync::Arc;

use fxhash::FxHashMap;

use crate::graph::{Edge, Graph, NodeId};

/// The symmetric adjacency relation, grouped by source node.
///
/// Node ids are mapped to dense indices `0..num_nodes()` in ascending id
/// order, and the rows of node `i` are the dense indices stored in
/// `targets[offsets[i]..offsets[i + 1]]`. The sorted id list is shared
/// with every label generation computed over this relation.
#[derive(Debug, Clone)]
pub struct Adjacency<N> {
    nodes: Arc<[N]>,
    index: FxHashMap<N, usize>,
    offsets: Vec<usize>,
    targets: Vec<usize>,
}

impl<N: NodeId> Adjacency<N> {
    /// Builds the table from the edges of `graph`, after closing them
    /// under reversal.
    pub fn from_graph(graph: &Graph<N>) -> Self {
        Self::from_symmetric(&graph.symmetrized(), graph.isolated.iter().copied())
    }

    /// Groups an already symmetric relation. Every id in `rows` or in
    /// `isolated` becomes a node; rows are kept as given, including
    /// duplicates and self-loops.
    pub fn from_symmetric<I>(rows: &[Edge<N>], isolated: I) -> Self
    where
        I: IntoIterator<Item = N>,
    {
        let mut nodes: Vec<N> = rows
            .iter()
            .flat_map(|&(u, v)| [u, v])
            .chain(isolated)
            .collect();
        nodes.sort_unstable();
        nodes.dedup();

        let index: FxHashMap<N, usize> =
            nodes.iter().enumerate().map(|(ix, &n)| (n, ix)).collect();

        let mut offsets = vec![0; nodes.len() + 1];
        for (from, _) in rows {
            offsets[index[from] + 1] += 1;
        }
        for ix in 0..nodes.len() {
            offsets[ix + 1] += offsets[ix];
        }

        let mut cursor = offsets.clone();
        let mut targets = vec![0; rows.len()];
        for (from, to) in rows {
            let slot = &mut cursor[index[from]];
            targets[*slot] = index[to];
            *slot += 1;
        }

        Adjacency {
            nodes: nodes.into(),
            index,
            offsets,
            targets,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of adjacency rows, i.e. twice the number of input edges.
    pub fn num_rows(&self) -> usize {
        self.targets.len()
    }

    /// The node ids in ascending order; position is the dense index.
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub(crate) fn shared_nodes(&self) -> Arc<[N]> {
        Arc::clone(&self.nodes)
    }

    pub fn node(&self, ix: usize) -> N {
        self.nodes[ix]
    }

    pub fn index_of(&self, node: N) -> Option<usize> {
        self.index.get(&node).copied()
    }

    /// Dense indices of the rows `(ix, _)`.
    pub fn neighbors(&self, ix: usize) -> &[usize] {
        &self.targets[self.offsets[ix]..self.offsets[ix + 1]]
    }

    pub fn degree(&self, ix: usize) -> usize {
        self.offsets[ix + 1] - self.offsets[ix]
    }
}
