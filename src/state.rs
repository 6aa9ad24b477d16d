use std::collections::BTreeMap;
use std::sync::Arc;

use crate::adjacency::Adjacency;
use crate::graph::NodeId;

/// One immutable generation of the label store: the current candidate
/// component id of every node.
///
/// `labels[ix]` is the label of the node with dense index `ix` in the
/// adjacency the generation was computed from; the id list is shared.
#[derive(Debug, Clone)]
pub struct Labels<N> {
    generation: usize,
    nodes: Arc<[N]>,
    labels: Vec<N>,
}

impl<N: NodeId> Labels<N> {
    /// Generation 0, where every node is labelled with its own id.
    pub fn initial(adjacency: &Adjacency<N>) -> Self {
        let nodes = adjacency.shared_nodes();
        let labels = nodes.to_vec();
        Labels {
            generation: 0,
            nodes,
            labels,
        }
    }

    /// The generation following `self`, over the same node set.
    pub(crate) fn successor(&self, labels: Vec<N>) -> Self {
        debug_assert_eq!(labels.len(), self.labels.len());
        Labels {
            generation: self.generation + 1,
            nodes: Arc::clone(&self.nodes),
            labels,
        }
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels by dense index.
    pub fn as_slice(&self) -> &[N] {
        &self.labels
    }

    pub fn get(&self, node: N) -> Option<N> {
        self.nodes
            .binary_search(&node)
            .ok()
            .map(|ix| self.labels[ix])
    }

    /// `(node, label)` pairs in ascending node order.
    pub fn iter(&self) -> impl Iterator<Item = (N, N)> + '_ {
        self.nodes.iter().copied().zip(self.labels.iter().copied())
    }

    /// Whether both generations cover the same node set.
    pub(crate) fn same_nodes(&self, other: &Labels<N>) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes) || self.nodes == other.nodes
    }

    pub fn to_assignment(&self) -> BTreeMap<N, N> {
        self.iter().collect()
    }

    pub fn components(&self) -> Components<N> {
        let mut members: BTreeMap<N, Vec<N>> = BTreeMap::new();
        for (node, label) in self.iter() {
            members.entry(label).or_default().push(node);
        }
        Components { members }
    }
}

/// Nodes grouped by label. Members are sorted, since they are collected
/// in ascending node order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components<N> {
    members: BTreeMap<N, Vec<N>>,
}

impl<N: NodeId> Components<N> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, id: N) -> Option<&[N]> {
        self.members.get(&id).map(Vec::as_slice)
    }

    /// `(component id, members)` in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (N, &[N])> + '_ {
        self.members.iter().map(|(&id, ms)| (id, ms.as_slice()))
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.members.values().map(Vec::len).collect()
    }

    pub fn retain_min_size(&mut self, min_size: usize) {
        self.members.retain(|_, ms| ms.len() >= min_size);
    }
}
