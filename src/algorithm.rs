use std::collections::BTreeMap;
use std::convert::Infallible;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, debug_span, info, warn};

use crate::adjacency::Adjacency;
use crate::error::{Error, Result};
use crate::graph::{Edge, Graph, NodeId};
use crate::state::Labels;

/// New label of node `ix`: the minimum of its own label and the labels
/// of its neighbors in `prev`. A node without rows keeps its label.
fn relax<N: NodeId>(adjacency: &Adjacency<N>, prev: &[N], ix: usize) -> N {
    let own = prev[ix];
    let label = match adjacency.neighbors(ix).iter().map(|&m| prev[m]).min() {
        Some(min) => own.min(min),
        None => own,
    };
    debug_assert!(label <= own);
    label
}

/// One synchronous propagation step over every node.
pub fn propagate<N: NodeId>(adjacency: &Adjacency<N>, labels: &Labels<N>) -> Labels<N> {
    let prev = labels.as_slice();
    let next = (0..prev.len()).map(|ix| relax(adjacency, prev, ix)).collect();
    labels.successor(next)
}

/// Same as [`propagate`], with the per-node minima computed on the
/// rayon pool. The next generation is complete before it is returned.
pub fn propagate_par<N: NodeId>(adjacency: &Adjacency<N>, labels: &Labels<N>) -> Labels<N> {
    let prev = labels.as_slice();
    let next = (0..prev.len())
        .into_par_iter()
        .map(|ix| relax(adjacency, prev, ix))
        .collect();
    labels.successor(next)
}

/// Propagation step that only recomputes the neighbors of `frontier`,
/// the nodes whose label changed in the step that produced `labels`.
/// Every other label is carried over unchanged, which gives the same
/// generation as [`propagate`] as long as the frontier is exact.
///
/// Returns the next generation together with its own frontier.
pub fn propagate_frontier<N: NodeId>(
    adjacency: &Adjacency<N>,
    labels: &Labels<N>,
    frontier: &[usize],
) -> (Labels<N>, Vec<usize>) {
    let prev = labels.as_slice();

    let mut affected: Vec<usize> = frontier
        .iter()
        .flat_map(|&ix| adjacency.neighbors(ix).iter().copied())
        .collect();
    affected.sort_unstable();
    affected.dedup();

    let mut next = prev.to_vec();
    let mut changed = Vec::new();

    for ix in affected {
        let label = relax(adjacency, prev, ix);
        if label != prev[ix] {
            next[ix] = label;
            changed.push(ix);
        }
    }

    (labels.successor(next), changed)
}

/// True iff the two generations differ as mappings, i.e. some node's
/// label changed.
pub fn has_changed<N: NodeId>(prev: &Labels<N>, next: &Labels<N>) -> bool {
    !prev.same_nodes(next)
        || prev
            .as_slice()
            .iter()
            .zip(next.as_slice())
            .any(|(a, b)| a != b)
}

/// Dense indices of the nodes whose label differs between two
/// generations over the same node set.
pub fn changed_nodes<N: NodeId>(prev: &Labels<N>, next: &Labels<N>) -> Vec<usize> {
    debug_assert!(prev.same_nodes(next));
    prev.as_slice()
        .iter()
        .zip(next.as_slice())
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(ix, _)| ix)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Recompute every node in every step.
    #[default]
    Full,
    /// Recompute only the neighbors of the nodes that changed last step.
    Frontier,
}

/// How a run ended, together with the last generation.
///
/// `iterations` is the generation number of `labels`. For a converged
/// run that is the number of steps that changed some label; one more
/// step was executed to confirm the fixed point.
#[derive(Debug, Clone)]
pub enum Outcome<N> {
    Converged { labels: Labels<N>, iterations: usize },
    /// The iteration cap was reached while labels were still changing.
    /// Every label is still >= its node's component id, so components
    /// may show up split, never wrongly merged.
    Exhausted { labels: Labels<N>, iterations: usize },
}

impl<N> Outcome<N> {
    pub fn is_converged(&self) -> bool {
        matches!(self, Outcome::Converged { .. })
    }

    pub fn iterations(&self) -> usize {
        match self {
            Outcome::Converged { iterations, .. } | Outcome::Exhausted { iterations, .. } => {
                *iterations
            }
        }
    }

    pub fn labels(&self) -> &Labels<N> {
        match self {
            Outcome::Converged { labels, .. } | Outcome::Exhausted { labels, .. } => labels,
        }
    }

    pub fn into_labels(self) -> Labels<N> {
        match self {
            Outcome::Converged { labels, .. } | Outcome::Exhausted { labels, .. } => labels,
        }
    }
}

/// Bounded min-label propagation driver.
#[derive(Debug, Clone)]
pub struct LabelPropagation {
    max_iterations: usize,
    strategy: Strategy,
    parallel: bool,
}

impl LabelPropagation {
    /// `max_iterations` caps the number of propagation steps and must
    /// be at least 1.
    pub fn new(max_iterations: usize) -> Result<Self> {
        if max_iterations == 0 {
            return Err(Error::ZeroIterations);
        }
        Ok(LabelPropagation {
            max_iterations,
            strategy: Strategy::default(),
            parallel: true,
        })
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Whether full steps run on the rayon pool. Frontier steps are
    /// always sequential.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn run<N: NodeId>(&self, adjacency: &Adjacency<N>) -> Outcome<N> {
        match self.drive(adjacency, |_| Ok::<(), Infallible>(())) {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }

    /// Like [`run`](Self::run), but checks `cancel` before every step
    /// and fails with [`Error::Cancelled`] once it is set.
    pub fn run_cancellable<N: NodeId>(
        &self,
        adjacency: &Adjacency<N>,
        cancel: &AtomicBool,
    ) -> Result<Outcome<N>> {
        self.drive(adjacency, |generation| {
            if cancel.load(Ordering::Relaxed) {
                warn!(generation, "label propagation cancelled");
                Err(Error::Cancelled { generation })
            } else {
                Ok(())
            }
        })
    }

    /// The driver loop. `check` runs at every generation boundary with
    /// the current generation number and aborts the run on error.
    fn drive<N, E, F>(&self, adjacency: &Adjacency<N>, mut check: F) -> Result<Outcome<N>, E>
    where
        N: NodeId,
        F: FnMut(usize) -> Result<(), E>,
    {
        let _span = debug_span!("propagate", nodes = adjacency.num_nodes()).entered();
        let mut run = Run::new(self, adjacency);
        loop {
            check(run.current.generation())?;
            match run.advance() {
                ControlFlow::Continue(next) => run = next,
                ControlFlow::Break(outcome) => return Ok(outcome),
            }
        }
    }
}

/// Driver-local loop state. Holds the latest generation only; the next
/// one is computed from it and then replaces it.
struct Run<'a, N> {
    config: &'a LabelPropagation,
    adjacency: &'a Adjacency<N>,
    current: Labels<N>,
    frontier: Vec<usize>,
}

impl<'a, N: NodeId> Run<'a, N> {
    fn new(config: &'a LabelPropagation, adjacency: &'a Adjacency<N>) -> Self {
        let frontier = match config.strategy {
            Strategy::Full => Vec::new(),
            Strategy::Frontier => (0..adjacency.num_nodes()).collect(),
        };
        Run {
            config,
            adjacency,
            current: Labels::initial(adjacency),
            frontier,
        }
    }

    fn advance(self) -> ControlFlow<Outcome<N>, Self> {
        let Run {
            config,
            adjacency,
            current,
            frontier,
        } = self;

        let steps = current.generation();
        if steps >= config.max_iterations {
            warn!(
                max_iterations = config.max_iterations,
                "iteration cap reached before labels converged"
            );
            return ControlFlow::Break(Outcome::Exhausted {
                labels: current,
                iterations: steps,
            });
        }

        let (next, frontier, unconverged) = match config.strategy {
            Strategy::Full => {
                let next = if config.parallel {
                    propagate_par(adjacency, &current)
                } else {
                    propagate(adjacency, &current)
                };
                let unconverged = has_changed(&current, &next);
                (next, frontier, unconverged)
            }
            Strategy::Frontier => {
                let (next, changed) = propagate_frontier(adjacency, &current, &frontier);
                debug!(
                    generation = next.generation(),
                    changed = changed.len(),
                    "frontier step"
                );
                let unconverged = !changed.is_empty();
                (next, changed, unconverged)
            }
        };

        if !unconverged {
            info!(iterations = steps, "labels converged");
            return ControlFlow::Break(Outcome::Converged {
                labels: current,
                iterations: steps,
            });
        }

        debug!(generation = next.generation(), "generation complete");

        ControlFlow::Continue(Run {
            config,
            adjacency,
            current: next,
            frontier,
        })
    }
}

/// Final node to component id mapping, as handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentAssignment<N: Ord> {
    pub assignment: BTreeMap<N, N>,
    /// `false` when the iteration cap cut the run short; the assignment
    /// is then best effort, each label >= its component id, not final.
    pub converged: bool,
    pub iterations_used: usize,
}

impl<N: NodeId> From<Outcome<N>> for ComponentAssignment<N> {
    fn from(outcome: Outcome<N>) -> Self {
        ComponentAssignment {
            converged: outcome.is_converged(),
            iterations_used: outcome.iterations(),
            assignment: outcome.labels().to_assignment(),
        }
    }
}

/// Labels every node referenced by `edges`, plus the `isolated` ones,
/// with the minimum node id of its connected component.
pub fn compute_connected_components<N, E, I>(
    edges: E,
    isolated: I,
    max_iterations: usize,
) -> Result<ComponentAssignment<N>>
where
    N: NodeId,
    E: IntoIterator<Item = Edge<N>>,
    I: IntoIterator<Item = N>,
{
    let propagation = LabelPropagation::new(max_iterations)?;
    let graph = Graph::from_edges(edges).with_isolated(isolated);
    let adjacency = Adjacency::from_graph(&graph);
    Ok(propagation.run(&adjacency).into())
}
