use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;

use min_label_components::algorithm::{has_changed, propagate, propagate_frontier, propagate_par};
use min_label_components::{
    compute_connected_components, Adjacency, Error, Graph, Labels, LabelPropagation, Outcome,
    Strategy,
};

/// Tests the algorithm against graphs whose components, and the number
/// of steps needed to find them, are known

fn k_graph_edges(offset: u64, n: u64) -> Vec<(u64, u64)> {
    let mut edges = Vec::new();

    let start = offset;
    let end = offset + n;

    for i in start..end {
        for j in i..end {
            if i != j {
                edges.push((i, j));
            }
        }
    }

    edges
}

fn bridged_k_graphs(k_a: u64, k_b: u64) -> Graph<u64> {
    let a_edges = k_graph_edges(0, k_a);
    let last_a = a_edges.last().unwrap().1;

    let first_b = last_a + 1;

    let mut b_edges = k_graph_edges(first_b, k_b);

    let mut edges = a_edges;
    edges.append(&mut b_edges);
    edges.push((last_a, first_b));

    Graph::from_edges(edges)
}

/// Chain visiting `ids` in order.
fn chain(ids: &[u64]) -> Graph<u64> {
    Graph::from_edges(ids.windows(2).map(|w| (w[0], w[1])))
}

fn run(graph: &Graph<u64>, max_iterations: usize) -> Outcome<u64> {
    let adjacency = Adjacency::from_graph(graph);
    LabelPropagation::new(max_iterations)
        .unwrap()
        .run(&adjacency)
}

fn distinct_labels(labels: &Labels<u64>) -> BTreeSet<u64> {
    labels.iter().map(|(_, label)| label).collect()
}

#[test]
fn scenario_a_mixed_components() {
    let edges = vec![(1, 2), (1, 3), (2, 3), (3, 4), (3, 5), (4, 5), (6, 7)];
    let result = compute_connected_components(edges, vec![8u64], 10).unwrap();

    assert!(result.converged);
    assert!(result.iterations_used <= 3);

    for n in 1..=5 {
        assert_eq!(result.assignment[&n], 1, "node {}", n);
    }
    assert_eq!(result.assignment[&6], 6);
    assert_eq!(result.assignment[&7], 6);
    assert_eq!(result.assignment[&8], 8);
    assert_eq!(result.assignment.len(), 8);
}

#[test]
fn scenario_b_two_triangles() {
    let graph = Graph::from_edges(vec![(1, 2), (2, 3), (1, 3), (4, 5), (5, 6), (4, 6)]);
    let outcome = run(&graph, 10);

    assert!(outcome.is_converged());
    assert_eq!(outcome.iterations(), 1);

    let components = outcome.labels().components();
    assert_eq!(components.len(), 2);
    assert_eq!(components.get(1), Some(&[1, 2, 3][..]));
    assert_eq!(components.get(4), Some(&[4, 5, 6][..]));
}

#[test]
fn scenario_c_chain_from_the_end() {
    for len in 1..8u64 {
        let ids: Vec<u64> = (1..=len + 1).collect();
        let graph = chain(&ids);

        let outcome = run(&graph, 100);
        assert!(outcome.is_converged());
        assert_eq!(outcome.iterations() as u64, len);
        assert!(outcome.labels().iter().all(|(_, label)| label == 1));

        // certifying the fixed point takes one confirming step
        let capped = run(&graph, len as usize);
        assert!(!capped.is_converged());
        assert_eq!(capped.iterations() as u64, len);

        let enough = run(&graph, len as usize + 1);
        assert!(enough.is_converged());
    }
}

#[test]
fn scenario_c_chain_from_the_middle() {
    // length 6, minimum in the center: 7 - 5 - 3 - 1 - 2 - 4 - 6
    let graph = chain(&[7, 5, 3, 1, 2, 4, 6]);
    let outcome = run(&graph, 100);
    assert!(outcome.is_converged());
    assert_eq!(outcome.iterations(), 3);

    // length 5: 5 - 3 - 1 - 2 - 4 - 6
    let graph = chain(&[5, 3, 1, 2, 4, 6]);
    assert_eq!(run(&graph, 100).iterations(), 3);

    let capped = run(&graph, 2);
    assert!(!capped.is_converged());
    // capped labels never undershoot the component id
    assert!(capped.labels().iter().all(|(_, label)| label >= 1));
    assert!(capped.labels().iter().any(|(_, label)| label > 1));
}

#[test]
fn scenario_d_duplicates_and_self_loops() {
    let clean = vec![(1u64, 2), (2, 3), (10, 11)];
    let noisy = vec![(1u64, 2), (2, 1), (1, 2), (2, 3), (3, 3), (10, 11), (11, 11), (12, 12)];

    let clean = compute_connected_components(clean, vec![12], 10).unwrap();
    let noisy = compute_connected_components(noisy, Vec::new(), 10).unwrap();

    assert_eq!(clean, noisy);
}

#[test]
fn isolated_nodes_converge_immediately() {
    let graph = Graph::from_edges(Vec::new()).with_isolated(vec![3u64, 1, 2]);
    let outcome = run(&graph, 1);

    assert!(outcome.is_converged());
    assert_eq!(outcome.iterations(), 0);
    assert_eq!(
        outcome.labels().to_assignment().into_iter().collect::<Vec<_>>(),
        vec![(1, 1), (2, 2), (3, 3)]
    );
}

#[test]
fn small_components_filtered() {
    let graph = Graph::from_edges(vec![(1, 2), (2, 3), (4, 5)]).with_isolated(vec![7u64]);
    let mut components = run(&graph, 10).labels().components();
    assert_eq!(components.sizes(), vec![3, 2, 1]);

    components.retain_min_size(2);
    assert_eq!(components.len(), 2);
    assert_eq!(components.get(1), Some(&[1, 2, 3][..]));
    assert_eq!(components.get(4), Some(&[4, 5][..]));
    assert_eq!(components.get(7), None);

    components.retain_min_size(4);
    assert!(components.is_empty());
}

#[test]
fn empty_graph() {
    let result = compute_connected_components(Vec::<(u64, u64)>::new(), Vec::new(), 1).unwrap();
    assert!(result.converged);
    assert!(result.assignment.is_empty());
    assert_eq!(result.iterations_used, 0);
}

#[test]
fn zero_iterations_rejected() {
    assert!(matches!(LabelPropagation::new(0), Err(Error::ZeroIterations)));
    assert!(matches!(
        compute_connected_components(vec![(1u64, 2)], Vec::new(), 0),
        Err(Error::ZeroIterations)
    ));
}

#[test]
fn bridged_complete_graphs() {
    let graph = bridged_k_graphs(4, 4);
    let outcome = run(&graph, 10);

    // the bridge joins both K4s into one component
    assert!(outcome.is_converged());
    assert_eq!(distinct_labels(outcome.labels()), BTreeSet::from([0]));

    let apart = Graph::from_edges(k_graph_edges(0, 4).into_iter().chain(k_graph_edges(4, 4)));
    let outcome = run(&apart, 10);
    assert_eq!(distinct_labels(outcome.labels()), BTreeSet::from([0, 4]));
    assert_eq!(outcome.labels().components().sizes(), vec![4, 4]);
}

#[test]
fn labels_never_increase() {
    let graph = chain(&[9, 4, 8, 2, 7, 1, 6, 3, 5]);
    let adjacency = Adjacency::from_graph(&graph);

    let mut current = Labels::initial(&adjacency);
    for node in adjacency.nodes() {
        assert_eq!(current.get(*node), Some(*node));
    }

    loop {
        let next = propagate(&adjacency, &current);
        assert_eq!(next.generation(), current.generation() + 1);
        for ((_, old), (_, new)) in current.iter().zip(next.iter()) {
            assert!(new <= old);
        }
        if !has_changed(&current, &next) {
            break;
        }
        current = next;
    }

    // one more step at the fixed point changes nothing
    let again = propagate(&adjacency, &current);
    assert!(!has_changed(&current, &again));
    assert!(current.iter().all(|(_, label)| label == 1));
}

#[test]
fn parallel_and_frontier_steps_match_full_steps() {
    let mut edges = k_graph_edges(20, 5);
    edges.extend(vec![(3, 9), (9, 14), (14, 2), (2, 40), (40, 41), (7, 7), (30, 31), (31, 30)]);
    let graph = Graph::from_edges(edges).with_isolated(vec![100]);
    let adjacency = Adjacency::from_graph(&graph);

    let mut full = Labels::initial(&adjacency);
    let mut frontier_labels = Labels::initial(&adjacency);
    let mut frontier: Vec<usize> = (0..adjacency.num_nodes()).collect();

    for _ in 0..10 {
        let next = propagate(&adjacency, &full);
        let par = propagate_par(&adjacency, &full);
        let (next_frontier, changed) = propagate_frontier(&adjacency, &frontier_labels, &frontier);

        assert_eq!(next.as_slice(), par.as_slice());
        assert_eq!(next.as_slice(), next_frontier.as_slice());
        assert_eq!(changed.is_empty(), !has_changed(&full, &next));

        full = next;
        frontier_labels = next_frontier;
        frontier = changed;
    }
}

#[test]
fn strategies_agree_on_outcome() {
    let graph = chain(&[12, 3, 8, 5, 1, 10, 6]).with_isolated(vec![2]);
    let adjacency = Adjacency::from_graph(&graph);

    let base = LabelPropagation::new(50).unwrap();
    let outcomes = vec![
        base.clone().with_parallel(false).run(&adjacency),
        base.clone().with_parallel(true).run(&adjacency),
        base.clone().with_strategy(Strategy::Frontier).run(&adjacency),
    ];

    for outcome in &outcomes {
        assert!(outcome.is_converged());
        assert_eq!(outcome.iterations(), outcomes[0].iterations());
        assert_eq!(outcome.labels().as_slice(), outcomes[0].labels().as_slice());
        assert_eq!(outcome.labels().generation(), outcome.iterations());
    }
}

#[test]
fn cancellation_at_generation_boundary() {
    let graph = chain(&[1, 2, 3, 4]);
    let adjacency = Adjacency::from_graph(&graph);
    let propagation = LabelPropagation::new(10).unwrap();

    let cancel = AtomicBool::new(true);
    match propagation.run_cancellable(&adjacency, &cancel) {
        Err(Error::Cancelled { generation }) => assert_eq!(generation, 0),
        other => panic!("expected cancellation, got {:?}", other),
    }

    let cancel = AtomicBool::new(false);
    let outcome = propagation.run_cancellable(&adjacency, &cancel).unwrap();
    assert!(outcome.is_converged());
    assert_eq!(outcome.iterations(), 3);
}

#[test]
fn cancellable_run_matches_plain_run() {
    let graph = chain(&[6, 2, 9, 4, 1, 8]);
    let adjacency = Adjacency::from_graph(&graph);
    let cancel = AtomicBool::new(false);

    for cap in 1..8 {
        for strategy in [Strategy::Full, Strategy::Frontier] {
            let propagation = LabelPropagation::new(cap).unwrap().with_strategy(strategy);
            let plain = propagation.run(&adjacency);
            let cancellable = propagation.run_cancellable(&adjacency, &cancel).unwrap();

            assert_eq!(plain.is_converged(), cancellable.is_converged(), "cap {}", cap);
            assert_eq!(plain.iterations(), cancellable.iterations());
            assert_eq!(plain.labels().as_slice(), cancellable.labels().as_slice());
        }
    }
}
