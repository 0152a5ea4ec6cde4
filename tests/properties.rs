//! Property-based tests for the pad assignment engine.
//!
//! Drives the single-link resolver over randomized small graphs and checks
//! the engine-wide invariants: landing uniqueness, launch sharing,
//! idempotence, forced priority, consensus majorities, and overflow
//! distinctness.

use pad_engine::{
    resolve_link, vote, LegacyPadMap, Link, NodeId, PadAssignment, PadCapacityModel,
    PadConstraintSet, PadGraph, PadIndex, PadNode,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Builds a graph of `n_nodes` shared-namespace nodes and resolves the given
/// edge list one link at a time, the way incremental editing does.
fn resolve_all(n_nodes: usize, edges: &[(usize, usize)], pad_count: u32) -> PadGraph {
    let _ = env_logger::builder().is_test(true).try_init();
    let caps = PadCapacityModel::shared(pad_count);
    let mut graph = PadGraph::new();
    let ids: Vec<NodeId> = (0..n_nodes)
        .map(|_| graph.add_node(PadNode::new(caps)))
        .collect();
    for &(s, t) in edges {
        let source = ids[s % n_nodes];
        let target = ids[t % n_nodes];
        let pads = resolve_link(source, target, &caps, &caps, &graph.links, None, None);
        graph.add_link(source, target, pads).unwrap();
    }
    graph
}

/// Per-node invariant sweep over a resolved graph.
fn check_invariants(graph: &PadGraph) -> Result<(), String> {
    let node_ids: BTreeSet<NodeId> = graph.nodes.keys().copied().collect();
    for node in node_ids {
        let launches: BTreeSet<PadIndex> = graph
            .links
            .iter()
            .filter(|l| l.source == node)
            .map(|l| l.launch)
            .collect();
        if launches.len() > 1 {
            return Err(format!("node {node} launches from {launches:?}"));
        }

        let mut seen: BTreeSet<PadIndex> = BTreeSet::new();
        for link in graph.links.iter().filter(|l| l.target == node) {
            if link.landing >= 0 && !seen.insert(link.landing) {
                return Err(format!(
                    "node {node} has two links on landing pad {}",
                    link.landing
                ));
            }
            if let Some(&launch) = launches.iter().next() {
                if link.landing == launch {
                    return Err(format!(
                        "node {node} lands a link on its launch pad {launch}"
                    ));
                }
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// For any edge list within a node's fixed capacity, sequential
    /// resolution never duplicates a non-overflow landing pad, never lands a
    /// link on a shared-namespace node's launch pad, and gives all links
    /// sharing a source one launch pad.
    #[test]
    fn sequential_resolution_upholds_invariants(
        n_nodes in 2usize..8,
        edges in prop::collection::vec((0usize..8, 0usize..8), 1..8),
    ) {
        let graph = resolve_all(n_nodes, &edges, 8);
        if let Err(violation) = check_invariants(&graph) {
            prop_assert!(false, "{}", violation);
        }
    }

    /// Re-resolving any single link of an already-resolved, collision-free
    /// graph (against the other links) reproduces its assignment: no churn.
    #[test]
    fn resolution_is_idempotent(
        n_nodes in 2usize..8,
        edges in prop::collection::vec((0usize..8, 0usize..8), 1..8),
    ) {
        let graph = resolve_all(n_nodes, &edges, 8);
        let caps = PadCapacityModel::shared(8);
        for (pos, link) in graph.links.iter().enumerate() {
            let others: Vec<Link> = graph
                .links
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != pos)
                .map(|(_, l)| l.clone())
                .collect();
            let again = resolve_link(
                link.source,
                link.target,
                &caps,
                &caps,
                &others,
                None,
                None,
            );
            prop_assert_eq!(
                again,
                link.pads(),
                "link {} churned from {:?}",
                link.id,
                link.pads()
            );
        }
    }

    /// The same edge list resolved twice yields the same pad sequence.
    #[test]
    fn resolution_is_deterministic(
        n_nodes in 2usize..8,
        edges in prop::collection::vec((0usize..8, 0usize..8), 1..12),
    ) {
        let first = resolve_all(n_nodes, &edges, 8);
        let second = resolve_all(n_nodes, &edges, 8);
        let pads = |g: &PadGraph| -> Vec<PadAssignment> {
            g.links.iter().map(Link::pads).collect()
        };
        prop_assert_eq!(pads(&first), pads(&second));
    }

    /// A forced constraint is returned exactly, whatever else occupies the
    /// endpoints.
    #[test]
    fn forced_constraints_win(
        launch in 0i32..16,
        landing in -4i32..16,
        edges in prop::collection::vec((0usize..4, 0usize..4), 0..6),
    ) {
        let graph = resolve_all(4, &edges, 8);
        let caps = PadCapacityModel::shared(8);
        let node_ids: Vec<NodeId> = {
            let mut ids: Vec<NodeId> = graph.nodes.keys().copied().collect();
            ids.sort();
            ids
        };
        let constraints = PadConstraintSet::forced(PadAssignment::new(launch, landing));

        let pads = resolve_link(
            node_ids[0],
            node_ids[1],
            &caps,
            &caps,
            &graph.links,
            Some(&constraints),
            None,
        );

        prop_assert_eq!(pads, PadAssignment::new(launch, landing));
    }

    /// With `a` links on one pad and `b` on another, the majority pad wins
    /// the vote and the repair list is exactly the minority.
    #[test]
    fn consensus_majority_wins(a in 1u32..6, b in 1u32..6) {
        prop_assume!(a != b);
        let caps = PadCapacityModel::shared(8);
        let mut graph = PadGraph::new();
        let hub = graph.add_node(PadNode::new(caps));
        for i in 0..(a + b) {
            let spoke = graph.add_node(PadNode::new(caps));
            let launch = if i < a { 0 } else { 1 };
            graph
                .add_link(hub, spoke, PadAssignment::new(launch, 0))
                .unwrap();
        }

        let outcome = vote(hub, &graph.links, None).unwrap();

        let expected_winner = if a > b { 0 } else { 1 };
        prop_assert_eq!(outcome.winning_pad, expected_winner);
        prop_assert_eq!(outcome.repairs.len() as u32, a.min(b));
    }

    /// A full target keeps accepting links on fresh overflow indices, all
    /// distinct and all negative.
    #[test]
    fn overflow_pads_stay_distinct(extra in 1usize..6) {
        let pad_count = 4u32;
        let caps = PadCapacityModel::shared(pad_count);
        let mut graph = PadGraph::new();
        let hub = graph.add_node(PadNode::new(caps));
        let total = pad_count as usize + extra;
        for _ in 0..total {
            let spoke = graph.add_node(PadNode::new(caps));
            let pads = resolve_link(spoke, hub, &caps, &caps, &graph.links, None, None);
            graph.add_link(spoke, hub, pads).unwrap();
        }

        let landings: Vec<PadIndex> = graph.links.iter().map(|l| l.landing).collect();
        let distinct: BTreeSet<PadIndex> = landings.iter().copied().collect();
        prop_assert_eq!(distinct.len(), total, "duplicate landing in {:?}", landings);
        let overflow: Vec<PadIndex> =
            landings.iter().copied().filter(|&p| p < 0).collect();
        prop_assert_eq!(overflow.len(), extra);
    }

    /// Legacy hints steer a rebuilt link back toward the prior layout: the
    /// old launch pad is reused and old landing pads are avoided.
    #[test]
    fn legacy_hints_bias_without_forcing(old_launch in 0i32..8) {
        let caps = PadCapacityModel::shared(8);
        let mut old_graph = PadGraph::new();
        let a = old_graph.add_node(PadNode::new(caps));
        let b = old_graph.add_node(PadNode::new(caps));
        old_graph
            .add_link(a, b, PadAssignment::new(old_launch, 2))
            .unwrap();
        let legacy = LegacyPadMap::from_graph(&old_graph);

        let mut constraints = PadConstraintSet::new();
        if let Some(pad) = legacy.launch_for(&a) {
            constraints.note_used_launch_pad(pad).unwrap();
        }
        for &pad in legacy.landings_for(&b).into_iter().flatten() {
            constraints.note_used_landing_pad(pad).unwrap();
        }

        let pads = resolve_link(a, b, &caps, &caps, &[], Some(&constraints), None);

        prop_assert_eq!(pads.launch, old_launch);
        prop_assert_ne!(pads.landing, 2);
    }
}

/// The scenario from the engine's documentation: a fresh link lands on the
/// lowest pad the target has free, deterministically.
#[test]
fn scenario_lowest_free_landing() {
    let caps = PadCapacityModel::shared(4);
    let mut graph = PadGraph::new();
    let a = graph.add_node(PadNode::new(caps));
    let b = graph.add_node(PadNode::new(caps));
    let c = graph.add_node(PadNode::new(caps));
    // B already uses its pad 0
    graph.add_link(c, b, PadAssignment::new(0, 0)).unwrap();

    let pads = resolve_link(a, b, &caps, &caps, &graph.links, None, None);

    assert_eq!(pads.launch, 0);
    assert_eq!(pads.landing, 1);
}
