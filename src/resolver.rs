//! Single-link pad computation.
//!
//! [`resolve_link`] decides the launch/landing pair for one source/target
//! pair given the existing link topology. It is a pure function over its
//! inputs with no side effects, so it doubles as a what-if query during
//! incremental edits; batch operations call it once per link with a shared
//! [`LinkIndex`](crate::types::LinkIndex).

use crate::capacity::PadCapacityModel;
use crate::constants::{DEFAULT_LAUNCH_PAD, FIRST_OVERFLOW_PAD};
use crate::constraints::PadConstraintSet;
use crate::types::{Link, LinkIndex, NodeId, NodePadUsage, PadAssignment, PadIndex};

/// Computes the pad pair for a link from `source` to `target`.
///
/// A `Forced` constraint is returned immediately without touching the
/// topology. Otherwise the launch pad is shared with any existing link
/// launching from `source` (fan-out links depart from one pad and are
/// rendered as a tree), and the landing pad is the lowest free index on
/// `target` after folding in the constraint's used-pad hints.
///
/// When every fixed landing pad is taken, a fresh overflow index is
/// synthesized if the target's type permits it; otherwise the highest fixed
/// index is reused and the resulting collision is left for the collision
/// resolver or the audit pass.
///
/// # Arguments
///
/// * `source` / `target` - The link's endpoints
/// * `source_caps` / `target_caps` - Capacity models of the endpoint types
/// * `links` - The existing link topology (the link being resolved excluded)
/// * `constraints` - Optional per-link override or legacy hints
/// * `index` - Optional inverted index over `links` for O(degree) lookups
pub fn resolve_link(
    source: NodeId,
    target: NodeId,
    source_caps: &PadCapacityModel,
    target_caps: &PadCapacityModel,
    links: &[Link],
    constraints: Option<&PadConstraintSet>,
    index: Option<&LinkIndex>,
) -> PadAssignment {
    if let Some(forced) = constraints.and_then(|c| c.forced_pads()) {
        return forced;
    }

    let source_usage = NodePadUsage::for_node(source, links, index);
    let launch = choose_launch(source_caps, &source_usage, constraints);

    let target_usage = if source == target {
        source_usage
    } else {
        NodePadUsage::for_node(target, links, index)
    };
    let landing = choose_landing(
        target_caps,
        &target_usage,
        constraints,
        (source == target).then_some(launch),
    );

    PadAssignment::new(launch, landing)
}

/// Picks the launch pad on the source node.
///
/// Priority: the pad other outbound links already use, then the smallest
/// legacy used-launch hint, then the lowest launch index not occupied by a
/// landing (shared namespace only), then pad 0.
fn choose_launch(
    caps: &PadCapacityModel,
    usage: &NodePadUsage,
    constraints: Option<&PadConstraintSet>,
) -> PadIndex {
    if let Some(pad) = usage.source_pad {
        return pad;
    }
    if let Some(hint) = constraints
        .and_then(|c| c.used_launch_pads())
        .and_then(|pads| pads.iter().next().copied())
    {
        return hint;
    }
    if caps.shared_namespace {
        for pad in 0..caps.launch_pad_max {
            if !usage.occupied_landings.contains(&pad) {
                return pad;
            }
        }
    }
    DEFAULT_LAUNCH_PAD
}

/// Picks the landing pad on the target node.
///
/// `own_launch` carries the just-chosen launch pad when the link is a
/// self-loop, so the landing cannot collide with it on a shared-namespace
/// node.
fn choose_landing(
    caps: &PadCapacityModel,
    usage: &NodePadUsage,
    constraints: Option<&PadConstraintSet>,
    own_launch: Option<PadIndex>,
) -> PadIndex {
    let mut occupied = usage.occupied_landings.clone();
    let mut overflow = usage.overflow_pads.clone();
    if let Some(hints) = constraints.and_then(|c| c.used_landing_pads()) {
        for &pad in hints {
            if PadCapacityModel::is_overflow(pad) {
                overflow.insert(pad);
            } else {
                occupied.insert(pad);
            }
        }
    }
    if caps.shared_namespace {
        if let Some(pad) = usage.source_pad {
            occupied.insert(pad);
        }
        if let Some(pad) = own_launch {
            occupied.insert(pad);
        }
    }

    for pad in 0..caps.landing_pad_max {
        if !occupied.contains(&pad) {
            return pad;
        }
    }

    if caps.may_overflow() {
        let pad = overflow
            .iter()
            .next()
            .map(|lowest| lowest - 1)
            .unwrap_or(FIRST_OVERFLOW_PAD);
        log::debug!("landing pads exhausted; synthesizing overflow pad {pad}");
        return pad;
    }

    // No free pad and no overflow: accept the collision on the highest fixed
    // index, to be repaired by a later pass.
    caps.last_fixed_landing()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::PadCapacityModel;
    use crate::types::{PadGraph, PadNode};

    fn shared_graph(pad_count: u32, nodes: usize) -> (PadGraph, Vec<NodeId>) {
        let mut graph = PadGraph::new();
        let ids = (0..nodes)
            .map(|_| graph.add_node(PadNode::new(PadCapacityModel::shared(pad_count))))
            .collect();
        (graph, ids)
    }

    #[test]
    fn test_first_link_between_fresh_nodes() {
        let (graph, ids) = shared_graph(4, 2);
        let caps = PadCapacityModel::shared(4);

        let pads = resolve_link(ids[0], ids[1], &caps, &caps, &graph.links, None, None);

        assert_eq!(pads, PadAssignment::new(0, 0));
    }

    #[test]
    fn test_landing_skips_occupied_pads() {
        let (mut graph, ids) = shared_graph(4, 3);
        let caps = PadCapacityModel::shared(4);
        graph.add_link(ids[2], ids[1], PadAssignment::new(0, 0)).unwrap();

        let pads = resolve_link(ids[0], ids[1], &caps, &caps, &graph.links, None, None);

        assert_eq!(pads.landing, 1);
    }

    #[test]
    fn test_landing_avoids_target_launch_pad() {
        let (mut graph, ids) = shared_graph(4, 3);
        let caps = PadCapacityModel::shared(4);
        // target launches from pad 0, so pad 0 is out of the landing pool
        graph.add_link(ids[1], ids[2], PadAssignment::new(0, 0)).unwrap();

        let pads = resolve_link(ids[0], ids[1], &caps, &caps, &graph.links, None, None);

        assert_eq!(pads.landing, 1);
    }

    #[test]
    fn test_launch_shared_across_fan_out() {
        let (mut graph, ids) = shared_graph(4, 3);
        let caps = PadCapacityModel::shared(4);
        graph.add_link(ids[0], ids[1], PadAssignment::new(2, 0)).unwrap();

        let pads = resolve_link(ids[0], ids[2], &caps, &caps, &graph.links, None, None);

        assert_eq!(pads.launch, 2);
    }

    #[test]
    fn test_forced_constraint_bypasses_topology() {
        let (mut graph, ids) = shared_graph(4, 2);
        let caps = PadCapacityModel::shared(4);
        // pads 3 and 5 are both occupied; forced wins anyway
        graph.add_link(ids[0], ids[1], PadAssignment::new(3, 5)).unwrap();
        let constraints = PadConstraintSet::forced(PadAssignment::new(3, 5));

        let pads = resolve_link(
            ids[0],
            ids[1],
            &caps,
            &caps,
            &graph.links,
            Some(&constraints),
            None,
        );

        assert_eq!(pads, PadAssignment::new(3, 5));
    }

    #[test]
    fn test_legacy_launch_hint_biases_launch() {
        let (graph, ids) = shared_graph(4, 2);
        let caps = PadCapacityModel::shared(4);
        let constraints = PadConstraintSet::preferred([3], []);

        let pads = resolve_link(
            ids[0],
            ids[1],
            &caps,
            &caps,
            &graph.links,
            Some(&constraints),
            None,
        );

        assert_eq!(pads.launch, 3);
    }

    #[test]
    fn test_legacy_landing_hints_treated_as_occupied() {
        let (graph, ids) = shared_graph(4, 2);
        let caps = PadCapacityModel::shared(4);
        let constraints = PadConstraintSet::preferred([], [0, 1]);

        let pads = resolve_link(
            ids[0],
            ids[1],
            &caps,
            &caps,
            &graph.links,
            Some(&constraints),
            None,
        );

        assert_eq!(pads.landing, 2);
    }

    #[test]
    fn test_overflow_synthesized_when_full() {
        let (mut graph, ids) = shared_graph(4, 6);
        let caps = PadCapacityModel::shared(4);
        // fill pads 1..4 on the target; pad 0 is its launch pad
        graph.add_link(ids[1], ids[2], PadAssignment::new(0, 0)).unwrap();
        for (i, landing) in [1, 2, 3].iter().enumerate() {
            graph
                .add_link(ids[2 + i], ids[1], PadAssignment::new(0, *landing))
                .unwrap();
        }

        let first = resolve_link(ids[0], ids[1], &caps, &caps, &graph.links, None, None);
        assert_eq!(first.landing, -1);

        // with the first overflow link in place the next one goes below it
        graph
            .add_link(ids[0], ids[1], PadAssignment::new(first.launch, first.landing))
            .unwrap();
        let second = resolve_link(ids[5], ids[1], &caps, &caps, &graph.links, None, None);
        assert_eq!(second.landing, -2);
    }

    #[test]
    fn test_highest_pad_reused_when_overflow_disallowed() {
        let mut graph = PadGraph::new();
        let caps = PadCapacityModel::dedicated_source(2);
        let a = graph.add_node(PadNode::new(caps));
        let b = graph.add_node(PadNode::new(caps));
        let c = graph.add_node(PadNode::new(caps));
        let d = graph.add_node(PadNode::new(caps));
        graph.add_link(b, a, PadAssignment::new(0, 0)).unwrap();
        graph.add_link(c, a, PadAssignment::new(0, 1)).unwrap();

        let pads = resolve_link(d, a, &caps, &caps, &graph.links, None, None);

        // capacity exhausted, no overflow: highest fixed index is reused
        assert_eq!(pads.landing, 1);
    }

    #[test]
    fn test_self_loop_keeps_launch_and_landing_distinct() {
        let (graph, ids) = shared_graph(4, 1);
        let caps = PadCapacityModel::shared(4);

        let pads = resolve_link(ids[0], ids[0], &caps, &caps, &graph.links, None, None);

        assert_eq!(pads.launch, 0);
        assert_eq!(pads.landing, 1);
    }

    #[test]
    fn test_launch_avoids_landing_on_shared_source() {
        let (mut graph, ids) = shared_graph(4, 3);
        let caps = PadCapacityModel::shared(4);
        // something already lands on pad 0 of the source
        graph.add_link(ids[2], ids[0], PadAssignment::new(0, 0)).unwrap();

        let pads = resolve_link(ids[0], ids[1], &caps, &caps, &graph.links, None, None);

        assert_eq!(pads.launch, 1);
    }

    #[test]
    fn test_index_and_scan_agree() {
        let (mut graph, ids) = shared_graph(4, 4);
        let caps = PadCapacityModel::shared(4);
        graph.add_link(ids[2], ids[1], PadAssignment::new(0, 0)).unwrap();
        graph.add_link(ids[3], ids[1], PadAssignment::new(1, 2)).unwrap();
        graph.add_link(ids[0], ids[3], PadAssignment::new(2, 0)).unwrap();

        let index = LinkIndex::build(&graph.links);
        let scanned = resolve_link(ids[0], ids[1], &caps, &caps, &graph.links, None, None);
        let indexed = resolve_link(
            ids[0],
            ids[1],
            &caps,
            &caps,
            &graph.links,
            None,
            Some(&index),
        );

        assert_eq!(scanned, indexed);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let (mut graph, ids) = shared_graph(6, 4);
        let caps = PadCapacityModel::shared(6);
        graph.add_link(ids[1], ids[2], PadAssignment::new(0, 0)).unwrap();
        graph.add_link(ids[3], ids[1], PadAssignment::new(1, 3)).unwrap();

        let first = resolve_link(ids[0], ids[1], &caps, &caps, &graph.links, None, None);
        for _ in 0..10 {
            let again = resolve_link(ids[0], ids[1], &caps, &caps, &graph.links, None, None);
            assert_eq!(first, again);
        }
    }
}
