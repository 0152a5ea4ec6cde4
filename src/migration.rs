//! Legacy-aware migration helpers.
//!
//! When a diagram is rebuilt from a higher-level instruction set, pad
//! continuity for retained nodes and links comes from a [`LegacyPadMap`]
//! built off the prior snapshot: an exact 1:1 link replacement is forced
//! onto its old pads, everything else is merely biased toward the old
//! layout through used-pad hints.

use crate::constraints::{LegacyPadMap, PadConstraintSet};
use crate::resolver::resolve_link;
use crate::types::{Link, LinkId, LinkIndex, NodeId, PadAssignment, PadGraph};
use std::collections::BTreeMap;

/// One link of a rebuilt diagram awaiting pad assignment.
#[derive(Debug, Clone)]
pub struct RebuiltLink {
    /// Identifier the rebuilt link will carry
    pub id: LinkId,
    /// ID of the source node
    pub source: NodeId,
    /// ID of the target node
    pub target: NodeId,
    /// The prior link this one replaces 1:1, if any
    pub replaces: Option<LinkId>,
}

/// Derives the constraint set for one rebuilt link.
///
/// An exact 1:1 replacement forces the old pad pair. Otherwise the source's
/// previous launch pad and the target's previous landing set are carried
/// over as hints, so the resolver is biased toward the old layout without
/// being forced to it.
pub fn constraints_from_legacy(
    legacy: &LegacyPadMap,
    replaces: Option<LinkId>,
    source: NodeId,
    target: NodeId,
) -> PadConstraintSet {
    if let Some(old) = replaces.and_then(|id| legacy.assignment_for(&id)) {
        return PadConstraintSet::forced(old);
    }

    let launch_hints = legacy.launch_for(&source);
    let landing_hints = legacy
        .landings_for(&target)
        .map(|pads| pads.iter().copied().collect::<Vec<_>>())
        .unwrap_or_default();
    PadConstraintSet::preferred(launch_hints, landing_hints)
}

/// Assigns pads to a batch of rebuilt links.
///
/// Links are resolved in link-id order over an incrementally extended
/// topology: each resolved link joins the working link list before the next
/// one is computed, so later links see the pads earlier ones claimed. The
/// graph's own links are the starting topology.
pub fn assign_rebuilt_links(
    graph: &PadGraph,
    rebuilt: &[RebuiltLink],
    legacy: &LegacyPadMap,
) -> BTreeMap<LinkId, PadAssignment> {
    let mut working: Vec<Link> = graph.links.clone();
    let mut index = LinkIndex::build(&working);

    let mut order: Vec<&RebuiltLink> = rebuilt.iter().collect();
    order.sort_by_key(|r| r.id);

    let mut assignments = BTreeMap::new();
    for rebuilt_link in order {
        let source_caps = graph
            .capacity(&rebuilt_link.source)
            .copied()
            .unwrap_or_default();
        let target_caps = graph
            .capacity(&rebuilt_link.target)
            .copied()
            .unwrap_or_default();
        let constraints = constraints_from_legacy(
            legacy,
            rebuilt_link.replaces,
            rebuilt_link.source,
            rebuilt_link.target,
        );

        let pads = resolve_link(
            rebuilt_link.source,
            rebuilt_link.target,
            &source_caps,
            &target_caps,
            &working,
            Some(&constraints),
            Some(&index),
        );

        let link = Link {
            id: rebuilt_link.id,
            source: rebuilt_link.source,
            target: rebuilt_link.target,
            launch: pads.launch,
            landing: pads.landing,
        };
        index.note_link(working.len(), &link);
        working.push(link);
        assignments.insert(rebuilt_link.id, pads);
    }
    assignments
}
