//! Whole-model invariant audit and repair application.
//!
//! [`audit_model`] scans every graph in a diagram model for pad invariant
//! violations (disagreeing launch pads, duplicate landings, launch/landing
//! collisions on shared-namespace nodes, out-of-range pads) and returns a
//! repair list without touching anything. [`apply_fixups`] is the separate,
//! idempotent application pass, so an audit can always be dry-run first.

use crate::capacity::PadCapacityModel;
use crate::consensus;
use crate::constants::{DEFAULT_LAUNCH_PAD, FIRST_OVERFLOW_PAD};
use crate::types::{
    DiagramModel, Link, LinkId, LinkIndex, NodeId, PadFixup, PadGraph, PadIndex, RankedPadChoice,
};
use std::collections::{BTreeMap, BTreeSet};

/// Audits every graph in the model and returns the combined repair list.
///
/// `rankings` supplies each link's geometrically ranked landing pads, as far
/// as the caller has them; links without rankings are relocated to the
/// lowest workable pad instead.
pub fn audit_model(
    model: &DiagramModel,
    rankings: &BTreeMap<LinkId, Vec<RankedPadChoice>>,
) -> Vec<PadFixup> {
    let mut fixups = Vec::new();
    for graph in &model.graphs {
        fixups.extend(audit_graph(graph, rankings));
    }
    fixups
}

/// Audits a single graph. Side-effect-free.
pub fn audit_graph(
    graph: &PadGraph,
    rankings: &BTreeMap<LinkId, Vec<RankedPadChoice>>,
) -> Vec<PadFixup> {
    let index = LinkIndex::build(&graph.links);
    let mut fixups = Vec::new();

    let mut node_ids: Vec<NodeId> = graph.nodes.keys().copied().collect();
    node_ids.sort();

    for node in node_ids {
        let Some(caps) = graph.capacity(&node).copied() else {
            continue;
        };

        let mut outbound: Vec<&Link> =
            index.outbound(&node).iter().map(|&p| &graph.links[p]).collect();
        outbound.sort_by_key(|l| l.id);
        let mut inbound: Vec<&Link> =
            index.inbound(&node).iter().map(|&p| &graph.links[p]).collect();
        inbound.sort_by_key(|l| l.id);

        // Launch agreement. Disagreement or an out-of-range pad goes through
        // the consensus vote.
        let mut resolved_launch: Option<PadIndex> = None;
        if !outbound.is_empty() {
            let distinct: BTreeSet<PadIndex> = outbound.iter().map(|l| l.launch).collect();
            let all_valid = distinct.iter().all(|&p| caps.is_valid_launch(p));
            if distinct.len() == 1 && all_valid {
                resolved_launch = distinct.iter().next().copied();
            } else {
                let winner = consensus::vote(node, &graph.links, Some(&index))
                    .map(|outcome| outcome.winning_pad)
                    .filter(|&pad| caps.is_valid_launch(pad))
                    .unwrap_or(DEFAULT_LAUNCH_PAD);
                for link in &outbound {
                    if link.launch != winner {
                        fixups.push(PadFixup {
                            graph: graph.id,
                            link: link.id,
                            is_launch_change: true,
                            new_pad: winner,
                        });
                    }
                }
                resolved_launch = Some(winner);
            }
        }

        // Landing scan: the first link (by id) on a pad keeps it, everything
        // colliding or out of range is relocated.
        let mut claimed: BTreeSet<PadIndex> = BTreeSet::new();
        let mut colliders: Vec<&Link> = Vec::new();
        for link in &inbound {
            let pad = link.landing;
            let overflow = PadCapacityModel::is_overflow(pad);
            let launch_clash = caps.shared_namespace && resolved_launch == Some(pad);
            let duplicate = !overflow && claimed.contains(&pad);
            let out_of_range = !overflow && !caps.is_fixed_landing(pad);
            let illegal_overflow = overflow && !caps.landing_pads_can_overflow;
            if launch_clash || duplicate || out_of_range || illegal_overflow {
                colliders.push(link);
            } else {
                claimed.insert(pad);
            }
        }
        for link in colliders {
            let new_pad = relocation_pad(
                node,
                &caps,
                &claimed,
                resolved_launch,
                rankings.get(&link.id),
            );
            claimed.insert(new_pad);
            fixups.push(PadFixup {
                graph: graph.id,
                link: link.id,
                is_launch_change: false,
                new_pad,
            });
        }
    }

    fixups
}

/// Applies a repair list to the model. Unknown graphs or links are skipped;
/// re-applying the same list is a no-op.
pub fn apply_fixups(model: &mut DiagramModel, fixups: &[PadFixup]) {
    for fixup in fixups {
        let Some(graph) = model.graph_mut(&fixup.graph) else {
            continue;
        };
        let Some(link) = graph.link_mut(&fixup.link) else {
            continue;
        };
        if fixup.is_launch_change {
            link.launch = fixup.new_pad;
        } else {
            link.landing = fixup.new_pad;
        }
    }
}

/// New landing pad for a relocated link: nearest ranked free pad, then the
/// lowest free pad, then an overflow pad, then any non-launch pad even if
/// occupied. The engine never leaves a launch/landing collision in place.
fn relocation_pad(
    node: NodeId,
    caps: &PadCapacityModel,
    claimed: &BTreeSet<PadIndex>,
    launch: Option<PadIndex>,
    choices: Option<&Vec<RankedPadChoice>>,
) -> PadIndex {
    let blocked = |pad: PadIndex| {
        claimed.contains(&pad) || (caps.shared_namespace && launch == Some(pad))
    };

    if let Some(choices) = choices {
        let mut ranked: Vec<&RankedPadChoice> = choices.iter().collect();
        ranked.sort_by_key(|c| c.rank);
        for choice in ranked {
            if caps.is_fixed_landing(choice.pad) && !blocked(choice.pad) {
                return choice.pad;
            }
        }
    }

    for pad in 0..caps.landing_pad_max {
        if !blocked(pad) {
            return pad;
        }
    }

    if caps.may_overflow() {
        return claimed
            .iter()
            .next()
            .filter(|&&p| p < 0)
            .map(|p| p - 1)
            .unwrap_or(FIRST_OVERFLOW_PAD);
    }

    log::warn!("node {node}: no unoccupied landing pad left; reusing an occupied pad");
    for pad in 0..caps.landing_pad_max {
        if !(caps.shared_namespace && launch == Some(pad)) {
            return pad;
        }
    }
    caps.last_fixed_landing()
}
