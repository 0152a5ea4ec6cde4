//! Majority repair for disagreeing launch pads.
//!
//! Links launching from one node must share a single launch pad. Imported or
//! corrupt models sometimes violate this; [`vote`] picks the majority pad
//! and lists the links that need to move. This is strictly a recovery path
//! for data that was already inconsistent on input; it never fails.

use crate::types::{Link, LinkId, LinkIndex, NodeId, PadIndex};
use std::collections::{BTreeMap, BTreeSet};

/// The outcome of a launch-pad vote on one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusOutcome {
    /// The launch pad the node's outbound links settle on
    pub winning_pad: PadIndex,
    /// Links not yet on the winning pad, sorted by link id
    pub repairs: Vec<LinkId>,
}

/// Votes on the launch pad of `node`.
///
/// Each outbound link votes for its current launch pad; the pad with the
/// most votes wins. Ties prefer a pad not already used as a landing on the
/// same node (moving there would just trade one collision for another),
/// then the numerically smallest pad. Returns `None` for a node with no
/// outbound links.
pub fn vote(node: NodeId, links: &[Link], index: Option<&LinkIndex>) -> Option<ConsensusOutcome> {
    let mut voters: Vec<&Link> = Vec::new();
    let mut landings: BTreeSet<PadIndex> = BTreeSet::new();
    match index {
        Some(idx) => {
            voters.extend(idx.outbound(&node).iter().map(|&p| &links[p]));
            landings.extend(idx.inbound(&node).iter().map(|&p| links[p].landing));
        }
        None => {
            for link in links {
                if link.source == node {
                    voters.push(link);
                }
                if link.target == node {
                    landings.insert(link.landing);
                }
            }
        }
    }
    if voters.is_empty() {
        return None;
    }

    let mut tally: BTreeMap<PadIndex, u32> = BTreeMap::new();
    for link in &voters {
        *tally.entry(link.launch).or_insert(0) += 1;
    }
    let best_count = tally.values().copied().max().unwrap_or(0);
    let tied: Vec<PadIndex> = tally
        .iter()
        .filter(|(_, &count)| count == best_count)
        .map(|(&pad, _)| pad)
        .collect();
    let winning_pad = tied
        .iter()
        .copied()
        .find(|pad| !landings.contains(pad))
        .unwrap_or(tied[0]);

    let mut repairs: Vec<LinkId> = voters
        .iter()
        .filter(|l| l.launch != winning_pad)
        .map(|l| l.id)
        .collect();
    repairs.sort();
    if !repairs.is_empty() {
        log::warn!(
            "node {node} launch pads disagree; keeping pad {winning_pad}, moving {} of {} links",
            repairs.len(),
            voters.len()
        );
    }

    Some(ConsensusOutcome {
        winning_pad,
        repairs,
    })
}
