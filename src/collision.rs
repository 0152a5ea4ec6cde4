//! Multi-link collision resolution over a single node's pad pool.
//!
//! [`resolve_node`] partitions one node's pads among every link touching the
//! node, honoring forced and seeded assignments first and then running a
//! greedy, preference-ranked assignment for the rest. The tie-break walks
//! competing links' next-ranked choices with an explicit loop, handing the
//! contested pad to whichever link would suffer the bigger drop in
//! desirability if refused. Greedy and deterministic, not globally optimal.

use crate::capacity::PadCapacityModel;
use crate::constants::{DEFAULT_LAUNCH_PAD, FIRST_OVERFLOW_PAD};
use crate::constraints::PadConstraintSet;
use crate::error::PadError;
use crate::types::{Link, LinkId, LinkIndex, NodeId, PadAssignment, PadIndex, RankedPadChoice};
use std::collections::{BTreeMap, BTreeSet};

/// How strongly a landing claim is held during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClaimStrength {
    /// From a `Forced` constraint; never evicted.
    Hard,
    /// Seeded from a current assignment; the launch pad may steal it.
    Soft,
}

#[derive(Debug, Clone, Copy)]
struct LandingClaim {
    link: LinkId,
    strength: ClaimStrength,
}

/// Resolves every pad on `node` at once.
///
/// Inbound links without an entry in `landing_choices` keep their current
/// landing pad where possible; links with ranked choices are reassigned
/// through the scored greedy pass. `launch_choice` is the geometrically
/// preferred launch pad, consulted only when neither a forced constraint nor
/// the current outbound assignments fix the launch.
///
/// The result maps every touching link to its full pad pair: outbound links
/// carry the resolved launch and their current landing, inbound links the
/// reverse, self-loops both resolved sides.
///
/// Fails only on colliding `Forced` constraints; capacity exhaustion
/// degrades to overflow or highest-index reuse instead.
pub fn resolve_node(
    node: NodeId,
    caps: &PadCapacityModel,
    links: &[Link],
    index: &LinkIndex,
    landing_choices: &BTreeMap<LinkId, Vec<RankedPadChoice>>,
    launch_choice: Option<&RankedPadChoice>,
    constraints: &BTreeMap<LinkId, PadConstraintSet>,
) -> Result<BTreeMap<LinkId, PadAssignment>, PadError> {
    let mut outbound: Vec<&Link> = index.outbound(&node).iter().map(|&p| &links[p]).collect();
    outbound.sort_by_key(|l| l.id);
    let mut inbound: Vec<&Link> = index.inbound(&node).iter().map(|&p| &links[p]).collect();
    inbound.sort_by_key(|l| l.id);

    let mut launch: Option<(PadIndex, ClaimStrength)> = None;
    let mut landings: BTreeMap<PadIndex, LandingClaim> = BTreeMap::new();
    let mut assigned_landing: BTreeMap<LinkId, PadIndex> = BTreeMap::new();
    let mut waiting: BTreeSet<LinkId> = BTreeSet::new();

    // Pass 1a: forced launch pads. The first forced launch fixes the node's
    // launch pad; a disagreeing second one is a caller bug.
    for link in &outbound {
        if let Some(forced) = constraints.get(&link.id).and_then(|c| c.forced_pads()) {
            match launch {
                None => launch = Some((forced.launch, ClaimStrength::Hard)),
                Some((pad, _)) if pad == forced.launch => {
                    launch = Some((pad, ClaimStrength::Hard));
                }
                Some((pad, _)) => {
                    return Err(PadError::ForcedLaunchDisagreement {
                        node,
                        first: pad,
                        second: forced.launch,
                    });
                }
            }
        }
    }

    // Pass 1b: forced landing pads claim unconditionally; a second forced
    // claim on a claimed non-overflow pad fails.
    for link in &inbound {
        if let Some(forced) = constraints.get(&link.id).and_then(|c| c.forced_pads()) {
            let pad = forced.landing;
            let clashes_launch = caps.shared_namespace
                && matches!(launch, Some((p, ClaimStrength::Hard)) if p == pad);
            if clashes_launch {
                return Err(PadError::ForcedPadCollision { node, pad });
            }
            if !PadCapacityModel::is_overflow(pad) && landings.contains_key(&pad) {
                return Err(PadError::ForcedPadCollision { node, pad });
            }
            landings.entry(pad).or_insert(LandingClaim {
                link: link.id,
                strength: ClaimStrength::Hard,
            });
            assigned_landing.insert(link.id, pad);
        }
    }

    // Pass 1c: seed soft claims from current assignments. Links listed in
    // `landing_choices` are being re-ranked and go straight to the waiting
    // pool, as does any link whose current pad is invalid or already taken.
    for link in &inbound {
        if assigned_landing.contains_key(&link.id) {
            continue;
        }
        if landing_choices.contains_key(&link.id) {
            waiting.insert(link.id);
            continue;
        }
        let pad = link.landing;
        let valid = caps.is_fixed_landing(pad)
            || (PadCapacityModel::is_overflow(pad) && caps.landing_pads_can_overflow);
        let clashes_launch = caps.shared_namespace
            && matches!(launch, Some((p, _)) if p == pad);
        if valid && !clashes_launch && !landings.contains_key(&pad) {
            landings.insert(
                pad,
                LandingClaim {
                    link: link.id,
                    strength: ClaimStrength::Soft,
                },
            );
            assigned_landing.insert(link.id, pad);
        } else {
            waiting.insert(link.id);
        }
    }

    // Pass 2: fix the launch pad from unanimously agreeing current outbound
    // assignments when nothing forced it.
    if launch.is_none() && !outbound.is_empty() {
        let current: BTreeSet<PadIndex> =
            outbound.iter().map(|l| l.launch).filter(|&p| p >= 0).collect();
        if current.len() == 1 {
            let pad = *current.iter().next().unwrap_or(&DEFAULT_LAUNCH_PAD);
            if !is_hard_claimed(caps, &landings, pad) {
                launch = Some((pad, ClaimStrength::Soft));
            }
        }
    }

    // Pass 3: geometrically preferred launch, then lowest workable pad.
    // Stealing priority belongs to the launch pad, but only soft claims are
    // evicted; a forced landing is never overridden.
    if launch.is_none() && !outbound.is_empty() {
        if let Some(choice) = launch_choice {
            if caps.is_valid_launch(choice.pad) && !is_hard_claimed(caps, &landings, choice.pad) {
                launch = Some((choice.pad, ClaimStrength::Soft));
            }
        }
    }
    if launch.is_none() && !outbound.is_empty() {
        launch = Some((default_launch_pad(caps, &landings), ClaimStrength::Soft));
    }

    // Eviction: a soft landing claim sitting on the launch pad goes back to
    // the waiting pool and is re-resolved by the ranked pass.
    if caps.shared_namespace {
        if let Some((pad, _)) = launch {
            if let Some(claim) = landings.get(&pad) {
                if claim.strength == ClaimStrength::Soft {
                    let evicted = claim.link;
                    landings.remove(&pad);
                    assigned_landing.remove(&evicted);
                    waiting.insert(evicted);
                    log::debug!(
                        "launch pad {pad} steals the landing of link {evicted} on node {node}"
                    );
                }
            }
        }
    }

    // Pass 4: ranked landing assignment over the waiting pool.
    let launch_pad = launch.map(|(p, _)| p);
    run_ranked_assignment(
        caps,
        landing_choices,
        launch_pad,
        &mut landings,
        &mut assigned_landing,
        &waiting,
    );

    // Assemble the per-link pad pairs.
    let mut result: BTreeMap<LinkId, PadAssignment> = BTreeMap::new();
    for link in outbound.iter().chain(inbound.iter()) {
        let entry = result.entry(link.id).or_insert_with(|| link.pads());
        if link.source == node {
            if let Some(pad) = launch_pad {
                entry.launch = pad;
            }
        }
        if link.target == node {
            if let Some(&pad) = assigned_landing.get(&link.id) {
                entry.landing = pad;
            }
        }
    }
    Ok(result)
}

/// Whether a hard claim blocks `pad` as a launch on this node.
fn is_hard_claimed(
    caps: &PadCapacityModel,
    landings: &BTreeMap<PadIndex, LandingClaim>,
    pad: PadIndex,
) -> bool {
    caps.shared_namespace
        && matches!(landings.get(&pad), Some(c) if c.strength == ClaimStrength::Hard)
}

/// Lowest workable launch pad: unclaimed first, then merely not
/// hard-claimed, then pad 0.
fn default_launch_pad(
    caps: &PadCapacityModel,
    landings: &BTreeMap<PadIndex, LandingClaim>,
) -> PadIndex {
    if !caps.shared_namespace {
        return DEFAULT_LAUNCH_PAD;
    }
    for pad in 0..caps.launch_pad_max {
        if !landings.contains_key(&pad) {
            return pad;
        }
    }
    for pad in 0..caps.launch_pad_max {
        if !is_hard_claimed(caps, landings, pad) {
            return pad;
        }
    }
    DEFAULT_LAUNCH_PAD
}

/// The greedy scored assignment loop.
///
/// Repeatedly hands the globally best waiting request its pad. On a score
/// tie the links' remaining available choices are walked in lockstep: the
/// link whose next option is worse wins, a link with no further options
/// beats one that has them, and two exhausted links fall back to smallest
/// link id. Links whose whole preference list is consumed receive the
/// lowest not-yet-claimed pad afterwards.
fn run_ranked_assignment(
    caps: &PadCapacityModel,
    landing_choices: &BTreeMap<LinkId, Vec<RankedPadChoice>>,
    launch_pad: Option<PadIndex>,
    landings: &mut BTreeMap<PadIndex, LandingClaim>,
    assigned_landing: &mut BTreeMap<LinkId, PadIndex>,
    waiting: &BTreeSet<LinkId>,
) {
    let blocked_launch = caps.shared_namespace.then_some(launch_pad).flatten();

    // Per-link preference lists, sorted by rank, restricted to real pads.
    let mut pending: BTreeMap<LinkId, Vec<RankedPadChoice>> = BTreeMap::new();
    for &link in waiting {
        let mut choices: Vec<RankedPadChoice> = landing_choices
            .get(&link)
            .map(|c| {
                c.iter()
                    .filter(|choice| caps.is_fixed_landing(choice.pad))
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        choices.sort_by_key(|c| c.rank);
        pending.insert(link, choices);
    }

    loop {
        let available = |pad: PadIndex| {
            !landings.contains_key(&pad) && Some(pad) != blocked_launch
        };

        // The globally best (link, choice) among every waiting request.
        let mut winner: Option<(LinkId, usize)> = None;
        for (&link, choices) in &pending {
            let Some(pos) = choices.iter().position(|c| available(c.pad)) else {
                continue;
            };
            winner = match winner {
                None => Some((link, pos)),
                Some((best_link, best_pos)) => {
                    let incumbent = &pending[&best_link];
                    if challenger_beats(choices, pos, incumbent, best_pos, &available) {
                        Some((link, pos))
                    } else {
                        Some((best_link, best_pos))
                    }
                }
            };
        }

        let Some((link, pos)) = winner else { break };
        let pad = pending[&link][pos].pad;
        landings.insert(
            pad,
            LandingClaim {
                link,
                strength: ClaimStrength::Soft,
            },
        );
        assigned_landing.insert(link, pad);
        pending.remove(&link);
    }

    // Last resort: exhausted preference lists get the lowest free pad, an
    // overflow pad, or the highest fixed index when nothing else is left.
    let leftovers: Vec<LinkId> = pending.keys().copied().collect();
    for link in leftovers {
        let pad = last_resort_pad(caps, landings, blocked_launch);
        landings.insert(
            pad,
            LandingClaim {
                link,
                strength: ClaimStrength::Soft,
            },
        );
        assigned_landing.insert(link, pad);
    }
}

/// True when the challenger request wins against the current incumbent.
///
/// Both positions point at each link's best still-available choice. The walk
/// down the two preference chains is a plain loop; preference lists are
/// finite, so it terminates without any recursion depth to worry about.
fn challenger_beats(
    challenger: &[RankedPadChoice],
    challenger_pos: usize,
    incumbent: &[RankedPadChoice],
    incumbent_pos: usize,
    available: &dyn Fn(PadIndex) -> bool,
) -> bool {
    let current = challenger[challenger_pos]
        .score
        .total_cmp(&incumbent[incumbent_pos].score);
    match current {
        std::cmp::Ordering::Greater => return true,
        std::cmp::Ordering::Less => return false,
        std::cmp::Ordering::Equal => {}
    }

    // Tied: compare the remaining available fallbacks in lockstep. The link
    // with the worse (or no) fallback would suffer the bigger drop, so it
    // takes the contested pad.
    let mut challenger_chain = challenger[challenger_pos + 1..]
        .iter()
        .filter(|c| available(c.pad));
    let mut incumbent_chain = incumbent[incumbent_pos + 1..]
        .iter()
        .filter(|c| available(c.pad));
    loop {
        match (challenger_chain.next(), incumbent_chain.next()) {
            // Both exhausted: the incumbent was reached first in link-id
            // order, so it keeps the pad.
            (None, None) => return false,
            (None, Some(_)) => return true,
            (Some(_), None) => return false,
            (Some(c), Some(i)) => match c.score.total_cmp(&i.score) {
                std::cmp::Ordering::Less => return true,
                std::cmp::Ordering::Greater => return false,
                std::cmp::Ordering::Equal => continue,
            },
        }
    }
}

/// Fallback pad for a link whose entire preference list was consumed.
fn last_resort_pad(
    caps: &PadCapacityModel,
    landings: &BTreeMap<PadIndex, LandingClaim>,
    blocked_launch: Option<PadIndex>,
) -> PadIndex {
    for pad in 0..caps.landing_pad_max {
        if !landings.contains_key(&pad) && Some(pad) != blocked_launch {
            return pad;
        }
    }
    if caps.may_overflow() {
        return landings
            .keys()
            .next()
            .filter(|&&p| p < 0)
            .map(|p| p - 1)
            .unwrap_or(FIRST_OVERFLOW_PAD);
    }
    caps.last_fixed_landing()
}
