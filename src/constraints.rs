//! Per-link pad constraints and the legacy pad snapshot.
//!
//! A [`PadConstraintSet`] either hard-forces a pad pair or carries used-pad
//! hints seeded from legacy data; the two modes are mutually exclusive. A
//! [`LegacyPadMap`] records pad usage from a prior version of the diagram so
//! rebuild operations can bias new assignments toward the old layout.

use crate::error::PadError;
use crate::types::{Link, LinkId, NodeId, PadAssignment, PadGraph, PadIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The two mutually exclusive constraint modes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConstraintMode {
    /// The pad pair must be honored exactly
    Forced(PadAssignment),
    /// Pads known to be in use, biasing but not forcing the resolution
    Preferred {
        used_launch_pads: BTreeSet<PadIndex>,
        used_landing_pads: BTreeSet<PadIndex>,
    },
}

/// Per-link override fed to the resolvers.
///
/// An empty set constrains nothing. Forcing a pad pair on a set that already
/// carries used-pad hints (or vice versa) is a caller bug and fails with
/// [`PadError::ConstraintModeConflict`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PadConstraintSet {
    mode: Option<ConstraintMode>,
}

impl PadConstraintSet {
    /// Creates an empty constraint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set that hard-forces the given pad pair.
    pub fn forced(pads: PadAssignment) -> Self {
        Self {
            mode: Some(ConstraintMode::Forced(pads)),
        }
    }

    /// Creates a set of used-pad hints from the given launch and landing
    /// pads.
    pub fn preferred(
        used_launch_pads: impl IntoIterator<Item = PadIndex>,
        used_landing_pads: impl IntoIterator<Item = PadIndex>,
    ) -> Self {
        Self {
            mode: Some(ConstraintMode::Preferred {
                used_launch_pads: used_launch_pads.into_iter().collect(),
                used_landing_pads: used_landing_pads.into_iter().collect(),
            }),
        }
    }

    /// Forces the pad pair, failing if used-pad hints were already recorded.
    pub fn set_forced(&mut self, pads: PadAssignment) -> Result<(), PadError> {
        match &self.mode {
            Some(ConstraintMode::Preferred { .. }) => Err(PadError::ConstraintModeConflict),
            _ => {
                self.mode = Some(ConstraintMode::Forced(pads));
                Ok(())
            }
        }
    }

    /// Records a launch pad known to be in use on the link's source node,
    /// failing if the set already forces a pad pair.
    pub fn note_used_launch_pad(&mut self, pad: PadIndex) -> Result<(), PadError> {
        match &mut self.mode {
            Some(ConstraintMode::Forced(_)) => Err(PadError::ConstraintModeConflict),
            Some(ConstraintMode::Preferred {
                used_launch_pads, ..
            }) => {
                used_launch_pads.insert(pad);
                Ok(())
            }
            None => {
                self.mode = Some(ConstraintMode::Preferred {
                    used_launch_pads: BTreeSet::from([pad]),
                    used_landing_pads: BTreeSet::new(),
                });
                Ok(())
            }
        }
    }

    /// Records a landing pad known to be in use on the link's target node,
    /// failing if the set already forces a pad pair.
    pub fn note_used_landing_pad(&mut self, pad: PadIndex) -> Result<(), PadError> {
        match &mut self.mode {
            Some(ConstraintMode::Forced(_)) => Err(PadError::ConstraintModeConflict),
            Some(ConstraintMode::Preferred {
                used_landing_pads, ..
            }) => {
                used_landing_pads.insert(pad);
                Ok(())
            }
            None => {
                self.mode = Some(ConstraintMode::Preferred {
                    used_launch_pads: BTreeSet::new(),
                    used_landing_pads: BTreeSet::from([pad]),
                });
                Ok(())
            }
        }
    }

    /// The forced pad pair, if this set is in forced mode.
    pub fn forced_pads(&self) -> Option<PadAssignment> {
        match &self.mode {
            Some(ConstraintMode::Forced(pads)) => Some(*pads),
            _ => None,
        }
    }

    /// Launch pads hinted as already in use, if any were recorded.
    pub fn used_launch_pads(&self) -> Option<&BTreeSet<PadIndex>> {
        match &self.mode {
            Some(ConstraintMode::Preferred {
                used_launch_pads, ..
            }) => Some(used_launch_pads),
            _ => None,
        }
    }

    /// Landing pads hinted as already in use, if any were recorded.
    pub fn used_landing_pads(&self) -> Option<&BTreeSet<PadIndex>> {
        match &self.mode {
            Some(ConstraintMode::Preferred {
                used_landing_pads, ..
            }) => Some(used_landing_pads),
            _ => None,
        }
    }

    /// True when the set constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.mode.is_none()
    }
}

/// Pad usage recorded from a prior version of the diagram.
///
/// Built once from the old snapshot, read-only during migration: the launch
/// pad each source node used, the landing pads each target node used, and
/// the exact pad pair of every prior link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyPadMap {
    link_pads: BTreeMap<LinkId, PadAssignment>,
    node_launch: BTreeMap<NodeId, PadIndex>,
    node_landings: BTreeMap<NodeId, BTreeSet<PadIndex>>,
}

impl LegacyPadMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every link of a prior graph snapshot.
    pub fn from_graph(graph: &PadGraph) -> Self {
        let mut map = Self::default();
        for link in &graph.links {
            map.record_link(link);
        }
        map
    }

    /// Records one prior link.
    pub fn record_link(&mut self, link: &Link) {
        self.link_pads.insert(link.id, link.pads());
        self.node_launch.entry(link.source).or_insert(link.launch);
        self.node_landings
            .entry(link.target)
            .or_default()
            .insert(link.landing);
    }

    /// The pad pair a prior link used.
    pub fn assignment_for(&self, link_id: &LinkId) -> Option<PadAssignment> {
        self.link_pads.get(link_id).copied()
    }

    /// The launch pad a prior source node used.
    pub fn launch_for(&self, node_id: &NodeId) -> Option<PadIndex> {
        self.node_launch.get(node_id).copied()
    }

    /// The landing pads a prior target node used.
    pub fn landings_for(&self, node_id: &NodeId) -> Option<&BTreeSet<PadIndex>> {
        self.node_landings.get(node_id)
    }

    /// True when no prior links were recorded.
    pub fn is_empty(&self) -> bool {
        self.link_pads.is_empty()
    }
}
