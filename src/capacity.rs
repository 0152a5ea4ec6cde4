//! Per-node-type pad capacity limits.
//!
//! A [`PadCapacityModel`] is loaded once per node type and never mutated.
//! It answers the purely static questions during resolution: how many pads a
//! node exposes, whether launch and landing pads share one numbering space,
//! and whether landing pads may spill past the fixed maximum.

use crate::constants::DEFAULT_PAD_COUNT;
use crate::types::PadIndex;
use serde::{Deserialize, Serialize};

/// Static pad limits for one node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadCapacityModel {
    /// Exclusive upper bound on launch pad indices
    pub launch_pad_max: PadIndex,
    /// Exclusive upper bound on fixed landing pad indices
    pub landing_pad_max: PadIndex,
    /// Number of pads a freshly created node of this type exposes
    pub default_pad_count: u32,
    /// Whether launch and landing pads draw from one numbering space
    pub shared_namespace: bool,
    /// Whether landing pads may spill past the fixed maximum as negative overflow indices
    pub landing_pads_can_overflow: bool,
    /// Whether the pad count grows with the rendered node size
    pub grows_with_node_size: bool,
}

impl PadCapacityModel {
    /// Capacity for a simple node: launch and landing pads share one
    /// numbering space, and landing pads overflow as the node grows.
    pub fn shared(pad_count: u32) -> Self {
        Self {
            launch_pad_max: pad_count as PadIndex,
            landing_pad_max: pad_count as PadIndex,
            default_pad_count: pad_count,
            shared_namespace: true,
            landing_pads_can_overflow: true,
            grows_with_node_size: true,
        }
    }

    /// Capacity for a node with one dedicated source pad and a separate,
    /// fixed-size landing namespace.
    pub fn dedicated_source(landing_pad_max: PadIndex) -> Self {
        Self {
            launch_pad_max: 1,
            landing_pad_max,
            default_pad_count: landing_pad_max.max(0) as u32,
            shared_namespace: false,
            landing_pads_can_overflow: false,
            grows_with_node_size: false,
        }
    }

    /// True when `pad` is a conceptual overflow pad rather than a physical one.
    pub fn is_overflow(pad: PadIndex) -> bool {
        pad < 0
    }

    /// True when `pad` indexes a physical landing pad of this type.
    pub fn is_fixed_landing(&self, pad: PadIndex) -> bool {
        (0..self.landing_pad_max).contains(&pad)
    }

    /// True when `pad` is a usable launch index for this type.
    pub fn is_valid_launch(&self, pad: PadIndex) -> bool {
        (0..self.launch_pad_max).contains(&pad)
    }

    /// Highest fixed landing index; reused once capacity is exhausted and
    /// overflow is not permitted.
    pub fn last_fixed_landing(&self) -> PadIndex {
        self.landing_pad_max - 1
    }

    /// Whether this type may synthesize a fresh overflow pad: overflow must
    /// be allowed and the node must still be able to grow.
    pub fn may_overflow(&self) -> bool {
        self.landing_pads_can_overflow && self.grows_with_node_size
    }
}

impl Default for PadCapacityModel {
    fn default() -> Self {
        Self::shared(DEFAULT_PAD_COUNT)
    }
}
