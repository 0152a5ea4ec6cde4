//! Error types for pad resolution.

use crate::types::{NodeId, PadIndex};
use thiserror::Error;

/// Errors produced by the pad assignment engine.
///
/// Every variant indicates a caller bug rather than a data condition:
/// over-capacity or inconsistent input degrades gracefully instead of
/// erroring, so none of these are retried. A failure is local to one node's
/// resolution and leaves no other node's state touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PadError {
    /// A forced pad pair was combined with used-pad hints on one constraint
    #[error("pad constraint cannot mix forced pads with used-pad hints")]
    ConstraintModeConflict,

    /// Two forced links claimed the same non-overflow pad on one node
    #[error("forced pad {pad} on node {node} is claimed by more than one link")]
    ForcedPadCollision {
        /// Node whose pad pool holds the collision.
        node: NodeId,
        /// The doubly claimed pad.
        pad: PadIndex,
    },

    /// Forced outbound links disagree about a node's single launch pad
    #[error("forced launch pads disagree on node {node}: {first} vs {second}")]
    ForcedLaunchDisagreement {
        /// Node the links launch from.
        node: NodeId,
        /// Launch pad claimed first.
        first: PadIndex,
        /// Conflicting launch pad claimed afterwards.
        second: PadIndex,
    },

    /// A link referenced a source node missing from the graph
    #[error("source node does not exist")]
    UnknownSource,

    /// A link referenced a target node missing from the graph
    #[error("target node does not exist")]
    UnknownTarget,
}
