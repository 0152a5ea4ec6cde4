//! Shared engine-wide constants.
//! Centralizes tweakable values used across pad resolution and repair.

use crate::types::PadIndex;

// Pad numbering
/// Launch pad chosen for a source node with no prior links and no hints.
pub const DEFAULT_LAUNCH_PAD: PadIndex = 0;
/// First overflow index handed out once every fixed landing pad is taken.
pub const FIRST_OVERFLOW_PAD: PadIndex = -1;

// Capacity defaults
/// Pad count assumed for node types that do not specify one.
pub const DEFAULT_PAD_COUNT: u32 = 8;
