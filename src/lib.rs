//! # Pad Engine
//!
//! The pad assignment engine for a node-and-link diagram editor: for every
//! directed link it decides which discrete connection point ("pad") on the
//! source node the link launches from and which pad on the target node it
//! lands on.
//!
//! ## Features
//! - Per-node-type pad capacity modeling (shared or split namespaces,
//!   overflow pads, growth)
//! - Single-link pad computation for incremental edits
//! - Multi-link collision resolution with preference ranking and documented
//!   tie-break rules
//! - Legacy-pad preservation when rebuilding a diagram from instructions
//! - Majority voting to repair disagreeing launch pads in imported data
//! - Whole-model consistency audits producing dry-runnable repair lists
//!
//! The engine is a pure library: it consumes a read-only view of the link
//! topology plus geometric preference rankings supplied by the surrounding
//! editor, and produces pad assignments and repair lists for the editor to
//! apply.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod audit;
mod capacity;
mod collision;
mod consensus;
mod constants;
mod constraints;
mod error;
mod migration;
mod resolver;
mod types;

// Re-export public types and functions
pub use audit::*;
pub use capacity::*;
pub use collision::*;
pub use consensus::*;
pub use constants::*;
pub use constraints::*;
pub use error::*;
pub use migration::*;
pub use resolver::*;
pub use types::*;
