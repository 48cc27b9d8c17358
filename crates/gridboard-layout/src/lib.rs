//! Gridboard Layout
//!
//! The collision-aware grid layout model:
//!
//! - [`GridEngine`]: greedy first-fit placement and manual move/resize
//! - [`normalize_layouts`]: legacy persisted formats to a flat entry list
//! - [`reconcile`]: align persisted entries with the live component set
//!
//! Placement guarantees zero overlap between `locked == false` entries;
//! optimality is explicitly not a goal.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod grid;
mod normalize;
mod reconcile;

pub use grid::GridEngine;
pub use normalize::{normalize_layouts, NormalizedLayouts};
pub use reconcile::{reconcile, ReconcileOutcome};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
