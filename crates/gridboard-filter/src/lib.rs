//! Gridboard Filter
//!
//! Interactive filtering: the dashboard-scoped predicate store, the
//! targeted propagation engine and the graph-interaction adapter.
//!
//! # Core Concepts
//!
//! - [`FilterStore`]: one predicate slot per producer,
//!   `Idle -> Active -> Idle`, last write wins
//! - [`PropagationEngine`]: one store mutation and one pass per
//!   interaction; notifies exactly the declared dependents with an
//!   atomically rebuilt combined set
//! - [`GraphInteractionAdapter`]: chart clicks and lasso selections to
//!   predicates; zoom/pan produces nothing

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod interaction;
mod propagation;
mod store;

pub use interaction::{ChartInteraction, ChartKind, GraphInteractionAdapter, SelectionPoint};
pub use propagation::{PropagationEngine, PropagationPass, RefreshOrder};
pub use store::FilterStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
