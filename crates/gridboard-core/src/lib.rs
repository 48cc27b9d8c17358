//! Gridboard Core
//!
//! Identity, data model and error taxonomy shared by every crate of the
//! dashboard composition engine.
//!
//! # Core Concepts
//!
//! - [`ComponentIndex`]: opaque, random, lifetime-stable component identity
//! - [`LayoutEntry`]: a component's rectangle on the fixed-column grid
//! - [`ComponentMetadata`]: per-component configuration, including declared
//!   [`FilterDependency`] entries
//! - [`FilterPredicate`] / [`CombinedFilterSet`]: one producer's constraint
//!   and the atomically rebuilt conjunction of all of them
//! - [`Dashboard`]: the aggregate of components, layouts and metadata

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod filter;
mod identity;
mod model;

pub use error::EngineError;
pub use filter::{ColumnName, CombinedFilterSet, FilterOperator, FilterPredicate};
pub use identity::{ComponentIndex, DashboardId};
pub use model::{
    ComponentMetadata, ComponentType, Dashboard, DataSourceRef, FilterDependency, LayoutEntry,
    Rect, DEFAULT_GRID_COLUMNS,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
