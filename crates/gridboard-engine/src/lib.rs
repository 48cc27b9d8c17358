//! Gridboard Engine
//!
//! The dashboard session orchestrator: one [`DashboardSession`] owns one
//! dashboard's live state and serializes every mutation through a single
//! reactive cycle per user event.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use gridboard_engine::{DashboardReconciler, DashboardSession, EngineConfig, SessionServices};
//!
//! let reconciler = DashboardReconciler::new(EngineConfig::default());
//! let (dashboard, report) = reconciler.load(&persistence, id, "Run 42").await?;
//!
//! let mut session = DashboardSession::new(dashboard, project, user, config, services);
//! let patch = session.on_duplicate(component_id).await;
//! ```
//!
//! Every operation answers with a minimal [`UiPatch`]; expected failures
//! (not found, permission denied) answer with an explicit no-update and a
//! log entry instead of an error.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod patch;
mod reconciler;
mod services;
mod session;

pub use config::EngineConfig;
pub use patch::{NoUpdateReason, UiPatch};
pub use reconciler::{DashboardReconciler, ReconcileReport};
pub use services::{
    DataQueryService, PermissionService, PersistenceService, ProjectRef, RenderPayload, UserRef,
};
pub use session::{DashboardSession, SessionServices};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
