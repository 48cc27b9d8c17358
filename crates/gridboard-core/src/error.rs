//! Error taxonomy for the composition engine
//!
//! Expected failures fall into four classes:
//! - `NotFound` — referenced component/dashboard absent: abort, no mutation
//! - `PermissionDenied` — abort before any mutation
//! - `CorruptState` — malformed persisted data, recovered by regeneration
//! - collaborator failures (persistence, data query) — surfaced to the caller
//!
//! Identity collisions are treated as practically impossible given random
//! generation and carry no variant here.

use crate::identity::{ComponentIndex, DashboardId};

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Referenced component is not live on the dashboard
    #[error("component not found: {0}")]
    ComponentNotFound(ComponentIndex),

    /// Referenced dashboard does not exist
    #[error("dashboard not found: {0}")]
    DashboardNotFound(DashboardId),

    /// Caller lacks editor permission on the owning project
    #[error("permission denied for {user} on {project}")]
    PermissionDenied {
        /// Project the dashboard belongs to
        project: String,
        /// Acting user
        user: String,
    },

    /// Persisted layout/metadata could not be parsed
    ///
    /// Recovered by regeneration during reconciliation; only surfaces when a
    /// caller opts out of recovery.
    #[error("corrupt persisted state: {0}")]
    CorruptState(String),

    /// Persistence collaborator failed
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// Data query collaborator failed
    #[error("data query failed: {0}")]
    QueryFailed(String),
}

impl EngineError {
    /// Check whether this is an expected failure
    ///
    /// Expected failures surface to the UI as an explicit no-update plus a
    /// log entry instead of propagating.
    #[inline]
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::ComponentNotFound(_)
                | Self::DashboardNotFound(_)
                | Self::PermissionDenied { .. }
                | Self::CorruptState(_)
        )
    }

    /// Check whether prior state is guaranteed unchanged
    ///
    /// All expected failures abort before any mutation; collaborator
    /// failures during a save may leave persisted state behind the
    /// in-memory state.
    #[inline]
    #[must_use]
    pub fn leaves_state_unchanged(&self) -> bool {
        self.is_expected()
    }
}
