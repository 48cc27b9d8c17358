//! Minimal UI patches
//!
//! Every session operation answers with the smallest description of what
//! changed — an added component, one layout entry, the set of consumers to
//! re-render — never a full tree re-send. Expected failures answer with an
//! explicit no-update carrying the reason that was also logged.

use gridboard_core::{ComponentIndex, ComponentMetadata, LayoutEntry};
use gridboard_filter::RefreshOrder;
use gridboard_tree::RenderNode;

/// Why an operation produced no update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoUpdateReason {
    /// Referenced component is not live
    ComponentNotFound,
    /// Caller lacks editor permission; operation was a silent no-op
    PermissionDenied,
    /// Persisting the staged change failed; prior state kept
    PersistenceFailed,
    /// The event source cannot contribute a filter predicate
    NotAFilterSource,
    /// Nothing to do (e.g. clearing an already idle producer)
    AlreadyIdle,
    /// The dashboard is at its component cap
    ComponentCapReached,
}

/// Minimal description of one operation's effect
#[derive(Debug, Clone)]
pub enum UiPatch {
    /// Explicit "no update" signal
    NoUpdate {
        /// Why nothing changed
        reason: NoUpdateReason,
    },
    /// A component (full triple) was added
    ComponentAdded {
        /// The new component's metadata
        metadata: ComponentMetadata,
        /// Its placed layout entry
        layout: LayoutEntry,
        /// Its render tree, when one exists
        tree: Option<RenderNode>,
    },
    /// One layout entry changed
    LayoutUpdated {
        /// The overwritten entry
        entry: LayoutEntry,
    },
    /// One component's metadata changed
    MetadataUpdated {
        /// The updated record
        metadata: ComponentMetadata,
    },
    /// A component and all its records were removed
    ComponentRemoved {
        /// The removed identity
        component_id: ComponentIndex,
        /// Consumers to re-render because the removal cleared a predicate
        refreshed: Vec<RefreshOrder>,
    },
    /// A filter interaction propagated
    FiltersPropagated {
        /// Consumers to re-render with their fresh combined set
        refreshed: Vec<RefreshOrder>,
    },
}

impl UiPatch {
    /// Shorthand for the no-update signal
    #[inline]
    #[must_use]
    pub fn none(reason: NoUpdateReason) -> Self {
        Self::NoUpdate { reason }
    }

    /// Check whether the patch changes anything
    #[inline]
    #[must_use]
    pub fn is_update(&self) -> bool {
        !matches!(self, Self::NoUpdate { .. })
    }
}
