//! External collaborator interfaces
//!
//! The composition engine never performs blocking I/O itself; data queries,
//! permission checks and persistence are delegated through these traits.
//! Persistence is simple CRUD, assumed reliable but not mutually
//! transactional between layouts and metadata — the reconciler absorbs the
//! gap.

use async_trait::async_trait;
use gridboard_core::{
    CombinedFilterSet, ComponentIndex, ComponentMetadata, DashboardId, DataSourceRef, EngineError,
    LayoutEntry,
};
use indexmap::IndexMap;

/// Project owning a dashboard, for permission checks
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRef(pub String);

impl ProjectRef {
    /// Create new reference
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Acting user, for permission checks
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserRef(pub String);

impl UserRef {
    /// Create new reference
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for UserRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Renderable payload produced by the data query backend
///
/// Opaque to the composition engine; it is handed to the UI layer verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPayload(pub serde_json::Value);

/// Data query/aggregation backend
///
/// Turns a filter set into renderable content. May take arbitrarily long;
/// callers dispatch fetches without awaiting them inside a propagation pass.
#[async_trait]
pub trait DataQueryService: Send + Sync {
    /// Query a source under the given combined filters
    async fn fetch(
        &self,
        source: &DataSourceRef,
        filters: &CombinedFilterSet,
    ) -> Result<RenderPayload, EngineError>;
}

/// Authorization collaborator
#[async_trait]
pub trait PermissionService: Send + Sync {
    /// Check editor permission for a user on a project
    async fn has_editor_permission(&self, project: &ProjectRef, user: &UserRef) -> bool;
}

/// Key-value persistence for dashboard state
///
/// Load methods return the raw persisted value: layout blobs may still be in
/// the legacy per-breakpoint shape and metadata lists may contain corrupt
/// entries; normalization happens in the engine.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Load the persisted layout blob, `None` when never saved
    async fn load_layouts(
        &self,
        dashboard: DashboardId,
    ) -> Result<Option<serde_json::Value>, EngineError>;

    /// Save the flat layout list
    async fn save_layouts(
        &self,
        dashboard: DashboardId,
        layouts: &[LayoutEntry],
    ) -> Result<(), EngineError>;

    /// Load the persisted metadata blob, `None` when never saved
    async fn load_metadata(
        &self,
        dashboard: DashboardId,
    ) -> Result<Option<serde_json::Value>, EngineError>;

    /// Save all component metadata
    async fn save_metadata(
        &self,
        dashboard: DashboardId,
        metadata: &IndexMap<ComponentIndex, ComponentMetadata>,
    ) -> Result<(), EngineError>;
}
