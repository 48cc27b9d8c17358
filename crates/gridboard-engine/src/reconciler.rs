//! Dashboard load-time reconciliation
//!
//! On load: normalize the persisted layout blob, derive the known component
//! set from persisted metadata, reconcile the layout against it, and persist
//! the result immediately so the next load is a fixed point. Corrupt
//! metadata entries are dropped (their layouts then reconcile away as
//! orphans); a component whose layout is corrupt simply gets a new one —
//! neither case is fatal.

use crate::config::EngineConfig;
use crate::services::PersistenceService;
use gridboard_core::{ComponentIndex, ComponentMetadata, Dashboard, DashboardId, EngineError};
use gridboard_layout::{normalize_layouts, reconcile, GridEngine};
use indexmap::IndexMap;

/// What one load-time reconciliation did
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Layout normalization issues (corrupt entries, legacy fallback)
    pub layout_issues: Vec<String>,
    /// Metadata entries that failed to parse and were dropped
    pub metadata_issues: Vec<String>,
    /// Orphaned layout entries dropped by reconciliation
    pub dropped: Vec<ComponentIndex>,
    /// Components whose layout was regenerated
    pub synthesized: Vec<ComponentIndex>,
    /// Whether the reconciled state was written back
    pub saved: bool,
}

impl ReconcileReport {
    /// Check whether the load found a fixed point (nothing to repair)
    #[inline]
    #[must_use]
    pub fn is_fixed_point(&self) -> bool {
        !self.saved
    }
}

/// Load-time reconciler
#[derive(Debug, Clone)]
pub struct DashboardReconciler {
    config: EngineConfig,
}

impl DashboardReconciler {
    /// Create reconciler with the given configuration
    #[inline]
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Load and reconcile one dashboard
    ///
    /// The title is supplied by the caller; the dashboard record itself
    /// lives with the external dashboard CRUD layer.
    ///
    /// # Errors
    /// Only collaborator failures surface; corrupt persisted state is
    /// recovered, never returned.
    pub async fn load(
        &self,
        persistence: &dyn PersistenceService,
        id: DashboardId,
        title: impl Into<String>,
    ) -> Result<(Dashboard, ReconcileReport), EngineError> {
        let mut report = ReconcileReport::default();

        // Known components come from persisted metadata.
        let raw_metadata = persistence.load_metadata(id).await?;
        let known = parse_metadata(raw_metadata.as_ref(), &mut report.metadata_issues);

        // Normalize whatever layout shape storage returns.
        let raw_layouts = persistence
            .load_layouts(id)
            .await?
            .unwrap_or(serde_json::Value::Null);
        let normalized = normalize_layouts(
            &raw_layouts,
            &self.config.reference_breakpoint,
            self.config.grid_columns,
        );
        let needs_flat_rewrite = !normalized.is_clean();
        report.layout_issues = normalized.issues;

        let grid = GridEngine::new(self.config.grid_columns);
        let outcome = reconcile(&grid, &normalized.entries, &known);
        report.dropped = outcome.dropped;
        report.synthesized = outcome.synthesized;

        for issue in &report.layout_issues {
            tracing::warn!(dashboard = %id, issue = %issue, "layout normalization");
        }
        for issue in &report.metadata_issues {
            tracing::warn!(dashboard = %id, issue = %issue, "metadata recovery");
        }

        // Persist the reconciled layout immediately so future loads are a
        // fixed point.
        if needs_flat_rewrite || !report.dropped.is_empty() || !report.synthesized.is_empty() {
            persistence.save_layouts(id, &outcome.entries).await?;
            report.saved = true;
        }
        if !report.metadata_issues.is_empty() {
            persistence.save_metadata(id, &known).await?;
            report.saved = true;
        }

        tracing::info!(
            dashboard = %id,
            components = known.len(),
            dropped = report.dropped.len(),
            synthesized = report.synthesized.len(),
            saved = report.saved,
            "dashboard reconciled"
        );

        let mut dashboard = Dashboard::new(title);
        dashboard.id = id;
        dashboard.components = known.keys().copied().collect();
        dashboard.layouts = outcome.entries;
        dashboard.metadata = known;
        Ok((dashboard, report))
    }
}

/// Parse persisted metadata tolerantly
///
/// Accepts the saved map form (`{index: record}`) and a plain list;
/// unparsable entries are dropped and reported.
fn parse_metadata(
    raw: Option<&serde_json::Value>,
    issues: &mut Vec<String>,
) -> IndexMap<ComponentIndex, ComponentMetadata> {
    let mut known = IndexMap::new();
    let values: Vec<&serde_json::Value> = match raw {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::Array(items)) => items.iter().collect(),
        Some(serde_json::Value::Object(map)) => map.values().collect(),
        Some(other) => {
            issues.push(format!("unsupported persisted metadata shape: {other}"));
            Vec::new()
        }
    };

    for (i, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<ComponentMetadata>(value.clone()) {
            Ok(metadata) => {
                known.insert(metadata.index, metadata);
            }
            Err(e) => issues.push(format!("metadata entry {i} unparsable: {e}")),
        }
    }
    known
}
