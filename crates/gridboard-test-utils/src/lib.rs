//! Testing utilities for the gridboard workspace
//!
//! Shared fixtures and in-memory collaborator doubles.

#![allow(missing_docs)]

use async_trait::async_trait;
use gridboard_core::{
    CombinedFilterSet, ComponentIndex, ComponentMetadata, ComponentType, DashboardId,
    DataSourceRef, EngineError, FilterDependency, LayoutEntry,
};
use gridboard_engine::{
    DataQueryService, PermissionService, PersistenceService, ProjectRef, RenderPayload,
    SessionServices, UserRef,
};
use gridboard_tree::RenderNode;
use indexmap::IndexMap;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory persistence double with failure injection and save counters
#[derive(Default)]
pub struct InMemoryPersistence {
    layouts: Mutex<Option<serde_json::Value>>,
    metadata: Mutex<Option<serde_json::Value>>,
    pub layout_saves: AtomicUsize,
    pub metadata_saves: AtomicUsize,
    pub fail_layout_saves: AtomicBool,
    pub fail_metadata_saves: AtomicBool,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layouts(self, layouts: serde_json::Value) -> Self {
        *self.layouts.lock().unwrap() = Some(layouts);
        self
    }

    pub fn with_metadata(self, metadata: serde_json::Value) -> Self {
        *self.metadata.lock().unwrap() = Some(metadata);
        self
    }

    pub fn stored_layouts(&self) -> Option<serde_json::Value> {
        self.layouts.lock().unwrap().clone()
    }

    pub fn stored_metadata(&self) -> Option<serde_json::Value> {
        self.metadata.lock().unwrap().clone()
    }

    pub fn layout_save_count(&self) -> usize {
        self.layout_saves.load(Ordering::SeqCst)
    }

    pub fn metadata_save_count(&self) -> usize {
        self.metadata_saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceService for InMemoryPersistence {
    async fn load_layouts(
        &self,
        _dashboard: DashboardId,
    ) -> Result<Option<serde_json::Value>, EngineError> {
        Ok(self.layouts.lock().unwrap().clone())
    }

    async fn save_layouts(
        &self,
        _dashboard: DashboardId,
        layouts: &[LayoutEntry],
    ) -> Result<(), EngineError> {
        if self.fail_layout_saves.load(Ordering::SeqCst) {
            return Err(EngineError::Persistence("injected layout save failure".into()));
        }
        self.layout_saves.fetch_add(1, Ordering::SeqCst);
        *self.layouts.lock().unwrap() =
            Some(serde_json::to_value(layouts).expect("layouts serialize"));
        Ok(())
    }

    async fn load_metadata(
        &self,
        _dashboard: DashboardId,
    ) -> Result<Option<serde_json::Value>, EngineError> {
        Ok(self.metadata.lock().unwrap().clone())
    }

    async fn save_metadata(
        &self,
        _dashboard: DashboardId,
        metadata: &IndexMap<ComponentIndex, ComponentMetadata>,
    ) -> Result<(), EngineError> {
        if self.fail_metadata_saves.load(Ordering::SeqCst) {
            return Err(EngineError::Persistence("injected metadata save failure".into()));
        }
        self.metadata_saves.fetch_add(1, Ordering::SeqCst);
        *self.metadata.lock().unwrap() =
            Some(serde_json::to_value(metadata).expect("metadata serializes"));
        Ok(())
    }
}

/// Permission double with a fixed answer
pub struct StaticPermissions {
    allow: bool,
}

impl StaticPermissions {
    pub fn allow_all() -> Self {
        Self { allow: true }
    }

    pub fn deny_all() -> Self {
        Self { allow: false }
    }
}

#[async_trait]
impl PermissionService for StaticPermissions {
    async fn has_editor_permission(&self, _project: &ProjectRef, _user: &UserRef) -> bool {
        self.allow
    }
}

/// Query double that records every fetch it receives
#[derive(Default)]
pub struct RecordingQuery {
    calls: Mutex<Vec<(DataSourceRef, CombinedFilterSet)>>,
}

impl RecordingQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(DataSourceRef, CombinedFilterSet)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DataQueryService for RecordingQuery {
    async fn fetch(
        &self,
        source: &DataSourceRef,
        filters: &CombinedFilterSet,
    ) -> Result<RenderPayload, EngineError> {
        self.calls
            .lock()
            .unwrap()
            .push((source.clone(), filters.clone()));
        Ok(RenderPayload(json!({"rows": []})))
    }
}

/// Bundle the standard doubles into session services
pub fn services_with(
    query: Arc<RecordingQuery>,
    permissions: Arc<StaticPermissions>,
    persistence: Arc<InMemoryPersistence>,
) -> SessionServices {
    SessionServices {
        query,
        permissions,
        persistence,
    }
}

pub fn experiments_source() -> DataSourceRef {
    DataSourceRef::new("experiments")
}

/// A dropdown filtering `column` on `source`
pub fn filter_control(source: &DataSourceRef, column: &str) -> ComponentMetadata {
    ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::FilterControl)
        .with_source(source.clone())
        .with_render_params(json!({"filter_column": column}))
}

/// A scatter chart over `source` that also consumes its filters
pub fn scatter_chart(source: &DataSourceRef) -> ComponentMetadata {
    ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::Chart)
        .with_source(source.clone())
        .with_render_params(json!({"chart_kind": "scatter", "x": "time", "y": "value"}))
        .with_dependency(FilterDependency::on_source(source.clone()))
}

/// A card aggregating over one column of `source`
pub fn aggregate_card(source: &DataSourceRef, column: &str) -> ComponentMetadata {
    ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::Card)
        .with_source(source.clone())
        .with_render_params(json!({"aggregate": "count", "group_by": column}))
        .with_dependency(FilterDependency::on_source(source.clone()))
}

/// A render tree with `refs` embedded references to `owner`
pub fn tree_with_refs(owner: ComponentIndex, refs: usize) -> RenderNode {
    let mut controls = Vec::new();
    for _ in 0..refs {
        controls.push(RenderNode::reference(owner));
    }
    RenderNode::map([
        ("title".to_string(), RenderNode::leaf(json!("widget"))),
        ("controls".to_string(), RenderNode::list(controls)),
    ])
}
