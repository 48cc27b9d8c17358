//! Dashboard session
//!
//! One [`DashboardSession`] is the single logical owner of one dashboard's
//! live state: every mutation to the layout, metadata and filter store goes
//! through `&mut self`, so one reactive cycle runs per user event and no
//! pass overlaps another. Data fetches are dispatched to the query
//! collaborator without being awaited — a propagation pass never blocks on
//! I/O.
//!
//! Duplicate, remove and move are all-or-nothing: the staged change is
//! persisted first and committed to memory only on success, so any failure
//! leaves prior state unchanged.

use crate::config::EngineConfig;
use crate::patch::{NoUpdateReason, UiPatch};
use crate::services::{DataQueryService, PermissionService, PersistenceService, ProjectRef, UserRef};
use gridboard_core::{
    ColumnName, ComponentIndex, ComponentMetadata, Dashboard, EngineError, FilterPredicate,
    LayoutEntry, Rect,
};
use gridboard_filter::{
    ChartInteraction, FilterStore, GraphInteractionAdapter, PropagationEngine, PropagationPass,
    RefreshOrder, SelectionPoint,
};
use gridboard_layout::GridEngine;
use gridboard_tree::{clone_metadata, clone_tree, RenderNode};
use indexmap::IndexMap;
use std::sync::Arc;

/// The engine's external collaborators, bundled
#[derive(Clone)]
pub struct SessionServices {
    /// Data query/aggregation backend
    pub query: Arc<dyn DataQueryService>,
    /// Authorization collaborator
    pub permissions: Arc<dyn PermissionService>,
    /// Key-value persistence
    pub persistence: Arc<dyn PersistenceService>,
}

/// Single-owner session over one dashboard
pub struct DashboardSession {
    dashboard: Dashboard,
    project: ProjectRef,
    user: UserRef,
    config: EngineConfig,
    grid: GridEngine,
    filters: FilterStore,
    propagation: PropagationEngine,
    adapter: GraphInteractionAdapter,
    trees: IndexMap<ComponentIndex, RenderNode>,
    services: SessionServices,
}

impl DashboardSession {
    /// Create a session over an already reconciled dashboard
    #[must_use]
    pub fn new(
        dashboard: Dashboard,
        project: ProjectRef,
        user: UserRef,
        config: EngineConfig,
        services: SessionServices,
    ) -> Self {
        let grid = GridEngine::new(config.grid_columns);
        Self {
            dashboard,
            project,
            user,
            config,
            grid,
            filters: FilterStore::new(),
            propagation: PropagationEngine::new(),
            adapter: GraphInteractionAdapter::new(),
            trees: IndexMap::new(),
            services,
        }
    }

    /// The session's dashboard
    #[inline]
    #[must_use]
    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// The session's filter store
    #[inline]
    #[must_use]
    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    /// A component's render tree, when one is installed
    #[inline]
    #[must_use]
    pub fn render_tree(&self, component_id: ComponentIndex) -> Option<&RenderNode> {
        self.trees.get(&component_id)
    }

    /// Rename the dashboard (in-memory; the dashboard record itself is
    /// owned by the external dashboard CRUD layer)
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.dashboard.title = title.into();
        self.dashboard.touch();
    }

    /// Install a component created by the external wizard
    ///
    /// The wizard allocates the index and builds the initial metadata; the
    /// session places the layout, persists the staged state and commits the
    /// full triple, or nothing.
    pub async fn adopt_component(
        &mut self,
        metadata: ComponentMetadata,
        tree: Option<RenderNode>,
    ) -> UiPatch {
        if self.dashboard.len() >= self.config.max_components {
            tracing::warn!(
                dashboard = %self.dashboard.id,
                cap = self.config.max_components,
                "component cap reached, not adopting"
            );
            return UiPatch::none(NoUpdateReason::ComponentCapReached);
        }

        let (w, h) = metadata.component_type.default_size();
        let rect = self.grid.place_sized(w, h, &self.dashboard.layouts);
        let layout = LayoutEntry::new(metadata.index, rect);

        let mut staged_layouts = self.dashboard.layouts.clone();
        staged_layouts.push(layout);
        let mut staged_metadata = self.dashboard.metadata.clone();
        staged_metadata.insert(metadata.index, metadata.clone());

        if !self.persist_staged(&staged_layouts, Some(&staged_metadata)).await {
            return UiPatch::none(NoUpdateReason::PersistenceFailed);
        }

        tracing::info!(
            dashboard = %self.dashboard.id,
            component = %metadata.index,
            component_type = metadata.component_type.as_str(),
            "component adopted"
        );
        self.dashboard.insert_component(metadata.clone(), layout);
        if let Some(tree) = tree.clone() {
            self.trees.insert(metadata.index, tree);
        }
        UiPatch::ComponentAdded {
            metadata,
            layout,
            tree,
        }
    }

    /// Manual drag or resize of one component
    ///
    /// The rectangle is overwritten as-is; the client enforces collision
    /// rules interactively for manual moves.
    pub async fn on_drag_or_resize(&mut self, component_id: ComponentIndex, new_rect: Rect) -> UiPatch {
        if !self.ensure_editor("move").await {
            return UiPatch::none(NoUpdateReason::PermissionDenied);
        }
        let Some(current) = self.dashboard.layout_of(component_id) else {
            self.warn_not_found(component_id, "move");
            return UiPatch::none(NoUpdateReason::ComponentNotFound);
        };

        let mut staged_entry = *current;
        GridEngine::move_or_resize(&mut staged_entry, new_rect);
        let staged_layouts: Vec<LayoutEntry> = self
            .dashboard
            .layouts
            .iter()
            .map(|e| if e.component_id == component_id { staged_entry } else { *e })
            .collect();

        if !self.persist_staged(&staged_layouts, None).await {
            return UiPatch::none(NoUpdateReason::PersistenceFailed);
        }

        if let Some(entry) = self.dashboard.layout_of_mut(component_id) {
            entry.set_rect(new_rect);
        }
        self.dashboard.touch();
        tracing::info!(component = %component_id, ?new_rect, "layout updated");
        UiPatch::LayoutUpdated { entry: staged_entry }
    }

    /// Duplicate a component under a fresh, independent identity
    ///
    /// The copy's render tree has every embedded reference remapped to the
    /// new index and its metadata parameters are deep-copied; the placed
    /// rectangle keeps the source's size and is collision-free against the
    /// latest snapshot.
    pub async fn on_duplicate(&mut self, component_id: ComponentIndex) -> UiPatch {
        if !self.ensure_editor("duplicate").await {
            return UiPatch::none(NoUpdateReason::PermissionDenied);
        }
        let Some(source_meta) = self.dashboard.metadata_of(component_id).cloned() else {
            self.warn_not_found(component_id, "duplicate");
            return UiPatch::none(NoUpdateReason::ComponentNotFound);
        };
        if self.dashboard.len() >= self.config.max_components {
            tracing::warn!(
                dashboard = %self.dashboard.id,
                cap = self.config.max_components,
                "component cap reached, not duplicating"
            );
            return UiPatch::none(NoUpdateReason::ComponentCapReached);
        }

        let new_index = ComponentIndex::for_duplicate(component_id);
        let metadata = clone_metadata(&source_meta, new_index);
        let tree = self
            .trees
            .get(&component_id)
            .map(|t| clone_tree(t, component_id, new_index));

        let (w, h) = self
            .dashboard
            .layout_of(component_id)
            .map_or(source_meta.component_type.default_size(), |e| (e.w, e.h));
        let rect = self.grid.place_sized(w, h, &self.dashboard.layouts);
        let layout = LayoutEntry::new(new_index, rect);

        let mut staged_layouts = self.dashboard.layouts.clone();
        staged_layouts.push(layout);
        let mut staged_metadata = self.dashboard.metadata.clone();
        staged_metadata.insert(new_index, metadata.clone());

        if !self.persist_staged(&staged_layouts, Some(&staged_metadata)).await {
            return UiPatch::none(NoUpdateReason::PersistenceFailed);
        }

        self.dashboard.insert_component(metadata.clone(), layout);
        if let Some(tree) = tree.clone() {
            self.trees.insert(new_index, tree);
        }
        tracing::info!(
            source = %component_id,
            duplicate = %new_index,
            references = tree.as_ref().map_or(0, |t| t.reference_count(new_index)),
            "component duplicated"
        );
        UiPatch::ComponentAdded {
            metadata,
            layout,
            tree,
        }
    }

    /// Remove a component and all three of its records
    ///
    /// When the removed component held an active predicate, its former
    /// dependents are refreshed with the remaining constraints.
    pub async fn on_remove(&mut self, component_id: ComponentIndex) -> UiPatch {
        if !self.ensure_editor("remove").await {
            return UiPatch::none(NoUpdateReason::PermissionDenied);
        }
        if !self.dashboard.contains(component_id) {
            self.warn_not_found(component_id, "remove");
            return UiPatch::none(NoUpdateReason::ComponentNotFound);
        }

        let staged_layouts: Vec<LayoutEntry> = self
            .dashboard
            .layouts
            .iter()
            .filter(|e| e.component_id != component_id)
            .copied()
            .collect();
        let mut staged_metadata = self.dashboard.metadata.clone();
        staged_metadata.shift_remove(&component_id);

        if !self.persist_staged(&staged_layouts, Some(&staged_metadata)).await {
            return UiPatch::none(NoUpdateReason::PersistenceFailed);
        }

        self.dashboard.remove_component(component_id);
        self.trees.shift_remove(&component_id);

        let pass =
            self.propagation
                .producer_cleared(&mut self.filters, &self.dashboard.metadata, component_id);
        self.dispatch_refreshes(&pass.orders);

        tracing::info!(component = %component_id, refreshed = pass.orders.len(), "component removed");
        UiPatch::ComponentRemoved {
            component_id,
            refreshed: pass.orders,
        }
    }

    /// Raw value change from a filter widget
    ///
    /// `null`, an empty string or an empty list clears the widget's
    /// predicate slot; a list becomes a set-membership predicate, any other
    /// value an equality predicate.
    pub async fn on_filter_input(
        &mut self,
        component_id: ComponentIndex,
        raw_value: serde_json::Value,
    ) -> UiPatch {
        let Some(metadata) = self.dashboard.metadata_of(component_id) else {
            self.warn_not_found(component_id, "filter_input");
            return UiPatch::none(NoUpdateReason::ComponentNotFound);
        };
        let Some(source) = metadata.data_source_ref.clone() else {
            tracing::warn!(component = %component_id, "filter input from component without a source");
            return UiPatch::none(NoUpdateReason::NotAFilterSource);
        };
        let Some(column) = metadata
            .render_params
            .get("filter_column")
            .and_then(|v| v.as_str())
            .map(ColumnName::new)
        else {
            tracing::warn!(component = %component_id, "filter input without a declared column");
            return UiPatch::none(NoUpdateReason::NotAFilterSource);
        };

        let interaction = match raw_value {
            serde_json::Value::Null => ChartInteraction::ClearSelection,
            serde_json::Value::String(s) if s.is_empty() => ChartInteraction::ClearSelection,
            serde_json::Value::Array(values) if values.is_empty() => {
                ChartInteraction::ClearSelection
            }
            serde_json::Value::Array(values) => ChartInteraction::Predicate(
                FilterPredicate::one_of(component_id, source, column, values),
            ),
            value => ChartInteraction::Predicate(FilterPredicate::equals(
                component_id,
                source,
                column,
                value,
            )),
        };
        self.apply_interaction(component_id, interaction)
    }

    /// A point of a chart was clicked
    pub async fn on_chart_click(
        &mut self,
        component_id: ComponentIndex,
        point: SelectionPoint,
    ) -> UiPatch {
        let Some(metadata) = self.dashboard.metadata_of(component_id) else {
            self.warn_not_found(component_id, "chart_click");
            return UiPatch::none(NoUpdateReason::ComponentNotFound);
        };
        let interaction = self.adapter.point_click(metadata, &point);
        self.apply_interaction(component_id, interaction)
    }

    /// A region/lasso selection on a chart finished
    pub async fn on_chart_select(
        &mut self,
        component_id: ComponentIndex,
        points: Vec<SelectionPoint>,
    ) -> UiPatch {
        let Some(metadata) = self.dashboard.metadata_of(component_id) else {
            self.warn_not_found(component_id, "chart_select");
            return UiPatch::none(NoUpdateReason::ComponentNotFound);
        };
        let interaction = self.adapter.region_select(metadata, &points);
        self.apply_interaction(component_id, interaction)
    }

    /// Clear every interactive input at once
    ///
    /// Empties the filter store and refreshes each consumer exactly once,
    /// unfiltered.
    pub async fn clear_filters(&mut self) -> UiPatch {
        if self.filters.is_empty() {
            return UiPatch::none(NoUpdateReason::AlreadyIdle);
        }
        let pass = self
            .propagation
            .all_cleared(&mut self.filters, &self.dashboard.metadata);
        self.dispatch_refreshes(&pass.orders);
        UiPatch::FiltersPropagated {
            refreshed: pass.orders,
        }
    }

    /// Metadata-only edit of a component's render parameters
    pub async fn edit_render_params(
        &mut self,
        component_id: ComponentIndex,
        render_params: serde_json::Value,
    ) -> UiPatch {
        if !self.ensure_editor("edit").await {
            return UiPatch::none(NoUpdateReason::PermissionDenied);
        }
        let Some(current) = self.dashboard.metadata_of(component_id) else {
            self.warn_not_found(component_id, "edit");
            return UiPatch::none(NoUpdateReason::ComponentNotFound);
        };

        let mut updated = current.clone();
        updated.render_params = render_params;
        let mut staged_metadata = self.dashboard.metadata.clone();
        staged_metadata.insert(component_id, updated.clone());

        if let Err(e) = self
            .services
            .persistence
            .save_metadata(self.dashboard.id, &staged_metadata)
            .await
        {
            tracing::error!(component = %component_id, error = %e, "metadata save failed");
            return UiPatch::none(NoUpdateReason::PersistenceFailed);
        }

        self.dashboard.metadata.insert(component_id, updated.clone());
        self.dashboard.touch();
        tracing::info!(component = %component_id, "render params updated");
        UiPatch::MetadataUpdated { metadata: updated }
    }

    /// Route one chart/widget interaction into the propagation engine
    ///
    /// At most one store mutation and one propagation pass per call.
    fn apply_interaction(
        &mut self,
        producer: ComponentIndex,
        interaction: ChartInteraction,
    ) -> UiPatch {
        let pass: PropagationPass = match interaction {
            ChartInteraction::Predicate(predicate) => self.propagation.producer_changed(
                &mut self.filters,
                &self.dashboard.metadata,
                predicate,
            ),
            ChartInteraction::ClearSelection => {
                if self.filters.get(producer).is_none() {
                    return UiPatch::none(NoUpdateReason::AlreadyIdle);
                }
                self.propagation
                    .producer_cleared(&mut self.filters, &self.dashboard.metadata, producer)
            }
            ChartInteraction::NotAFilterSource => {
                tracing::warn!(component = %producer, "event source cannot contribute a predicate");
                return UiPatch::none(NoUpdateReason::NotAFilterSource);
            }
        };

        self.dispatch_refreshes(&pass.orders);
        UiPatch::FiltersPropagated {
            refreshed: pass.orders,
        }
    }

    /// Dispatch consumer fetches without blocking the pass
    ///
    /// The query collaborator delivers payloads to the UI on its own; the
    /// session only logs completion.
    fn dispatch_refreshes(&self, orders: &[RefreshOrder]) {
        for order in orders {
            let Some(metadata) = self.dashboard.metadata_of(order.consumer) else {
                continue;
            };
            let Some(source) = metadata.data_source_ref.clone() else {
                continue;
            };
            let query = Arc::clone(&self.services.query);
            let filters = order.filters.clone();
            let consumer = order.consumer;
            tokio::spawn(async move {
                match query.fetch(&source, &filters).await {
                    Ok(_) => tracing::debug!(consumer = %consumer, "refresh fetch completed"),
                    Err(e) => {
                        tracing::warn!(consumer = %consumer, error = %e, "refresh fetch failed");
                    }
                }
            });
        }
    }

    /// Permission gate for editing operations
    ///
    /// Denial aborts before any mutation, as a logged no-op.
    async fn ensure_editor(&self, operation: &str) -> bool {
        let allowed = self
            .services
            .permissions
            .has_editor_permission(&self.project, &self.user)
            .await;
        if !allowed {
            let err = EngineError::PermissionDenied {
                project: self.project.0.clone(),
                user: self.user.0.clone(),
            };
            tracing::warn!(error = %err, operation, "operation aborted");
        }
        allowed
    }

    /// Log an abort on a component that is not live
    fn warn_not_found(&self, component_id: ComponentIndex, operation: &str) {
        let err = EngineError::ComponentNotFound(component_id);
        tracing::warn!(error = %err, operation, "operation aborted");
    }

    /// Persist staged layouts (and metadata) before committing to memory
    ///
    /// Layouts and metadata saves are not mutually transactional; a failure
    /// between them leaves an orphan in storage that the next reconciliation
    /// pass drops.
    async fn persist_staged(
        &self,
        layouts: &[LayoutEntry],
        metadata: Option<&IndexMap<ComponentIndex, ComponentMetadata>>,
    ) -> bool {
        if let Err(e) = self
            .services
            .persistence
            .save_layouts(self.dashboard.id, layouts)
            .await
        {
            tracing::error!(dashboard = %self.dashboard.id, error = %e, "layout save failed");
            return false;
        }
        if let Some(metadata) = metadata {
            if let Err(e) = self
                .services
                .persistence
                .save_metadata(self.dashboard.id, metadata)
                .await
            {
                tracing::error!(dashboard = %self.dashboard.id, error = %e, "metadata save failed");
                return false;
            }
        }
        true
    }
}
