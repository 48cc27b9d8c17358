//! Dashboard data model
//!
//! Defines the persistent shape of a dashboard:
//! - Grid geometry ([`Rect`], [`LayoutEntry`])
//! - Component configuration ([`ComponentMetadata`], [`ComponentType`])
//! - Declared filter dependencies ([`FilterDependency`])
//! - The [`Dashboard`] aggregate itself

use crate::filter::ColumnName;
use crate::identity::{ComponentIndex, DashboardId};
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Number of columns on the default layout grid
pub const DEFAULT_GRID_COLUMNS: u32 = 12;

/// Rectangle in grid units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left column
    pub x: u32,
    /// Top row
    pub y: u32,
    /// Width in columns
    pub w: u32,
    /// Height in rows
    pub h: u32,
}

impl Rect {
    /// Create new rectangle
    #[inline]
    #[must_use]
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// One past the rightmost occupied column
    #[inline]
    #[must_use]
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    /// One past the bottom occupied row
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    /// Check whether two rectangles share any cell
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// One component's rectangle on the grid
///
/// Invariant (maintained by the layout model): no two `locked == false`
/// entries of one dashboard overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    /// Component this entry positions
    pub component_id: ComponentIndex,
    /// Left column
    pub x: u32,
    /// Top row
    pub y: u32,
    /// Width in columns
    pub w: u32,
    /// Height in rows
    pub h: u32,
    /// Locked entries are pinned by the user and excluded from the
    /// non-overlap invariant
    #[serde(default)]
    pub locked: bool,
}

impl LayoutEntry {
    /// Create new unlocked entry
    #[inline]
    #[must_use]
    pub fn new(component_id: ComponentIndex, rect: Rect) -> Self {
        Self {
            component_id,
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
            locked: false,
        }
    }

    /// Mark as locked
    #[inline]
    #[must_use]
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// The entry's rectangle
    #[inline]
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    /// Overwrite the rectangle, keeping identity and lock state
    #[inline]
    pub fn set_rect(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.w = rect.w;
        self.h = rect.h;
    }

    /// Check whether this entry's rectangle overlaps another's
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &LayoutEntry) -> bool {
        self.rect().overlaps(&other.rect())
    }
}

/// Kind of visual component on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    /// Chart visualization
    Chart,
    /// Tabular view
    Table,
    /// Single-value aggregate card
    Card,
    /// Interactive filter control (dropdown, slider, search box)
    FilterControl,
    /// Static text block
    TextBlock,
}

impl ComponentType {
    /// Type-specific default size `(w, h)` in grid units
    #[must_use]
    pub fn default_size(&self) -> (u32, u32) {
        match self {
            ComponentType::Chart => (6, 4),
            ComponentType::Table => (6, 4),
            ComponentType::Card => (3, 2),
            ComponentType::FilterControl => (3, 1),
            ComponentType::TextBlock => (4, 2),
        }
    }

    /// Stable name used in persisted metadata and log lines
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Chart => "chart",
            ComponentType::Table => "table",
            ComponentType::Card => "card",
            ComponentType::FilterControl => "filter_control",
            ComponentType::TextBlock => "text_block",
        }
    }
}

/// Reference to a tabular data source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataSourceRef(pub String);

impl DataSourceRef {
    /// Create new reference
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Source name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DataSourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A consumer's declared interest in filter changes
///
/// Dependencies are declared in metadata at creation time; the propagation
/// engine performs a direct lookup against them rather than inferring
/// producer/consumer links at runtime. `column: None` subscribes to every
/// column of the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDependency {
    /// Data source the consumer reads
    pub source: DataSourceRef,
    /// Specific column, or `None` for any column of the source
    pub column: Option<ColumnName>,
}

impl FilterDependency {
    /// Depend on every column of a source
    #[inline]
    #[must_use]
    pub fn on_source(source: DataSourceRef) -> Self {
        Self {
            source,
            column: None,
        }
    }

    /// Depend on one column of a source
    #[inline]
    #[must_use]
    pub fn on_column(source: DataSourceRef, column: ColumnName) -> Self {
        Self {
            source,
            column: Some(column),
        }
    }

    /// Check whether a change to `(source, column)` concerns this dependency
    #[must_use]
    pub fn matches(&self, source: &DataSourceRef, column: &ColumnName) -> bool {
        if self.source != *source {
            return false;
        }
        match &self.column {
            Some(own) => own == column,
            None => true,
        }
    }
}

/// Per-component configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMetadata {
    /// Component identity; must match exactly one layout entry
    pub index: ComponentIndex,
    /// Component kind
    pub component_type: ComponentType,
    /// Backing data source, if the component renders data
    pub data_source_ref: Option<DataSourceRef>,
    /// Render parameters (axes, aggregation, labels, ...), opaque to the
    /// composition engine
    pub render_params: serde_json::Value,
    /// Declared filter dependencies (consumers only)
    pub filter_dependencies: Vec<FilterDependency>,
}

impl ComponentMetadata {
    /// Create new metadata with empty parameters
    #[inline]
    #[must_use]
    pub fn new(index: ComponentIndex, component_type: ComponentType) -> Self {
        Self {
            index,
            component_type,
            data_source_ref: None,
            render_params: serde_json::Value::Null,
            filter_dependencies: Vec::new(),
        }
    }

    /// With data source
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: DataSourceRef) -> Self {
        self.data_source_ref = Some(source);
        self
    }

    /// With render parameters
    #[inline]
    #[must_use]
    pub fn with_render_params(mut self, params: serde_json::Value) -> Self {
        self.render_params = params;
        self
    }

    /// With an additional filter dependency
    #[inline]
    #[must_use]
    pub fn with_dependency(mut self, dependency: FilterDependency) -> Self {
        self.filter_dependencies.push(dependency);
        self
    }

    /// Check whether this component consumes filter changes at all
    #[inline]
    #[must_use]
    pub fn is_consumer(&self) -> bool {
        !self.filter_dependencies.is_empty()
    }
}

/// A dashboard: components, their layouts and their metadata
///
/// `components` is the authoritative set of live identities; `layouts` and
/// `metadata` entries whose id is not in it are orphans and get dropped
/// during reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    /// Dashboard identity
    pub id: DashboardId,
    /// Display title
    pub title: String,
    /// Live component identities
    pub components: IndexSet<ComponentIndex>,
    /// Grid rectangles, one per live component
    pub layouts: Vec<LayoutEntry>,
    /// Configuration, one per live component
    pub metadata: IndexMap<ComponentIndex, ComponentMetadata>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl Dashboard {
    /// Create new empty dashboard
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: DashboardId::new(),
            title: title.into(),
            components: IndexSet::new(),
            layouts: Vec::new(),
            metadata: IndexMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Number of live components
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if the dashboard has no components
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Check whether `index` is a live component
    #[inline]
    #[must_use]
    pub fn contains(&self, index: ComponentIndex) -> bool {
        self.components.contains(&index)
    }

    /// Layout entry for a component
    #[inline]
    #[must_use]
    pub fn layout_of(&self, index: ComponentIndex) -> Option<&LayoutEntry> {
        self.layouts.iter().find(|e| e.component_id == index)
    }

    /// Mutable layout entry for a component
    #[inline]
    pub fn layout_of_mut(&mut self, index: ComponentIndex) -> Option<&mut LayoutEntry> {
        self.layouts.iter_mut().find(|e| e.component_id == index)
    }

    /// Metadata for a component
    #[inline]
    #[must_use]
    pub fn metadata_of(&self, index: ComponentIndex) -> Option<&ComponentMetadata> {
        self.metadata.get(&index)
    }

    /// Insert the full (identity, layout, metadata) triple of one component
    ///
    /// The three records are always created together; partial insertion is
    /// not representable through this API.
    pub fn insert_component(&mut self, metadata: ComponentMetadata, layout: LayoutEntry) {
        debug_assert_eq!(metadata.index, layout.component_id);
        let index = metadata.index;
        self.components.insert(index);
        self.layouts.push(layout);
        self.metadata.insert(index, metadata);
        self.touch();
    }

    /// Remove a component and all three of its records
    ///
    /// Returns the removed pair, or `None` (and no mutation) when `index` is
    /// not live.
    pub fn remove_component(
        &mut self,
        index: ComponentIndex,
    ) -> Option<(ComponentMetadata, LayoutEntry)> {
        if !self.components.contains(&index) {
            return None;
        }
        let pos = self.layouts.iter().position(|e| e.component_id == index)?;
        let metadata = self.metadata.shift_remove(&index)?;
        let layout = self.layouts.remove(pos);
        self.components.shift_remove(&index);
        self.touch();
        Some((metadata, layout))
    }

    /// Components declaring at least one filter dependency
    pub fn consumers(&self) -> impl Iterator<Item = &ComponentMetadata> {
        self.metadata.values().filter(|m| m.is_consumer())
    }

    /// Record a mutation
    #[inline]
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn meta(component_type: ComponentType) -> ComponentMetadata {
        ComponentMetadata::new(ComponentIndex::fresh(), component_type)
    }

    #[test]
    fn rect_overlap_detection() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(4, 0, 4, 4);
        let c = Rect::new(2, 2, 4, 4);

        assert!(!a.overlaps(&b)); // edge-adjacent, not overlapping
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
        assert!(a.overlaps(&a));
    }

    #[test]
    fn layout_entry_set_rect_keeps_identity() {
        let mut entry = LayoutEntry::new(ComponentIndex::fresh(), Rect::new(0, 0, 2, 2));
        let id = entry.component_id;
        entry.set_rect(Rect::new(5, 5, 3, 3));

        assert_eq!(entry.component_id, id);
        assert_eq!(entry.rect(), Rect::new(5, 5, 3, 3));
        assert!(!entry.locked);
    }

    #[test]
    fn component_type_default_sizes_fit_grid() {
        for ty in [
            ComponentType::Chart,
            ComponentType::Table,
            ComponentType::Card,
            ComponentType::FilterControl,
            ComponentType::TextBlock,
        ] {
            let (w, h) = ty.default_size();
            assert!(w >= 1 && w <= DEFAULT_GRID_COLUMNS);
            assert!(h >= 1);
        }
    }

    #[test]
    fn dependency_matching() {
        let source = DataSourceRef::new("experiments");
        let other = DataSourceRef::new("sensors");
        let group = ColumnName::new("group");

        let any = FilterDependency::on_source(source.clone());
        assert!(any.matches(&source, &group));
        assert!(!any.matches(&other, &group));

        let narrow = FilterDependency::on_column(source.clone(), group.clone());
        assert!(narrow.matches(&source, &group));
        assert!(!narrow.matches(&source, &ColumnName::new("dose")));
    }

    #[test]
    fn dashboard_insert_and_remove_triple() {
        let mut dash = Dashboard::new("run 42");
        let metadata = meta(ComponentType::Card);
        let index = metadata.index;
        let layout = LayoutEntry::new(index, Rect::new(0, 0, 3, 2));

        dash.insert_component(metadata, layout);
        assert!(dash.contains(index));
        assert!(dash.layout_of(index).is_some());
        assert!(dash.metadata_of(index).is_some());
        assert_eq!(dash.len(), 1);

        let removed = dash.remove_component(index);
        assert!(removed.is_some());
        assert!(!dash.contains(index));
        assert!(dash.layout_of(index).is_none());
        assert!(dash.metadata_of(index).is_none());
        assert!(dash.is_empty());
    }

    #[test]
    fn remove_unknown_component_is_noop() {
        let mut dash = Dashboard::new("empty");
        assert!(dash.remove_component(ComponentIndex::fresh()).is_none());
        assert!(dash.is_empty());
    }

    #[test]
    fn consumers_are_components_with_dependencies() {
        let mut dash = Dashboard::new("d");
        let producer = meta(ComponentType::FilterControl);
        let consumer = meta(ComponentType::Card)
            .with_dependency(FilterDependency::on_source(DataSourceRef::new("experiments")));

        let p_layout = LayoutEntry::new(producer.index, Rect::new(0, 0, 3, 1));
        let c_layout = LayoutEntry::new(consumer.index, Rect::new(3, 0, 3, 2));
        let consumer_index = consumer.index;

        dash.insert_component(producer, p_layout);
        dash.insert_component(consumer, c_layout);

        let consumers: Vec<_> = dash.consumers().map(|m| m.index).collect();
        assert_eq!(consumers, vec![consumer_index]);
    }
}
