//! Graph-interaction adapter
//!
//! Turns chart click and selection events into filter predicates keyed to
//! the chart's own index as producer. Only chart kinds with point-level
//! selection participate. Viewport zoom/pan is not a filter source: it
//! produces nothing here, by decision, not omission.

use gridboard_core::{ColumnName, ComponentMetadata, ComponentType, FilterPredicate};

/// Visualization kind of a chart component
///
/// Parsed from the chart's render parameters (`"chart_kind"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Scatter plot
    Scatter,
    /// Bar chart
    Bar,
    /// Histogram
    Histogram,
    /// Line chart
    Line,
    /// Heatmap
    Heatmap,
}

impl ChartKind {
    /// Parse from the stable name used in render parameters
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "scatter" => Some(ChartKind::Scatter),
            "bar" => Some(ChartKind::Bar),
            "histogram" => Some(ChartKind::Histogram),
            "line" => Some(ChartKind::Line),
            "heatmap" => Some(ChartKind::Heatmap),
            _ => None,
        }
    }

    /// Read the kind out of a chart's render parameters
    #[must_use]
    pub fn from_params(params: &serde_json::Value) -> Option<Self> {
        params.get("chart_kind").and_then(|v| v.as_str()).and_then(Self::parse)
    }

    /// Whether the kind supports point-level selection
    #[must_use]
    pub fn supports_point_selection(&self) -> bool {
        matches!(self, ChartKind::Scatter | ChartKind::Bar | ChartKind::Histogram)
    }
}

/// One selected point's dimension value
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionPoint {
    /// Dimension column the point was selected on
    pub column: ColumnName,
    /// The point's value in that dimension
    pub value: serde_json::Value,
}

impl SelectionPoint {
    /// Create new selection point
    #[inline]
    #[must_use]
    pub fn new(column: ColumnName, value: serde_json::Value) -> Self {
        Self { column, value }
    }
}

/// What a chart interaction amounts to
#[derive(Debug, Clone, PartialEq)]
pub enum ChartInteraction {
    /// The chart contributes (or replaces) a predicate
    Predicate(FilterPredicate),
    /// The chart's selection was emptied; its slot returns to idle
    ClearSelection,
    /// The component cannot act as a filter source for this event
    NotAFilterSource,
}

/// Adapter from chart events to filter predicates
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphInteractionAdapter;

impl GraphInteractionAdapter {
    /// Create new adapter
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// A single point was clicked
    ///
    /// Builds an equality predicate on the clicked point's dimension value,
    /// keyed to the chart itself as producer.
    #[must_use]
    pub fn point_click(
        &self,
        chart: &ComponentMetadata,
        point: &SelectionPoint,
    ) -> ChartInteraction {
        let Some(source) = self.selectable_source(chart) else {
            return ChartInteraction::NotAFilterSource;
        };
        ChartInteraction::Predicate(FilterPredicate::equals(
            chart.index,
            source,
            point.column.clone(),
            point.value.clone(),
        ))
    }

    /// A region/lasso selection finished
    ///
    /// Builds a set-membership predicate over the union of the selected
    /// points' values in the first point's dimension (duplicates removed,
    /// first-seen order kept). An empty selection clears the chart's slot.
    #[must_use]
    pub fn region_select(
        &self,
        chart: &ComponentMetadata,
        points: &[SelectionPoint],
    ) -> ChartInteraction {
        let Some(source) = self.selectable_source(chart) else {
            return ChartInteraction::NotAFilterSource;
        };
        let Some(first) = points.first() else {
            return ChartInteraction::ClearSelection;
        };

        let column = first.column.clone();
        let mut values: Vec<serde_json::Value> = Vec::new();
        for point in points.iter().filter(|p| p.column == column) {
            if !values.contains(&point.value) {
                values.push(point.value.clone());
            }
        }

        ChartInteraction::Predicate(FilterPredicate::one_of(
            chart.index,
            source,
            column,
            values,
        ))
    }

    /// The chart's data source, when it can act as a filter source at all
    fn selectable_source(
        &self,
        chart: &ComponentMetadata,
    ) -> Option<gridboard_core::DataSourceRef> {
        if chart.component_type != ComponentType::Chart {
            return None;
        }
        let kind = ChartKind::from_params(&chart.render_params)?;
        if !kind.supports_point_selection() {
            return None;
        }
        chart.data_source_ref.clone()
    }
}
