//! Gridboard inspection and demo binary

use async_trait::async_trait;
use clap::{value_parser, Arg, Command};
use gridboard_core::{
    ColumnName, CombinedFilterSet, ComponentIndex, ComponentMetadata, ComponentType, DashboardId,
    DataSourceRef, EngineError, FilterDependency, LayoutEntry,
};
use gridboard_engine::{
    DashboardReconciler, DashboardSession, DataQueryService, EngineConfig, PermissionService,
    PersistenceService, ProjectRef, RenderPayload, SessionServices, UiPatch, UserRef,
};
use gridboard_filter::SelectionPoint;
use indexmap::IndexMap;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Command::new("gridboard")
        .version(gridboard_engine::VERSION)
        .about("Reactive dashboard composition engine")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("inspect")
                .about("Reconcile a persisted dashboard fixture and print the repair summary")
                .arg(
                    Arg::new("fixture")
                        .long("fixture")
                        .required(true)
                        .value_parser(value_parser!(std::path::PathBuf))
                        .help("JSON file with 'layouts' and 'metadata' blobs"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run a scripted interaction sequence on a demo dashboard"),
        )
        .get_matches();

    match cli.subcommand() {
        Some(("inspect", matches)) => {
            let path: &std::path::PathBuf = matches.get_one("fixture").expect("required");
            inspect(path).await
        }
        Some(("simulate", _)) => simulate().await,
        _ => unreachable!("arg_required_else_help"),
    }
}

async fn inspect(path: &std::path::Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)?;
    let fixture: serde_json::Value = serde_json::from_str(&raw)?;
    let persistence = FixturePersistence::new(
        fixture.get("layouts").cloned(),
        fixture.get("metadata").cloned(),
    );

    let reconciler = DashboardReconciler::new(EngineConfig::default());
    let (dashboard, report) = reconciler
        .load(&persistence, DashboardId::new(), "inspected")
        .await?;

    println!("components: {}", dashboard.len());
    println!("dropped orphan layouts: {}", report.dropped.len());
    println!("regenerated layouts: {}", report.synthesized.len());
    for issue in report.layout_issues.iter().chain(&report.metadata_issues) {
        println!("issue: {issue}");
    }
    println!(
        "fixed point: {}",
        if report.is_fixed_point() { "yes" } else { "no (repairs persisted)" }
    );
    Ok(())
}

async fn simulate() -> anyhow::Result<()> {
    let experiments = DataSourceRef::new("experiments");

    let control = ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::FilterControl)
        .with_source(experiments.clone())
        .with_render_params(json!({"filter_column": "group"}));
    let chart = ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::Chart)
        .with_source(experiments.clone())
        .with_render_params(json!({"chart_kind": "scatter", "x": "time", "y": "value"}))
        .with_dependency(FilterDependency::on_source(experiments.clone()));
    let card = ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::Card)
        .with_source(experiments.clone())
        .with_render_params(json!({"aggregate": "count"}))
        .with_dependency(FilterDependency::on_source(experiments.clone()));

    let control_id = control.index;
    let chart_id = chart.index;

    let services = SessionServices {
        query: Arc::new(EchoQuery),
        permissions: Arc::new(AllowAll),
        persistence: Arc::new(FixturePersistence::new(None, None)),
    };
    let mut session = DashboardSession::new(
        gridboard_core::Dashboard::new("simulated"),
        ProjectRef::new("demo"),
        UserRef::new("local"),
        EngineConfig::default(),
        services,
    );

    for metadata in [control, chart, card] {
        describe("adopt", &session.adopt_component(metadata, None).await);
    }

    describe(
        "filter input group=X",
        &session.on_filter_input(control_id, json!("X")).await,
    );
    describe(
        "scatter click group=Y",
        &session
            .on_chart_click(
                chart_id,
                SelectionPoint::new(ColumnName::new("group"), json!("Y")),
            )
            .await,
    );
    describe("duplicate chart", &session.on_duplicate(chart_id).await);
    describe("clear all filters", &session.clear_filters().await);

    Ok(())
}

fn describe(event: &str, patch: &UiPatch) {
    match patch {
        UiPatch::NoUpdate { reason } => println!("{event}: no update ({reason:?})"),
        UiPatch::ComponentAdded { metadata, layout, .. } => println!(
            "{event}: added {} {} at ({}, {}) {}x{}",
            metadata.component_type.as_str(),
            metadata.index.short(),
            layout.x,
            layout.y,
            layout.w,
            layout.h
        ),
        UiPatch::LayoutUpdated { entry } => println!(
            "{event}: moved {} to ({}, {})",
            entry.component_id.short(),
            entry.x,
            entry.y
        ),
        UiPatch::MetadataUpdated { metadata } => {
            println!("{event}: edited {}", metadata.index.short());
        }
        UiPatch::ComponentRemoved { component_id, refreshed } => println!(
            "{event}: removed {} ({} consumers refreshed)",
            component_id.short(),
            refreshed.len()
        ),
        UiPatch::FiltersPropagated { refreshed } => println!(
            "{event}: {} consumers refreshed",
            refreshed.len()
        ),
    }
}

/// Persistence double over an optional in-memory fixture
struct FixturePersistence {
    layouts: Mutex<Option<serde_json::Value>>,
    metadata: Mutex<Option<serde_json::Value>>,
}

impl FixturePersistence {
    fn new(layouts: Option<serde_json::Value>, metadata: Option<serde_json::Value>) -> Self {
        Self {
            layouts: Mutex::new(layouts),
            metadata: Mutex::new(metadata),
        }
    }
}

#[async_trait]
impl PersistenceService for FixturePersistence {
    async fn load_layouts(
        &self,
        _dashboard: DashboardId,
    ) -> Result<Option<serde_json::Value>, EngineError> {
        Ok(self.layouts.lock().await.clone())
    }

    async fn save_layouts(
        &self,
        _dashboard: DashboardId,
        layouts: &[LayoutEntry],
    ) -> Result<(), EngineError> {
        *self.layouts.lock().await = Some(serde_json::to_value(layouts).expect("serializable"));
        Ok(())
    }

    async fn load_metadata(
        &self,
        _dashboard: DashboardId,
    ) -> Result<Option<serde_json::Value>, EngineError> {
        Ok(self.metadata.lock().await.clone())
    }

    async fn save_metadata(
        &self,
        _dashboard: DashboardId,
        metadata: &IndexMap<ComponentIndex, ComponentMetadata>,
    ) -> Result<(), EngineError> {
        *self.metadata.lock().await = Some(serde_json::to_value(metadata).expect("serializable"));
        Ok(())
    }
}

/// Permission double that always grants
struct AllowAll;

#[async_trait]
impl PermissionService for AllowAll {
    async fn has_editor_permission(&self, _project: &ProjectRef, _user: &UserRef) -> bool {
        true
    }
}

/// Query double that echoes the filter set back as the payload
struct EchoQuery;

#[async_trait]
impl DataQueryService for EchoQuery {
    async fn fetch(
        &self,
        source: &DataSourceRef,
        filters: &CombinedFilterSet,
    ) -> Result<RenderPayload, EngineError> {
        Ok(RenderPayload(json!({
            "source": source.as_str(),
            "predicates": filters.len(),
        })))
    }
}
