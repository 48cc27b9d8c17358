//! Session operation tests: duplicate, move, remove, filter interactions

use gridboard_core::{ColumnName, ComponentIndex, Dashboard, FilterOperator, Rect};
use gridboard_engine::{
    DashboardSession, EngineConfig, NoUpdateReason, ProjectRef, UiPatch, UserRef,
};
use gridboard_filter::SelectionPoint;
use gridboard_test_utils::{
    aggregate_card, experiments_source, filter_control, scatter_chart, services_with,
    tree_with_refs, InMemoryPersistence, RecordingQuery, StaticPermissions,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

struct Harness {
    session: DashboardSession,
    query: Arc<RecordingQuery>,
    persistence: Arc<InMemoryPersistence>,
    control: ComponentIndex,
    chart: ComponentIndex,
    card: ComponentIndex,
}

async fn harness(permissions: StaticPermissions) -> Harness {
    let query = Arc::new(RecordingQuery::new());
    let persistence = Arc::new(InMemoryPersistence::new());
    let services = services_with(
        Arc::clone(&query),
        Arc::new(permissions),
        Arc::clone(&persistence),
    );

    let mut session = DashboardSession::new(
        Dashboard::new("test"),
        ProjectRef::new("proj"),
        UserRef::new("user"),
        EngineConfig::default(),
        services,
    );

    let source = experiments_source();
    let control = filter_control(&source, "group");
    let chart = scatter_chart(&source);
    let card = aggregate_card(&source, "group");
    let (control_id, chart_id, card_id) = (control.index, chart.index, card.index);

    let chart_tree = tree_with_refs(chart_id, 3);
    assert!(session.adopt_component(control, None).await.is_update());
    assert!(session.adopt_component(chart, Some(chart_tree)).await.is_update());
    assert!(session.adopt_component(card, None).await.is_update());

    Harness {
        session,
        query,
        persistence,
        control: control_id,
        chart: chart_id,
        card: card_id,
    }
}

/// Let spawned fetch tasks run on the current-thread runtime
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn duplicate_yields_independent_component() {
    let mut h = harness(StaticPermissions::allow_all()).await;

    let UiPatch::ComponentAdded { metadata, layout, .. } = h.session.on_duplicate(h.card).await
    else {
        panic!("expected ComponentAdded");
    };

    assert_ne!(metadata.index, h.card);
    assert_eq!(layout.component_id, metadata.index);

    let original = h.session.dashboard().metadata_of(h.card).unwrap().clone();
    assert_eq!(metadata.component_type, original.component_type);
    assert_eq!(metadata.render_params, original.render_params);
    assert_eq!(metadata.filter_dependencies, original.filter_dependencies);

    // Editing the duplicate leaves the original untouched.
    let edited = h
        .session
        .edit_render_params(metadata.index, json!({"aggregate": "sum"}))
        .await;
    assert!(edited.is_update());
    let original_after = h.session.dashboard().metadata_of(h.card).unwrap();
    assert_eq!(original_after.render_params, original.render_params);
}

#[tokio::test]
async fn duplicating_twice_yields_two_independent_copies() {
    let mut h = harness(StaticPermissions::allow_all()).await;

    let UiPatch::ComponentAdded { metadata: first, .. } = h.session.on_duplicate(h.card).await
    else {
        panic!("expected ComponentAdded");
    };
    let UiPatch::ComponentAdded { metadata: second, .. } = h.session.on_duplicate(h.card).await
    else {
        panic!("expected ComponentAdded");
    };

    assert_ne!(first.index, second.index);
    assert_eq!(first.render_params, second.render_params);
}

#[tokio::test]
async fn duplicates_never_overlap_existing_layouts() {
    let mut h = harness(StaticPermissions::allow_all()).await;

    for _ in 0..4 {
        assert!(h.session.on_duplicate(h.chart).await.is_update());
    }

    let layouts = &h.session.dashboard().layouts;
    for (i, a) in layouts.iter().enumerate() {
        for b in &layouts[i + 1..] {
            assert!(!a.overlaps(b), "{:?} overlaps {:?}", a.rect(), b.rect());
        }
    }
}

#[tokio::test]
async fn duplicate_remaps_every_tree_reference() {
    let mut h = harness(StaticPermissions::allow_all()).await;

    let UiPatch::ComponentAdded { metadata, tree, .. } = h.session.on_duplicate(h.chart).await
    else {
        panic!("expected ComponentAdded");
    };
    let tree = tree.expect("chart has a render tree");

    assert_eq!(tree.reference_count(h.chart), 0);
    assert_eq!(tree.reference_count(metadata.index), 3);
    // Source tree untouched.
    let source_tree = h.session.render_tree(h.chart).unwrap();
    assert_eq!(source_tree.reference_count(h.chart), 3);
}

#[tokio::test]
async fn permission_denial_is_a_silent_noop() {
    let mut h = harness(StaticPermissions::deny_all()).await;
    let before = h.session.dashboard().len();
    let saves_before = h.persistence.layout_save_count();

    let patch = h.session.on_duplicate(h.chart).await;
    let UiPatch::NoUpdate { reason } = patch else {
        panic!("expected NoUpdate");
    };

    assert_eq!(reason, NoUpdateReason::PermissionDenied);
    assert_eq!(h.session.dashboard().len(), before);
    assert_eq!(h.persistence.layout_save_count(), saves_before);
}

#[tokio::test]
async fn unknown_component_operations_do_not_mutate() {
    let mut h = harness(StaticPermissions::allow_all()).await;
    let before = h.session.dashboard().len();
    let ghost = ComponentIndex::fresh();

    for patch in [
        h.session.on_duplicate(ghost).await,
        h.session.on_remove(ghost).await,
        h.session.on_drag_or_resize(ghost, Rect::new(0, 0, 2, 2)).await,
        h.session.on_filter_input(ghost, json!("X")).await,
    ] {
        let UiPatch::NoUpdate { reason } = patch else {
            panic!("expected NoUpdate");
        };
        assert_eq!(reason, NoUpdateReason::ComponentNotFound);
    }
    assert_eq!(h.session.dashboard().len(), before);
}

#[tokio::test]
async fn persistence_failure_leaves_prior_state_unchanged() {
    let mut h = harness(StaticPermissions::allow_all()).await;
    h.persistence
        .fail_layout_saves
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let before = h.session.dashboard().clone();
    let patch = h.session.on_duplicate(h.chart).await;

    let UiPatch::NoUpdate { reason } = patch else {
        panic!("expected NoUpdate");
    };
    assert_eq!(reason, NoUpdateReason::PersistenceFailed);
    assert_eq!(h.session.dashboard().len(), before.len());
    assert_eq!(h.session.dashboard().layouts, before.layouts);
}

#[tokio::test]
async fn drag_overwrites_rectangle_and_persists() {
    let mut h = harness(StaticPermissions::allow_all()).await;

    let patch = h
        .session
        .on_drag_or_resize(h.card, Rect::new(9, 9, 3, 2))
        .await;
    let UiPatch::LayoutUpdated { entry } = patch else {
        panic!("expected LayoutUpdated");
    };

    assert_eq!(entry.rect(), Rect::new(9, 9, 3, 2));
    assert_eq!(
        h.session.dashboard().layout_of(h.card).unwrap().rect(),
        Rect::new(9, 9, 3, 2)
    );

    // The save carried the updated entry.
    let stored = h.persistence.stored_layouts().unwrap();
    let stored_entries: Vec<gridboard_core::LayoutEntry> =
        serde_json::from_value(stored).unwrap();
    let stored_card = stored_entries
        .iter()
        .find(|e| e.component_id == h.card)
        .unwrap();
    assert_eq!(stored_card.rect(), Rect::new(9, 9, 3, 2));
}

#[tokio::test]
async fn filter_input_notifies_exactly_the_dependents() {
    let mut h = harness(StaticPermissions::allow_all()).await;

    let patch = h.session.on_filter_input(h.control, json!("X")).await;
    let UiPatch::FiltersPropagated { refreshed } = patch else {
        panic!("expected FiltersPropagated");
    };

    let mut notified: Vec<_> = refreshed.iter().map(|o| o.consumer).collect();
    notified.sort();
    let mut expected = vec![h.chart, h.card];
    expected.sort();
    assert_eq!(notified, expected);

    settle().await;
    // One dispatched fetch per dependent, none for the producer.
    assert_eq!(h.query.call_count(), 2);
}

#[tokio::test]
async fn scatter_click_feeds_the_aggregating_card() {
    let mut h = harness(StaticPermissions::allow_all()).await;

    let patch = h
        .session
        .on_chart_click(
            h.chart,
            SelectionPoint::new(ColumnName::new("group"), json!("X")),
        )
        .await;
    let UiPatch::FiltersPropagated { refreshed } = patch else {
        panic!("expected FiltersPropagated");
    };

    // The chart is the producer; only the card re-renders.
    assert_eq!(refreshed.len(), 1);
    assert_eq!(refreshed[0].consumer, h.card);

    let predicate = refreshed[0].filters.iter().next().unwrap();
    assert_eq!(predicate.column, ColumnName::new("group"));
    assert_eq!(predicate.operator, FilterOperator::Eq);
    assert_eq!(predicate.values, vec![json!("X")]);

    settle().await;
    let calls = h.query.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, experiments_source());
    assert_eq!(calls[0].1.len(), 1);
}

#[tokio::test]
async fn lasso_selection_builds_membership_predicate() {
    let mut h = harness(StaticPermissions::allow_all()).await;

    let points = vec![
        SelectionPoint::new(ColumnName::new("group"), json!("A")),
        SelectionPoint::new(ColumnName::new("group"), json!("B")),
        SelectionPoint::new(ColumnName::new("group"), json!("A")),
    ];
    let patch = h.session.on_chart_select(h.chart, points).await;
    let UiPatch::FiltersPropagated { refreshed } = patch else {
        panic!("expected FiltersPropagated");
    };

    let predicate = refreshed[0].filters.iter().next().unwrap();
    assert_eq!(predicate.operator, FilterOperator::In);
    assert_eq!(predicate.values, vec![json!("A"), json!("B")]);
}

#[tokio::test]
async fn last_write_wins_per_producer_slot() {
    let mut h = harness(StaticPermissions::allow_all()).await;

    h.session.on_filter_input(h.control, json!("X")).await;
    h.session.on_filter_input(h.control, json!("Y")).await;

    assert_eq!(h.session.filters().active_count(), 1);
    let combined = h.session.filters().combined();
    assert_eq!(combined.iter().next().unwrap().values, vec![json!("Y")]);
}

#[tokio::test]
async fn clearing_all_filters_refreshes_each_consumer_once_unfiltered() {
    let mut h = harness(StaticPermissions::allow_all()).await;

    h.session.on_filter_input(h.control, json!("X")).await;
    let patch = h.session.clear_filters().await;
    let UiPatch::FiltersPropagated { refreshed } = patch else {
        panic!("expected FiltersPropagated");
    };

    let mut notified: Vec<_> = refreshed.iter().map(|o| o.consumer).collect();
    notified.sort();
    notified.dedup();
    assert_eq!(notified.len(), refreshed.len(), "each consumer exactly once");
    assert!(refreshed.iter().all(|o| o.filters.is_empty()));
    assert!(h.session.filters().is_empty());
}

#[tokio::test]
async fn clearing_when_already_idle_is_a_noop() {
    let mut h = harness(StaticPermissions::allow_all()).await;

    let patch = h.session.clear_filters().await;
    let UiPatch::NoUpdate { reason } = patch else {
        panic!("expected NoUpdate");
    };
    assert_eq!(reason, NoUpdateReason::AlreadyIdle);
}

#[tokio::test]
async fn removing_a_producer_refreshes_its_former_dependents() {
    let mut h = harness(StaticPermissions::allow_all()).await;

    h.session.on_filter_input(h.control, json!("X")).await;
    let patch = h.session.on_remove(h.control).await;
    let UiPatch::ComponentRemoved { component_id, refreshed } = patch else {
        panic!("expected ComponentRemoved");
    };

    assert_eq!(component_id, h.control);
    assert!(!h.session.dashboard().contains(h.control));
    assert!(h.session.dashboard().layout_of(h.control).is_none());
    assert!(h.session.dashboard().metadata_of(h.control).is_none());

    // The cleared predicate refreshes both dependents with an empty set.
    assert_eq!(refreshed.len(), 2);
    assert!(refreshed.iter().all(|o| o.filters.is_empty()));
}

#[tokio::test]
async fn filter_interaction_never_touches_layout_or_metadata() {
    let mut h = harness(StaticPermissions::allow_all()).await;
    let layouts_before = h.session.dashboard().layouts.clone();
    let saves_before = h.persistence.layout_save_count();

    h.session.on_filter_input(h.control, json!("X")).await;
    h.session
        .on_chart_click(
            h.chart,
            SelectionPoint::new(ColumnName::new("group"), json!("Y")),
        )
        .await;
    h.session.clear_filters().await;

    assert_eq!(h.session.dashboard().layouts, layouts_before);
    assert_eq!(h.persistence.layout_save_count(), saves_before);
}
