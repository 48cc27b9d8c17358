//! Layout reconciliation against the live component set
//!
//! Drops entries whose component no longer exists and synthesizes a placed
//! entry for every live component that lacks one. Running it twice on its
//! own output is a no-op.

use crate::grid::GridEngine;
use gridboard_core::{ComponentIndex, ComponentMetadata, LayoutEntry};
use indexmap::IndexMap;

/// Result of one reconciliation pass
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// The reconciled, collision-consistent entry list
    pub entries: Vec<LayoutEntry>,
    /// Orphaned entries that were dropped (no matching component)
    pub dropped: Vec<ComponentIndex>,
    /// Components that had no (usable) entry and got one synthesized
    pub synthesized: Vec<ComponentIndex>,
}

impl ReconcileOutcome {
    /// Check whether the pass changed anything
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.dropped.is_empty() && self.synthesized.is_empty()
    }
}

/// Reconcile persisted entries with the live component set
///
/// `known` maps every live component to its metadata; the declared component
/// type drives the default size of synthesized entries. Duplicate entries
/// for one component keep the first occurrence, the rest are dropped as
/// orphans.
#[must_use]
pub fn reconcile(
    engine: &GridEngine,
    layouts: &[LayoutEntry],
    known: &IndexMap<ComponentIndex, ComponentMetadata>,
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();
    let mut seen: Vec<ComponentIndex> = Vec::with_capacity(layouts.len());

    for entry in layouts {
        let id = entry.component_id;
        if !known.contains_key(&id) || seen.contains(&id) {
            outcome.dropped.push(id);
            continue;
        }
        seen.push(id);
        outcome.entries.push(*entry);
    }

    // Known components missing a layout get one placed against the snapshot
    // built so far, so synthesized entries never collide with kept ones or
    // with each other.
    for (id, metadata) in known {
        if seen.contains(id) {
            continue;
        }
        let rect = engine.place(metadata.component_type, &outcome.entries);
        outcome.entries.push(LayoutEntry::new(*id, rect));
        outcome.synthesized.push(*id);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridboard_core::{ComponentType, Rect};
    use pretty_assertions::assert_eq;

    fn known_of(metas: Vec<ComponentMetadata>) -> IndexMap<ComponentIndex, ComponentMetadata> {
        metas.into_iter().map(|m| (m.index, m)).collect()
    }

    #[test]
    fn orphaned_entries_are_dropped() {
        let engine = GridEngine::default();
        let live = ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::Card);
        let live_id = live.index;
        let orphan_id = ComponentIndex::fresh();

        let layouts = vec![
            LayoutEntry::new(live_id, Rect::new(0, 0, 3, 2)),
            LayoutEntry::new(orphan_id, Rect::new(3, 0, 3, 2)),
        ];
        let outcome = reconcile(&engine, &layouts, &known_of(vec![live]));

        assert_eq!(outcome.dropped, vec![orphan_id]);
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].component_id, live_id);
    }

    #[test]
    fn missing_layout_is_synthesized_with_type_default() {
        let engine = GridEngine::default();
        let meta = ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::Chart);
        let id = meta.index;

        let outcome = reconcile(&engine, &[], &known_of(vec![meta]));

        assert_eq!(outcome.synthesized, vec![id]);
        let entry = &outcome.entries[0];
        let (w, h) = ComponentType::Chart.default_size();
        assert_eq!((entry.w, entry.h), (w, h));
    }

    #[test]
    fn synthesized_entries_do_not_collide() {
        let engine = GridEngine::default();
        let kept = ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::Table);
        let kept_id = kept.index;
        let missing_a = ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::Chart);
        let missing_b = ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::Card);

        let layouts = vec![LayoutEntry::new(kept_id, Rect::new(0, 0, 6, 4))];
        let outcome = reconcile(&engine, &layouts, &known_of(vec![kept, missing_a, missing_b]));

        assert_eq!(outcome.entries.len(), 3);
        for (i, a) in outcome.entries.iter().enumerate() {
            for b in &outcome.entries[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn duplicate_entries_keep_first_occurrence() {
        let engine = GridEngine::default();
        let meta = ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::Card);
        let id = meta.index;

        let layouts = vec![
            LayoutEntry::new(id, Rect::new(0, 0, 3, 2)),
            LayoutEntry::new(id, Rect::new(6, 0, 3, 2)),
        ];
        let outcome = reconcile(&engine, &layouts, &known_of(vec![meta]));

        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].rect(), Rect::new(0, 0, 3, 2));
        assert_eq!(outcome.dropped, vec![id]);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let engine = GridEngine::default();
        let metas = vec![
            ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::Chart),
            ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::Card),
            ComponentMetadata::new(ComponentIndex::fresh(), ComponentType::Table),
        ];
        let known = known_of(metas);

        let first = reconcile(&engine, &[], &known);
        assert!(!first.is_noop());

        let second = reconcile(&engine, &first.entries, &known);
        assert!(second.is_noop());
        assert_eq!(second.entries, first.entries);
    }
}
