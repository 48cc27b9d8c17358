//! Dashboard-scoped interactive filter store
//!
//! One predicate slot per producer. A producer is `Idle` (no slot) or
//! `Active` (one predicate); setting a slot replaces it wholesale and
//! clearing returns it to `Idle`. The store is owned by the dashboard
//! session and passed by reference into the propagation engine — there is no
//! ambient global.

use gridboard_core::{CombinedFilterSet, ComponentIndex, FilterPredicate};
use indexmap::IndexMap;

/// Map from producer identity to its current filter predicate
#[derive(Debug, Default, Clone)]
pub struct FilterStore {
    slots: IndexMap<ComponentIndex, FilterPredicate>,
}

impl FilterStore {
    /// Create new empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a producer's predicate slot wholesale (last write wins)
    ///
    /// Returns the predicate that was replaced, if any.
    pub fn set(&mut self, predicate: FilterPredicate) -> Option<FilterPredicate> {
        self.slots.insert(predicate.producer, predicate)
    }

    /// Clear one producer's slot back to idle
    pub fn clear(&mut self, producer: ComponentIndex) -> Option<FilterPredicate> {
        self.slots.shift_remove(&producer)
    }

    /// Clear every slot; returns how many were active
    pub fn clear_all(&mut self) -> usize {
        let cleared = self.slots.len();
        self.slots.clear();
        cleared
    }

    /// Current predicate of a producer
    #[inline]
    #[must_use]
    pub fn get(&self, producer: ComponentIndex) -> Option<&FilterPredicate> {
        self.slots.get(&producer)
    }

    /// Number of active predicates
    #[inline]
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.len()
    }

    /// Check if no producer is active
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Snapshot the conjunction of all active predicates
    ///
    /// Built in one step from the current slots, so every consumer notified
    /// in a pass sees the same, fully updated set.
    #[must_use]
    pub fn combined(&self) -> CombinedFilterSet {
        CombinedFilterSet::from_predicates(self.slots.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridboard_core::{ColumnName, DataSourceRef};
    use serde_json::json;

    fn predicate(producer: ComponentIndex, value: &str) -> FilterPredicate {
        FilterPredicate::equals(
            producer,
            DataSourceRef::new("experiments"),
            ColumnName::new("group"),
            json!(value),
        )
    }

    #[test]
    fn set_replaces_slot_wholesale() {
        let mut store = FilterStore::new();
        let producer = ComponentIndex::fresh();

        assert!(store.set(predicate(producer, "X")).is_none());
        let replaced = store.set(predicate(producer, "Y"));

        assert_eq!(replaced.unwrap().values, vec![json!("X")]);
        assert_eq!(store.active_count(), 1);
        assert_eq!(store.get(producer).unwrap().values, vec![json!("Y")]);
    }

    #[test]
    fn clear_returns_slot_to_idle() {
        let mut store = FilterStore::new();
        let producer = ComponentIndex::fresh();

        store.set(predicate(producer, "X"));
        let cleared = store.clear(producer);

        assert!(cleared.is_some());
        assert!(store.get(producer).is_none());
        assert!(store.is_empty());

        // Clearing an idle producer is a no-op.
        assert!(store.clear(producer).is_none());
    }

    #[test]
    fn combined_is_conjunction_of_all_slots() {
        let mut store = FilterStore::new();
        let a = ComponentIndex::fresh();
        let b = ComponentIndex::fresh();

        store.set(predicate(a, "X"));
        store.set(predicate(b, "Y"));

        let combined = store.combined();
        assert_eq!(combined.len(), 2);
    }

    #[test]
    fn clear_all_empties_the_store() {
        let mut store = FilterStore::new();
        store.set(predicate(ComponentIndex::fresh(), "X"));
        store.set(predicate(ComponentIndex::fresh(), "Y"));

        assert_eq!(store.clear_all(), 2);
        assert!(store.is_empty());
        assert!(store.combined().is_empty());
        assert_eq!(store.clear_all(), 0);
    }
}
