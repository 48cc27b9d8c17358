//! Targeted filter propagation
//!
//! One user interaction causes at most one store mutation and one
//! propagation pass. A pass recomputes the combined predicate set atomically
//! and names exactly the consumers whose declared dependencies intersect the
//! changed predicate — unrelated consumers and the triggering producer are
//! never notified. The actual data fetch is the caller's concern and must
//! not block the pass.

use crate::store::FilterStore;
use gridboard_core::{
    ColumnName, CombinedFilterSet, ComponentIndex, ComponentMetadata, DataSourceRef,
    FilterPredicate,
};
use indexmap::IndexMap;

/// Instruction to re-render one consumer with a given filter set
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOrder {
    /// Consumer to re-render
    pub consumer: ComponentIndex,
    /// The atomically recomputed set the consumer must query with
    pub filters: CombinedFilterSet,
}

/// Result of one propagation pass
#[derive(Debug, Clone, Default)]
pub struct PropagationPass {
    /// Producer whose slot changed, if the pass had a single trigger
    pub producer: Option<ComponentIndex>,
    /// Consumers to re-render, each with the fresh combined set
    pub orders: Vec<RefreshOrder>,
    /// The combined set after the store mutation
    pub combined: CombinedFilterSet,
}

impl PropagationPass {
    /// Check whether any consumer needs a re-render
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// The propagation engine
///
/// Stateless; all dashboard state (filter store, metadata) is passed by
/// reference per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropagationEngine;

impl PropagationEngine {
    /// Create new engine
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// A producer contributed or replaced its predicate
    pub fn producer_changed(
        &self,
        store: &mut FilterStore,
        metadata: &IndexMap<ComponentIndex, ComponentMetadata>,
        predicate: FilterPredicate,
    ) -> PropagationPass {
        let producer = predicate.producer;
        let source = predicate.source.clone();
        let column = predicate.column.clone();

        store.set(predicate);
        let combined = store.combined();
        let orders = dependents(metadata, &source, &column, producer, &combined);

        tracing::debug!(
            producer = %producer,
            source = %source,
            column = %column,
            consumers = orders.len(),
            "filter predicate set"
        );

        PropagationPass {
            producer: Some(producer),
            orders,
            combined,
        }
    }

    /// A producer returned to idle (cleared its predicate)
    ///
    /// Consumers that depended on the removed predicate are re-rendered with
    /// the remaining constraints. An already idle producer changes nothing.
    pub fn producer_cleared(
        &self,
        store: &mut FilterStore,
        metadata: &IndexMap<ComponentIndex, ComponentMetadata>,
        producer: ComponentIndex,
    ) -> PropagationPass {
        let Some(removed) = store.clear(producer) else {
            return PropagationPass {
                producer: Some(producer),
                orders: Vec::new(),
                combined: store.combined(),
            };
        };

        let combined = store.combined();
        let orders = dependents(metadata, &removed.source, &removed.column, producer, &combined);

        tracing::debug!(
            producer = %producer,
            consumers = orders.len(),
            "filter predicate cleared"
        );

        PropagationPass {
            producer: Some(producer),
            orders,
            combined,
        }
    }

    /// Every producer cleared at once
    ///
    /// Empties the store and orders exactly one unfiltered refresh for every
    /// consumer. When nothing was active the pass is empty.
    pub fn all_cleared(
        &self,
        store: &mut FilterStore,
        metadata: &IndexMap<ComponentIndex, ComponentMetadata>,
    ) -> PropagationPass {
        if store.clear_all() == 0 {
            return PropagationPass::default();
        }

        let combined = store.combined();
        let orders: Vec<RefreshOrder> = metadata
            .values()
            .filter(|m| m.is_consumer())
            .map(|m| RefreshOrder {
                consumer: m.index,
                filters: combined.clone(),
            })
            .collect();

        tracing::debug!(consumers = orders.len(), "all filters cleared");

        PropagationPass {
            producer: None,
            orders,
            combined,
        }
    }
}

/// Consumers whose declared dependencies intersect `(source, column)`
///
/// The triggering producer is excluded even when it declares a matching
/// dependency on its own source.
fn dependents(
    metadata: &IndexMap<ComponentIndex, ComponentMetadata>,
    source: &DataSourceRef,
    column: &ColumnName,
    producer: ComponentIndex,
    combined: &CombinedFilterSet,
) -> Vec<RefreshOrder> {
    metadata
        .values()
        .filter(|m| m.index != producer)
        .filter(|m| m.filter_dependencies.iter().any(|d| d.matches(source, column)))
        .map(|m| RefreshOrder {
            consumer: m.index,
            filters: combined.clone(),
        })
        .collect()
}
