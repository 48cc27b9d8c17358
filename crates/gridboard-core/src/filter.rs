//! Filter predicates and the combined filter set
//!
//! A producer component contributes at most one [`FilterPredicate`] at a
//! time; the [`CombinedFilterSet`] is the conjunction of every active
//! predicate and is rebuilt atomically per propagation pass.

use crate::identity::ComponentIndex;
use crate::model::DataSourceRef;
use serde::{Deserialize, Serialize};

/// Column of a tabular data source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnName(pub String);

impl ColumnName {
    /// Create new column name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Column name as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ColumnName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Comparison operator of a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Column equals a single value
    Eq,
    /// Column is one of a set of values
    In,
}

impl FilterOperator {
    /// Stable name for serialized queries and log lines
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::In => "in",
        }
    }
}

/// One filter condition contributed by one producer component
///
/// At most one predicate per producer is live at a time; a producer with no
/// predicate contributes no constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    /// Producer that contributed this predicate
    pub producer: ComponentIndex,
    /// Data source the predicate constrains
    pub source: DataSourceRef,
    /// Constrained column
    pub column: ColumnName,
    /// Comparison operator
    pub operator: FilterOperator,
    /// Operand values; exactly one for `Eq`, one or more for `In`
    pub values: Vec<serde_json::Value>,
}

impl FilterPredicate {
    /// Single-value equality predicate
    #[inline]
    #[must_use]
    pub fn equals(
        producer: ComponentIndex,
        source: DataSourceRef,
        column: ColumnName,
        value: serde_json::Value,
    ) -> Self {
        Self {
            producer,
            source,
            column,
            operator: FilterOperator::Eq,
            values: vec![value],
        }
    }

    /// Set-membership predicate
    #[inline]
    #[must_use]
    pub fn one_of(
        producer: ComponentIndex,
        source: DataSourceRef,
        column: ColumnName,
        values: Vec<serde_json::Value>,
    ) -> Self {
        Self {
            producer,
            source,
            column,
            operator: FilterOperator::In,
            values,
        }
    }
}

/// Conjunction (AND) of all currently active predicates
///
/// Rebuilt wholesale by each propagation pass so consumers never observe a
/// partially updated set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedFilterSet {
    predicates: Vec<FilterPredicate>,
}

impl CombinedFilterSet {
    /// Empty set (no constraint)
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from a snapshot of active predicates
    #[inline]
    #[must_use]
    pub fn from_predicates(predicates: Vec<FilterPredicate>) -> Self {
        Self { predicates }
    }

    /// Number of active predicates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Check if no constraint is active
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Iterate over the predicates
    pub fn iter(&self) -> impl Iterator<Item = &FilterPredicate> {
        self.predicates.iter()
    }

    /// Predicates constraining a given source
    pub fn for_source<'a>(
        &'a self,
        source: &'a DataSourceRef,
    ) -> impl Iterator<Item = &'a FilterPredicate> {
        self.predicates.iter().filter(move |p| p.source == *source)
    }
}
