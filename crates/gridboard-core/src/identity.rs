//! Component and dashboard identity
//!
//! Provides [`ComponentIndex`], the globally unique identifier every grid
//! component carries for its whole lifetime, and [`DashboardId`] for the
//! dashboards that own them.

use serde::{Deserialize, Serialize};
use ulid::Ulid;
use uuid::Uuid;

/// Unique component identifier
///
/// Opaque, randomly generated (v4 UUID, 128 random bits). Stable for the
/// component's lifetime, never reused, and never derived from another index.
/// Collisions are treated as practically impossible and are not guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentIndex(pub Uuid);

impl ComponentIndex {
    /// Generate a fresh index
    #[inline]
    #[must_use]
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }

    /// Generate the index for a duplicate of `original`
    ///
    /// Behaves identically to [`ComponentIndex::fresh`]: the duplicate gets a
    /// fully independent identity with no structural link back to the source,
    /// so it can be edited, removed or duplicated again without affecting the
    /// original.
    #[inline]
    #[must_use]
    pub fn for_duplicate(original: Self) -> Self {
        let _ = original;
        Self::fresh()
    }

    /// Short form for log lines (first 8 hex chars)
    #[must_use]
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for ComponentIndex {
    fn default() -> Self {
        Self::fresh()
    }
}

impl std::fmt::Display for ComponentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique dashboard identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DashboardId(pub Ulid);

impl DashboardId {
    /// Generate new dashboard ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for DashboardId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DashboardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
