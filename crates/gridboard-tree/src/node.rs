//! Typed render tree
//!
//! A component's render tree is a tagged union rather than free-form JSON so
//! that cloning and identifier remapping are structurally exhaustive: every
//! embedded identity lives in a [`ComponentRef`] or a [`RenderNode::WithId`]
//! wrapper, never inside a string.

use gridboard_core::ComponentIndex;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Typed reference to a component embedded in a render tree
///
/// Controls (reset buttons, drill-down links, cross-widget selectors) carry
/// these to name the component they act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentRef(pub ComponentIndex);

impl ComponentRef {
    /// Create new reference
    #[inline]
    #[must_use]
    pub fn new(index: ComponentIndex) -> Self {
        Self(index)
    }

    /// Referenced component
    #[inline]
    #[must_use]
    pub fn index(&self) -> ComponentIndex {
        self.0
    }
}

/// One node of a component's render tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderNode {
    /// Terminal value (label, number, color, ...)
    Leaf(serde_json::Value),
    /// Ordered children
    List(Vec<RenderNode>),
    /// Named children
    Map(IndexMap<String, RenderNode>),
    /// Reference to a component
    Ref(ComponentRef),
    /// Subtree owned by a specific component identity
    WithId {
        /// Owning component
        id: ComponentIndex,
        /// Wrapped subtree
        child: Box<RenderNode>,
    },
}

impl RenderNode {
    /// Terminal value node
    #[inline]
    #[must_use]
    pub fn leaf(value: impl Into<serde_json::Value>) -> Self {
        Self::Leaf(value.into())
    }

    /// List node
    #[inline]
    #[must_use]
    pub fn list(children: Vec<RenderNode>) -> Self {
        Self::List(children)
    }

    /// Map node
    #[must_use]
    pub fn map(entries: impl IntoIterator<Item = (String, RenderNode)>) -> Self {
        Self::Map(entries.into_iter().collect())
    }

    /// Reference node
    #[inline]
    #[must_use]
    pub fn reference(index: ComponentIndex) -> Self {
        Self::Ref(ComponentRef::new(index))
    }

    /// Identity-wrapped subtree
    #[inline]
    #[must_use]
    pub fn with_id(id: ComponentIndex, child: RenderNode) -> Self {
        Self::WithId {
            id,
            child: Box::new(child),
        }
    }

    /// Count embedded references to `index`, at any depth
    ///
    /// Counts both [`RenderNode::Ref`] values and [`RenderNode::WithId`]
    /// wrappers.
    #[must_use]
    pub fn reference_count(&self, index: ComponentIndex) -> usize {
        match self {
            RenderNode::Leaf(_) => 0,
            RenderNode::List(children) => {
                children.iter().map(|c| c.reference_count(index)).sum()
            }
            RenderNode::Map(entries) => {
                entries.values().map(|c| c.reference_count(index)).sum()
            }
            RenderNode::Ref(r) => usize::from(r.index() == index),
            RenderNode::WithId { id, child } => {
                usize::from(*id == index) + child.reference_count(index)
            }
        }
    }

    /// Total node count, for sizing log lines
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            RenderNode::Leaf(_) | RenderNode::Ref(_) => 1,
            RenderNode::List(children) => 1 + children.iter().map(RenderNode::size).sum::<usize>(),
            RenderNode::Map(entries) => 1 + entries.values().map(RenderNode::size).sum::<usize>(),
            RenderNode::WithId { child, .. } => 1 + child.size(),
        }
    }
}
