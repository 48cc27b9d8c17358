//! Gridboard Tree
//!
//! Typed render trees and the component cloner.
//!
//! # Core Concepts
//!
//! - [`RenderNode`]: tagged-union render tree
//!   (`Leaf | List | Map | Ref | WithId`) making identifier remap
//!   structurally exhaustive
//! - [`ComponentRef`]: typed reference value object embedded in trees
//! - [`clone_tree`]: structurally independent deep copy that rewrites every
//!   reference from the old identity to the new one
//! - [`clone_metadata`]: metadata copy under a new index with deep-copied
//!   parameters

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod clone;
mod node;

pub use clone::{clone_metadata, clone_tree};
pub use node::{ComponentRef, RenderNode};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
