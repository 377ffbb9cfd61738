//! Family graph structure and traversal.
//!
//! This module provides the adjacency snapshot over person records using
//! petgraph's StableGraph, with iterative traversal primitives that
//! tolerate cyclic and dangling input.

mod engine;
mod traverse;

pub use engine::{FamilyEdge, FamilyGraph, ParentRole};
pub use traverse::{FamilyGroup, Traversal, TraversalNode};

pub(crate) use traverse::WalkDirection;
