//! Spatial indexing over layout output.
//!
//! An R-tree of positioned node rectangles for O(log n) hit testing,
//! viewport queries, and overlap verification.

mod rtree;

pub use rtree::{NodeRect, SpatialIndex};
