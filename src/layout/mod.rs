//! Layout algorithms for family-tree visualization.
//!
//! Four algorithm variants share one positioning core: Standard (the
//! general case), Compact (units at 50%), Timeline (x from birth years
//! instead of subtree centering), and Hourglass (ancestors above the root,
//! descendants below). Each variant supplies only the parameter or axis
//! rule that differs; the collision and centering math lives in
//! [`subtree`].
//!
//! Output is positions and edge descriptors only - rendering to a visual
//! file format is a downstream concern.

mod engine;
mod subtree;
mod timeline;

pub use engine::LayoutEngine;

use serde::Serialize;

use crate::error::LayoutWarning;
use crate::generation::{EdgeKind, NodeRole, TreeDirection};
use crate::person::PersonId;

/// The closed set of layout variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutAlgorithm {
    /// Subtree centering with collision shifts; rows grow away from the
    /// root.
    Standard,
    /// Standard with horizontal and vertical units at 50%, for dense trees
    /// where pixel economy beats readability spacing.
    Compact,
    /// X from a linear birth-year scale; collision relaxed to a
    /// minimum-separation nudge.
    Timeline,
    /// Standard run per half: ancestors render above the root, descendants
    /// below, root at y = 0.
    Hourglass,
}

/// Spacing configuration in output units (pixels).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spacing {
    /// Width of one node box.
    pub node_width: f32,
    /// Height of one node box.
    pub node_height: f32,
    /// Required horizontal separation between sibling subtree extents.
    pub h_spacing: f32,
    /// Vertical distance between generation rows.
    pub v_spacing: f32,
    /// Gap between the members of a spouse pair.
    pub spouse_gap: f32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            node_width: 120.0,
            node_height: 48.0,
            h_spacing: 40.0,
            v_spacing: 120.0,
            spouse_gap: 16.0,
        }
    }
}

impl Spacing {
    /// Uniformly scaled copy (Compact uses 0.5).
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            node_width: self.node_width * factor,
            node_height: self.node_height * factor,
            h_spacing: self.h_spacing * factor,
            v_spacing: self.v_spacing * factor,
            spouse_gap: self.spouse_gap * factor,
        }
    }
}

/// Arrow style on produced edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowMode {
    /// Directed toward the child (the default for parent-child edges).
    TowardChild,
    /// Arrowheads on both ends.
    Both,
    /// Undirected.
    None,
}

/// Label verbosity for spouse edges, built from marriage metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpouseLabelStyle {
    /// Draw the edge with no label.
    None,
    /// Marriage date only.
    Date,
    /// Marriage date and place.
    DatePlace,
    /// Date, place, and divorce when recorded.
    Full,
}

/// One layout request. Transient; the result is regenerated wholesale on
/// every run.
#[derive(Debug, Clone)]
pub struct LayoutRequest {
    /// The person the tree is centered on.
    pub root: PersonId,
    pub direction: TreeDirection,
    /// Bound on |generation|; 0 means unlimited.
    pub generation_limit: u32,
    /// Include spouses of selected persons as paired nodes.
    pub include_spouses: bool,
    pub algorithm: LayoutAlgorithm,
    pub spacing: Spacing,
    /// Spouse edges are suppressed by default - adjacency implies the
    /// pairing. `Some` draws them with the given label verbosity.
    pub spouse_edges: Option<SpouseLabelStyle>,
    /// Arrow style for parent-child edges.
    pub arrows: ArrowMode,
    /// Hard cap on traversal size; substitute for a timeout.
    pub node_ceiling: Option<usize>,
}

impl LayoutRequest {
    pub fn new(
        root: impl Into<PersonId>,
        direction: TreeDirection,
        algorithm: LayoutAlgorithm,
    ) -> Self {
        Self {
            root: root.into(),
            direction,
            generation_limit: 0,
            include_spouses: false,
            algorithm,
            spacing: Spacing::default(),
            spouse_edges: None,
            arrows: ArrowMode::TowardChild,
            node_ceiling: None,
        }
    }
}

/// A positioned node. `x`/`y` are the node box center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub id: PersonId,
    pub x: f32,
    pub y: f32,
    pub generation: i32,
    pub role: NodeRole,
}

/// A routable edge descriptor between two positioned nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutEdge {
    pub from: PersonId,
    pub to: PersonId,
    pub kind: EdgeKind,
    pub arrow: ArrowMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Result of one layout run: positioned nodes, edge descriptors, and the
/// non-fatal conditions met along the way.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutResult {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<LayoutEdge>,
    pub warnings: Vec<LayoutWarning>,
}

impl LayoutResult {
    /// Bounding box of all node rectangles as (min_x, min_y, max_x, max_y),
    /// for viewport fitting. `None` for an empty layout.
    pub fn bounds(&self, spacing: &Spacing) -> Option<(f32, f32, f32, f32)> {
        if self.nodes.is_empty() {
            return None;
        }
        let (hw, hh) = (spacing.node_width / 2.0, spacing.node_height / 2.0);
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for node in &self.nodes {
            min_x = min_x.min(node.x - hw);
            max_x = max_x.max(node.x + hw);
            min_y = min_y.min(node.y - hh);
            max_y = max_y.max(node.y + hh);
        }
        Some((min_x, min_y, max_x, max_y))
    }
}
