//! R-tree spatial index over positioned layout nodes.
//!
//! Built from a finished layout, the index answers the queries an
//! interactive consumer needs in O(log n): which node is under the
//! pointer, which nodes fall in a viewport rectangle, which node is
//! nearest to a point. It also drives the non-overlap verification of
//! layout output, since rectangle intersection is exactly what an R*-tree
//! is fast at.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::layout::{LayoutResult, Spacing};
use crate::person::PersonId;

/// One node rectangle in the index.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRect {
    /// The positioned person.
    pub id: PersonId,
    /// Box center x.
    pub x: f32,
    /// Box center y.
    pub y: f32,
    /// Half the box width.
    pub half_width: f32,
    /// Half the box height.
    pub half_height: f32,
}

impl NodeRect {
    pub fn new(id: PersonId, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            x,
            y,
            half_width: width / 2.0,
            half_height: height / 2.0,
        }
    }

    fn min_corner(&self) -> [f32; 2] {
        [self.x - self.half_width, self.y - self.half_height]
    }

    fn max_corner(&self) -> [f32; 2] {
        [self.x + self.half_width, self.y + self.half_height]
    }
}

impl RTreeObject for NodeRect {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min_corner(), self.max_corner())
    }
}

impl PointDistance for NodeRect {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = (point[0] - self.x).abs() - self.half_width;
        let dy = (point[1] - self.y).abs() - self.half_height;
        let dx = dx.max(0.0);
        let dy = dy.max(0.0);
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        (point[0] - self.x).abs() <= self.half_width
            && (point[1] - self.y).abs() <= self.half_height
    }
}

/// Spatial index over a layout result.
pub struct SpatialIndex {
    tree: RTree<NodeRect>,
}

impl SpatialIndex {
    /// Bulk-load the index from a finished layout.
    pub fn from_layout(result: &LayoutResult, spacing: &Spacing) -> Self {
        let rects: Vec<NodeRect> = result
            .nodes
            .iter()
            .map(|node| {
                NodeRect::new(
                    node.id.clone(),
                    node.x,
                    node.y,
                    spacing.node_width,
                    spacing.node_height,
                )
            })
            .collect();
        Self {
            tree: RTree::bulk_load(rects),
        }
    }

    /// The node whose box contains the point, if any.
    pub fn node_at(&self, x: f32, y: f32) -> Option<&PersonId> {
        self.tree.locate_at_point(&[x, y]).map(|rect| &rect.id)
    }

    /// The node box nearest to a point.
    pub fn nearest(&self, x: f32, y: f32) -> Option<&PersonId> {
        self.tree.nearest_neighbor(&[x, y]).map(|rect| &rect.id)
    }

    /// All nodes intersecting a rectangle (a viewport query).
    pub fn in_rect(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vec<PersonId> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|rect| rect.id.clone())
            .collect()
    }

    /// Every pair of node boxes whose interiors overlap.
    ///
    /// A correct layout returns an empty list for every algorithm; touching
    /// edges do not count as overlap.
    pub fn overlapping_pairs(&self) -> Vec<(PersonId, PersonId)> {
        const EPSILON: f32 = 1e-3;
        let mut pairs = Vec::new();
        for rect in self.tree.iter() {
            // Shrink the probe so shared borders are not reported.
            let probe = AABB::from_corners(
                [
                    rect.x - rect.half_width + EPSILON,
                    rect.y - rect.half_height + EPSILON,
                ],
                [
                    rect.x + rect.half_width - EPSILON,
                    rect.y + rect.half_height - EPSILON,
                ],
            );
            for other in self.tree.locate_in_envelope_intersecting(&probe) {
                if other.id < rect.id {
                    pairs.push((other.id.clone(), rect.id.clone()));
                }
            }
        }
        pairs.sort();
        pairs.dedup();
        pairs
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::NodeRole;
    use crate::layout::PositionedNode;

    fn layout_of(points: &[(&str, f32, f32)]) -> LayoutResult {
        LayoutResult {
            nodes: points
                .iter()
                .map(|(id, x, y)| PositionedNode {
                    id: (*id).into(),
                    x: *x,
                    y: *y,
                    generation: 0,
                    role: NodeRole::Primary,
                })
                .collect(),
            edges: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn spacing() -> Spacing {
        Spacing {
            node_width: 100.0,
            node_height: 40.0,
            h_spacing: 20.0,
            v_spacing: 100.0,
            spouse_gap: 10.0,
        }
    }

    #[test]
    fn test_node_at_hits_the_box() {
        let layout = layout_of(&[("a", 0.0, 0.0), ("b", 200.0, 0.0)]);
        let index = SpatialIndex::from_layout(&layout, &spacing());

        assert_eq!(index.node_at(10.0, 5.0), Some(&"a".into()));
        assert_eq!(index.node_at(210.0, -5.0), Some(&"b".into()));
        assert_eq!(index.node_at(100.0, 0.0), None, "gap between boxes");
    }

    #[test]
    fn test_nearest_prefers_closest_box() {
        let layout = layout_of(&[("a", 0.0, 0.0), ("b", 300.0, 0.0)]);
        let index = SpatialIndex::from_layout(&layout, &spacing());
        assert_eq!(index.nearest(100.0, 0.0), Some(&"a".into()));
        assert_eq!(index.nearest(220.0, 0.0), Some(&"b".into()));
    }

    #[test]
    fn test_in_rect_viewport_query() {
        let layout = layout_of(&[("a", 0.0, 0.0), ("b", 200.0, 0.0), ("c", 500.0, 500.0)]);
        let index = SpatialIndex::from_layout(&layout, &spacing());

        let mut hits = index.in_rect(-100.0, -100.0, 260.0, 100.0);
        hits.sort();
        assert_eq!(hits, vec![PersonId::from("a"), PersonId::from("b")]);
    }

    #[test]
    fn test_overlapping_pairs_detects_collision() {
        // Boxes are 100 wide: centers 60 apart overlap, 120 apart do not.
        let clean = layout_of(&[("a", 0.0, 0.0), ("b", 120.0, 0.0)]);
        let index = SpatialIndex::from_layout(&clean, &spacing());
        assert!(index.overlapping_pairs().is_empty());

        let colliding = layout_of(&[("a", 0.0, 0.0), ("b", 60.0, 0.0)]);
        let index = SpatialIndex::from_layout(&colliding, &spacing());
        assert_eq!(index.overlapping_pairs(), vec![("a".into(), "b".into())]);
    }

    #[test]
    fn test_touching_edges_are_not_overlap() {
        let touching = layout_of(&[("a", 0.0, 0.0), ("b", 100.0, 0.0)]);
        let index = SpatialIndex::from_layout(&touching, &spacing());
        assert!(index.overlapping_pairs().is_empty(), "shared border is not a collision");
    }

    #[test]
    fn test_empty_layout() {
        let layout = layout_of(&[]);
        let index = SpatialIndex::from_layout(&layout, &spacing());
        assert!(index.is_empty());
        assert_eq!(index.node_at(0.0, 0.0), None);
    }
}
