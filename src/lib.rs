//! Lineage Graph - family graph and tree layout engine.
//!
//! Stores genealogical (or fictional-lineage) relationship data as person
//! records with typed links, keeps reciprocal links consistent as the data
//! mutates, and turns a selected subgraph into positioned nodes and edges
//! for visual output.
//!
//! # Architecture
//!
//! - `person`: record model, dates with precision tags, in-memory store
//! - `graph`: adjacency snapshot over petgraph with safe traversal of
//!   possibly cyclic input
//! - `sync`: the consistency maintainer - reciprocal edits, conflict
//!   surfacing, batch repair
//! - `generation`: generation numbering relative to a chosen root
//! - `layout`: the four positioning algorithms sharing one collision core
//! - `spatial`: R-tree hit testing over finished layouts
//!
//! # Example
//!
//! ```
//! use lineage_graph::{
//!     compute_layout, LayoutAlgorithm, LayoutRequest, Person, PersonStore, TreeDirection,
//! };
//!
//! let mut parent = Person::new("p", "Parent");
//! parent.children = vec!["c".into()];
//! let mut child = Person::new("c", "Child");
//! child.father = Some("p".into());
//! let store: PersonStore = [parent, child].into_iter().collect();
//!
//! let request = LayoutRequest::new("p", TreeDirection::Descendants, LayoutAlgorithm::Standard);
//! let layout = compute_layout(&store, &request).unwrap();
//! assert_eq!(layout.nodes.len(), 2);
//! ```

pub mod error;
pub mod generation;
pub mod graph;
pub mod layout;
pub mod person;
pub mod spatial;
pub mod sync;

pub use error::{LayoutWarning, RelationshipConflict, SyncError, TreeError};
pub use generation::{
    EdgeKind, GenerationResolver, NodeRole, ResolvedSubgraph, TreeDirection, TreeSelection,
};
pub use graph::{FamilyGraph, FamilyGroup, ParentRole};
pub use layout::{
    ArrowMode, LayoutAlgorithm, LayoutEngine, LayoutEdge, LayoutRequest, LayoutResult,
    PositionedNode, Spacing, SpouseLabelStyle,
};
pub use person::{DateInfo, DatePrecision, Person, PersonId, PersonStore, Sex, SpouseLink, SpouseStatus};
pub use spatial::SpatialIndex;
pub use sync::{
    AppliedChange, ConsistencyMaintainer, MutationOp, RelationKind, RelationshipMutation,
    RepairReport,
};

/// Run one layout request against a store snapshot.
///
/// Convenience over [`LayoutEngine::layout`]; the engine itself is
/// stateless, so constructing one per call costs nothing.
pub fn compute_layout(
    store: &PersonStore,
    request: &LayoutRequest,
) -> Result<LayoutResult, TreeError> {
    LayoutEngine::new().layout(store, request)
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Four-generation family with marriages and uneven branching:
    ///
    /// ggf/ggm -> gf -> f -> (a, b, c); a married to asp with children
    /// (a1, a2, a3); c married to csp with child c1. b childless.
    fn family() -> PersonStore {
        let mut people: Vec<Person> = Vec::new();

        let mut ggf = Person::new("ggf", "Great Grandfather");
        ggf.sex = Some(Sex::Male);
        ggf.birth = Some(DateInfo::year(1860));
        let mut ggm = Person::new("ggm", "Great Grandmother");
        ggm.sex = Some(Sex::Female);
        ggm.birth = Some(DateInfo::year(1865));
        let mut gf = Person::new("gf", "Grandfather");
        gf.sex = Some(Sex::Male);
        gf.birth = Some(DateInfo::year(1890));
        let mut f = Person::new("f", "Father");
        f.sex = Some(Sex::Male);
        f.birth = Some(DateInfo::year(1920));

        ggf.children = vec!["gf".into()];
        ggm.children = vec!["gf".into()];
        ggf.spouses.push(SpouseLink::new("ggm"));
        ggm.spouses.push(SpouseLink::new("ggf"));
        gf.father = Some("ggf".into());
        gf.mother = Some("ggm".into());
        gf.children = vec!["f".into()];
        f.father = Some("gf".into());

        let mut a = Person::new("a", "A");
        a.birth = Some(DateInfo::year(1950));
        let mut b = Person::new("b", "B");
        b.birth = Some(DateInfo::year(1952));
        let mut c = Person::new("c", "C");
        c.birth = Some(DateInfo::year(1955));
        f.children = vec!["a".into(), "b".into(), "c".into()];
        for child in [&mut a, &mut b, &mut c] {
            child.father = Some("f".into());
        }

        let mut asp = Person::new("asp", "A Spouse");
        a.spouses.push(SpouseLink {
            spouse: "asp".into(),
            marriage: Some(DateInfo::year(1975)),
            divorce: None,
            location: Some("Riverton".to_string()),
            status: SpouseStatus::Current,
        });
        asp.spouses.push(SpouseLink::new("a"));
        a.children = vec!["a1".into(), "a2".into(), "a3".into()];
        asp.children = a.children.clone();
        for (id, year) in [("a1", 1976), ("a2", 1979), ("a3", 1985)] {
            let mut child = Person::new(id, id.to_uppercase());
            child.father = Some("a".into());
            child.mother = Some("asp".into());
            child.birth = Some(DateInfo::year(year));
            people.push(child);
        }

        let mut csp = Person::new("csp", "C Spouse");
        c.spouses.push(SpouseLink::new("csp"));
        csp.spouses.push(SpouseLink::new("c"));
        c.children = vec!["c1".into()];
        csp.children = c.children.clone();
        let mut c1 = Person::new("c1", "C1");
        c1.father = Some("c".into());
        c1.mother = Some("csp".into());
        c1.birth = Some(DateInfo::year(1980));

        people.extend([ggf, ggm, gf, f, a, b, c, asp, csp, c1]);
        people.into_iter().collect()
    }

    fn request(algorithm: LayoutAlgorithm, direction: TreeDirection) -> LayoutRequest {
        let mut request = LayoutRequest::new("f", direction, algorithm);
        request.include_spouses = true;
        request
    }

    /// Effective node spacing of a request (Compact halves it internally).
    fn effective_spacing(request: &LayoutRequest) -> Spacing {
        match request.algorithm {
            LayoutAlgorithm::Compact => request.spacing.scaled(0.5),
            _ => request.spacing.clone(),
        }
    }

    #[test]
    fn test_no_overlap_for_all_algorithms_and_directions() {
        let store = family();
        let algorithms = [
            LayoutAlgorithm::Standard,
            LayoutAlgorithm::Compact,
            LayoutAlgorithm::Timeline,
            LayoutAlgorithm::Hourglass,
        ];
        let directions = [
            TreeDirection::Descendants,
            TreeDirection::Ancestors,
            TreeDirection::Full,
        ];
        for algorithm in algorithms {
            for direction in directions {
                let request = request(algorithm, direction);
                let result = compute_layout(&store, &request).expect("layout");
                let index = SpatialIndex::from_layout(&result, &effective_spacing(&request));
                let overlaps = index.overlapping_pairs();
                assert!(
                    overlaps.is_empty(),
                    "{algorithm:?}/{direction:?} produced overlapping nodes: {overlaps:?}"
                );
            }
        }
    }

    #[test]
    fn test_generations_unique_and_consistent_in_full_tree() {
        let store = family();
        let graph = FamilyGraph::from_store(&store);
        let selection = TreeSelection::new("f", TreeDirection::Full);
        let resolved = GenerationResolver::new().resolve(&graph, &selection).expect("resolve");

        // Every node has exactly one generation, equal to its shortest
        // path from the root.
        assert_eq!(resolved.generation_of(&"f".into()), Some(0));
        assert_eq!(resolved.generation_of(&"gf".into()), Some(-1));
        assert_eq!(resolved.generation_of(&"ggf".into()), Some(-2));
        assert_eq!(resolved.generation_of(&"a".into()), Some(1));
        assert_eq!(resolved.generation_of(&"a2".into()), Some(2));
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn test_ancestor_scenario_limit_one() {
        // Root with father and mother, limit 1: exactly three nodes at
        // generations {0, -1, -1} and two parent-child edges.
        let mut root = Person::new("r", "Root");
        root.father = Some("fa".into());
        root.mother = Some("mo".into());
        let mut fa = Person::new("fa", "Father");
        fa.children = vec!["r".into()];
        let mut mo = Person::new("mo", "Mother");
        mo.children = vec!["r".into()];
        let store: PersonStore = [root, fa, mo].into_iter().collect();

        let mut request = LayoutRequest::new("r", TreeDirection::Ancestors, LayoutAlgorithm::Standard);
        request.generation_limit = 1;
        let result = compute_layout(&store, &request).expect("layout");

        assert_eq!(result.nodes.len(), 3);
        let generation_of = |id: &str| {
            result
                .nodes
                .iter()
                .find(|n| n.id == id.into())
                .map(|n| n.generation)
        };
        assert_eq!(generation_of("r"), Some(0));
        assert_eq!(generation_of("fa"), Some(-1));
        assert_eq!(generation_of("mo"), Some(-1));

        let mut parent_edges: Vec<(String, String)> = result
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::ParentChild)
            .map(|e| (e.from.as_str().to_string(), e.to.as_str().to_string()))
            .collect();
        parent_edges.sort();
        assert_eq!(
            parent_edges,
            vec![
                ("fa".to_string(), "r".to_string()),
                ("mo".to_string(), "r".to_string())
            ]
        );
    }

    #[test]
    fn test_spouse_pairs_adjacent_in_every_algorithm() {
        let store = family();
        for algorithm in [
            LayoutAlgorithm::Standard,
            LayoutAlgorithm::Compact,
            LayoutAlgorithm::Timeline,
            LayoutAlgorithm::Hourglass,
        ] {
            let request = request(algorithm, TreeDirection::Descendants);
            let spacing = effective_spacing(&request);
            let result = compute_layout(&store, &request).expect("layout");

            let a = result.nodes.iter().find(|n| n.id == "a".into()).expect("a");
            let asp = result.nodes.iter().find(|n| n.id == "asp".into()).expect("asp");
            assert_eq!(asp.generation, a.generation, "{algorithm:?}: same generation");
            assert_eq!(asp.y, a.y, "{algorithm:?}: same row");
            let dx = asp.x - a.x;
            let expected = spacing.node_width + spacing.spouse_gap;
            assert!(
                (dx - expected).abs() < 0.01,
                "{algorithm:?}: spouse offset {dx}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_mutation_pipeline_feeds_next_layout() {
        // Write through the maintainer, then lay out again: the reciprocal
        // edit must be visible without any manual bookkeeping.
        let mut store: PersonStore = [
            Person::new("p", "Parent"),
            Person::new("k", "Kid"),
        ]
        .into_iter()
        .collect();

        let maintainer = ConsistencyMaintainer::new();
        maintainer
            .apply(&mut store, &RelationshipMutation::add("k", RelationKind::Father, "p"))
            .expect("mutation");

        let request = LayoutRequest::new("p", TreeDirection::Descendants, LayoutAlgorithm::Standard);
        let result = compute_layout(&store, &request).expect("layout");
        assert_eq!(result.nodes.len(), 2);
        assert!(result
            .edges
            .iter()
            .any(|e| e.from == "p".into() && e.to == "k".into()));
    }

    #[test]
    fn test_repair_then_layout_has_no_dangling_warnings() {
        // One-sided data straight from an importer: repair heals it, the
        // following layout is warning-free.
        let mut child = Person::new("child", "Child");
        child.father = Some("dad".into());
        let dad = Person::new("dad", "Dad");
        let mut store: PersonStore = [child, dad].into_iter().collect();

        let maintainer = ConsistencyMaintainer::new();
        let report = maintainer.repair(&mut store);
        assert_eq!(report.changes.len(), 1);
        assert!(maintainer.repair(&mut store).is_clean(), "repair is idempotent");

        let request = LayoutRequest::new("dad", TreeDirection::Descendants, LayoutAlgorithm::Standard);
        let result = compute_layout(&store, &request).expect("layout");
        assert!(result.warnings.is_empty());
        assert_eq!(result.nodes.len(), 2);
    }

    #[test]
    fn test_hourglass_keeps_ancestors_and_descendants_apart() {
        let store = family();
        let request = request(LayoutAlgorithm::Hourglass, TreeDirection::Full);
        let result = compute_layout(&store, &request).expect("layout");

        for node in &result.nodes {
            if node.generation < 0 {
                assert!(node.y < 0.0, "{}: ancestors render above the root", node.id);
            } else if node.generation > 0 {
                assert!(node.y > 0.0, "{}: descendants render below the root", node.id);
            } else {
                assert_eq!(node.y, 0.0, "{}: root row is y = 0", node.id);
            }
        }
    }

    #[test]
    fn test_layout_result_serializes_for_render_export() {
        let store = family();
        let mut req = request(LayoutAlgorithm::Standard, TreeDirection::Descendants);
        req.spouse_edges = Some(SpouseLabelStyle::Date);
        let result = compute_layout(&store, &req).expect("layout");

        let json = serde_json::to_value(&result).expect("serialize");
        assert!(json["nodes"].is_array());
        assert!(json["edges"].is_array());
        assert!(json["warnings"].is_array());
        let first = &json["nodes"][0];
        assert!(first["id"].is_string());
        assert!(first["x"].is_number());
        assert!(first["generation"].is_number());

        let spouse_edge = json["edges"]
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["kind"] == "spouse" && e["label"].is_string())
            .expect("labelled spouse edge");
        assert_eq!(spouse_edge["label"], "m. 1975");
    }

    #[test]
    fn test_hit_testing_a_finished_layout() {
        let store = family();
        let req = request(LayoutAlgorithm::Standard, TreeDirection::Descendants);
        let result = compute_layout(&store, &req).expect("layout");
        let index = SpatialIndex::from_layout(&result, &req.spacing);

        let f = result.nodes.iter().find(|n| n.id == "f".into()).expect("f");
        assert_eq!(index.node_at(f.x, f.y), Some(&"f".into()));
        assert_eq!(index.nearest(f.x + 1.0, f.y + 1.0), Some(&"f".into()));
    }
}
