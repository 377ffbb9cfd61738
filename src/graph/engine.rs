//! FamilyGraph - adjacency view over a record store.
//!
//! The graph snapshots the relationship fields of every record into a
//! petgraph StableGraph, with maps between stable person identifiers and
//! internal indices. Layout requests traverse the snapshot; concurrent
//! mutations go through the consistency maintainer against the store and
//! are picked up by the next snapshot.
//!
//! Construction is where malformed input is absorbed: duplicate assertions
//! of the same edge collapse to one, and references to absent records are
//! skipped and reported as dangling-reference warnings instead of failing
//! the build.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LayoutWarning;
use crate::person::{PersonId, PersonStore, Sex};

/// Which parent slot a parent-child edge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentRole {
    Father,
    Mother,
}

/// Typed edge in the family graph.
///
/// Parent-child edges are directed parent → child. Spouse edges are stored
/// once per pair and treated as undirected by every traversal. `order`
/// preserves the source record's list ordering so sibling and spouse
/// iteration is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyEdge {
    ParentChild { role: ParentRole, order: u32 },
    Spouse { order: u32 },
}

/// In-memory adjacency structure built from person records.
pub struct FamilyGraph {
    /// Topology; node weights are stable person identifiers.
    graph: StableGraph<PersonId, FamilyEdge, Directed>,
    /// Map from stable identifier to internal index.
    id_to_index: HashMap<PersonId, NodeIndex>,
    /// Dangling references found while building the snapshot.
    warnings: Vec<LayoutWarning>,
}

impl FamilyGraph {
    /// Build an adjacency snapshot from every record in the store.
    pub fn from_store(store: &PersonStore) -> Self {
        let mut graph = StableGraph::with_capacity(store.len(), store.len() * 2);
        let mut id_to_index = HashMap::with_capacity(store.len());
        let mut warnings = Vec::new();

        for person in store.iter() {
            let index = graph.add_node(person.id.clone());
            id_to_index.insert(person.id.clone(), index);
        }

        let dangling = |subject: &PersonId, missing: &PersonId| {
            debug!(subject = %subject, missing = %missing, "skipping dangling reference");
            LayoutWarning::DanglingReference {
                subject: subject.clone(),
                missing: missing.clone(),
            }
        };

        // Parent edges, authoritative from the child side. The parent's
        // child list supplies the sibling order when it lists the child.
        for person in store.iter() {
            let child_idx = id_to_index[&person.id];
            let slots = [
                (person.father.as_ref(), ParentRole::Father),
                (person.mother.as_ref(), ParentRole::Mother),
            ];
            for (slot, role) in slots {
                let Some(parent_id) = slot else { continue };
                let Some(&parent_idx) = id_to_index.get(parent_id) else {
                    warnings.push(dangling(&person.id, parent_id));
                    continue;
                };
                let order = store
                    .get(parent_id)
                    .and_then(|p| p.children.iter().position(|c| c == &person.id))
                    .map(|i| i as u32)
                    .unwrap_or(u32::MAX);
                graph.add_edge(parent_idx, child_idx, FamilyEdge::ParentChild { role, order });
            }
        }

        // One-sided child-list edges: the child does not point back, so the
        // edge only exists on the parent's side. Role falls back to the
        // parent's recorded sex.
        for person in store.iter() {
            let parent_idx = id_to_index[&person.id];
            for (i, child_id) in person.children.iter().enumerate() {
                let Some(&child_idx) = id_to_index.get(child_id) else {
                    warnings.push(dangling(&person.id, child_id));
                    continue;
                };
                let reciprocal = store.get(child_id).is_some_and(|c| {
                    c.father.as_ref() == Some(&person.id) || c.mother.as_ref() == Some(&person.id)
                });
                if reciprocal {
                    continue;
                }
                let role = match person.sex {
                    Some(Sex::Female) => ParentRole::Mother,
                    _ => ParentRole::Father,
                };
                graph.add_edge(
                    parent_idx,
                    child_idx,
                    FamilyEdge::ParentChild { role, order: i as u32 },
                );
            }
        }

        // Spouse edges, one per unordered pair.
        let mut spouse_pairs: HashSet<(PersonId, PersonId)> = HashSet::new();
        for person in store.iter() {
            let person_idx = id_to_index[&person.id];
            for (i, link) in person.spouses.iter().enumerate() {
                let Some(&spouse_idx) = id_to_index.get(&link.spouse) else {
                    warnings.push(dangling(&person.id, &link.spouse));
                    continue;
                };
                let key = if person.id <= link.spouse {
                    (person.id.clone(), link.spouse.clone())
                } else {
                    (link.spouse.clone(), person.id.clone())
                };
                if spouse_pairs.insert(key) {
                    graph.add_edge(person_idx, spouse_idx, FamilyEdge::Spouse { order: i as u32 });
                }
            }
        }

        Self {
            graph,
            id_to_index,
            warnings,
        }
    }

    /// Whether the identifier is present in the snapshot.
    pub fn contains(&self, id: &PersonId) -> bool {
        self.id_to_index.contains_key(id)
    }

    /// Number of persons in the snapshot.
    pub fn person_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Dangling-reference warnings collected during construction.
    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }

    pub(crate) fn index_of(&self, id: &PersonId) -> Option<NodeIndex> {
        self.id_to_index.get(id).copied()
    }

    pub(crate) fn id_of(&self, index: NodeIndex) -> &PersonId {
        &self.graph[index]
    }

    pub(crate) fn topology(&self) -> &StableGraph<PersonId, FamilyEdge, Directed> {
        &self.graph
    }

    /// Parents of a person, father slot first.
    pub fn parents_of(&self, id: &PersonId) -> Vec<(PersonId, ParentRole)> {
        let Some(index) = self.index_of(id) else {
            return Vec::new();
        };
        let mut parents: Vec<(PersonId, ParentRole)> = self
            .graph
            .edges_directed(index, Direction::Incoming)
            .filter_map(|edge| match edge.weight() {
                FamilyEdge::ParentChild { role, .. } => {
                    Some((self.graph[edge.source()].clone(), *role))
                }
                FamilyEdge::Spouse { .. } => None,
            })
            .collect();
        parents.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        parents
    }

    /// Children of a person in recorded sibling order.
    pub fn children_of(&self, id: &PersonId) -> Vec<PersonId> {
        let Some(index) = self.index_of(id) else {
            return Vec::new();
        };
        let mut children: Vec<(u32, PersonId)> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .filter_map(|edge| match edge.weight() {
                FamilyEdge::ParentChild { order, .. } => {
                    Some((*order, self.graph[edge.target()].clone()))
                }
                FamilyEdge::Spouse { .. } => None,
            })
            .collect();
        children.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        children.into_iter().map(|(_, id)| id).collect()
    }

    /// Spouses of a person in recorded link order.
    pub fn spouses_of(&self, id: &PersonId) -> Vec<PersonId> {
        let Some(index) = self.index_of(id) else {
            return Vec::new();
        };
        let mut spouses: Vec<(u32, PersonId)> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .chain(self.graph.edges_directed(index, Direction::Incoming))
            .filter_map(|edge| match edge.weight() {
                FamilyEdge::Spouse { order } => {
                    let other = if edge.source() == index {
                        edge.target()
                    } else {
                        edge.source()
                    };
                    Some((*order, self.graph[other].clone()))
                }
                FamilyEdge::ParentChild { .. } => None,
            })
            .collect();
        spouses.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        spouses.into_iter().map(|(_, id)| id).collect()
    }

    /// Siblings derived via shared parent, in sibling order, self excluded.
    /// Never stored - always recomputed from parent edges.
    pub fn siblings_of(&self, id: &PersonId) -> Vec<PersonId> {
        let mut seen = HashSet::new();
        let mut siblings = Vec::new();
        for (parent, _) in self.parents_of(id) {
            for child in self.children_of(&parent) {
                if &child != id && seen.insert(child.clone()) {
                    siblings.push(child);
                }
            }
        }
        siblings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::{Person, SpouseLink};

    fn person(id: &str) -> Person {
        Person::new(id, id.to_uppercase())
    }

    /// Store with: f + m married, children a then b; a has child c.
    fn small_family() -> PersonStore {
        let mut f = person("f");
        let mut m = person("m");
        let mut a = person("a");
        let mut b = person("b");
        let mut c = person("c");

        f.sex = Some(Sex::Male);
        m.sex = Some(Sex::Female);
        f.children = vec!["a".into(), "b".into()];
        m.children = vec!["a".into(), "b".into()];
        f.spouses.push(SpouseLink::new("m"));
        m.spouses.push(SpouseLink::new("f"));
        a.father = Some("f".into());
        a.mother = Some("m".into());
        b.father = Some("f".into());
        b.mother = Some("m".into());
        a.children = vec!["c".into()];
        c.father = Some("a".into());

        [f, m, a, b, c].into_iter().collect()
    }

    #[test]
    fn test_parents_father_first() {
        let graph = FamilyGraph::from_store(&small_family());
        let parents = graph.parents_of(&"a".into());
        assert_eq!(
            parents,
            vec![
                ("f".into(), ParentRole::Father),
                ("m".into(), ParentRole::Mother)
            ]
        );
    }

    #[test]
    fn test_children_in_recorded_order() {
        let graph = FamilyGraph::from_store(&small_family());
        assert_eq!(
            graph.children_of(&"f".into()),
            vec![PersonId::from("a"), PersonId::from("b")]
        );
    }

    #[test]
    fn test_bidirectional_records_produce_one_edge() {
        let graph = FamilyGraph::from_store(&small_family());
        // a's father edge is asserted by both a.father and f.children;
        // only one edge per parent must exist.
        let idx = graph.index_of(&"a".into()).unwrap();
        let parent_edges = graph
            .topology()
            .edges_directed(idx, Direction::Incoming)
            .filter(|e| matches!(e.weight(), FamilyEdge::ParentChild { .. }))
            .count();
        assert_eq!(parent_edges, 2, "one edge per parent, no duplicates");
    }

    #[test]
    fn test_spouse_edge_stored_once_and_visible_from_both_sides() {
        let graph = FamilyGraph::from_store(&small_family());
        assert_eq!(graph.spouses_of(&"f".into()), vec![PersonId::from("m")]);
        assert_eq!(graph.spouses_of(&"m".into()), vec![PersonId::from("f")]);
    }

    #[test]
    fn test_siblings_derived_not_stored() {
        let graph = FamilyGraph::from_store(&small_family());
        assert_eq!(graph.siblings_of(&"a".into()), vec![PersonId::from("b")]);
        assert_eq!(graph.siblings_of(&"c".into()), Vec::<PersonId>::new());
    }

    #[test]
    fn test_dangling_reference_reported_not_fatal() {
        let mut p = person("p");
        p.father = Some("ghost".into());
        let store: PersonStore = [p].into_iter().collect();
        let graph = FamilyGraph::from_store(&store);

        assert_eq!(graph.person_count(), 1);
        assert_eq!(
            graph.warnings(),
            &[LayoutWarning::DanglingReference {
                subject: "p".into(),
                missing: "ghost".into()
            }]
        );
        assert!(graph.parents_of(&"p".into()).is_empty());
    }

    #[test]
    fn test_one_sided_child_edge_uses_parent_sex_for_role() {
        let mut m = person("m");
        m.sex = Some(Sex::Female);
        m.children = vec!["k".into()];
        let k = person("k"); // k does not point back
        let store: PersonStore = [m, k].into_iter().collect();
        let graph = FamilyGraph::from_store(&store);

        assert_eq!(
            graph.parents_of(&"k".into()),
            vec![("m".into(), ParentRole::Mother)]
        );
    }
}
