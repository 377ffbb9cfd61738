//! Traversal primitives over the family graph.
//!
//! All walks are iterative (queue + visited set) so a malformed graph can
//! never recurse unboundedly: a node is expanded at most once, and the
//! first-discovered depth wins. Reaching an already-visited node through a
//! second path is legal (pedigree collapse); it only counts as a cycle when
//! the revisited node lies on the traversal chain of the node that reached
//! it - that is, when a person turns up as their own ancestor or
//! descendant. Cycles terminate the branch and are reported, never panicked
//! on.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::stable_graph::NodeIndex;
use tracing::trace;

use crate::person::{PersonId, PersonStore};

use super::engine::FamilyGraph;

/// Direction of a generational walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WalkDirection {
    /// Follow father/mother links away from the start.
    Up,
    /// Follow child links away from the start.
    Down,
}

/// One node reached by a traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalNode {
    pub id: PersonId,
    /// Generation distance from the start (0 = start itself).
    pub depth: u32,
}

/// Result of a bounded breadth-first walk.
#[derive(Debug, Clone, Default)]
pub struct Traversal {
    /// Nodes in breadth-first discovery order, start first.
    pub nodes: Vec<TraversalNode>,
    /// Each cycle found, as the identifiers along the repeated chain.
    pub cycles: Vec<Vec<PersonId>>,
}

impl Traversal {
    /// Depth of the deepest node reached.
    pub fn max_depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

impl FamilyGraph {
    /// Breadth-first upward traversal via father/mother links.
    ///
    /// Depths are generation distances from `id` (the ancestor side renders
    /// them as negative generations). `limit` bounds the depth when
    /// positive; 0 is unlimited.
    pub fn ancestors_of(&self, id: &PersonId, limit: u32) -> Traversal {
        self.walk(id, WalkDirection::Up, limit, None)
    }

    /// Breadth-first downward traversal via child links. Symmetric to
    /// [`FamilyGraph::ancestors_of`].
    pub fn descendants_of(&self, id: &PersonId, limit: u32) -> Traversal {
        self.walk(id, WalkDirection::Down, limit, None)
    }

    pub(crate) fn walk(
        &self,
        start: &PersonId,
        direction: WalkDirection,
        limit: u32,
        node_ceiling: Option<usize>,
    ) -> Traversal {
        let mut result = Traversal::default();
        let Some(start_idx) = self.index_of(start) else {
            return result;
        };

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut came_from: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut seen_cycles: HashSet<Vec<PersonId>> = HashSet::new();
        let mut queue: VecDeque<(NodeIndex, u32)> = VecDeque::new();

        visited.insert(start_idx);
        queue.push_back((start_idx, 0));

        while let Some((index, depth)) = queue.pop_front() {
            result.nodes.push(TraversalNode {
                id: self.id_of(index).clone(),
                depth,
            });

            if let Some(ceiling) = node_ceiling {
                if result.nodes.len() >= ceiling {
                    trace!(ceiling, "node ceiling reached, traversal stopped");
                    break;
                }
            }
            if limit > 0 && depth == limit {
                continue;
            }

            for next in self.step(index, direction) {
                if visited.contains(&next) {
                    // Revisit: cycle only if `next` is on the chain that
                    // led here, i.e. it would become its own ancestor.
                    if let Some(members) = chain_back_to(&came_from, index, next, self) {
                        let mut key = members.clone();
                        key.sort();
                        if seen_cycles.insert(key) {
                            trace!(members = ?members, "cycle detected, branch terminated");
                            result.cycles.push(members);
                        }
                    }
                    continue;
                }
                visited.insert(next);
                came_from.insert(next, index);
                queue.push_back((next, depth + 1));
            }
        }

        result
    }

    /// Next nodes one generation away, in deterministic order.
    fn step(&self, index: NodeIndex, direction: WalkDirection) -> Vec<NodeIndex> {
        let id = self.id_of(index);
        let ids = match direction {
            WalkDirection::Up => self
                .parents_of(id)
                .into_iter()
                .map(|(parent, _)| parent)
                .collect::<Vec<_>>(),
            WalkDirection::Down => self.children_of(id),
        };
        ids.into_iter().filter_map(|id| self.index_of(&id)).collect()
    }

    /// Undirected flood fill across parent, child, and spouse edges.
    ///
    /// Returns every person weakly connected to `id`, in identifier order.
    pub fn connected_component_of(&self, id: &PersonId) -> Vec<PersonId> {
        let Some(start_idx) = self.index_of(id) else {
            return Vec::new();
        };

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        visited.insert(start_idx);
        queue.push_back(start_idx);

        while let Some(index) = queue.pop_front() {
            for next in self.topology().neighbors_undirected(index) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        let mut members: Vec<PersonId> = visited.into_iter().map(|i| self.id_of(i).clone()).collect();
        members.sort();
        members
    }

    /// All weakly-connected components, each with a representative root.
    ///
    /// Components are discovered in identifier order, so repeated runs over
    /// the same store yield the same grouping.
    pub fn disconnected_groups(&self, store: &PersonStore) -> Vec<FamilyGroup> {
        let mut assigned: HashSet<PersonId> = HashSet::new();
        let mut groups = Vec::new();

        for id in store.ids() {
            if assigned.contains(id) || !self.contains(id) {
                continue;
            }
            let members = self.connected_component_of(id);
            for member in &members {
                assigned.insert(member.clone());
            }
            let root = representative_root(&members, store);
            groups.push(FamilyGroup { root, members });
        }

        groups
    }
}

/// One disconnected family group: a weakly-connected component and its
/// designated representative.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyGroup {
    /// Earliest-born member (identifier order as the tiebreak).
    pub root: PersonId,
    /// Every member, in identifier order.
    pub members: Vec<PersonId>,
}

/// Earliest-born member; unknown birth sorts last, identifiers break ties.
fn representative_root(members: &[PersonId], store: &PersonStore) -> PersonId {
    members
        .iter()
        .min_by_key(|id| {
            let year = store
                .get(id)
                .and_then(|p| p.birth.as_ref())
                .and_then(|d| d.sort_year())
                .unwrap_or(i32::MAX);
            (year, (*id).clone())
        })
        .cloned()
        .unwrap_or_else(|| PersonId::new(""))
}

/// If `target` lies on the came-from chain starting at `from`, return the
/// chain members from `target` to `from` inclusive.
fn chain_back_to(
    came_from: &HashMap<NodeIndex, NodeIndex>,
    from: NodeIndex,
    target: NodeIndex,
    graph: &FamilyGraph,
) -> Option<Vec<PersonId>> {
    let mut chain = vec![from];
    let mut cursor = from;
    while cursor != target {
        cursor = *came_from.get(&cursor)?;
        chain.push(cursor);
    }
    chain.reverse();
    Some(chain.into_iter().map(|i| graph.id_of(i).clone()).collect())
}
