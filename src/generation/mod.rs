//! Generation assignment for a selected subgraph.
//!
//! Turns a tree selection (root, direction, limits) into an integer
//! generation per node: root = 0, ancestors negative, descendants positive.
//! Spouses never get a traversal depth of their own - a spouse is not blood
//! related and has no path to the root - they inherit the generation of the
//! person they are paired with.
//!
//! The output edge list is restricted to mapped nodes, so layout never sees
//! an edge into a node that was excluded or cut off by the generation
//! limit.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use crate::error::{LayoutWarning, TreeError};
use crate::graph::{FamilyGraph, WalkDirection};
use crate::person::PersonId;

/// Which side of the root a selection covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeDirection {
    Ancestors,
    Descendants,
    Full,
}

/// Transient view parameters for one layout request. Never persisted;
/// recomputed per request.
#[derive(Debug, Clone)]
pub struct TreeSelection {
    /// The person the tree is centered on.
    pub root: PersonId,
    pub direction: TreeDirection,
    /// Bound on |generation|; 0 means unlimited.
    pub generation_limit: u32,
    /// Include spouses of selected persons.
    pub include_spouses: bool,
    /// Hard cap on traversal size per direction; the practical substitute
    /// for a timeout on degenerate inputs.
    pub node_ceiling: Option<usize>,
}

impl TreeSelection {
    pub fn new(root: impl Into<PersonId>, direction: TreeDirection) -> Self {
        Self {
            root: root.into(),
            direction,
            generation_limit: 0,
            include_spouses: false,
            node_ceiling: None,
        }
    }
}

/// Role a node plays in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Reached by blood traversal from the root.
    Primary,
    /// Included only as the partner of a primary node.
    Spouse,
}

/// Kind of a subgraph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    ParentChild,
    Spouse,
}

/// An edge between two mapped nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct SubgraphEdge {
    pub from: PersonId,
    pub to: PersonId,
    pub kind: EdgeKind,
}

/// Generation-annotated subgraph, ready for positioning.
#[derive(Debug, Clone)]
pub struct ResolvedSubgraph {
    pub root: PersonId,
    /// Generation per mapped node (root = 0).
    pub generations: BTreeMap<PersonId, i32>,
    /// Role per mapped node.
    pub roles: BTreeMap<PersonId, NodeRole>,
    /// Spouse-role node → the primary it renders next to.
    pub spouse_attachments: BTreeMap<PersonId, PersonId>,
    /// Edges restricted to mapped nodes.
    pub edges: Vec<SubgraphEdge>,
    pub warnings: Vec<LayoutWarning>,
}

impl ResolvedSubgraph {
    pub fn generation_of(&self, id: &PersonId) -> Option<i32> {
        self.generations.get(id).copied()
    }
}

/// Assigns generations relative to a chosen root.
#[derive(Debug, Default)]
pub struct GenerationResolver;

impl GenerationResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a selection against a graph snapshot.
    ///
    /// The only fatal failure is a root absent from the snapshot. Cycles
    /// and nodes with contradictory generations degrade to warnings; an
    /// empty selection degrades to a root-only subgraph.
    pub fn resolve(
        &self,
        graph: &FamilyGraph,
        selection: &TreeSelection,
    ) -> Result<ResolvedSubgraph, TreeError> {
        if !graph.contains(&selection.root) {
            return Err(TreeError::RootNotFound(selection.root.clone()));
        }

        let mut warnings = Vec::new();
        let mut generations: BTreeMap<PersonId, i32> = BTreeMap::new();
        let mut roles: BTreeMap<PersonId, NodeRole> = BTreeMap::new();
        generations.insert(selection.root.clone(), 0);

        let limit = selection.generation_limit;
        let up = matches!(selection.direction, TreeDirection::Ancestors | TreeDirection::Full)
            .then(|| graph.walk(&selection.root, WalkDirection::Up, limit, selection.node_ceiling));
        let down = matches!(selection.direction, TreeDirection::Descendants | TreeDirection::Full)
            .then(|| {
                graph.walk(&selection.root, WalkDirection::Down, limit, selection.node_ceiling)
            });

        if let Some(walk) = &up {
            for node in &walk.nodes {
                generations.entry(node.id.clone()).or_insert(-(node.depth as i32));
            }
        }

        // Union with the descendant side. A non-root node reached both ways
        // would need two generations at once - only possible in a cyclic
        // graph - so it is excluded rather than placed inconsistently.
        let mut contradictory: Vec<PersonId> = Vec::new();
        if let Some(walk) = &down {
            for node in &walk.nodes {
                if node.depth == 0 {
                    continue;
                }
                match generations.get(&node.id) {
                    Some(_) => contradictory.push(node.id.clone()),
                    None => {
                        generations.insert(node.id.clone(), node.depth as i32);
                    }
                }
            }
        }
        if !contradictory.is_empty() {
            contradictory.sort();
            contradictory.dedup();
            for id in &contradictory {
                trace!(id = %id, "excluded: reachable as both ancestor and descendant");
                generations.remove(id);
            }
            warnings.push(LayoutWarning::Cycle {
                members: contradictory,
            });
        }

        for walk in up.iter().chain(down.iter()) {
            for members in &walk.cycles {
                let warning = LayoutWarning::Cycle {
                    members: members.clone(),
                };
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }
        }

        for id in generations.keys() {
            roles.insert(id.clone(), NodeRole::Primary);
        }

        // Spouses inherit the partner's generation. First mapped partner
        // wins when a spouse links to several selected persons.
        let mut spouse_attachments: BTreeMap<PersonId, PersonId> = BTreeMap::new();
        if selection.include_spouses {
            let blood: Vec<(PersonId, i32)> =
                generations.iter().map(|(id, g)| (id.clone(), *g)).collect();
            for (id, generation) in blood {
                for spouse in graph.spouses_of(&id) {
                    if generations.contains_key(&spouse) {
                        continue;
                    }
                    generations.insert(spouse.clone(), generation);
                    roles.insert(spouse.clone(), NodeRole::Spouse);
                    spouse_attachments.insert(spouse, id.clone());
                }
            }
        }

        // Edge list restricted to mapped nodes; edges to excluded or
        // out-of-limit nodes are dropped, not left dangling.
        let mut edges = Vec::new();
        for id in generations.keys() {
            for (parent, _) in graph.parents_of(id) {
                if generations.contains_key(&parent) {
                    edges.push(SubgraphEdge {
                        from: parent,
                        to: id.clone(),
                        kind: EdgeKind::ParentChild,
                    });
                }
            }
        }
        for id in generations.keys() {
            for spouse in graph.spouses_of(id) {
                if id < &spouse && generations.contains_key(&spouse) {
                    edges.push(SubgraphEdge {
                        from: id.clone(),
                        to: spouse,
                        kind: EdgeKind::Spouse,
                    });
                }
            }
        }

        // Dangling references inside the selection surface with the result.
        for warning in graph.warnings() {
            if let LayoutWarning::DanglingReference { subject, .. } = warning {
                if generations.contains_key(subject) && !warnings.contains(warning) {
                    warnings.push(warning.clone());
                }
            }
        }

        Ok(ResolvedSubgraph {
            root: selection.root.clone(),
            generations,
            roles,
            spouse_attachments,
            edges,
            warnings,
        })
    }
}
