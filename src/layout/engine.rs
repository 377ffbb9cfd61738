//! Layout engine - variant dispatch and result assembly.
//!
//! One request runs to completion synchronously: resolve generations, build
//! layout units (spouse pairs collapse into one unit here), position each
//! half with the shared subtree core or the timeline scale, then emit
//! positioned nodes and edge descriptors. The result is regenerated
//! wholesale on every run; nothing is mutated in place.

use std::collections::HashSet;

use tracing::debug;

use crate::error::TreeError;
use crate::generation::{
    EdgeKind, GenerationResolver, NodeRole, ResolvedSubgraph, TreeDirection, TreeSelection,
};
use crate::graph::FamilyGraph;
use crate::person::{PersonId, PersonStore};

use super::subtree::{position_forest, LayoutUnit};
use super::timeline::position_timeline;
use super::{
    ArrowMode, LayoutAlgorithm, LayoutEdge, LayoutRequest, LayoutResult, PositionedNode, Spacing,
    SpouseLabelStyle,
};

/// Computes positioned layouts from a record store snapshot.
#[derive(Debug, Default)]
pub struct LayoutEngine {
    resolver: GenerationResolver,
}

/// Tree links for one half (ancestor or descendant side) of the layout.
struct HalfLinks {
    /// children[i] = child unit indices of unit i within this half.
    children: Vec<Vec<usize>>,
    /// Entry points: the request root first, then disconnected remainders.
    roots: Vec<usize>,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            resolver: GenerationResolver::new(),
        }
    }

    /// Run one layout request against a fresh graph snapshot of the store.
    pub fn layout(
        &self,
        store: &PersonStore,
        request: &LayoutRequest,
    ) -> Result<LayoutResult, TreeError> {
        let graph = FamilyGraph::from_store(store);
        self.layout_graph(store, &graph, request)
    }

    /// Run one layout request against an existing snapshot.
    pub fn layout_graph(
        &self,
        store: &PersonStore,
        graph: &FamilyGraph,
        request: &LayoutRequest,
    ) -> Result<LayoutResult, TreeError> {
        let selection = TreeSelection {
            root: request.root.clone(),
            direction: request.direction,
            generation_limit: request.generation_limit,
            include_spouses: request.include_spouses,
            node_ceiling: request.node_ceiling,
        };
        let resolved = self.resolver.resolve(graph, &selection)?;

        let spacing = match request.algorithm {
            LayoutAlgorithm::Compact => request.spacing.scaled(0.5),
            _ => request.spacing.clone(),
        };

        let (mut units, unit_of) = build_units(graph, &resolved);
        debug!(
            units = units.len(),
            algorithm = ?request.algorithm,
            "positioning units"
        );

        let has_descendants = units.iter().any(|u| u.generation > 0);
        let has_ancestors = units.iter().any(|u| u.generation < 0);
        let root_unit = unit_of[&resolved.root];

        let descendant_half = has_descendants.then(|| {
            build_half_links(graph, &resolved, &units, &unit_of, root_unit, true)
        });
        let ancestor_half = has_ancestors.then(|| {
            build_half_links(graph, &resolved, &units, &unit_of, root_unit, false)
        });

        match request.algorithm {
            LayoutAlgorithm::Timeline => {
                // Both halves merge into one interpolation tree; the date
                // scale owns x across the whole subgraph.
                let mut children = vec![Vec::new(); units.len()];
                let mut roots = vec![root_unit];
                for half in [&descendant_half, &ancestor_half].into_iter().flatten() {
                    for (i, kids) in half.children.iter().enumerate() {
                        children[i].extend(kids.iter().copied());
                    }
                    roots.extend(half.roots.iter().copied().filter(|r| *r != root_unit));
                }
                for (unit, kids) in units.iter_mut().zip(children) {
                    unit.children = kids;
                }
                let years: Vec<Option<i32>> = units
                    .iter()
                    .map(|u| {
                        store
                            .get(&u.primary)
                            .and_then(|p| p.birth.as_ref())
                            .and_then(|d| d.sort_year())
                    })
                    .collect();
                position_timeline(&mut units, &roots, &years, &spacing);
            }
            _ => {
                // Standard, Compact, and Hourglass share the subtree core;
                // each half is positioned separately and lines up on the
                // shared root, which both passes normalize to x = 0.
                for half in [&descendant_half, &ancestor_half].into_iter().flatten() {
                    for (unit, kids) in units.iter_mut().zip(half.children.iter()) {
                        unit.children = kids.clone();
                    }
                    position_forest(&mut units, &half.roots, &spacing);
                }
                if !has_descendants && !has_ancestors {
                    position_forest(&mut units, &[root_unit], &spacing);
                }
            }
        }

        let nodes = emit_nodes(&units, &resolved, request, &spacing);
        let edges = build_edges(store, &resolved, request);

        Ok(LayoutResult {
            nodes,
            edges,
            warnings: resolved.warnings.clone(),
        })
    }
}

/// Vertical rule per algorithm (decision: Standard grows downward from the
/// root for single-direction requests; Full and Hourglass separate the
/// halves with signed rows).
fn row_y(generation: i32, request: &LayoutRequest, spacing: &Spacing) -> f32 {
    let signed = matches!(request.algorithm, LayoutAlgorithm::Hourglass)
        || matches!(request.direction, TreeDirection::Full);
    if signed {
        generation as f32 * spacing.v_spacing
    } else {
        generation.unsigned_abs() as f32 * spacing.v_spacing
    }
}

/// Collapse the resolved subgraph into layout units: one per primary
/// person, spouses folded into their partner's unit in link order.
fn build_units(
    graph: &FamilyGraph,
    resolved: &ResolvedSubgraph,
) -> (Vec<LayoutUnit>, std::collections::BTreeMap<PersonId, usize>) {
    let mut units = Vec::new();
    let mut unit_of = std::collections::BTreeMap::new();

    for (id, generation) in &resolved.generations {
        if resolved.roles.get(id) == Some(&NodeRole::Primary) {
            unit_of.insert(id.clone(), units.len());
            units.push(LayoutUnit::new(id.clone(), *generation));
        }
    }

    for index in 0..units.len() {
        let primary = units[index].primary.clone();
        for spouse in graph.spouses_of(&primary) {
            if resolved.spouse_attachments.get(&spouse) == Some(&primary) {
                unit_of.insert(spouse.clone(), index);
                units[index].spouses.push(spouse);
            }
        }
    }

    (units, unit_of)
}

/// Build the tree links of one half.
///
/// Descendant side: a child unit hangs under the unit containing its
/// father when mapped, else its mother (a spouse-paired couple is one
/// unit, so the usual case attaches to the couple). Ancestor side: a
/// parent unit hangs under the mapped child it was reached through.
/// Units with no attachment (disconnected remainders after cycle
/// exclusion) become extra forest roots.
fn build_half_links(
    graph: &FamilyGraph,
    resolved: &ResolvedSubgraph,
    units: &[LayoutUnit],
    unit_of: &std::collections::BTreeMap<PersonId, usize>,
    root_unit: usize,
    descendant_side: bool,
) -> HalfLinks {
    let in_half = |generation: i32| {
        if descendant_side {
            generation >= 0
        } else {
            generation <= 0
        }
    };

    // Attachment target per unit of the half (root never attaches).
    let mut attachment: Vec<Option<usize>> = vec![None; units.len()];
    for (index, unit) in units.iter().enumerate() {
        if index == root_unit || !in_half(unit.generation) || unit.generation == 0 {
            continue;
        }
        if descendant_side {
            attachment[index] = graph
                .parents_of(&unit.primary)
                .iter()
                .filter_map(|(parent, _)| unit_of.get(parent).copied())
                .find(|&t| units[t].generation == unit.generation - 1 && in_half(units[t].generation));
        } else {
            attachment[index] = graph
                .children_of(&unit.primary)
                .iter()
                .filter_map(|child| unit_of.get(child).copied())
                .find(|&t| units[t].generation == unit.generation + 1 && in_half(units[t].generation));
        }
    }

    // Ordered child lists: recorded child order on the descendant side,
    // father-then-mother on the ancestor side.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); units.len()];
    for (index, unit) in units.iter().enumerate() {
        if !in_half(unit.generation) {
            continue;
        }
        let mut seen = HashSet::new();
        if descendant_side {
            let mut members = vec![unit.primary.clone()];
            members.extend(unit.spouses.iter().cloned());
            for member in members {
                for child in graph.children_of(&member) {
                    if let Some(&child_unit) = unit_of.get(&child) {
                        if attachment[child_unit] == Some(index) && seen.insert(child_unit) {
                            children[index].push(child_unit);
                        }
                    }
                }
            }
        } else {
            for (parent, _) in graph.parents_of(&unit.primary) {
                if let Some(&parent_unit) = unit_of.get(&parent) {
                    if attachment[parent_unit] == Some(index) && seen.insert(parent_unit) {
                        children[index].push(parent_unit);
                    }
                }
            }
        }
    }

    let mut roots = vec![root_unit];
    for (index, unit) in units.iter().enumerate() {
        if index != root_unit
            && in_half(unit.generation)
            && unit.generation != 0
            && attachment[index].is_none()
        {
            roots.push(index);
        }
    }

    HalfLinks { children, roots }
}

/// Emit positioned nodes from the unit arena, primary first, spouses at
/// their recorded offsets.
fn emit_nodes(
    units: &[LayoutUnit],
    resolved: &ResolvedSubgraph,
    request: &LayoutRequest,
    spacing: &Spacing,
) -> Vec<PositionedNode> {
    let mut nodes = Vec::new();
    for unit in units {
        let y = row_y(unit.generation, request, spacing);
        nodes.push(PositionedNode {
            id: unit.primary.clone(),
            x: unit.primary_x(spacing),
            y,
            generation: unit.generation,
            role: NodeRole::Primary,
        });
        for (i, spouse) in unit.spouses.iter().enumerate() {
            let generation = resolved.generation_of(spouse).unwrap_or(unit.generation);
            nodes.push(PositionedNode {
                id: spouse.clone(),
                x: unit.spouse_x(i, spacing),
                y,
                generation,
                role: NodeRole::Spouse,
            });
        }
    }
    nodes
}

/// Build edge descriptors from the restricted edge list.
fn build_edges(
    store: &PersonStore,
    resolved: &ResolvedSubgraph,
    request: &LayoutRequest,
) -> Vec<LayoutEdge> {
    let mut edges = Vec::new();
    for edge in &resolved.edges {
        match edge.kind {
            EdgeKind::ParentChild => edges.push(LayoutEdge {
                from: edge.from.clone(),
                to: edge.to.clone(),
                kind: EdgeKind::ParentChild,
                arrow: request.arrows,
                label: None,
            }),
            EdgeKind::Spouse => {
                let Some(style) = request.spouse_edges else {
                    continue;
                };
                edges.push(LayoutEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    kind: EdgeKind::Spouse,
                    arrow: ArrowMode::None,
                    label: spouse_label(store, &edge.from, &edge.to, style),
                });
            }
        }
    }
    edges
}

/// Label text for a spouse edge at the requested verbosity.
fn spouse_label(
    store: &PersonStore,
    a: &PersonId,
    b: &PersonId,
    style: SpouseLabelStyle,
) -> Option<String> {
    let link = store
        .get(a)
        .and_then(|p| p.spouse_link(b).cloned())
        .or_else(|| store.get(b).and_then(|p| p.spouse_link(a).cloned()))?;

    match style {
        SpouseLabelStyle::None => None,
        SpouseLabelStyle::Date => link.marriage.map(|d| format!("m. {d}")),
        SpouseLabelStyle::DatePlace | SpouseLabelStyle::Full => {
            let mut parts = Vec::new();
            if let Some(date) = link.marriage {
                parts.push(format!("m. {date}"));
            }
            if let Some(place) = &link.location {
                parts.push(place.clone());
            }
            let mut label = parts.join(", ");
            if style == SpouseLabelStyle::Full {
                if let Some(divorce) = link.divorce {
                    if label.is_empty() {
                        label = format!("div. {divorce}");
                    } else {
                        label = format!("{label}; div. {divorce}");
                    }
                }
            }
            (!label.is_empty()).then_some(label)
        }
    }
}
