//! Timeline x-axis: birth years drive horizontal placement.
//!
//! Each unit's x comes from a linear scale mapping its birth year onto the
//! horizontal axis across the full date range present in the subgraph.
//! Undated units are interpolated among their dated siblings (falling back
//! to the parent's year, then the range midpoint), so every unit lands
//! somewhere plausible instead of piling up at zero.
//!
//! Collision avoidance is relaxed here: dates, not tree shape, own the
//! x-axis, so the only correction is a per-row minimum-separation nudge -
//! a unit mapped closer than one block width to its left neighbor is
//! pushed right by the deficit.

use std::collections::BTreeMap;

use super::subtree::LayoutUnit;
use super::Spacing;

/// Position all units from birth years. `birth_years[i]` is the recorded
/// birth year of unit i's primary, when known. `roots` are the tree entry
/// points of the current halves, used to resolve undated units top-down.
pub(crate) fn position_timeline(
    units: &mut [LayoutUnit],
    roots: &[usize],
    birth_years: &[Option<i32>],
    spacing: &Spacing,
) {
    let years = resolve_years(units, roots, birth_years);

    let min_year = years.iter().copied().min().unwrap_or(0);
    let max_year = years.iter().copied().max().unwrap_or(0);
    let range = (max_year - min_year) as f32;

    // The axis spans the width the same units would need side by side, so
    // year gaps translate to proportional pixel gaps at a usable density.
    let axis_width =
        (units.len().saturating_sub(1)).max(1) as f32 * (spacing.node_width + spacing.h_spacing);

    for (i, unit) in units.iter_mut().enumerate() {
        let x = if range > 0.0 {
            (years[i] - min_year) as f32 / range * axis_width
        } else {
            0.0
        };
        // The primary node center lands on the scale position.
        unit.block_left = x - spacing.node_width / 2.0;
    }

    nudge_rows(units, spacing);
}

/// Effective year per unit: recorded, else interpolated among dated
/// siblings, else the parent's year, else the subgraph midpoint.
fn resolve_years(units: &[LayoutUnit], roots: &[usize], birth_years: &[Option<i32>]) -> Vec<i32> {
    let known: Vec<i32> = birth_years.iter().copied().flatten().collect();
    let fallback = if known.is_empty() {
        0
    } else {
        let min = known.iter().min().copied().unwrap_or(0);
        let max = known.iter().max().copied().unwrap_or(0);
        min + (max - min) / 2
    };

    let mut years: Vec<Option<i32>> = birth_years.to_vec();

    // Top-down: parents resolve before their children so the parent
    // fallback is always available.
    let mut stack: Vec<usize> = roots.to_vec();
    while let Some(index) = stack.pop() {
        if years[index].is_none() {
            years[index] = Some(fallback);
        }
        let parent_year = years[index];
        let children = &units[index].children;
        interpolate_siblings(children, &mut years, parent_year);
        stack.extend(children.iter().copied());
    }

    years.into_iter().map(|y| y.unwrap_or(fallback)).collect()
}

/// Fill undated entries of one sibling list by linear interpolation
/// between the nearest dated siblings on either side; a one-sided gap
/// copies the nearest dated sibling, a fully undated list copies the
/// parent.
fn interpolate_siblings(siblings: &[usize], years: &mut [Option<i32>], parent_year: Option<i32>) {
    let dated: Vec<(usize, i32)> = siblings
        .iter()
        .enumerate()
        .filter_map(|(pos, &idx)| years[idx].map(|y| (pos, y)))
        .collect();

    for (pos, &idx) in siblings.iter().enumerate() {
        if years[idx].is_some() {
            continue;
        }
        let before = dated.iter().rev().find(|(p, _)| *p < pos);
        let after = dated.iter().find(|(p, _)| *p > pos);
        years[idx] = match (before, after) {
            (Some(&(bp, by)), Some(&(ap, ay))) => {
                let t = (pos - bp) as f32 / (ap - bp) as f32;
                Some(by + ((ay - by) as f32 * t).round() as i32)
            }
            (Some(&(_, by)), None) => Some(by),
            (None, Some(&(_, ay))) => Some(ay),
            (None, None) => parent_year,
        };
    }
}

/// Per-row sweep: a unit closer to its left neighbor than that neighbor's
/// block width is pushed right by the deficit.
fn nudge_rows(units: &mut [LayoutUnit], spacing: &Spacing) {
    let mut rows: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (i, unit) in units.iter().enumerate() {
        rows.entry(unit.generation).or_default().push(i);
    }

    for row in rows.values() {
        let mut ordered = row.clone();
        ordered.sort_by(|&a, &b| {
            units[a]
                .block_left
                .partial_cmp(&units[b].block_left)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| units[a].primary.cmp(&units[b].primary))
        });
        for pair in ordered.windows(2) {
            let clear = units[pair[0]].block_left + units[pair[0]].block_width(spacing);
            if units[pair[1]].block_left < clear {
                units[pair[1]].block_left = clear;
            }
        }
    }
}
