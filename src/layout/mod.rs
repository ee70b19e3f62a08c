mod connectors;
mod error;
pub(crate) mod hierarchy;
mod tidy;
pub(crate) mod types;
pub use connectors::derive_connectors;
pub use error::LayoutError;
pub use types::*;

use crate::config::LayoutConfig;
use crate::ir::{FamilyGraph, Member};
use error::fallback_positions;
use hierarchy::{FamilyForest, FamilyUnit, build_forest};
use std::collections::{BTreeMap, HashMap};
use tidy::{TidyConfig, layout_tree};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PlacedForest {
    pub positions: BTreeMap<String, Position>,
    pub couple_centers: BTreeMap<usize, Position>,
}

/// Lays out the whole family graph: hierarchy, positions, then connectors.
///
/// Always returns one finite position per distinct member. When the tidy
/// layout cannot be completed the members are placed on a single row instead
/// and `FamilyLayout::fallback` is set.
pub fn compute_layout(graph: &FamilyGraph, config: &LayoutConfig) -> FamilyLayout {
    let forest = build_forest(&graph.members, &graph.edges);
    tracing::debug!(
        members = graph.members.len(),
        edges = graph.edges.len(),
        trees = forest.roots.len(),
        "built family forest"
    );

    let (placed, fallback) = place_or_fallback(&forest, &graph.members, config);
    let connectors = derive_connectors(&placed.positions, &graph.edges, config);
    let (width, height) = drawing_extent(&placed.positions, config);

    FamilyLayout {
        positions: placed.positions,
        couple_centers: placed.couple_centers,
        connectors,
        viewport_width: config.viewport_width,
        width,
        height,
        fallback,
    }
}

fn place_or_fallback(
    forest: &FamilyForest<'_>,
    members: &[Member],
    config: &LayoutConfig,
) -> (PlacedForest, bool) {
    match assign_positions(forest, members, config) {
        Ok(placed) => (placed, false),
        Err(err) => {
            tracing::warn!(
                error = %err,
                members = members.len(),
                "family layout failed; using single-row fallback"
            );
            let mut placed = PlacedForest {
                positions: fallback_positions(members, config),
                couple_centers: BTreeMap::new(),
            };
            center_in_viewport(&mut placed, config);
            (placed, true)
        }
    }
}

pub(crate) fn assign_positions(
    forest: &FamilyForest<'_>,
    members: &[Member],
    config: &LayoutConfig,
) -> error::Result<PlacedForest> {
    let tidy = TidyConfig::from_layout(config);
    let half_node = config.node_width / 2.0;
    let half_partner = config.partner_spacing / 2.0;
    let mut placed = PlacedForest::default();
    let mut next_left: Option<f32> = None;

    for &root in &forest.roots {
        let points: HashMap<usize, (f32, f32)> = layout_tree(forest, root, &tidy)?
            .into_iter()
            .map(|point| (point.unit, (point.x, point.y)))
            .collect();
        let mut tree_members = Vec::new();
        let mut tree_centers = Vec::new();
        for unit_id in forest.subtree(root) {
            let Some(unit) = forest.unit(unit_id) else {
                continue;
            };
            expand_unit(unit, &points, half_partner, &mut tree_members, &mut tree_centers)?;
        }

        let left = tree_members
            .iter()
            .map(|(_, pos)| pos.x - half_node)
            .fold(f32::INFINITY, f32::min);
        let right = tree_members
            .iter()
            .map(|(_, pos)| pos.x + half_node)
            .fold(f32::NEG_INFINITY, f32::max);
        let dx = next_left.unwrap_or(0.0) - left;

        for (id, pos) in tree_members {
            let shifted = Position::new(pos.x + dx, pos.y);
            if placed.positions.insert(id.to_string(), shifted).is_some() {
                return Err(LayoutError::DuplicateMember { id: id.to_string() });
            }
        }
        for (unit, pos) in tree_centers {
            placed
                .couple_centers
                .insert(unit, Position::new(pos.x + dx, pos.y));
        }
        next_left = Some(right + dx + config.tree_gutter);
    }

    for member in members {
        if !placed.positions.contains_key(&member.id) {
            return Err(LayoutError::MissingMember {
                id: member.id.clone(),
            });
        }
    }

    center_in_viewport(&mut placed, config);

    if let Some((id, _)) = placed.positions.iter().find(|(_, pos)| !pos.is_finite()) {
        return Err(LayoutError::NonFinitePosition { id: id.clone() });
    }
    Ok(placed)
}

/// Splits one unit's point into member positions, plus a center for couples.
fn expand_unit<'a>(
    unit: &FamilyUnit<'a>,
    points: &HashMap<usize, (f32, f32)>,
    half_partner: f32,
    members: &mut Vec<(&'a str, Position)>,
    centers: &mut Vec<(usize, Position)>,
) -> error::Result<()> {
    let Some(&(x, y)) = points.get(&unit.id) else {
        return Err(LayoutError::MissingMember {
            id: unit.partners.first().copied().unwrap_or_default().to_string(),
        });
    };
    match unit.partners.as_slice() {
        [only] => members.push((*only, Position::new(x, y))),
        [first, second, ..] => {
            members.push((*first, Position::new(x - half_partner, y)));
            members.push((*second, Position::new(x + half_partner, y)));
            centers.push((unit.id, Position::new(x, y)));
        }
        [] => {}
    }
    Ok(())
}

/// Centers the member-center bounding box in the viewport, never closer than
/// `side_margin` to the left edge, and puts the top row at `top_margin`.
fn center_in_viewport(placed: &mut PlacedForest, config: &LayoutConfig) {
    if placed.positions.is_empty() {
        return;
    }
    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut min_y = f32::INFINITY;
    for pos in placed.positions.values() {
        min_x = min_x.min(pos.x);
        max_x = max_x.max(pos.x);
        min_y = min_y.min(pos.y);
    }
    let span = max_x - min_x;
    let left = ((config.viewport_width - span) / 2.0).max(config.side_margin);
    let dx = left - min_x;
    let dy = config.top_margin - min_y;
    for pos in placed
        .positions
        .values_mut()
        .chain(placed.couple_centers.values_mut())
    {
        pos.x += dx;
        pos.y += dy;
    }
}

fn drawing_extent(positions: &BTreeMap<String, Position>, config: &LayoutConfig) -> (f32, f32) {
    if positions.is_empty() {
        return (config.viewport_width, config.top_margin * 2.0);
    }
    let max_x = positions.values().map(|pos| pos.x).fold(f32::NEG_INFINITY, f32::max);
    let max_y = positions.values().map(|pos| pos.y).fold(f32::NEG_INFINITY, f32::max);
    let width = config
        .viewport_width
        .max(max_x + config.node_width / 2.0 + config.side_margin);
    let height = max_y + config.node_height / 2.0 + config.top_margin;
    (width, height)
}
