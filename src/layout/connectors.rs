use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::LayoutConfig;
use crate::ir::{EdgeKind, RelationshipEdge};

use super::types::{ConnectorSegment, Connectors, Position, SegmentKind};

type AnchorKey = (i64, i64);

struct SiblingGroup<'a> {
    anchor: Position,
    /// Anchor sits on the spouse line of two side-by-side partners.
    adjacent_couple: bool,
    children: Vec<&'a str>,
}

/// Derives spouse links and parent-child elbows from final positions.
///
/// Edges whose endpoints have no position are skipped; this never fails.
pub fn derive_connectors(
    positions: &BTreeMap<String, Position>,
    edges: &[RelationshipEdge],
    config: &LayoutConfig,
) -> Connectors {
    Connectors {
        spouse_links: spouse_links(positions, edges, config),
        parent_child_links: parent_child_links(positions, edges, config),
    }
}

fn spouse_links(
    positions: &BTreeMap<String, Position>,
    edges: &[RelationshipEdge],
    config: &LayoutConfig,
) -> Vec<ConnectorSegment> {
    let half = config.node_width / 2.0;
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut links = Vec::new();
    for edge in edges.iter().filter(|edge| edge.kind == EdgeKind::Spouse) {
        let (from, to) = (edge.from_id.as_str(), edge.to_id.as_str());
        if from == to {
            continue;
        }
        let (Some(a), Some(b)) = (positions.get(from), positions.get(to)) else {
            continue;
        };
        let pair = if from < to { (from, to) } else { (to, from) };
        if !seen.insert(pair) {
            continue;
        }
        let (left, right) = if a.x <= b.x { (a, b) } else { (b, a) };
        let x1 = left.x + half;
        let x2 = right.x - half;
        if x2 <= x1 {
            continue;
        }
        links.push(ConnectorSegment::new(
            (x1, left.y),
            (x2, right.y),
            SegmentKind::Spouse,
        ));
    }
    links
}

fn parent_child_links(
    positions: &BTreeMap<String, Position>,
    edges: &[RelationshipEdge],
    config: &LayoutConfig,
) -> Vec<ConnectorSegment> {
    let mut spouses: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut parents_of: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        let (from, to) = (edge.from_id.as_str(), edge.to_id.as_str());
        if from == to || !positions.contains_key(from) || !positions.contains_key(to) {
            continue;
        }
        match edge.kind {
            EdgeKind::Spouse => {
                push_unique(spouses.entry(from).or_default(), to);
                push_unique(spouses.entry(to).or_default(), from);
            }
            EdgeKind::Parent => push_unique(parents_of.entry(to).or_default(), from),
        }
    }

    let quantum = if config.connector_key_quantum > 0.0 {
        config.connector_key_quantum
    } else {
        1.0
    };
    let mut groups: Vec<SiblingGroup<'_>> = Vec::new();
    let mut group_index: HashMap<AnchorKey, usize> = HashMap::new();

    for edge in edges.iter().filter(|edge| edge.kind == EdgeKind::Parent) {
        let (parent, child) = (edge.from_id.as_str(), edge.to_id.as_str());
        if parent == child {
            continue;
        }
        let Some(&parent_pos) = positions.get(parent) else {
            continue;
        };
        if !positions.contains_key(child) {
            continue;
        }

        let co_parents = parents_of.get(child).map(Vec::as_slice).unwrap_or(&[]);
        let partner = spouses.get(parent).and_then(|list| {
            list.iter()
                .copied()
                .find(|spouse| co_parents.contains(spouse))
                .or_else(|| list.first().copied())
        });
        let (anchor, adjacent_couple) = match partner.and_then(|id| positions.get(id)) {
            Some(&partner_pos) => (
                parent_pos.midpoint(partner_pos),
                side_by_side(parent_pos, partner_pos, config),
            ),
            None => (parent_pos, false),
        };

        let key = (
            (anchor.x / quantum).round() as i64,
            (anchor.y / quantum).round() as i64,
        );
        let idx = *group_index.entry(key).or_insert_with(|| {
            groups.push(SiblingGroup {
                anchor,
                adjacent_couple,
                children: Vec::new(),
            });
            groups.len() - 1
        });
        push_unique(&mut groups[idx].children, child);
    }

    let mut links = Vec::new();
    for group in &groups {
        emit_group(group, positions, config, &mut links);
    }
    links
}

fn emit_group(
    group: &SiblingGroup<'_>,
    positions: &BTreeMap<String, Position>,
    config: &LayoutConfig,
    out: &mut Vec<ConnectorSegment>,
) {
    let half_height = config.node_height / 2.0;
    // Partners placed apart have no spouse line to hang from.
    let start_y = if group.adjacent_couple {
        group.anchor.y
    } else {
        group.anchor.y + half_height
    };
    let children: Vec<Position> = group
        .children
        .iter()
        .filter_map(|id| positions.get(*id).copied())
        .collect();

    match children.as_slice() {
        [] => {}
        [only] => out.push(ConnectorSegment::new(
            (group.anchor.x, start_y),
            (only.x, only.y - half_height),
            SegmentKind::Stem,
        )),
        many => {
            let highest_top = many
                .iter()
                .map(|pos| pos.y - half_height)
                .fold(f32::INFINITY, f32::min);
            let branch_y = (start_y + highest_top) / 2.0;
            let min_x = many.iter().map(|pos| pos.x).fold(f32::INFINITY, f32::min);
            let max_x = many.iter().map(|pos| pos.x).fold(f32::NEG_INFINITY, f32::max);
            out.push(ConnectorSegment::new(
                (group.anchor.x, start_y),
                (group.anchor.x, branch_y),
                SegmentKind::Stem,
            ));
            out.push(ConnectorSegment::new(
                (min_x, branch_y),
                (max_x, branch_y),
                SegmentKind::Branch,
            ));
            for pos in many {
                out.push(ConnectorSegment::new(
                    (pos.x, branch_y),
                    (pos.x, pos.y - half_height),
                    SegmentKind::Drop,
                ));
            }
        }
    }
}

fn side_by_side(a: Position, b: Position, config: &LayoutConfig) -> bool {
    a.y == b.y && (a.x - b.x).abs() <= config.partner_spacing + 0.5
}

fn push_unique<'a>(list: &mut Vec<&'a str>, id: &'a str) {
    if !list.contains(&id) {
        list.push(id);
    }
}
