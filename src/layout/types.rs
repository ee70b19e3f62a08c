use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Position) -> Position {
        Position::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Horizontal link between two partners.
    Spouse,
    /// Vertical line leaving a couple-center (or a single parent).
    Stem,
    /// Horizontal line spanning a group of siblings.
    Branch,
    /// Short vertical line from a branch down to one child.
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConnectorSegment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub kind: SegmentKind,
}

impl ConnectorSegment {
    pub fn new(from: (f32, f32), to: (f32, f32), kind: SegmentKind) -> Self {
        Self {
            x1: from.0,
            y1: from.1,
            x2: to.0,
            y2: to.1,
            kind,
        }
    }

    pub fn is_vertical(&self) -> bool {
        self.x1 == self.x2 && self.y1 != self.y2
    }

    pub fn is_horizontal(&self) -> bool {
        self.y1 == self.y2 && self.x1 != self.x2
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connectors {
    pub spouse_links: Vec<ConnectorSegment>,
    pub parent_child_links: Vec<ConnectorSegment>,
}

impl Connectors {
    pub fn is_empty(&self) -> bool {
        self.spouse_links.is_empty() && self.parent_child_links.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &ConnectorSegment> {
        self.spouse_links.iter().chain(self.parent_child_links.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FamilyLayout {
    pub positions: BTreeMap<String, Position>,
    /// Unexpanded family-unit points, keyed by the unit's synthetic id.
    pub couple_centers: BTreeMap<usize, Position>,
    pub connectors: Connectors,
    pub viewport_width: f32,
    pub width: f32,
    pub height: f32,
    /// Set when the single-row safety net replaced the tidy layout.
    pub fallback: bool,
}

impl FamilyLayout {
    pub fn position(&self, member_id: &str) -> Option<Position> {
        self.positions.get(member_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
