use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::ir::Member;

use super::Position;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("tidy-tree contour ended early under unit {unit}")]
    BrokenContour { unit: usize },
    #[error("sibling span between units {left} and {right} is empty")]
    DegenerateSiblingSpan { left: usize, right: usize },
    #[error("member '{id}' was not placed")]
    MissingMember { id: String },
    #[error("member '{id}' was placed more than once")]
    DuplicateMember { id: String },
    #[error("member '{id}' received a non-finite position")]
    NonFinitePosition { id: String },
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// One row, input order, `fallback_spacing` apart. Centering is applied by the caller.
pub(super) fn fallback_positions(
    members: &[Member],
    config: &LayoutConfig,
) -> BTreeMap<String, Position> {
    let spacing = config.fallback_spacing.max(config.node_width);
    let mut positions = BTreeMap::new();
    let mut column = 0usize;
    for member in members {
        if positions.contains_key(&member.id) {
            continue;
        }
        positions.insert(
            member.id.clone(),
            Position::new(column as f32 * spacing, 0.0),
        );
        column += 1;
    }
    positions
}
