//! Turns flat members and typed edges into a forest of family units.
//!
//! A family unit is one member, or a couple, plus the units of their combined
//! children. Every member ends up as a partner in exactly one unit: a visited
//! set guards against cycles and duplicate edges, and a final sweep turns every
//! member no root reached into a tree of its own.

use std::collections::{HashMap, HashSet};

use crate::ir::{EdgeKind, Member, RelationshipEdge};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FamilyUnit<'a> {
    /// Synthetic id; also the unit's index in `FamilyForest::units` (pre-order).
    pub id: usize,
    /// One member, or a couple (first partner is the one the unit was built from).
    pub partners: Vec<&'a str>,
    /// Ids of the child units, left to right.
    pub children: Vec<usize>,
}

impl<'a> FamilyUnit<'a> {
    pub fn is_couple(&self) -> bool {
        self.partners.len() > 1
    }
}

/// Flat arena of units. Nesting lives in `children` ids, so dropping a deep
/// lineage does not recurse.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FamilyForest<'a> {
    pub units: Vec<FamilyUnit<'a>>,
    /// Tree roots in placement order.
    pub roots: Vec<usize>,
}

impl<'a> FamilyForest<'a> {
    pub fn unit(&self, id: usize) -> Option<&FamilyUnit<'a>> {
        self.units.get(id)
    }

    /// Unit ids of the tree under `root`, parents before children, siblings left to right.
    pub fn subtree(&self, root: usize) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(unit) = self.unit(id) else {
                continue;
            };
            order.push(id);
            stack.extend(unit.children.iter().rev().copied());
        }
        order
    }
}

#[derive(Default)]
struct RelationIndex<'a> {
    spouse_of: HashMap<&'a str, Vec<&'a str>>,
    children_of: HashMap<&'a str, Vec<&'a str>>,
    has_parent: HashSet<&'a str>,
}

impl<'a> RelationIndex<'a> {
    fn new(members: &'a [Member], edges: &'a [RelationshipEdge]) -> Self {
        let known: HashSet<&str> = members.iter().map(|member| member.id.as_str()).collect();
        let mut index = Self::default();
        for edge in edges {
            let from = edge.from_id.as_str();
            let to = edge.to_id.as_str();
            if from == to || !known.contains(from) || !known.contains(to) {
                continue;
            }
            match edge.kind {
                EdgeKind::Spouse => {
                    push_unique(index.spouse_of.entry(from).or_default(), to);
                    push_unique(index.spouse_of.entry(to).or_default(), from);
                }
                EdgeKind::Parent => {
                    push_unique(index.children_of.entry(from).or_default(), to);
                    index.has_parent.insert(to);
                }
            }
        }
        index
    }

    fn spouses(&self, id: &str) -> &[&'a str] {
        self.spouse_of.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn children(&self, id: &str) -> &[&'a str] {
        self.children_of.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn is_root(&self, id: &str) -> bool {
        !self.has_parent.contains(id)
    }

    /// A root whose partner descends from someone else in the graph.
    fn married_in(&self, id: &str) -> bool {
        self.spouses(id).iter().any(|spouse| !self.is_root(spouse))
    }
}

fn push_unique<'a>(list: &mut Vec<&'a str>, id: &'a str) {
    if !list.contains(&id) {
        list.push(id);
    }
}

struct ForestBuilder<'a> {
    index: RelationIndex<'a>,
    visited: HashSet<&'a str>,
    forest: FamilyForest<'a>,
}

/// A unit whose child ids are still being walked.
struct PendingUnit<'a> {
    unit: usize,
    child_ids: Vec<&'a str>,
    next: usize,
}

impl<'a> ForestBuilder<'a> {
    /// Claims `member` (and its first unvisited spouse) as a new unit.
    fn open_unit(&mut self, member: &'a str) -> PendingUnit<'a> {
        self.visited.insert(member);
        let mut partners = vec![member];
        let spouse = self
            .index
            .spouses(member)
            .iter()
            .copied()
            .find(|spouse| !self.visited.contains(spouse));
        if let Some(spouse) = spouse {
            self.visited.insert(spouse);
            partners.push(spouse);
        }

        let mut child_ids: Vec<&'a str> = Vec::new();
        for partner in &partners {
            for &child in self.index.children(partner) {
                push_unique(&mut child_ids, child);
            }
        }

        let id = self.forest.units.len();
        self.forest.units.push(FamilyUnit {
            id,
            partners,
            children: Vec::new(),
        });
        PendingUnit {
            unit: id,
            child_ids,
            next: 0,
        }
    }

    /// Depth-first build of the tree rooted at `root`. A child is skipped if
    /// any earlier branch already claimed it.
    fn build_tree(&mut self, root: &'a str) -> usize {
        let root_unit = self.open_unit(root);
        let root_id = root_unit.unit;
        let mut stack = vec![root_unit];
        while let Some(top) = stack.last_mut() {
            let Some(&child) = top.child_ids.get(top.next) else {
                stack.pop();
                continue;
            };
            top.next += 1;
            let parent = top.unit;
            if self.visited.contains(child) {
                continue;
            }
            let pending = self.open_unit(child);
            self.forest.units[parent].children.push(pending.unit);
            stack.push(pending);
        }
        root_id
    }
}

pub(crate) fn build_forest<'a>(
    members: &'a [Member],
    edges: &'a [RelationshipEdge],
) -> FamilyForest<'a> {
    let mut builder = ForestBuilder {
        index: RelationIndex::new(members, edges),
        visited: HashSet::new(),
        forest: FamilyForest::default(),
    };

    let (deferred, primary): (Vec<&str>, Vec<&str>) = members
        .iter()
        .map(|member| member.id.as_str())
        .filter(|id| builder.index.is_root(id))
        .partition(|id| builder.index.married_in(id));

    for root in primary.into_iter().chain(deferred) {
        if builder.visited.contains(root) {
            continue;
        }
        let tree = builder.build_tree(root);
        builder.forest.roots.push(tree);
    }

    // Orphans and members caught in parent cycles with no root above them.
    for member in members {
        let id = member.id.as_str();
        if builder.visited.contains(id) {
            continue;
        }
        let tree = builder.build_tree(id);
        builder.forest.roots.push(tree);
    }

    builder.forest
}
