//! Reingold–Tilford tidy tree, in the linear-time form of Buchheim, Jünger and
//! Leipert ("Improving Walker's Algorithm to Run in Linear Time", 2002).
//!
//! Nodes are family units. Separation is measured between unit centers and
//! widened by half the partner spacing for every couple involved, so a couple
//! unit occupies its full two-card width on the contour.
//!
//! Both walks run over an explicit stack or the pre-order node array, so
//! the depth of a lineage never grows the call stack.
//!
//! 1. First walk (post-order): preliminary x per node, merging subtree contours
//!    through threads and shifting right subtrees apart.
//! 2. Second walk (pre-order): accumulate modifiers into final x.

use crate::config::LayoutConfig;

use super::error::{LayoutError, Result};
use super::hierarchy::FamilyForest;

#[derive(Debug, Clone, Copy)]
pub(crate) struct TidyConfig {
    pub node_width: f32,
    pub row_height: f32,
    pub sibling_separation: f32,
    pub subtree_separation: f32,
    /// Extra half-width contributed by a couple unit.
    pub couple_extra: f32,
}

impl TidyConfig {
    pub fn from_layout(config: &LayoutConfig) -> Self {
        Self {
            node_width: config.node_width,
            row_height: config.row_height,
            sibling_separation: config.sibling_separation,
            subtree_separation: config.subtree_separation,
            couple_extra: config.partner_spacing / 2.0,
        }
    }
}

/// Final point of one family unit, relative to its tree's root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct UnitPoint {
    pub unit: usize,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
struct TidyNode {
    unit: usize,
    couple: bool,
    depth: usize,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Left-to-right index among siblings.
    number: usize,
    prelim: f32,
    modifier: f32,
    shift: f32,
    change: f32,
    thread: Option<usize>,
    ancestor: usize,
    /// Default ancestor used while apportioning this node's children.
    default_ancestor: Option<usize>,
    x: f32,
}

struct TidyTree {
    nodes: Vec<TidyNode>,
    config: TidyConfig,
}

pub(crate) fn layout_tree(
    forest: &FamilyForest<'_>,
    root: usize,
    config: &TidyConfig,
) -> Result<Vec<UnitPoint>> {
    let mut tree = TidyTree {
        nodes: Vec::new(),
        config: *config,
    };
    tree.push_tree(forest, root);
    if tree.nodes.is_empty() {
        return Err(LayoutError::BrokenContour { unit: root });
    }
    tree.first_walk()?;
    let root_offset = -tree.nodes[0].prelim;
    tree.second_walk(root_offset);

    Ok(tree
        .nodes
        .iter()
        .map(|node| UnitPoint {
            unit: node.unit,
            x: node.x,
            y: node.depth as f32 * config.row_height,
        })
        .collect())
}

impl TidyTree {
    /// Copies the tree under `root` into `nodes` in pre-order, so a parent's
    /// index is always below its children's.
    fn push_tree(&mut self, forest: &FamilyForest<'_>, root: usize) {
        let mut stack: Vec<(usize, Option<usize>, usize, usize)> = vec![(root, None, 0, 0)];
        while let Some((unit_id, parent, depth, number)) = stack.pop() {
            let Some(unit) = forest.unit(unit_id) else {
                continue;
            };
            let idx = self.nodes.len();
            self.nodes.push(TidyNode {
                unit: unit.id,
                couple: unit.is_couple(),
                depth,
                parent,
                children: Vec::with_capacity(unit.children.len()),
                number,
                prelim: 0.0,
                modifier: 0.0,
                shift: 0.0,
                change: 0.0,
                thread: None,
                ancestor: idx,
                default_ancestor: None,
                x: 0.0,
            });
            if let Some(parent) = parent {
                self.nodes[parent].children.push(idx);
            }
            for (number, &child) in unit.children.iter().enumerate().rev() {
                stack.push((child, Some(idx), depth + 1, number));
            }
        }
    }

    /// Post-order over the whole tree; left siblings finish before right ones.
    fn first_walk(&mut self) -> Result<()> {
        let mut stack = vec![(0usize, false)];
        while let Some((v, expanded)) = stack.pop() {
            if expanded {
                self.place_node(v)?;
                continue;
            }
            stack.push((v, true));
            stack.extend(self.nodes[v].children.iter().rev().map(|&child| (child, false)));
        }
        Ok(())
    }

    fn place_node(&mut self, v: usize) -> Result<()> {
        let first = self.nodes[v].children.first().copied();
        let last = self.nodes[v].children.last().copied();
        let left = self.left_sibling(v);
        if let (Some(first), Some(last)) = (first, last) {
            self.execute_shifts(v);
            let midpoint = (self.nodes[first].prelim + self.nodes[last].prelim) / 2.0;
            if let Some(w) = left {
                let prelim = self.nodes[w].prelim + self.separation(w, v);
                self.nodes[v].prelim = prelim;
                self.nodes[v].modifier = prelim - midpoint;
            } else {
                self.nodes[v].prelim = midpoint;
            }
        } else if let Some(w) = left {
            self.nodes[v].prelim = self.nodes[w].prelim + self.separation(w, v);
        }

        if let Some(parent) = self.nodes[v].parent {
            let first_sibling = self.nodes[parent].children[0];
            let ancestor = self.nodes[parent].default_ancestor.unwrap_or(first_sibling);
            let ancestor = self.apportion(v, left, ancestor)?;
            self.nodes[parent].default_ancestor = Some(ancestor);
        }
        Ok(())
    }

    /// Pre-order by construction: every parent's modifier is final before its children read it.
    fn second_walk(&mut self, root_offset: f32) {
        for v in 0..self.nodes.len() {
            let inherited = match self.nodes[v].parent {
                Some(parent) => self.nodes[parent].modifier,
                None => root_offset,
            };
            let node = &mut self.nodes[v];
            node.x = node.prelim + inherited;
            node.modifier += inherited;
        }
    }

    fn apportion(&mut self, v: usize, left: Option<usize>, mut ancestor: usize) -> Result<usize> {
        let Some(w) = left else {
            return Ok(ancestor);
        };
        let broken = LayoutError::BrokenContour {
            unit: self.nodes[v].unit,
        };
        let parent = self.nodes[v].parent.ok_or_else(|| broken.clone())?;

        // i = inner, o = outer, p = right subtree (v), m = left forest.
        let mut vip = v;
        let mut vop = v;
        let mut vim = w;
        let mut vom = self.nodes[parent].children[0];
        let mut sip = self.nodes[vip].modifier;
        let mut sop = self.nodes[vop].modifier;
        let mut sim = self.nodes[vim].modifier;
        let mut som = self.nodes[vom].modifier;

        let mut next_im = self.next_right(vim);
        let mut next_ip = self.next_left(vip);
        while let (Some(im), Some(ip)) = (next_im, next_ip) {
            vim = im;
            vip = ip;
            vom = self.next_left(vom).ok_or_else(|| broken.clone())?;
            vop = self.next_right(vop).ok_or_else(|| broken.clone())?;
            self.nodes[vop].ancestor = v;
            let shift = self.nodes[vim].prelim + sim - self.nodes[vip].prelim - sip
                + self.separation(vim, vip);
            if shift > 0.0 {
                let wm = self.next_ancestor(vim, v, ancestor);
                self.move_subtree(wm, v, shift)?;
                sip += shift;
                sop += shift;
            }
            sim += self.nodes[vim].modifier;
            sip += self.nodes[vip].modifier;
            som += self.nodes[vom].modifier;
            sop += self.nodes[vop].modifier;
            next_im = self.next_right(vim);
            next_ip = self.next_left(vip);
        }

        if let Some(im) = next_im
            && self.next_right(vop).is_none()
        {
            self.nodes[vop].thread = Some(im);
            self.nodes[vop].modifier += sim - sop;
        }
        if let Some(ip) = next_ip
            && self.next_left(vom).is_none()
        {
            self.nodes[vom].thread = Some(ip);
            self.nodes[vom].modifier += sip - som;
            ancestor = v;
        }
        Ok(ancestor)
    }

    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f32) -> Result<()> {
        let span = self.nodes[wp].number as f32 - self.nodes[wm].number as f32;
        if span <= 0.0 {
            return Err(LayoutError::DegenerateSiblingSpan {
                left: self.nodes[wm].unit,
                right: self.nodes[wp].unit,
            });
        }
        let change = shift / span;
        self.nodes[wp].change -= change;
        self.nodes[wp].shift += shift;
        self.nodes[wm].change += change;
        self.nodes[wp].prelim += shift;
        self.nodes[wp].modifier += shift;
        Ok(())
    }

    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0f32;
        let mut change = 0.0f32;
        let children = self.nodes[v].children.clone();
        for &w in children.iter().rev() {
            let node = &mut self.nodes[w];
            node.prelim += shift;
            node.modifier += shift;
            change += node.change;
            shift += node.shift + change;
        }
    }

    fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
        let candidate = self.nodes[vim].ancestor;
        if self.nodes[candidate].parent == self.nodes[v].parent {
            candidate
        } else {
            ancestor
        }
    }

    fn left_sibling(&self, v: usize) -> Option<usize> {
        let node = &self.nodes[v];
        let parent = node.parent?;
        if node.number == 0 {
            return None;
        }
        self.nodes[parent].children.get(node.number - 1).copied()
    }

    fn next_left(&self, v: usize) -> Option<usize> {
        self.nodes[v].children.first().copied().or(self.nodes[v].thread)
    }

    fn next_right(&self, v: usize) -> Option<usize> {
        self.nodes[v].children.last().copied().or(self.nodes[v].thread)
    }

    /// Minimum center distance between two horizontally adjacent units.
    fn separation(&self, left: usize, right: usize) -> f32 {
        let a = &self.nodes[left];
        let b = &self.nodes[right];
        let factor = if a.parent.is_some() && a.parent == b.parent {
            self.config.sibling_separation
        } else {
            self.config.subtree_separation
        };
        let extra = |node: &TidyNode| {
            if node.couple {
                self.config.couple_extra
            } else {
                0.0
            }
        };
        factor * self.config.node_width + extra(a) + extra(b)
    }
}
