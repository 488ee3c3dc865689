//! Circular stepping over the leaves of a tree.
//!
//! Traversal is depth-first in sibling order. Directories, including empty
//! ones, are passed through but never returned; stepping past the last leaf
//! wraps around to the first one and vice versa.

use super::node::{NodeId, Tree};

/// Direction of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Whether the walk may descend into the current node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Course {
    Advance,
    Retreat,
}

/// The leaf after `node`, wrapping around.
///
/// Returns `node` itself when it is the only leaf, or when the tree has no
/// leaves at all. `None` for a stale id.
pub fn next(tree: &Tree, node: NodeId) -> Option<NodeId> {
    step(tree, node, Direction::Forward)
}

/// The leaf before `node`, wrapping around.
pub fn prev(tree: &Tree, node: NodeId) -> Option<NodeId> {
    step(tree, node, Direction::Backward)
}

/// The first leaf of the tree; the root when there are no leaves.
pub fn first(tree: &Tree) -> Option<NodeId> {
    next(tree, tree.root()?)
}

/// The last leaf of the tree; the root when there are no leaves.
pub fn last(tree: &Tree) -> Option<NodeId> {
    prev(tree, tree.root()?)
}

/// Step `node` in `direction`.
pub fn step(tree: &Tree, node: NodeId, direction: Direction) -> Option<NodeId> {
    if !tree.contains(node) {
        return None;
    }

    let (mut cursor, mut course) = if tree.is_root(node) || tree.has_children(node) {
        (edge_child(tree, node, direction), Course::Advance)
    } else {
        move_on(tree, node, direction)
    };

    loop {
        let current = match cursor {
            Some(current) if current != node => current,
            _ => return Some(node),
        };
        if tree.is_leaf(current) {
            return Some(current);
        }

        (cursor, course) = if tree.is_root(current)
            || (course == Course::Advance && tree.has_children(current))
        {
            (edge_child(tree, current, direction), Course::Advance)
        } else {
            move_on(tree, current, direction)
        };
    }
}

/// Go to the sibling in `direction`, or climb to the parent when there is none.
fn move_on(tree: &Tree, node: NodeId, direction: Direction) -> (Option<NodeId>, Course) {
    match sibling(tree, node, direction) {
        Some(sibling) => (Some(sibling), Course::Advance),
        None => (tree.parent(node), Course::Retreat),
    }
}

fn edge_child(tree: &Tree, node: NodeId, direction: Direction) -> Option<NodeId> {
    match direction {
        Direction::Forward => tree.first_child(node),
        Direction::Backward => tree.last_child(node),
    }
}

fn sibling(tree: &Tree, node: NodeId, direction: Direction) -> Option<NodeId> {
    match direction {
        Direction::Forward => tree.next_sibling(node),
        Direction::Backward => tree.prev_sibling(node),
    }
}
