//! Ordinal positions of leaves.

use super::node::{NodeId, Tree};

/// Position of a node among all leaves of its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafPosition {
    /// Zero-based index in navigation order; `None` when the node is not a leaf.
    pub index: Option<usize>,
    /// Number of leaves in the tree.
    pub total: usize,
}

/// Locate `node` among the leaves of `tree`.
///
/// A stale id yields no index and a total of zero.
pub fn leaf_position(tree: &Tree, node: NodeId) -> LeafPosition {
    if !tree.contains(node) {
        return LeafPosition {
            index: None,
            total: 0,
        };
    }

    let mut index = None;
    let mut total = 0;
    for id in tree.iter().filter(|id| tree.is_leaf(*id)) {
        if id == node {
            index = Some(total);
        }
        total += 1;
    }
    LeafPosition { index, total }
}

/// Number of leaves in `tree`.
pub fn leaf_count(tree: &Tree) -> usize {
    tree.iter().filter(|id| tree.is_leaf(*id)).count()
}
