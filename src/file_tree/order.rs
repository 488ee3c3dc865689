//! Sibling ordering and sorted insertion.
//!
//! Siblings are kept files first, then directories, each group ascending by
//! collation key.

use std::cmp::Ordering;
use std::path::Path;

use super::node::{NodeData, NodeId, Tree};

/// Whether `a` sorts strictly before `b` among siblings.
pub fn less_than(a: &NodeData, b: &NodeData) -> bool {
    compare(a, b) == Ordering::Less
}

/// Total order over siblings.
pub fn compare(a: &NodeData, b: &NodeData) -> Ordering {
    a.is_directory()
        .cmp(&b.is_directory())
        .then_with(|| a.collation_key().cmp(b.collation_key()))
}

/// The child of `parent` whose path is exactly `path`.
pub fn child_with_path(tree: &Tree, parent: NodeId, path: &Path) -> Option<NodeId> {
    tree.children(parent)
        .iter()
        .copied()
        .find(|child| tree.data(*child).is_some_and(|data| data.path() == path))
}

/// Insert `subtree` below `parent`, keeping sibling order.
///
/// Returns the id of the inserted root, or `None` (leaving `tree` untouched)
/// when `parent` is stale or a file, when `subtree` has no root data, or when
/// `parent` already has a child with the same path.
pub fn insert(tree: &mut Tree, parent: NodeId, subtree: Tree) -> Option<NodeId> {
    let new_data = subtree.root().and_then(|root| subtree.data(root))?.clone();
    if !tree.contains(parent) || tree.is_leaf(parent) {
        return None;
    }
    if child_with_path(tree, parent, new_data.path()).is_some() {
        tracing::trace!("{} is already in the tree", new_data.path().display());
        return None;
    }

    let siblings = tree.children(parent);
    let position = siblings
        .iter()
        .position(|sibling| {
            tree.data(*sibling)
                .map_or(true, |data| !less_than(data, &new_data))
        })
        .unwrap_or(siblings.len());

    tree.graft(parent, position, subtree)
}

/// Insert a single node below `parent`. See [`insert`].
pub fn insert_node(tree: &mut Tree, parent: NodeId, data: NodeData) -> Option<NodeId> {
    insert(tree, parent, Tree::with_root(data))
}
