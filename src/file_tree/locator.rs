//! Path lookup.

use std::path::Path;

use super::node::{NodeId, Tree};

/// Find the node whose path is `target`, searching outward from `start`.
///
/// The whole tree is walked in pre-order beginning at `start` and wrapping
/// around at the root, so nodes above and beside `start` are found too.
/// Directories and the root are matched as well as files.
pub fn find(tree: &Tree, start: NodeId, target: &Path) -> Option<NodeId> {
    if !tree.contains(start) {
        return None;
    }

    let mut current = start;
    loop {
        if tree.data(current).is_some_and(|data| data.path() == target) {
            return Some(current);
        }
        current = successor(tree, current)?;
        if current == start {
            return None;
        }
    }
}

/// Find `target` starting from the root.
pub fn find_from_root(tree: &Tree, target: &Path) -> Option<NodeId> {
    find(tree, tree.root()?, target)
}

/// Pre-order successor, wrapping from the last node back to the root.
fn successor(tree: &Tree, node: NodeId) -> Option<NodeId> {
    if let Some(child) = tree.first_child(node) {
        return Some(child);
    }
    let mut current = node;
    loop {
        if let Some(sibling) = tree.next_sibling(current) {
            return Some(sibling);
        }
        match tree.parent(current) {
            Some(parent) => current = parent,
            None => return Some(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_tree::node::NodeData;

    fn entry(path: &str, is_directory: bool) -> NodeData {
        let name = Path::new(path).file_name().unwrap().to_string_lossy().into_owned();
        NodeData::new(path, name, is_directory)
    }

    struct Sample {
        tree: Tree,
        a: NodeId,
        d1: NodeId,
        b: NodeId,
        empty: NodeId,
    }

    fn sample() -> Sample {
        let mut tree = Tree::with_root(entry("/g", true));
        let root = tree.root().unwrap();
        let a = tree.push_child(root, entry("/g/a.png", false)).unwrap();
        let d1 = tree.push_child(root, entry("/g/d1", true)).unwrap();
        let b = tree.push_child(d1, entry("/g/d1/b.png", false)).unwrap();
        let empty = tree.push_child(root, entry("/g/empty", true)).unwrap();
        Sample { tree, a, d1, b, empty }
    }

    #[test]
    fn test_find_from_any_start() {
        let s = sample();
        let root = s.tree.root().unwrap();
        for start in [root, s.a, s.d1, s.b, s.empty] {
            assert_eq!(find(&s.tree, start, Path::new("/g/d1/b.png")), Some(s.b));
            assert_eq!(find(&s.tree, start, Path::new("/g/a.png")), Some(s.a));
            assert_eq!(find(&s.tree, start, Path::new("/g/d1")), Some(s.d1));
            assert_eq!(find(&s.tree, start, Path::new("/g")), Some(root));
        }
    }

    #[test]
    fn test_find_missing() {
        let s = sample();
        assert_eq!(find(&s.tree, s.b, Path::new("/g/nope.png")), None);
        assert_eq!(find_from_root(&s.tree, Path::new("/elsewhere")), None);
    }

    #[test]
    fn test_find_from_stale_start() {
        let mut s = sample();
        s.tree.remove(s.a);
        assert_eq!(find(&s.tree, s.a, Path::new("/g/d1/b.png")), None);
        assert_eq!(find_from_root(&Tree::new(), Path::new("/g")), None);
    }

    #[test]
    fn test_anonymous_root_is_never_matched() {
        let mut tree = Tree::anonymous();
        let root = tree.root().unwrap();
        let x = tree.push_child(root, entry("/a/x.png", false)).unwrap();
        assert_eq!(find(&tree, x, Path::new("/a/x.png")), Some(x));
        assert_eq!(find(&tree, root, Path::new("")), None);
    }
}
