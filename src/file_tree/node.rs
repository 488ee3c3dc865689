//! Arena-backed tree of filesystem entries.
//!
//! This module provides `Tree`, which owns every node of a filtered filesystem
//! view. Nodes are addressed by generational `NodeId`s: parents own their
//! children through the arena, children refer back to their parent by id, and
//! an id whose node has been removed never resolves to a newer node.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::sync::NodeWatch;

/// Sort key derived from a display name.
///
/// Case-folded with accents stripped, so `élan.png` sorts among the `e`
/// names. Digit runs compare by numeric value so that `img2.png` sorts
/// before `img10.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollationKey {
    folded: String,
    original: String,
}

impl CollationKey {
    /// Derive the key for a display name.
    pub fn new(display_name: &str) -> Self {
        let stripped: String = display_name.nfd().filter(|c| !is_combining_mark(*c)).collect();
        Self {
            folded: stripped.to_lowercase(),
            original: display_name.to_owned(),
        }
    }

    /// The folded form used for comparisons.
    pub fn as_str(&self) -> &str {
        &self.folded
    }
}

impl Ord for CollationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        alphanumeric_sort::compare_str(&self.folded, &other.folded)
            .then_with(|| self.folded.cmp(&other.folded))
            .then_with(|| self.original.cmp(&other.original))
    }
}

impl PartialOrd for CollationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Metadata for an entry that passed the viewability filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    path: PathBuf,
    display_name: String,
    collation_key: CollationKey,
    is_directory: bool,
}

impl NodeData {
    /// Create entry data; the collation key is derived from `display_name`.
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>, is_directory: bool) -> Self {
        let display_name = display_name.into();
        Self {
            path: path.into(),
            collation_key: CollationKey::new(&display_name),
            display_name,
            is_directory,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn collation_key(&self) -> &CollationKey {
        &self.collation_key
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }
}

/// Handle to a node stored in a `Tree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// A single node of the tree.
#[derive(Debug)]
pub struct Node {
    data: Option<NodeData>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    watch: Option<NodeWatch>,
}

impl Node {
    fn new(data: Option<NodeData>, parent: Option<NodeId>) -> Self {
        Self {
            data,
            parent,
            children: Vec::new(),
            watch: None,
        }
    }

    /// Entry data; `None` only for an anonymous root.
    pub fn data(&self) -> Option<&NodeData> {
        self.data.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The live watch attached to this node, if any.
    pub fn watch(&self) -> Option<&NodeWatch> {
        self.watch.as_ref()
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Filtered, sorted mirror of part of a filesystem.
///
/// A tree is either *rooted* (its root is a real directory), *anonymous*
/// (its root carries no data and its children are unrelated top-level
/// entries) or *empty* (no root, e.g. after the root directory was deleted).
#[derive(Debug, Default)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: Option<NodeId>,
    len: usize,
}

impl Tree {
    /// Create an empty tree without a root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree whose root carries `data`.
    pub fn with_root(data: NodeData) -> Self {
        let mut tree = Self::new();
        let root = tree.alloc(Node::new(Some(data), None));
        tree.root = Some(root);
        tree
    }

    /// Create a tree with an anonymous root.
    pub fn anonymous() -> Self {
        let mut tree = Self::new();
        let root = tree.alloc(Node::new(None, None));
        tree.root = Some(root);
        tree
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of live nodes, the root included.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree has no root at all.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Whether `id` refers to a live node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.get(id).and_then(Node::data)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    /// Children of `id` in sibling order; empty for stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    /// A leaf is a viewable file. Directories, empty or not, are never leaves.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.data(id).is_some_and(|data| !data.is_directory())
    }

    pub fn is_directory(&self, id: NodeId) -> bool {
        self.data(id).is_some_and(NodeData::is_directory)
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.root == Some(id) && self.contains(id)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let position = siblings.iter().position(|sibling| *sibling == id)?;
        siblings.get(position + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let position = siblings.iter().position(|sibling| *sibling == id)?;
        position.checked_sub(1).and_then(|p| siblings.get(p).copied())
    }

    /// Whether `ancestor` is `node` or lies on its path to the root.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Pre-order walk of the subtree rooted at `id`, `id` included.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        Descendants { tree: self, stack }
    }

    /// Pre-order walk of the whole tree.
    pub fn iter(&self) -> Descendants<'_> {
        match self.root {
            Some(root) => self.descendants(root),
            None => Descendants {
                tree: self,
                stack: Vec::new(),
            },
        }
    }

    pub fn watch(&self, id: NodeId) -> Option<&NodeWatch> {
        self.get(id).and_then(Node::watch)
    }

    /// Attach a watch to `id`, releasing any watch it already held.
    pub(crate) fn set_watch(&mut self, id: NodeId, watch: NodeWatch) {
        if let Some(node) = self.get_mut(id) {
            node.watch = Some(watch);
        }
    }

    /// Release the watch held by `id`, if any.
    pub(crate) fn clear_watch(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.watch = None;
        }
    }

    /// Append `data` as the last child of `parent`.
    pub(crate) fn push_child(&mut self, parent: NodeId, data: NodeData) -> Option<NodeId> {
        self.get(parent)?;
        let child = self.alloc(Node::new(Some(data), Some(parent)));
        self.get_mut(parent)?.children.push(child);
        Some(child)
    }

    /// Move every node of `subtree` into this tree, attaching its root as the
    /// child of `parent` at `position`.
    pub(crate) fn graft(&mut self, parent: NodeId, position: usize, mut subtree: Tree) -> Option<NodeId> {
        self.get(parent)?;
        let top = subtree.root.take()?;

        let mut adopted = None;
        let mut pending = vec![(top, parent)];
        while let Some((old_id, new_parent)) = pending.pop() {
            let Some(mut node) = subtree.take(old_id) else {
                continue;
            };
            let old_children = std::mem::take(&mut node.children);
            node.parent = Some(new_parent);
            let new_id = self.alloc(node);

            if adopted.is_some() {
                if let Some(parent_node) = self.get_mut(new_parent) {
                    parent_node.children.push(new_id);
                }
            } else {
                adopted = Some(new_id);
            }
            pending.extend(old_children.into_iter().rev().map(|child| (child, new_id)));
        }

        let adopted = adopted?;
        let children = &mut self.get_mut(parent)?.children;
        let position = position.min(children.len());
        children.insert(position, adopted);
        Some(adopted)
    }

    /// Unlink `id` from its parent and free it with its whole subtree.
    ///
    /// Children are released before their parents and every node drops its
    /// watch before its slot is freed. Removing the root empties the tree.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<NodeData> {
        let parent = self.get(id)?.parent;
        match parent {
            Some(parent) => {
                if let Some(parent_node) = self.get_mut(parent) {
                    parent_node.children.retain(|child| *child != id);
                }
            }
            None => {
                if self.root == Some(id) {
                    self.root = None;
                }
            }
        }

        let doomed: Vec<NodeId> = self.descendants(id).collect();
        let mut removed = None;
        for node_id in doomed.into_iter().rev() {
            if let Some(mut node) = self.take(node_id) {
                drop(node.watch.take());
                if node_id == id {
                    removed = node.data;
                }
            }
        }
        removed
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId { index, generation: 0 }
    }

    fn take(&mut self, id: NodeId) -> Option<Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(node)
    }
}

/// Pre-order iterator over node ids.
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
