//! Browsing cursor for an image viewer.
//!
//! This module provides `BrowseCursor`, which remembers the image currently
//! shown, steps through the tree, and re-anchors itself when change notices
//! remove or add images underneath it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::file_tree::{leaf_count, leaf_position, locator, navigator, LeafPosition, NodeId, Tree};
use crate::sync::{ChangeNotice, FileChangeKind};

/// Current position of a viewer within a tree.
#[derive(Debug, Clone, Default)]
pub struct BrowseCursor {
    /// The node being shown.
    current: Option<NodeId>,
    /// Paths that changed since the last redraw.
    dirty_paths: HashSet<PathBuf>,
    /// Whether the shown image itself changed.
    needs_full_redraw: bool,
}

impl BrowseCursor {
    /// Create a cursor that shows nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cursor on the first image of `tree`.
    pub fn at_first(tree: &Tree) -> Self {
        Self {
            current: first_leaf(tree),
            ..Self::default()
        }
    }

    /// The node being shown, if it is still in `tree`.
    pub fn current(&self, tree: &Tree) -> Option<NodeId> {
        self.current.filter(|id| tree.contains(*id))
    }

    /// Path of the node being shown.
    pub fn current_path<'t>(&self, tree: &'t Tree) -> Option<&'t Path> {
        self.current(tree)
            .and_then(|id| tree.data(id))
            .map(|data| data.path())
    }

    /// Move to the next image, wrapping around.
    pub fn advance(&mut self, tree: &Tree) -> Option<NodeId> {
        self.step(tree, navigator::next)
    }

    /// Move to the previous image, wrapping around.
    pub fn retreat(&mut self, tree: &Tree) -> Option<NodeId> {
        self.step(tree, navigator::prev)
    }

    fn step(&mut self, tree: &Tree, step: fn(&Tree, NodeId) -> Option<NodeId>) -> Option<NodeId> {
        let target = match self.current(tree) {
            Some(current) => step(tree, current).filter(|id| tree.is_leaf(*id)),
            None => first_leaf(tree),
        };
        if target != self.current {
            self.needs_full_redraw = true;
        }
        self.current = target;
        target
    }

    /// Show the entry at `path`.
    ///
    /// A directory resolves to the first image found from it. Returns `None`
    /// and keeps the current position when nothing matches.
    pub fn jump_to(&mut self, tree: &Tree, path: &Path) -> Option<NodeId> {
        let start = self.current(tree).or_else(|| tree.root())?;
        let found = locator::find(tree, start, path)?;
        let target = if tree.is_leaf(found) {
            found
        } else {
            navigator::next(tree, found).filter(|id| tree.is_leaf(*id))?
        };
        self.current = Some(target);
        self.needs_full_redraw = true;
        Some(target)
    }

    /// Position of the shown image among all images.
    pub fn position(&self, tree: &Tree) -> LeafPosition {
        match self.current(tree) {
            Some(current) => leaf_position(tree, current),
            None => LeafPosition {
                index: None,
                total: leaf_count(tree),
            },
        }
    }

    /// Update the cursor after a change was applied.
    pub fn apply(&mut self, notice: &ChangeNotice<'_>) {
        self.dirty_paths.insert(notice.path.to_path_buf());
        if let Some(parent) = notice.path.parent() {
            self.dirty_paths.insert(parent.to_path_buf());
        }

        let tree = notice.tree;
        match notice.kind {
            FileChangeKind::Deleted => {
                if self.current.is_some() && self.current(tree).is_none() {
                    tracing::debug!("Shown image was removed, moving on");
                    self.current = notice.successor.or_else(|| first_leaf(tree));
                    self.needs_full_redraw = true;
                }
            }
            FileChangeKind::Created => {
                if self.current(tree).is_none() {
                    self.current = notice
                        .node
                        .filter(|id| tree.is_leaf(*id))
                        .or_else(|| first_leaf(tree));
                    self.needs_full_redraw = self.current.is_some();
                }
            }
        }
    }

    /// Check if a path changed since the last redraw.
    pub fn is_dirty(&self, path: &Path) -> bool {
        self.dirty_paths.contains(path)
    }

    /// Whether anything changed since the last redraw.
    pub fn needs_redraw(&self) -> bool {
        self.needs_full_redraw || !self.dirty_paths.is_empty()
    }

    /// Whether the shown image itself changed.
    pub fn needs_full_redraw(&self) -> bool {
        self.needs_full_redraw
    }

    /// Clear the dirty state after redraw.
    pub fn clear_dirty(&mut self) {
        self.dirty_paths.clear();
        self.needs_full_redraw = false;
    }
}

fn first_leaf(tree: &Tree) -> Option<NodeId> {
    navigator::first(tree).filter(|id| tree.is_leaf(*id))
}
