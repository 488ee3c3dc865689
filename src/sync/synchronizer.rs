//! Live tree that follows filesystem changes.
//!
//! The `Synchronizer` owns a tree and the watches attached to its nodes.
//! Events are applied one at a time on the owner's thread:
//! - a created entry is run through the filters of the watch that saw it,
//!   built (directories are scanned fresh) and inserted in sorted position;
//!   a path that is already in the tree is left alone and not reported
//! - a deleted entry is removed with its whole subtree, releasing the
//!   watches inside it
//!
//! After each change the application callback receives a `ChangeNotice`.

use std::path::Path;

use crate::file_tree::{
    leaf_index, locator, navigator, order, Builder, FileSystem, LoadOptions, LocalFileSystem,
    NodeData, NodeId, Tree, TreeError, Viewability,
};
use crate::sync::watcher::{FileChangeEvent, FileChangeKind, FileWatcher, NodeWatch};

/// Callback invoked after every applied change.
pub type ChangeCallback = Box<dyn FnMut(&ChangeNotice<'_>)>;

/// Describes one applied change.
#[derive(Debug)]
pub struct ChangeNotice<'a> {
    /// What happened.
    pub kind: FileChangeKind,
    /// The path reported by the watcher.
    pub path: &'a Path,
    /// For creations, the node now in the tree for `path`, or `None` when the
    /// entry was filtered out or vanished. For deletions, the id of the
    /// removed node; it no longer resolves in `tree`.
    pub node: Option<NodeId>,
    /// For deletions, the leaf that followed the removed node and survived.
    pub successor: Option<NodeId>,
    /// The current root; `None` once the root itself was deleted.
    pub root: Option<NodeId>,
    /// The tree after the change.
    pub tree: &'a Tree,
}

impl ChangeNotice<'_> {
    /// Data of the affected node, if it is still in the tree.
    pub fn node_data(&self) -> Option<&NodeData> {
        self.node.and_then(|id| self.tree.data(id))
    }
}

/// A tree kept in step with the filesystem.
pub struct Synchronizer {
    tree: Tree,
    watcher: FileWatcher,
    fs: Box<dyn FileSystem>,
    options: LoadOptions,
    on_change: Option<ChangeCallback>,
}

impl Synchronizer {
    /// Load `path` and follow its changes. `Ok(None)` when nothing at `path`
    /// is viewable.
    ///
    /// # Arguments
    /// * `path` - A directory, or a file to be shown within its folder
    /// * `options` - Filters for the initial scan and for later changes
    /// * `watcher` - Where watches are registered
    /// * `on_change` - Called after each applied change
    pub fn open_path(
        path: impl AsRef<Path>,
        options: LoadOptions,
        watcher: FileWatcher,
        on_change: impl FnMut(&ChangeNotice<'_>) + 'static,
    ) -> Result<Option<Self>, TreeError> {
        SynchronizerBuilder::new(watcher)
            .options(options)
            .on_change(on_change)
            .open_path(path)
    }

    /// Load a list of paths below an anonymous root and follow their changes.
    pub fn open_paths<P: AsRef<Path>>(
        paths: &[P],
        options: LoadOptions,
        watcher: FileWatcher,
        on_change: impl FnMut(&ChangeNotice<'_>) + 'static,
    ) -> Self {
        SynchronizerBuilder::new(watcher)
            .options(options)
            .on_change(on_change)
            .open_paths(paths)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn watcher(&self) -> &FileWatcher {
        &self.watcher
    }

    pub fn options(&self) -> LoadOptions {
        self.options
    }

    /// Replace the change callback.
    pub fn set_on_change(&mut self, on_change: impl FnMut(&ChangeNotice<'_>) + 'static) {
        self.on_change = Some(Box::new(on_change));
    }

    /// Stop following changes and hand back the tree.
    pub fn into_tree(mut self) -> Tree {
        let nodes: Vec<NodeId> = self.tree.iter().collect();
        for id in nodes {
            self.tree.clear_watch(id);
        }
        self.tree
    }

    /// Apply every event the watcher has received so far.
    ///
    /// Returns the number of events applied.
    pub fn poll_events(&mut self) -> usize {
        let events = self.watcher.poll_events();
        let count = events.len();
        for routed in events {
            self.apply_event(&routed.watched, &routed.event);
        }
        count
    }

    /// Apply one event seen by the watch on `watched`.
    pub fn apply_event(&mut self, watched: &Path, event: &FileChangeEvent) {
        match event.kind {
            FileChangeKind::Created => self.apply_created(watched, &event.path),
            FileChangeKind::Deleted => self.apply_deleted(&event.path),
        }
    }

    fn apply_created(&mut self, watched: &Path, path: &Path) {
        let Some(parent) = locator::find_from_root(&self.tree, watched) else {
            tracing::debug!("{} is gone from the tree, ignoring {}", watched.display(), path.display());
            return;
        };
        let Some(flags) = self.tree.watch(parent).map(NodeWatch::flags) else {
            tracing::debug!("{} is not watched, ignoring {}", watched.display(), path.display());
            return;
        };

        let builder = Builder::new(self.fs.as_ref(), flags);
        let node = match builder.classify(path) {
            Ok(Viewability::Hidden) => {
                tracing::trace!("Ignoring hidden {}", path.display());
                return;
            }
            Ok(Viewability::Viewable(data)) if !data.is_directory() || flags.include_directories => {
                let is_directory = data.is_directory();
                let subtree = builder.subtree(data);
                match order::insert(&mut self.tree, parent, subtree) {
                    Some(id) => {
                        tracing::debug!("Added {}", path.display());
                        if is_directory && flags.recursive {
                            self.watch_directories(id, flags);
                        }
                        Some(id)
                    }
                    None => {
                        tracing::trace!("{} is already in the tree", path.display());
                        return;
                    }
                }
            }
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Created entry is not readable: {}", e);
                None
            }
        };

        self.notify(FileChangeKind::Created, path, node, None);
    }

    fn apply_deleted(&mut self, path: &Path) {
        let Some(target) = locator::find_from_root(&self.tree, path) else {
            tracing::trace!("{} is not in the tree", path.display());
            return;
        };

        let successor = surviving_successor(&self.tree, target);
        self.tree.remove(target);
        tracing::debug!("Removed {}", path.display());

        self.notify(FileChangeKind::Deleted, path, Some(target), successor);
    }

    fn notify(
        &mut self,
        kind: FileChangeKind,
        path: &Path,
        node: Option<NodeId>,
        successor: Option<NodeId>,
    ) {
        let Some(callback) = self.on_change.as_mut() else {
            return;
        };
        let notice = ChangeNotice {
            kind,
            path,
            node,
            successor,
            root: self.tree.root(),
            tree: &self.tree,
        };
        callback(&notice);
    }

    /// Watch the directories of a freshly loaded tree.
    ///
    /// A rooted tree watches its root; a path list watches each top-level
    /// directory and each top-level file. Subdirectories are watched too
    /// when `recursive` is set.
    fn attach_watches(&mut self) {
        let Some(root) = self.tree.root() else {
            return;
        };
        let flags = self.options;
        if self.tree.data(root).is_some() {
            self.watch_directories(root, flags);
            return;
        }
        let top_level = self.tree.children(root).to_vec();
        for id in top_level {
            if self.tree.is_directory(id) {
                self.watch_directories(id, flags);
            } else {
                self.watch_node(id, flags);
            }
        }
    }

    fn watch_directories(&mut self, top: NodeId, flags: LoadOptions) {
        let targets: Vec<NodeId> = if flags.recursive {
            self.tree
                .descendants(top)
                .filter(|id| self.tree.is_directory(*id))
                .collect()
        } else {
            vec![top]
        };
        for id in targets {
            self.watch_node(id, flags);
        }
    }

    fn watch_node(&mut self, id: NodeId, flags: LoadOptions) {
        let Some(path) = self.tree.data(id).map(|data| data.path().to_path_buf()) else {
            return;
        };
        if let Some(handle) = self.watcher.watch(&path) {
            self.tree.set_watch(id, NodeWatch::new(handle, flags));
        }
    }
}

/// The first leaf after `target` that lies outside its subtree.
fn surviving_successor(tree: &Tree, target: NodeId) -> Option<NodeId> {
    let total = leaf_index::leaf_count(tree);
    let mut current = target;
    for _ in 0..=total {
        let next = navigator::next(tree, current)?;
        if next == current {
            return None;
        }
        if tree.is_leaf(next) && !tree.is_ancestor_or_self(target, next) {
            return Some(next);
        }
        current = next;
    }
    None
}

/// Builder for `Synchronizer` with sensible defaults.
pub struct SynchronizerBuilder {
    watcher: FileWatcher,
    options: LoadOptions,
    fs: Box<dyn FileSystem>,
    on_change: Option<ChangeCallback>,
}

impl SynchronizerBuilder {
    pub fn new(watcher: FileWatcher) -> Self {
        Self {
            watcher,
            options: LoadOptions::default(),
            fs: Box::new(LocalFileSystem),
            on_change: None,
        }
    }

    pub fn options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn file_system(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    pub fn on_change(mut self, on_change: impl FnMut(&ChangeNotice<'_>) + 'static) -> Self {
        self.on_change = Some(Box::new(on_change));
        self
    }

    /// Load `path` and start watching it. `Ok(None)` when nothing at `path`
    /// is viewable.
    pub fn open_path(self, path: impl AsRef<Path>) -> Result<Option<Synchronizer>, TreeError> {
        let tree = Builder::new(self.fs.as_ref(), self.options).load_path(path.as_ref())?;
        Ok(tree.map(|tree| self.finish(tree)))
    }

    pub fn open_paths<P: AsRef<Path>>(self, paths: &[P]) -> Synchronizer {
        let tree = Builder::new(self.fs.as_ref(), self.options).load_paths(paths);
        self.finish(tree)
    }

    fn finish(self, tree: Tree) -> Synchronizer {
        let mut sync = Synchronizer {
            tree,
            watcher: self.watcher,
            fs: self.fs,
            options: self.options,
            on_change: self.on_change,
        };
        sync.attach_watches();
        sync
    }
}
