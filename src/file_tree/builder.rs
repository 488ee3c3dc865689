//! Scanning the filesystem into a tree.
//!
//! The builder decides which entries are viewable:
//! - hidden entries only with `include_hidden`
//! - subdirectories only with `include_directories`, expanded recursively
//! - files only when their content type is in the registry
//!
//! Errors on the requested path are returned; errors on anything found below
//! it are logged and the entry is left out. Directory symlinks are followed
//! unless they lead back into a directory that is still being expanded.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::error::TreeError;
use super::mime::MimeRegistry;
use super::node::{NodeData, NodeId, Tree};
use super::options::LoadOptions;
use super::order;
use super::source::{FileInfo, FileKind, FileSystem, LocalFileSystem};

/// Outcome of running one entry through the filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewability {
    /// The entry belongs in the tree.
    Viewable(NodeData),
    /// Hidden, and hidden entries are excluded.
    Hidden,
    /// Neither a directory nor a file of a supported type.
    Unsupported,
}

/// Builds trees from a `FileSystem`.
pub struct Builder<'a> {
    fs: &'a dyn FileSystem,
    registry: &'a MimeRegistry,
    options: LoadOptions,
}

impl<'a> Builder<'a> {
    /// Create a builder using the process-wide content type registry.
    pub fn new(fs: &'a dyn FileSystem, options: LoadOptions) -> Self {
        Self {
            fs,
            registry: MimeRegistry::global(),
            options,
        }
    }

    /// Use `registry` instead of the process-wide one.
    pub fn registry(mut self, registry: &'a MimeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn options(&self) -> LoadOptions {
        self.options
    }

    /// Load the tree for a single path.
    ///
    /// The path is made absolute first. A directory becomes the root. A
    /// viewable file is shown in the context of its folder: the tree is built
    /// from its parent directory. An existing entry that the filters reject
    /// gives `Ok(None)`.
    pub fn load_path(&self, path: &Path) -> Result<Option<Tree>, TreeError> {
        let path = self.fs.resolve(path)?;
        let info = self.fs.query(&path)?;
        let data = match self.classify_info(&path, &info) {
            Viewability::Viewable(data) => data,
            Viewability::Hidden | Viewability::Unsupported => {
                tracing::debug!("Nothing viewable at {}", path.display());
                return Ok(None);
            }
        };

        if data.is_directory() {
            return self.load_directory(data).map(Some);
        }

        let Some(parent) = path.parent() else {
            return Ok(None);
        };
        let parent_info = self.fs.query(parent)?;
        if !parent_info.is_directory() {
            return Ok(None);
        }
        tracing::debug!("Loading {} from its folder {}", path.display(), parent.display());
        self.load_directory(NodeData::new(parent, parent_info.display_name, true))
            .map(Some)
    }

    /// Load an arbitrary list of paths below an anonymous root.
    ///
    /// Paths that cannot be queried or are filtered out are skipped. Listed
    /// directories are kept even without `include_directories`, their
    /// subdirectories follow the option.
    pub fn load_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Tree {
        let mut tree = Tree::anonymous();
        let Some(root) = tree.root() else {
            return tree;
        };

        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        for path in paths {
            let path = match self.fs.resolve(path.as_ref()) {
                Ok(path) => path,
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", path.as_ref().display(), e);
                    continue;
                }
            };
            if !seen.insert(path.clone()) {
                continue;
            }
            match self.classify(&path) {
                Ok(Viewability::Viewable(data)) => accepted.push(data),
                Ok(_) => tracing::trace!("Skipping {}", path.display()),
                Err(e) => tracing::debug!("Skipping {}: {}", path.display(), e),
            }
        }

        accepted.sort_by(order::compare);
        for data in accepted {
            let dir_path = data.is_directory().then(|| data.path().to_path_buf());
            if let (Some(id), Some(dir_path)) = (tree.push_child(root, data), dir_path) {
                self.populate(&mut tree, id, &dir_path, &mut Vec::new());
            }
        }
        tree
    }

    /// Run `path` through the filters.
    ///
    /// Directories are reported as viewable regardless of
    /// `include_directories`; callers decide whether to keep them.
    pub fn classify(&self, path: &Path) -> Result<Viewability, TreeError> {
        let info = self.fs.query(path)?;
        Ok(self.classify_info(path, &info))
    }

    /// Build the subtree for one entry, expanding it when it is a directory.
    pub fn subtree(&self, data: NodeData) -> Tree {
        let dir_path = data.is_directory().then(|| data.path().to_path_buf());
        let mut tree = Tree::with_root(data);
        if let (Some(root), Some(dir_path)) = (tree.root(), dir_path) {
            self.populate(&mut tree, root, &dir_path, &mut Vec::new());
        }
        tree
    }

    /// Build the subtree for `path`, or `None` when it is filtered out.
    pub fn build_entry(&self, path: &Path) -> Result<Option<Tree>, TreeError> {
        match self.classify(path)? {
            Viewability::Viewable(data) if data.is_directory() && !self.options.include_directories => Ok(None),
            Viewability::Viewable(data) => Ok(Some(self.subtree(data))),
            Viewability::Hidden | Viewability::Unsupported => Ok(None),
        }
    }

    fn classify_info(&self, path: &Path, info: &FileInfo) -> Viewability {
        if info.is_hidden && !self.options.include_hidden {
            return Viewability::Hidden;
        }
        match info.kind {
            FileKind::Directory => Viewability::Viewable(NodeData::new(path, info.display_name.clone(), true)),
            FileKind::File
                if info
                    .content_type
                    .as_deref()
                    .is_some_and(|content_type| self.registry.is_supported(content_type)) =>
            {
                Viewability::Viewable(NodeData::new(path, info.display_name.clone(), false))
            }
            _ => Viewability::Unsupported,
        }
    }

    /// Root the tree at `data` and expand it. Listing the root itself must succeed.
    fn load_directory(&self, data: NodeData) -> Result<Tree, TreeError> {
        let dir_path = data.path().to_path_buf();
        let entries = self.fs.list(&dir_path)?;
        let mut ancestors = vec![self.fs.resolve(&dir_path).unwrap_or_else(|_| dir_path.clone())];
        let mut tree = Tree::with_root(data);
        if let Some(root) = tree.root() {
            self.fill(&mut tree, root, entries, &mut ancestors);
        }
        tracing::debug!("Loaded {} ({} nodes)", dir_path.display(), tree.len());
        Ok(tree)
    }

    /// Expand the directory `dir`; a listing failure leaves it empty.
    ///
    /// `ancestors` holds the resolved paths of the directories being expanded
    /// above `dir`. A directory that resolves to one of them (a symlink back
    /// up the tree) is kept but not expanded.
    fn populate(&self, tree: &mut Tree, dir: NodeId, dir_path: &Path, ancestors: &mut Vec<PathBuf>) {
        let resolved = self.fs.resolve(dir_path).unwrap_or_else(|_| dir_path.to_path_buf());
        if ancestors.contains(&resolved) {
            tracing::debug!("Not following {} back into {}", dir_path.display(), resolved.display());
            return;
        }
        match self.fs.list(dir_path) {
            Ok(entries) => {
                ancestors.push(resolved);
                self.fill(tree, dir, entries, ancestors);
                ancestors.pop();
            }
            Err(e) => tracing::debug!("Cannot list {}: {}", dir_path.display(), e),
        }
    }

    fn fill(&self, tree: &mut Tree, dir: NodeId, entries: Vec<PathBuf>, ancestors: &mut Vec<PathBuf>) {
        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for path in entries {
            match self.classify(&path) {
                Ok(Viewability::Viewable(data)) if data.is_directory() => {
                    if self.options.include_directories {
                        dirs.push(data);
                    }
                }
                Ok(Viewability::Viewable(data)) => files.push(data),
                Ok(_) => {}
                Err(e) => tracing::debug!("Skipping {}: {}", path.display(), e),
            }
        }

        files.sort_by(order::compare);
        dirs.sort_by(order::compare);

        for data in files {
            tree.push_child(dir, data);
        }
        for data in dirs {
            let dir_path = data.path().to_path_buf();
            if let Some(id) = tree.push_child(dir, data) {
                self.populate(tree, id, &dir_path, ancestors);
            }
        }
    }
}

/// Load `path` from the local disk. See [`Builder::load_path`].
pub fn load_path(path: impl AsRef<Path>, options: LoadOptions) -> Result<Option<Tree>, TreeError> {
    Builder::new(&LocalFileSystem, options).load_path(path.as_ref())
}

/// Load a list of paths from the local disk. See [`Builder::load_paths`].
pub fn load_paths<P: AsRef<Path>>(paths: &[P], options: LoadOptions) -> Tree {
    Builder::new(&LocalFileSystem, options).load_paths(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_tree::leaf_index::leaf_count;
    use crate::file_tree::navigator;
    use crate::file_tree::printer::render;
    use crate::test_support::{options, Fixture};
    use std::fs;

    #[test]
    fn test_directory_counts() {
        let fixture = Fixture::new();
        let cases = [(false, false, 3), (false, true, 14), (true, false, 5), (true, true, 18)];
        for (hidden, recursive, expected) in cases {
            let tree = load_path(fixture.root(), options(hidden, recursive)).unwrap().unwrap();
            assert_eq!(
                leaf_count(&tree),
                expected,
                "hidden={hidden} recursive={recursive}"
            );
        }
    }

    #[test]
    fn test_flat_render() {
        let fixture = Fixture::new();
        let tree = load_path(fixture.root(), options(false, false)).unwrap().unwrap();
        assert_eq!(
            render(&tree),
            "gallery (3 children)\n\
             ├─ bepa.png\n\
             ├─ cepa.jpg\n\
             └─ epa.png\n"
        );
    }

    #[test]
    fn test_recursive_render() {
        let fixture = Fixture::new();
        let tree = load_path(fixture.root(), options(false, true)).unwrap().unwrap();
        let expected = [
            "gallery (5 children)",
            "├─ bepa.png",
            "├─ cepa.jpg",
            "├─ epa.png",
            "├─┬dir_one (1 children)",
            "│ └─ two.jpg",
            "└─┬dir_two (7 children)",
            "  ├─ apa.png",
            "  ├─ bepa.png",
            "  ├─ cepa.png",
            "  ├─┬sub_dir_four (1 children)",
            "  │ └──subsub (0 children)",
            "  ├─┬sub_dir_one (3 children)",
            "  │ ├─ img0.png",
            "  │ ├─ img1.png",
            "  │ └─ img2.png",
            "  ├──sub_dir_three (0 children)",
            "  └─┬sub_dir_two (4 children)",
            "    ├─ img0.png",
            "    ├─ img1.png",
            "    ├─ img2.png",
            "    └─ img3.png",
        ];
        assert_eq!(render(&tree), format!("{}\n", expected.join("\n")));
    }

    #[test]
    fn test_hidden_recursive_iteration_order() {
        let fixture = Fixture::new();
        let tree = load_path(fixture.root(), options(true, true)).unwrap().unwrap();

        let first = navigator::first(&tree).unwrap();
        let mut names = Vec::new();
        let mut current = first;
        loop {
            names.push(tree.data(current).unwrap().display_name().to_owned());
            current = navigator::next(&tree, current).unwrap();
            if current == first {
                break;
            }
        }
        assert_eq!(
            names,
            vec![
                ".apa.png", ".depa.gif", "bepa.png", "cepa.jpg", "epa.png", ".three.png", "two.jpg",
                "img.jpg", "apa.png", "bepa.png", "cepa.png", "img0.png", "img1.png", "img2.png",
                "img0.png", "img1.png", "img2.png", "img3.png",
            ]
        );

        let last = navigator::last(&tree).unwrap();
        assert_eq!(tree.data(last).unwrap().path(), fixture.path("dir_two/sub_dir_two/img3.png"));
    }

    #[test]
    fn test_single_file_loads_its_folder() {
        let fixture = Fixture::new();
        let tree = load_path(fixture.path("bepa.png"), options(false, false)).unwrap().unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.data(root).unwrap().path(), fixture.root());
        assert_eq!(tree.children(root).len(), 3);
    }

    #[test]
    fn test_load_errors() {
        let fixture = Fixture::new();
        let err = load_path(fixture.path("nothing_here"), options(false, false)).unwrap_err();
        assert!(matches!(err, TreeError::NotFound { .. }));
        assert_eq!(err.path(), fixture.path("nothing_here"));
    }

    #[test]
    fn test_filtered_top_level_entry_is_not_an_error() {
        let fixture = Fixture::new();
        assert!(load_path(fixture.path("test.txt"), options(false, false)).unwrap().is_none());
        assert!(load_path(fixture.path(".apa.png"), options(false, false)).unwrap().is_none());
        assert!(load_path(fixture.path("dir_one/.secrets"), options(false, true)).unwrap().is_none());

        let tree = load_path(fixture.path("dir_one/.secrets"), options(true, true)).unwrap().unwrap();
        assert_eq!(leaf_count(&tree), 1);
    }

    #[test]
    fn test_relative_path_is_made_absolute() {
        let fixture = Fixture::new();
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(fixture.root()).unwrap();
        let single = load_path("bepa.png", options(false, false));
        let folder = load_path(".", options(false, false));
        let listed = load_paths(&["cepa.jpg", "./cepa.jpg"], options(false, false));
        std::env::set_current_dir(previous).unwrap();

        let tree = single.unwrap().unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.data(root).unwrap().path(), fixture.root());
        assert!(tree.iter().all(|id| tree.data(id).unwrap().path().is_absolute()));
        assert_eq!(leaf_count(&tree), 3);

        let tree = folder.unwrap().unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.data(root).unwrap().display_name(), "gallery");

        let first = navigator::first(&listed).unwrap();
        assert_eq!(listed.data(first).unwrap().path(), fixture.path("cepa.jpg"));
        assert_eq!(leaf_count(&listed), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_back_to_ancestor_is_not_expanded() {
        let fixture = Fixture::new();
        std::os::unix::fs::symlink(fixture.root(), fixture.path("dir_one/loop")).unwrap();
        std::os::unix::fs::symlink(fixture.path("dir_two/sub_dir_one"), fixture.path("dir_one/shortcut")).unwrap();

        let tree = load_path(fixture.root(), options(false, true)).unwrap().unwrap();
        // shortcut points sideways and is expanded, loop points up and stays empty
        assert_eq!(leaf_count(&tree), 14 + 3);

        let dir_one = tree
            .children(tree.root().unwrap())
            .iter()
            .copied()
            .find(|&id| tree.data(id).unwrap().display_name() == "dir_one")
            .unwrap();
        let names: Vec<_> = tree
            .children(dir_one)
            .iter()
            .map(|&id| {
                let data = tree.data(id).unwrap();
                (data.display_name().to_owned(), tree.children(id).len())
            })
            .collect();
        assert_eq!(
            names,
            vec![
                ("two.jpg".to_owned(), 0),
                ("loop".to_owned(), 0),
                ("shortcut".to_owned(), 3),
            ]
        );
    }

    #[test]
    fn test_path_list() {
        let fixture = Fixture::new();
        let paths = [
            fixture.path(".apa.png"),
            fixture.path("bepa.png"),
            fixture.path("cepa.jpg"),
            fixture.path(".depa.gif"),
            fixture.path("test.txt"),
            fixture.path("dir_two"),
            fixture.path("does_not_exist.png"),
            fixture.path("bepa.png"),
        ];
        let tree = load_paths(&paths, options(false, false));
        assert_eq!(
            render(&tree),
            "<ROOT> (3 children)\n\
             ├─ bepa.png\n\
             ├─ cepa.jpg\n\
             └─┬dir_two (3 children)\n\
             \x20 ├─ apa.png\n\
             \x20 ├─ bepa.png\n\
             \x20 └─ cepa.png\n"
        );

        let tree = load_paths(&paths, options(true, true));
        assert_eq!(leaf_count(&tree), 4 + 10);
    }

    #[test]
    fn test_empty_path_list() {
        let paths: [PathBuf; 0] = [];
        let tree = load_paths(&paths, options(false, false));
        let root = tree.root().unwrap();
        assert!(tree.data(root).is_none());
        assert_eq!(navigator::first(&tree), Some(root));
    }

    #[test]
    fn test_build_entry() {
        let fixture = Fixture::new();
        let builder_fs = LocalFileSystem;
        let builder = Builder::new(&builder_fs, options(false, true));

        let subtree = builder.build_entry(&fixture.path("dir_two/sub_dir_one")).unwrap().unwrap();
        assert_eq!(leaf_count(&subtree), 3);

        assert!(builder.build_entry(&fixture.path("test.txt")).unwrap().is_none());
        assert!(builder.build_entry(&fixture.path(".apa.png")).unwrap().is_none());
        assert!(builder.build_entry(&fixture.path("gone.png")).is_err());

        let flat = Builder::new(&builder_fs, options(false, false));
        assert!(flat.build_entry(&fixture.path("dir_two")).unwrap().is_none());
        assert_eq!(
            flat.classify(&fixture.path(".depa.gif")).unwrap(),
            Viewability::Hidden
        );
    }

    #[test]
    fn test_custom_registry() {
        let fixture = Fixture::new();
        let registry = MimeRegistry::new(["image/png"]);
        let tree = Builder::new(&LocalFileSystem, options(false, false))
            .registry(&registry)
            .load_path(fixture.root())
            .unwrap()
            .unwrap();
        // cepa.jpg is no longer viewable
        assert_eq!(leaf_count(&tree), 2);
    }

    #[test]
    fn test_flat_directory_leaves_out_subdirectories() {
        let fixture = Fixture::new();
        fs::write(fixture.path("dir_two/zz.png"), b"").unwrap();
        let tree = load_path(fixture.path("dir_two"), options(false, false)).unwrap().unwrap();
        assert_eq!(leaf_count(&tree), 4);
    }
}
