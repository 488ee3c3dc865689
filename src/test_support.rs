//! On-disk fixture shared by the tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::file_tree::LoadOptions;

const FILES: &[&str] = &[
    "test.txt",
    "cepa.jpg",
    ".apa.png",
    "not_an_image.yo",
    ".depa.gif",
    "bepa.png",
    "epa.png",
    "dir_one/one.txt",
    "dir_one/two.jpg",
    "dir_one/.three.png",
    "dir_one/.secrets/img.jpg",
    "dir_two/bepa.png",
    "dir_two/sub_dir_two/img0.png",
    "dir_two/sub_dir_two/img1.png",
    "dir_two/sub_dir_two/img2.png",
    "dir_two/sub_dir_two/img3.png",
    "dir_two/sub_dir_one/img0.png",
    "dir_two/sub_dir_one/img2.png",
    "dir_two/sub_dir_one/img1.png",
    "dir_two/apa.png",
    "dir_two/cepa.png",
];

const EMPTY_DIRS: &[&str] = &["dir_two/sub_dir_three", "dir_two/sub_dir_four/subsub"];

/// A `gallery` directory inside a temporary directory.
///
/// The temporary directory itself has a dot-prefixed name, so the fixture
/// root is one level below it.
pub(crate) struct Fixture {
    _dir: TempDir,
    root: PathBuf,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("gallery");
        for file in FILES {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, b"").unwrap();
        }
        for empty in EMPTY_DIRS {
            fs::create_dir_all(root.join(empty)).unwrap();
        }
        Self { _dir: dir, root }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

/// Options as the browser sets them: recursion implies subdirectories.
pub(crate) fn options(include_hidden: bool, recursive: bool) -> LoadOptions {
    LoadOptions::new()
        .include_hidden(include_hidden)
        .include_directories(recursive)
        .recursive(recursive)
}
