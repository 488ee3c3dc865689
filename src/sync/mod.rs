//! Keeping a tree in step with the filesystem.
//!
//! - [`watcher`]: watch handles, backends and event routing
//! - [`synchronizer`]: applies routed events to a live tree

pub mod synchronizer;
pub mod watcher;

pub use synchronizer::{ChangeCallback, ChangeNotice, Synchronizer, SynchronizerBuilder};
pub use watcher::{
    FileChangeEvent, FileChangeKind, FileWatcher, ManualBackend, NodeWatch, NotifyBackend,
    RoutedEvent, WatchBackend, WatchHandle, WatcherError,
};
