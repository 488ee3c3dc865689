//! Per-path change notification with RAII watch handles.
//!
//! This module provides `FileWatcher`, which hands out a `WatchHandle` for
//! every watched path and routes raw filesystem events to the watch they
//! belong to. The underlying mechanism is a `WatchBackend`:
//! - `NotifyBackend`: native OS notifications through `notify`
//! - `ManualBackend`: events injected by the host, for embedding and tests

use notify::{
    event::{ModifyKind, RenameMode},
    Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;
use thiserror::Error;

use crate::file_tree::LoadOptions;

/// Errors that can occur in the file watcher system.
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Failed to create watcher: {0}")]
    WatcherCreation(#[from] notify::Error),

    #[error("Failed to watch path {path}: {source}")]
    WatchPath {
        path: PathBuf,
        source: notify::Error,
    },
}

/// Change kinds the tree reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileChangeKind {
    Created,
    Deleted,
}

/// A normalized filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChangeEvent {
    pub path: PathBuf,
    pub kind: FileChangeKind,
}

impl FileChangeEvent {
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: FileChangeKind::Created,
        }
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: FileChangeKind::Deleted,
        }
    }
}

/// Translate a raw `notify` event.
///
/// Renames become a deletion of the old path and a creation of the new one.
/// inotify reports a rename both as separate halves and as a combined pair,
/// so the same deletion and creation can arrive twice; the synchronizer
/// ignores the repeats. Content and metadata modifications are dropped.
fn translate(event: Event) -> Vec<FileChangeEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.into_iter().map(FileChangeEvent::created).collect(),
        EventKind::Remove(_) => event.paths.into_iter().map(FileChangeEvent::deleted).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.into_iter().map(FileChangeEvent::deleted).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.into_iter().map(FileChangeEvent::created).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.into_iter();
            let mut events = Vec::with_capacity(2);
            if let Some(from) = paths.next() {
                events.push(FileChangeEvent::deleted(from));
            }
            if let Some(to) = paths.next() {
                events.push(FileChangeEvent::created(to));
            }
            events
        }
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .into_iter()
            .map(|path| {
                if path.exists() {
                    FileChangeEvent::created(path)
                } else {
                    FileChangeEvent::deleted(path)
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// A source of change notifications for individual paths.
///
/// Watches are non-recursive: a watched directory reports changes to its
/// immediate children and its own deletion.
pub trait WatchBackend {
    fn watch(&mut self, path: &Path) -> Result<(), WatcherError>;

    fn unwatch(&mut self, path: &Path) -> Result<(), WatcherError>;

    /// Drain the events received since the last call.
    fn poll_events(&mut self) -> Vec<FileChangeEvent>;
}

/// Native notifications through `notify`.
pub struct NotifyBackend {
    watcher: RecommendedWatcher,
    event_rx: Receiver<Result<Event, notify::Error>>,
}

impl NotifyBackend {
    /// Creates a backend on the platform's recommended watcher.
    pub fn new() -> Result<Self, WatcherError> {
        let (tx, rx) = channel();

        let config = Config::default()
            .with_poll_interval(Duration::from_millis(500))
            .with_compare_contents(false);

        let watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                let _ = tx.send(res);
            },
            config,
        )?;

        Ok(Self {
            watcher,
            event_rx: rx,
        })
    }
}

impl WatchBackend for NotifyBackend {
    fn watch(&mut self, path: &Path) -> Result<(), WatcherError> {
        self.watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::WatchPath {
                path: path.to_path_buf(),
                source: e,
            })
    }

    fn unwatch(&mut self, path: &Path) -> Result<(), WatcherError> {
        self.watcher.unwatch(path).map_err(|e| WatcherError::WatchPath {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn poll_events(&mut self) -> Vec<FileChangeEvent> {
        let mut events = Vec::new();
        while let Ok(result) = self.event_rx.try_recv() {
            match result {
                Ok(event) => events.extend(translate(event)),
                Err(e) => tracing::warn!("File watcher error: {}", e),
            }
        }
        events
    }
}

/// Events pushed by the host through a channel.
pub struct ManualBackend {
    watched: HashSet<PathBuf>,
    event_rx: Receiver<FileChangeEvent>,
}

impl ManualBackend {
    /// Returns the backend and the sender used to feed it.
    pub fn new() -> (Self, Sender<FileChangeEvent>) {
        let (tx, rx) = channel();
        (
            Self {
                watched: HashSet::new(),
                event_rx: rx,
            },
            tx,
        )
    }
}

impl WatchBackend for ManualBackend {
    fn watch(&mut self, path: &Path) -> Result<(), WatcherError> {
        self.watched.insert(path.to_path_buf());
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<(), WatcherError> {
        self.watched.remove(path);
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<FileChangeEvent> {
        self.event_rx.try_iter().collect()
    }
}

/// An event paired with the watched path it was routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedEvent {
    pub watched: PathBuf,
    pub event: FileChangeEvent,
}

struct WatcherState {
    backend: Box<dyn WatchBackend>,
    watched: HashMap<PathBuf, usize>,
}

impl WatcherState {
    fn release(&mut self, path: &Path) {
        let Some(count) = self.watched.get_mut(path) else {
            return;
        };
        *count -= 1;
        if *count > 0 {
            return;
        }
        self.watched.remove(path);
        match self.backend.unwatch(path) {
            Ok(()) => tracing::debug!("Stopped watching {}", path.display()),
            // The OS drops watches on deleted paths by itself.
            Err(e) => tracing::debug!("Unwatch failed for {}: {}", path.display(), e),
        }
    }

    fn route(&self, event: FileChangeEvent) -> Option<RoutedEvent> {
        let parent = event
            .path
            .parent()
            .filter(|p| self.watched.contains_key(*p))
            .map(Path::to_path_buf);
        if let Some(watched) = parent {
            return Some(RoutedEvent { watched, event });
        }
        if event.kind == FileChangeKind::Deleted && self.watched.contains_key(&event.path) {
            return Some(RoutedEvent {
                watched: event.path.clone(),
                event,
            });
        }
        tracing::trace!("Dropping event for unwatched {}", event.path.display());
        None
    }
}

/// Shared, single-threaded watch registry.
///
/// Cloning yields another reference to the same registry.
#[derive(Clone)]
pub struct FileWatcher {
    state: Rc<RefCell<WatcherState>>,
}

impl FileWatcher {
    pub fn new(backend: impl WatchBackend + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(WatcherState {
                backend: Box::new(backend),
                watched: HashMap::new(),
            })),
        }
    }

    /// A watcher on native OS notifications.
    pub fn native() -> Result<Self, WatcherError> {
        Ok(Self::new(NotifyBackend::new()?))
    }

    /// A watcher fed by hand, with the sender that feeds it.
    pub fn manual() -> (Self, Sender<FileChangeEvent>) {
        let (backend, tx) = ManualBackend::new();
        (Self::new(backend), tx)
    }

    /// Start watching `path`.
    ///
    /// Returns `None` when the path cannot be watched; the caller then simply
    /// receives no changes for it. The watch lasts as long as the handle.
    pub fn watch(&self, path: &Path) -> Option<WatchHandle> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if let Some(count) = state.watched.get_mut(path) {
            *count += 1;
        } else {
            match state.backend.watch(path) {
                Ok(()) => {
                    tracing::debug!("Watching {}", path.display());
                    state.watched.insert(path.to_path_buf(), 1);
                }
                Err(e) => {
                    tracing::warn!("{}, changes will not be followed", e);
                    return None;
                }
            }
        }
        Some(WatchHandle {
            path: path.to_path_buf(),
            owner: Rc::downgrade(&self.state),
        })
    }

    pub fn is_watched(&self, path: &Path) -> bool {
        self.state.borrow().watched.contains_key(path)
    }

    /// Currently watched paths, sorted.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.state.borrow().watched.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Drain pending events and route each one to its watch.
    ///
    /// Events for paths nobody watches are dropped.
    pub fn poll_events(&self) -> Vec<RoutedEvent> {
        let mut state = self.state.borrow_mut();
        let events = state.backend.poll_events();
        let routed = events.into_iter().filter_map(|event| state.route(event)).collect();
        routed
    }
}

impl fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileWatcher")
            .field("watched", &self.watched_paths())
            .finish()
    }
}

/// A live watch on one path. Dropping it stops the watch.
pub struct WatchHandle {
    path: PathBuf,
    owner: Weak<RefCell<WatcherState>>,
}

impl WatchHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle").field("path", &self.path).finish()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        let Some(owner) = self.owner.upgrade() else {
            return;
        };
        match owner.try_borrow_mut() {
            Ok(mut state) => state.release(&self.path),
            Err(_) => tracing::warn!("Watcher busy, leaking watch on {}", self.path.display()),
        };
    }
}

/// A watch attached to a tree node, with the filters used for changes under it.
#[derive(Debug)]
pub struct NodeWatch {
    handle: WatchHandle,
    flags: LoadOptions,
}

impl NodeWatch {
    pub fn new(handle: WatchHandle, flags: LoadOptions) -> Self {
        Self { handle, flags }
    }

    pub fn path(&self) -> &Path {
        self.handle.path()
    }

    pub fn flags(&self) -> LoadOptions {
        self.flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, RemoveKind};

    #[test]
    fn test_translate_create_and_remove() {
        let event = Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("/g/a.png"));
        assert_eq!(translate(event), vec![FileChangeEvent::created("/g/a.png")]);

        let event = Event::new(EventKind::Remove(RemoveKind::Any)).add_path(PathBuf::from("/g/a.png"));
        assert_eq!(translate(event), vec![FileChangeEvent::deleted("/g/a.png")]);
    }

    #[test]
    fn test_translate_rename_both() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/g/old.png"))
            .add_path(PathBuf::from("/g/new.png"));
        assert_eq!(
            translate(event),
            vec![
                FileChangeEvent::deleted("/g/old.png"),
                FileChangeEvent::created("/g/new.png"),
            ]
        );
    }

    #[test]
    fn test_translate_ignores_content_changes() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("/g/a.png"));
        assert!(translate(event).is_empty());
    }

    #[test]
    fn test_handles_are_refcounted() {
        let (watcher, _tx) = FileWatcher::manual();
        let path = Path::new("/g");

        let first = watcher.watch(path).unwrap();
        let second = watcher.watch(path).unwrap();
        assert_eq!(watcher.watched_paths(), vec![PathBuf::from("/g")]);

        drop(first);
        assert!(watcher.is_watched(path));
        drop(second);
        assert!(!watcher.is_watched(path));
    }

    #[test]
    fn test_routing() {
        let (watcher, tx) = FileWatcher::manual();
        let _dir = watcher.watch(Path::new("/g")).unwrap();
        let _file = watcher.watch(Path::new("/other/top.png")).unwrap();

        tx.send(FileChangeEvent::created("/g/new.png")).unwrap();
        tx.send(FileChangeEvent::deleted("/g")).unwrap();
        tx.send(FileChangeEvent::deleted("/other/top.png")).unwrap();
        tx.send(FileChangeEvent::created("/other/top.png")).unwrap();
        tx.send(FileChangeEvent::created("/elsewhere/x.png")).unwrap();

        let routed = watcher.poll_events();
        assert_eq!(
            routed,
            vec![
                RoutedEvent {
                    watched: PathBuf::from("/g"),
                    event: FileChangeEvent::created("/g/new.png"),
                },
                RoutedEvent {
                    watched: PathBuf::from("/g"),
                    event: FileChangeEvent::deleted("/g"),
                },
                RoutedEvent {
                    watched: PathBuf::from("/other/top.png"),
                    event: FileChangeEvent::deleted("/other/top.png"),
                },
            ]
        );
        assert!(watcher.poll_events().is_empty());
    }

    #[test]
    fn test_handle_outliving_watcher() {
        let (watcher, _tx) = FileWatcher::manual();
        let handle = watcher.watch(Path::new("/g")).unwrap();
        drop(watcher);
        assert_eq!(handle.path(), Path::new("/g"));
        drop(handle);
    }
}
