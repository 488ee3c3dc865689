//! Image Navigation Tree
//!
//! This crate keeps an in-memory, filtered and sorted mirror of part of a
//! filesystem for an image browser, and keeps it in step with live changes.
//!
//! ## What It Provides
//!
//! - **Filtering**: only directories and files of a supported image type,
//!   hidden entries on request
//! - **Ordering**: files before directories, names compared case-insensitively
//!   with numbers in natural order
//! - **Navigation**: next/previous image with wraparound, lookup by path,
//!   ordinal position among all images
//! - **Live sync**: created and deleted entries are applied to the tree as
//!   notifications arrive
//!
//! ## Data Flow
//!
//! ```text
//! Builder (scan path or path list)
//!        ↓
//! Tree ──── watches on directory nodes
//!        ↓
//! FileWatcher.poll_events() [OWNER THREAD]
//!        ↓
//! Synchronizer.apply_event() [insert / remove subtree]
//!        ↓
//! on_change(ChangeNotice)
//!        ↓
//! BrowseCursor.apply() re-anchors the shown image
//! ```
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use image_nav_tree::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let watcher = FileWatcher::native()?;
//!     let mut sync = Synchronizer::open_path(
//!         "/home/me/Pictures",
//!         LoadOptions::recursive_scan(),
//!         watcher,
//!         |notice| println!("{:?} {}", notice.kind, notice.path.display()),
//!     )?
//!     .ok_or_else(|| anyhow::anyhow!("nothing viewable"))?;
//!
//!     let mut cursor = BrowseCursor::at_first(sync.tree());
//!     cursor.advance(sync.tree());
//!     println!("{:?}", cursor.position(sync.tree()));
//!
//!     // Apply whatever changed in the meantime
//!     sync.poll_events();
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`file_tree`]: The tree and everything that reads or reshapes it
//!   - [`file_tree::builder`]: Scanning directories and path lists
//!   - [`file_tree::navigator`]: Next/previous image
//!   - [`file_tree::locator`]: Lookup by path
//!   - [`file_tree::leaf_index`]: Ordinal positions
//! - [`sync`]: Live synchronization
//!   - [`sync::watcher`]: Watch handles and notification backends
//!   - [`sync::synchronizer`]: Applying changes to a tree
//! - [`ui`]: Viewer-side state

#![warn(rustdoc::missing_crate_level_docs)]

pub mod file_tree;
pub mod sync;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;

/// Re-exports for convenience.
pub mod prelude {
    pub use crate::file_tree::{
        leaf_count, leaf_position, load_path, load_paths, navigator, printer::render, Builder,
        FileSystem, LeafPosition, LoadOptions, LocalFileSystem, MimeRegistry, NodeData, NodeId,
        Tree, TreeError,
    };
    pub use crate::sync::{
        ChangeCallback, ChangeNotice, FileChangeEvent, FileChangeKind, FileWatcher, Synchronizer,
        SynchronizerBuilder, WatcherError,
    };
    pub use crate::ui::BrowseCursor;
}

/// Run the synchronization loop.
///
/// This function polls the watcher of `sync` and applies the routed events,
/// sleeping `poll_interval_ms` between rounds. It never returns; drop the
/// future (e.g. through `tokio::select!` or a timeout) to stop it.
///
/// # Arguments
/// * `sync` - The synchronizer to drive
/// * `poll_interval_ms` - How often to poll the watcher (default: 50ms)
///
/// # Example
///
/// ```rust,no_run
/// use image_nav_tree::{prelude::*, run_sync_loop};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> anyhow::Result<()> {
///     let watcher = FileWatcher::native()?;
///     let Some(mut sync) = SynchronizerBuilder::new(watcher).open_path("/home/me/Pictures")? else {
///         return Ok(());
///     };
///
///     tokio::select! {
///         _ = run_sync_loop(&mut sync, 50) => {}
///         _ = tokio::signal::ctrl_c() => {}
///     }
///     Ok(())
/// }
/// ```
pub async fn run_sync_loop(sync: &mut sync::Synchronizer, poll_interval_ms: u64) {
    let poll_interval = std::time::Duration::from_millis(poll_interval_ms);

    loop {
        let applied = sync.poll_events();
        if applied > 0 {
            tracing::debug!("Applied {} filesystem changes", applied);
        }

        tokio::time::sleep(poll_interval).await;
    }
}
