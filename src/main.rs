//! Demo application for the image navigation tree.
//!
//! Loads a directory, a single image, or a list of paths, prints the tree,
//! then follows filesystem changes until Ctrl+C:
//! 1. The tree is built with the requested filters
//! 2. Watches are attached to its directories
//! 3. Changes are applied as they arrive and the tree is printed again
//!
//! Usage: `image-nav-tree [--hidden] [--recursive] [PATH...]`

use anyhow::Result;
use image_nav_tree::prelude::*;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("image_nav_tree=debug".parse()?))
        .init();

    println!("=== Image Navigation Tree Demo ===\n");

    let mut options = LoadOptions::new();
    let mut paths = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--hidden" => options = options.include_hidden(true),
            "--recursive" => options = options.include_directories(true).recursive(true),
            _ => paths.push(PathBuf::from(arg)),
        }
    }
    if paths.is_empty() {
        paths.push(std::env::current_dir()?);
    }

    let cursor = Rc::new(RefCell::new(BrowseCursor::new()));
    let cursor_for_changes = Rc::clone(&cursor);
    let on_change = move |notice: &ChangeNotice<'_>| {
        println!("[Sync] {:?}: {}", notice.kind, notice.path.display());
        cursor_for_changes.borrow_mut().apply(notice);
    };

    let watcher = FileWatcher::native()?;
    let mut sync = if let [path] = paths.as_slice() {
        let Some(sync) = Synchronizer::open_path(path, options, watcher, on_change)? else {
            println!("Nothing viewable at {}", path.display());
            return Ok(());
        };
        let shown = LocalFileSystem.resolve(path)?;
        cursor.borrow_mut().jump_to(sync.tree(), &shown);
        sync
    } else {
        Synchronizer::open_paths(&paths, options, watcher, on_change)
    };

    if cursor.borrow().current(sync.tree()).is_none() {
        *cursor.borrow_mut() = BrowseCursor::at_first(sync.tree());
    }

    print_state(&sync, &cursor.borrow());
    println!("Watching {} paths", sync.watcher().watched_paths().len());
    println!("Press Ctrl+C to exit\n");
    println!("Try adding or removing images in the watched directories.\n");
    println!("---\n");

    let poll_interval = std::time::Duration::from_millis(100);

    // Handle Ctrl+C gracefully
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        }
        println!("\nShutting down...");
        let _ = shutdown_tx.send(());
    });

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                break;
            }
            _ = tokio::time::sleep(poll_interval) => {
                sync.poll_events();
                if cursor.borrow().needs_redraw() {
                    print_state(&sync, &cursor.borrow());
                    cursor.borrow_mut().clear_dirty();
                }
            }
        }
    }

    println!("Done!");

    Ok(())
}

fn print_state(sync: &Synchronizer, cursor: &BrowseCursor) {
    let tree = sync.tree();
    if tree.is_empty() {
        println!("(tree is empty, its root was removed)\n");
        return;
    }
    println!("{}", render(tree));

    let position = cursor.position(tree);
    match (cursor.current_path(tree), position.index) {
        (Some(path), Some(index)) => {
            println!("Showing {} ({}/{})\n", path.display(), index + 1, position.total)
        }
        _ => println!("No image to show ({} in tree)\n", position.total),
    }
}
