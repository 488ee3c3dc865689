//! UI components module.
//!
//! This module provides UI-side state that follows a synchronized tree.

pub mod cursor;

pub use cursor::BrowseCursor;
