//! The filtered, sorted tree and the operations over it.
//!
//! - [`node`]: arena storage, `Tree`, `NodeId`, `NodeData`
//! - [`builder`]: scanning directories and path lists
//! - [`order`]: sibling ordering and sorted insertion
//! - [`navigator`]: next/previous leaf with wraparound
//! - [`locator`]: find a node by path
//! - [`leaf_index`]: ordinal position among leaves
//! - [`printer`]: debug rendering

pub mod builder;
pub mod error;
pub mod leaf_index;
pub mod locator;
pub mod mime;
pub mod navigator;
pub mod node;
pub mod options;
pub mod order;
pub mod printer;
pub mod source;

pub use builder::{load_path, load_paths, Builder, Viewability};
pub use error::TreeError;
pub use leaf_index::{leaf_count, leaf_position, LeafPosition};
pub use mime::MimeRegistry;
pub use navigator::Direction;
pub use node::{CollationKey, Descendants, Node, NodeData, NodeId, Tree};
pub use options::LoadOptions;
pub use source::{FileInfo, FileKind, FileSystem, LocalFileSystem};
