// SPDX-License-Identifier: MIT OR Apache-2.0
//! Archive browser for the shader patcher.
//!
//! A lazily populated tree of folders, shader files, functions and parameter
//! structs under the archive root, suitable for a picker view:
//! - [`ArchiveTreeModel::get_children`] computes a level on first request and
//!   caches it under its path key
//! - [`ArchiveTreeModel::is_leaf`] marks functions and parameter structs
//! - [`ArchiveTreeModel::poll_events`] reports attribute and structure changes
//!
//! Size and timestamp of new items are read by a single background worker in
//! the order the items were created.

pub mod fs;
pub mod item;
pub mod model;
pub mod worker;

pub use fs::{DirListing, EntryMetadata, FileSystem, MemoryFileSystem, OsFileSystem};
pub use item::{Icon, ItemHandle, ItemKind, TreeItem, TreePath};
pub use model::{ArchiveTreeModel, TreeEvent, TreeModelConfig};
