// SPDX-License-Identifier: MIT OR Apache-2.0
//! Filesystem access used by the archive tree.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Attributes of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Entry is a directory
    pub is_dir: bool,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Last modification time, where the platform reports one
    pub modified: Option<SystemTime>,
}

/// Contents of a directory, each list sorted by path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    /// Subdirectories
    pub directories: Vec<PathBuf>,
    /// Files
    pub files: Vec<PathBuf>,
}

/// Directory enumeration and attribute lookup
pub trait FileSystem: Send + Sync {
    /// Attributes of `path`
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata>;

    /// Immediate children of the directory at `path`
    fn read_dir(&self, path: &Path) -> io::Result<DirListing>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        let meta = std::fs::metadata(path)?;
        Ok(EntryMetadata {
            is_dir: meta.is_dir(),
            size: if meta.is_dir() { 0 } else { meta.len() },
            modified: meta.modified().ok(),
        })
    }

    fn read_dir(&self, path: &Path) -> io::Result<DirListing> {
        let mut listing = DirListing::default();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                listing.directories.push(entry.path());
            } else {
                listing.files.push(entry.path());
            }
        }
        listing.directories.sort();
        listing.files.sort();
        Ok(listing)
    }
}

#[derive(Debug, Clone)]
enum MemoryEntry {
    Directory,
    File { size: u64, modified: SystemTime },
}

/// In-memory filesystem for hosts without disk access and for tests.
///
/// Directories can be marked as failing to simulate IO errors, and every
/// `read_dir` call is counted.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    entries: Mutex<BTreeMap<PathBuf, MemoryEntry>>,
    failing: Mutex<HashSet<PathBuf>>,
    read_dir_calls: Mutex<usize>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory and any missing ancestors
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(MemoryEntry::Directory);
        }
    }

    /// Add a file of `size` bytes, creating its parent directories
    pub fn add_file(&self, path: impl AsRef<Path>, size: u64) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.entries.lock().insert(
            path.to_path_buf(),
            MemoryEntry::File {
                size,
                modified: SystemTime::now(),
            },
        );
    }

    /// Make listing `path` fail with an IO error
    pub fn fail_dir(&self, path: impl AsRef<Path>) {
        self.failing.lock().insert(path.as_ref().to_path_buf());
    }

    /// Number of `read_dir` calls so far
    pub fn read_dir_calls(&self) -> usize {
        *self.read_dir_calls.lock()
    }
}

impl FileSystem for MemoryFileSystem {
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        match self.entries.lock().get(path) {
            Some(MemoryEntry::Directory) => Ok(EntryMetadata {
                is_dir: true,
                size: 0,
                modified: None,
            }),
            Some(MemoryEntry::File { size, modified }) => Ok(EntryMetadata {
                is_dir: false,
                size: *size,
                modified: Some(*modified),
            }),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<DirListing> {
        *self.read_dir_calls.lock() += 1;
        if self.failing.lock().iter().any(|p| p == path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("cannot list {}", path.display()),
            ));
        }

        let entries = self.entries.lock();
        match entries.get(path) {
            Some(MemoryEntry::Directory) => {}
            Some(MemoryEntry::File { .. }) => {
                return Err(io::Error::new(io::ErrorKind::Other, "not a directory"));
            }
            None => return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory")),
        }

        let mut listing = DirListing::default();
        for (child, entry) in entries.iter() {
            if child.parent() != Some(path) {
                continue;
            }
            match entry {
                MemoryEntry::Directory => listing.directories.push(child.clone()),
                MemoryEntry::File { .. } => listing.files.push(child.clone()),
            }
        }
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_listing() {
        let fs = MemoryFileSystem::new();
        fs.add_file("game/xleres/basic.h", 120);
        fs.add_file("game/xleres/lighting/phong.sh", 300);

        let listing = fs.read_dir(Path::new("game/xleres/")).unwrap();
        assert_eq!(listing.directories, vec![PathBuf::from("game/xleres/lighting")]);
        assert_eq!(listing.files, vec![PathBuf::from("game/xleres/basic.h")]);
        assert_eq!(fs.read_dir_calls(), 1);

        let meta = fs.metadata(Path::new("game/xleres/basic.h")).unwrap();
        assert!(!meta.is_dir);
        assert_eq!(meta.size, 120);
        assert!(fs.metadata(Path::new("game/xleres")).unwrap().is_dir);
    }

    #[test]
    fn test_memory_failures() {
        let fs = MemoryFileSystem::new();
        fs.add_dir("root/locked");
        fs.fail_dir("root/locked");
        assert!(fs.read_dir(Path::new("root/locked")).is_err());
        assert!(fs.read_dir(Path::new("root/missing")).is_err());
        assert!(fs.metadata(Path::new("root/missing")).is_err());
    }

    #[test]
    fn test_os_filesystem() {
        let root = std::env::temp_dir().join(format!("shaderpatch-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("a.h"), b"float4 main();").unwrap();

        let fs = OsFileSystem;
        let listing = fs.read_dir(&root).unwrap();
        assert_eq!(listing.directories, vec![root.join("sub")]);
        assert_eq!(listing.files, vec![root.join("a.h")]);
        assert_eq!(fs.metadata(&root.join("a.h")).unwrap().size, 14);
        assert!(fs.read_dir(&root.join("missing")).is_err());

        std::fs::remove_dir_all(&root).unwrap();
    }
}
