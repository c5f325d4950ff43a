//! File System Abstraction
//!
//! Platform-agnostic file I/O used by the reconciliation pass.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub is_directory: bool,
}

/// File system access trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn place(fs: &dyn FileSystemAccess, src: &Path, dest: &Path) -> Result<()> {
///     if let Some(parent) = dest.parent() {
///         fs.create_dir_all(parent).await?;
///     }
///     fs.copy_file(src, dest).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Copy `from` to `to`, overwriting the destination.
    ///
    /// Returns the number of bytes copied.
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<u64>;

    /// Rename a file in place. Both paths are expected on the same volume.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// Every regular file below `root`.
    ///
    /// Symbolic links are reported neither as files nor followed into.
    /// Entries that cannot be read are skipped, so one bad entry never hides
    /// the rest of the tree. Only an unreadable `root` is an error.
    async fn list_files_recursive(&self, root: &Path) -> Result<Vec<PathBuf>>;
}
