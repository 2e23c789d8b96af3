//! Filesystem boundary contract.
//!
//! Implementations are bound to a single project root chosen by the
//! composition root; every path crossing this boundary is project-relative.

use crate::BoxFuture;
use sourceset_domain::ProjectPath;
use sourceset_shared::{RequestContext, Result};

/// File system entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSystemEntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Other / unknown (symlinks are not followed).
    Other,
}

/// A directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemDirEntry {
    /// Entry name (single path segment).
    pub name: Box<str>,
    /// Entry kind.
    pub kind: FileSystemEntryKind,
}

/// File system stat info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSystemStat {
    /// Kind of the entry.
    pub kind: FileSystemEntryKind,
    /// Size in bytes.
    pub size_bytes: u64,
}

/// Boundary contract for byte-level filesystem access.
pub trait FileSystemPort: Send + Sync {
    /// List a directory. `dir` is a normalized directory; `""` is the project root.
    fn read_dir(
        &self,
        ctx: &RequestContext,
        dir: Box<str>,
    ) -> BoxFuture<'_, Result<Vec<FileSystemDirEntry>>>;

    /// Read a file's bytes. Missing files fail with `core:not_found`.
    fn read_file_bytes(&self, ctx: &RequestContext, file: ProjectPath)
    -> BoxFuture<'_, Result<Vec<u8>>>;

    /// Stat a file. Missing files fail with `core:not_found`.
    fn stat(&self, ctx: &RequestContext, path: ProjectPath)
    -> BoxFuture<'_, Result<FileSystemStat>>;
}
