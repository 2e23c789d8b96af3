//! Local filesystem adapter bound to a project root.

use sourceset_domain::ProjectPath;
use sourceset_ports::{
    BoxFuture, FileSystemDirEntry, FileSystemEntryKind, FileSystemPort, FileSystemStat,
};
use sourceset_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result, ResultExt};
use std::fs::FileType;
use std::io;
use std::path::{Path, PathBuf};

/// Local filesystem adapter using async IO.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
    max_file_size_bytes: Option<u64>,
}

impl LocalFileSystem {
    /// Build a filesystem adapter rooted at `root` with an optional max file size.
    pub fn new(root: impl Into<PathBuf>, max_file_size_bytes: Option<u64>) -> Self {
        Self {
            root: root.into(),
            max_file_size_bytes,
        }
    }

    /// Project root this adapter reads under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

impl FileSystemPort for LocalFileSystem {
    fn read_dir(
        &self,
        ctx: &RequestContext,
        dir: Box<str>,
    ) -> BoxFuture<'_, Result<Vec<FileSystemDirEntry>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("fs.read_dir")?;
            let full_path = self.resolve(&dir);
            let mut entries = Vec::new();
            let mut read_dir = tokio::fs::read_dir(&full_path)
                .await
                .map_err(ErrorEnvelope::from)
                .with_metadata("path", &*dir)?;

            while let Some(entry) = read_dir.next_entry().await.map_err(ErrorEnvelope::from)? {
                let Ok(name) = entry.file_name().into_string() else {
                    tracing::warn!(
                        dir = %dir,
                        name = ?entry.file_name(),
                        "skipping entry with a non-UTF-8 name"
                    );
                    continue;
                };
                entries.push(FileSystemDirEntry {
                    name: name.into_boxed_str(),
                    kind: followed_kind(&entry).await?,
                });
            }

            entries.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(entries)
        })
    }

    fn read_file_bytes(
        &self,
        ctx: &RequestContext,
        file: ProjectPath,
    ) -> BoxFuture<'_, Result<Vec<u8>>> {
        let ctx = ctx.clone();
        let max_file_size_bytes = self.max_file_size_bytes;
        Box::pin(async move {
            ctx.ensure_not_cancelled("fs.read_file_bytes")?;
            let full_path = self.resolve(file.as_str());
            let metadata = tokio::fs::metadata(&full_path)
                .await
                .map_err(ErrorEnvelope::from)
                .with_metadata("path", file.as_str())?;
            if !metadata.is_file() {
                return Err(ErrorEnvelope::expected(
                    ErrorCode::invalid_input(),
                    "path is not a file",
                )
                .with_metadata("path", file.as_str()));
            }
            if let Some(limit) = max_file_size_bytes
                && metadata.len() > limit
            {
                return Err(file_too_large(&file, metadata.len(), limit));
            }

            tokio::fs::read(&full_path)
                .await
                .map_err(ErrorEnvelope::from)
                .with_metadata("path", file.as_str())
        })
    }

    fn stat(&self, ctx: &RequestContext, path: ProjectPath) -> BoxFuture<'_, Result<FileSystemStat>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("fs.stat")?;
            let full_path = self.resolve(path.as_str());
            let metadata = tokio::fs::metadata(&full_path)
                .await
                .map_err(ErrorEnvelope::from)
                .with_metadata("path", path.as_str())?;

            Ok(FileSystemStat {
                kind: entry_kind(metadata.file_type()),
                size_bytes: metadata.len(),
            })
        })
    }
}

/// Build the error for a file over the configured capture limit.
pub fn file_too_large(file: &ProjectPath, size_bytes: u64, limit: u64) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("snapshot", "file_too_large"),
        "file exceeds max size",
    )
    .with_metadata("path", file.as_str())
    .with_metadata("sizeBytes", size_bytes.to_string())
    .with_metadata("maxFileSizeBytes", limit.to_string())
}

/// Kind of a listed entry, looking through symlinks.
///
/// Linked directories are reported as `Other` so recursive walks cannot cycle;
/// dangling links are `Other` too.
async fn followed_kind(entry: &tokio::fs::DirEntry) -> Result<FileSystemEntryKind> {
    let file_type = entry.file_type().await.map_err(ErrorEnvelope::from)?;
    if !file_type.is_symlink() {
        return Ok(entry_kind(file_type));
    }
    match tokio::fs::metadata(entry.path()).await {
        Ok(metadata) if metadata.is_dir() => Ok(FileSystemEntryKind::Other),
        Ok(metadata) => Ok(entry_kind(metadata.file_type())),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(FileSystemEntryKind::Other),
        Err(error) => Err(ErrorEnvelope::from(error)),
    }
}

fn entry_kind(file_type: FileType) -> FileSystemEntryKind {
    if file_type.is_file() {
        FileSystemEntryKind::File
    } else if file_type.is_dir() {
        FileSystemEntryKind::Directory
    } else {
        FileSystemEntryKind::Other
    }
}
