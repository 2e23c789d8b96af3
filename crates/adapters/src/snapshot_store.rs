//! Digest-based snapshot store over a filesystem port.

use crate::fs::file_too_large;
use sourceset_domain::{FileDigest, MergedSnapshot, ProjectPath, Snapshot, SnapshotEntry};
use sourceset_ports::{BoxFuture, FileSystemEntryKind, FileSystemPort, SnapshotStorePort};
use sourceset_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Captures files by SHA-256 digest; path-set operations use the domain algebra.
#[derive(Clone)]
pub struct DigestSnapshotStore {
    fs: Arc<dyn FileSystemPort>,
    max_file_size_bytes: Option<u64>,
}

impl DigestSnapshotStore {
    /// Build a store reading through `fs`.
    pub fn new(fs: Arc<dyn FileSystemPort>, max_file_size_bytes: Option<u64>) -> Self {
        Self {
            fs,
            max_file_size_bytes,
        }
    }

    async fn capture_one(&self, ctx: &RequestContext, path: ProjectPath) -> Result<SnapshotEntry> {
        let stat = self.fs.stat(ctx, path.clone()).await?;
        if stat.kind != FileSystemEntryKind::File {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "declared source is not a regular file",
            )
            .with_metadata("path", path.as_str()));
        }
        if let Some(limit) = self.max_file_size_bytes
            && stat.size_bytes > limit
        {
            return Err(file_too_large(&path, stat.size_bytes, limit));
        }

        let bytes = self.fs.read_file_bytes(ctx, path.clone()).await?;
        Ok(SnapshotEntry::new(path, FileDigest::of_bytes(&bytes)))
    }
}

impl SnapshotStorePort for DigestSnapshotStore {
    fn capture(
        &self,
        ctx: &RequestContext,
        paths: Vec<ProjectPath>,
    ) -> BoxFuture<'_, Result<Snapshot>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let unique: BTreeSet<ProjectPath> = paths.into_iter().collect();
            let mut entries = Vec::with_capacity(unique.len());
            for path in unique {
                ctx.ensure_not_cancelled("snapshot.capture")?;
                entries.push(self.capture_one(&ctx, path).await?);
            }
            Snapshot::from_entries(entries).map_err(ErrorEnvelope::from)
        })
    }

    fn subset(
        &self,
        _ctx: &RequestContext,
        snapshot: Snapshot,
        paths: BTreeSet<ProjectPath>,
    ) -> BoxFuture<'_, Result<Snapshot>> {
        Box::pin(async move { Ok(snapshot.subset(&paths)) })
    }

    fn merge(
        &self,
        _ctx: &RequestContext,
        snapshots: Vec<Snapshot>,
    ) -> BoxFuture<'_, Result<MergedSnapshot>> {
        Box::pin(async move { Ok(Snapshot::merge(&snapshots)) })
    }

    fn strip_prefix(
        &self,
        _ctx: &RequestContext,
        snapshot: Snapshot,
        prefix: Box<str>,
    ) -> BoxFuture<'_, Result<Snapshot>> {
        Box::pin(async move { snapshot.strip_prefix(&prefix).map_err(ErrorEnvelope::from) })
    }
}
