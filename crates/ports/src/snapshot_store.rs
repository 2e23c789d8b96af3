//! Content store boundary contract.

use crate::BoxFuture;
use sourceset_domain::{MergedSnapshot, ProjectPath, Snapshot};
use sourceset_shared::{RequestContext, Result};
use std::collections::BTreeSet;

/// Content-addressed capture and path-set operations over snapshots.
///
/// The store is the only authority on whether a file exists and what it
/// contains. Failures are surfaced unmodified to callers.
pub trait SnapshotStorePort: Send + Sync {
    /// Capture the given files. Any missing file fails the whole capture with
    /// `core:not_found`.
    fn capture(
        &self,
        ctx: &RequestContext,
        paths: Vec<ProjectPath>,
    ) -> BoxFuture<'_, Result<Snapshot>>;

    /// Keep only entries whose path is in `paths`.
    fn subset(
        &self,
        ctx: &RequestContext,
        snapshot: Snapshot,
        paths: BTreeSet<ProjectPath>,
    ) -> BoxFuture<'_, Result<Snapshot>>;

    /// Union several snapshots into one.
    fn merge(
        &self,
        ctx: &RequestContext,
        snapshots: Vec<Snapshot>,
    ) -> BoxFuture<'_, Result<MergedSnapshot>>;

    /// Remove a directory prefix from every path in the snapshot.
    fn strip_prefix(
        &self,
        ctx: &RequestContext,
        snapshot: Snapshot,
        prefix: Box<str>,
    ) -> BoxFuture<'_, Result<Snapshot>>;
}
