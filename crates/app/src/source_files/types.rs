//! Inputs, outputs and dependencies of the source-files use cases.

use sourceset_domain::{
    LegacyTarget, OriginSpec, PathCollision, Snapshot, SourcesDescriptor, SourcesKind,
    TargetAddress,
};
use sourceset_ports::{
    LoggerPort, SnapshotStorePort, SourceRootPort, SourcesHydrationPort, TelemetryPort,
};
use std::sync::Arc;
use std::time::Duration;

/// Resolve everything the given descriptors own.
#[derive(Debug, Clone, Default)]
pub struct AllSourceFilesInput {
    /// Descriptors to resolve.
    pub sources: Vec<SourcesDescriptor>,
    /// Strip source roots from typed descriptors.
    pub strip_source_roots: bool,
}

/// Resolve what the caller named, restricted to ownership.
#[derive(Debug, Clone, Default)]
pub struct SpecifiedSourceFilesInput {
    /// Descriptors paired with the intent that selected them.
    pub sources_with_origins: Vec<(SourcesDescriptor, OriginSpec)>,
    /// Strip source roots from typed descriptors.
    pub strip_source_roots: bool,
}

/// Resolve legacy targets whose files are already captured.
#[derive(Debug, Clone, Default)]
pub struct LegacyAllSourceFilesInput {
    /// Legacy targets.
    pub targets: Vec<LegacyTarget>,
    /// Strip source roots from non raw-files targets.
    pub strip_source_roots: bool,
}

/// The final, deduplicated file set of a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceFiles {
    /// Merged files, sorted by path.
    pub snapshot: Snapshot,
    /// Paths that carried different content from different descriptors.
    pub collisions: Vec<PathCollision>,
}

impl SourceFiles {
    /// Sorted file paths.
    #[must_use]
    pub fn files(&self) -> Vec<String> {
        self.snapshot.files()
    }

    /// Returns true when no file was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

/// Bounds applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveLimits {
    /// Maximum number of descriptors resolved at once.
    pub max_concurrency: usize,
    /// Deadline for the whole request.
    pub timeout: Duration,
}

impl Default for ResolveLimits {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Dependencies shared by the source-files use cases.
#[derive(Clone)]
pub struct SourceFilesDeps {
    /// Expands descriptors into owned snapshots.
    pub hydrator: Arc<dyn SourcesHydrationPort>,
    /// Snapshot path-set algebra.
    pub store: Arc<dyn SnapshotStorePort>,
    /// Source root inference.
    pub source_roots: Arc<dyn SourceRootPort>,
    /// Request bounds.
    pub limits: ResolveLimits,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional telemetry sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// One item after resolution, before stripping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Owning target.
    pub address: TargetAddress,
    /// Decides whether stripping applies.
    pub kind: SourcesKind,
    /// Resolved files.
    pub snapshot: Snapshot,
}

/// Which public request is running; names log events and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFilesRequestKind {
    /// Full ownership of descriptors.
    All,
    /// Intent-aware resolution.
    Specified,
    /// Legacy targets.
    Legacy,
}

impl SourceFilesRequestKind {
    /// Stable name used in event and metric names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Specified => "specified",
            Self::Legacy => "legacy",
        }
    }

    /// Operation label used for cancellation and timeout errors.
    #[must_use]
    pub const fn operation(self) -> &'static str {
        match self {
            Self::All => "source_files.all",
            Self::Specified => "source_files.specified",
            Self::Legacy => "source_files.legacy",
        }
    }

    /// Full event or metric name, e.g. `sourceFiles.all.start`.
    #[must_use]
    pub fn event(self, suffix: &str) -> String {
        format!("sourceFiles.{}.{suffix}", self.as_str())
    }
}
