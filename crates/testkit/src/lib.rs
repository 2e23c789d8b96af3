//! # sourceset-testkit
//!
//! Test helpers, project fixtures and in-memory adapters.
//! This crate depends on `domain`, `ports` and `shared`.

pub mod fixtures;
pub mod in_memory;

pub use fixtures::{ProjectFixture, TargetFixture, resolution_project};
pub use in_memory::{
    FixedSourceRoots, InMemoryFileSystem, InMemorySnapshotStore, NoopLogger, NoopTelemetry,
    RecordingLogger, RecordingTelemetry, StaticSourcesHydrator,
};
