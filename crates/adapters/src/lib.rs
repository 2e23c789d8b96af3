//! # sourceset-adapters
//!
//! Adapter implementations for ports: local filesystem, digest snapshot
//! store, glob hydration, source roots, JSON logging and telemetry.
//! This crate depends on `ports`, `shared`, and `domain`.

pub mod fs;
pub mod hydration;
pub mod log_sink;
pub mod logger;
pub mod snapshot_store;
pub mod source_roots;
pub mod telemetry;

pub use fs::LocalFileSystem;
pub use hydration::GlobSourcesHydrator;
pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use logger::JsonLogger;
pub use snapshot_store::DigestSnapshotStore;
pub use source_roots::PatternSourceRoots;
pub use telemetry::JsonTelemetry;
