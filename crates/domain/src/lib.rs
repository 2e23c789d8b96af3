//! # sourceset-domain
//!
//! Pure data model for resolving the source files of build targets.
//!
//! - **Addresses and paths** - `TargetAddress`, `ProjectPath`
//! - **Declarations** - `SourcesDescriptor`, `SourcesKind`, `LegacyTarget`
//! - **Intents** - `OriginSpec` and its `Classification`
//! - **Snapshots** - `Snapshot`, `FileDigest`, subset / merge / strip algebra
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod address;
pub mod error;
pub mod origin;
pub mod path;
pub mod snapshot;
pub mod sources;

pub use address::TargetAddress;
pub use error::DomainError;
pub use origin::{Classification, OriginSpec};
pub use path::{ProjectPath, normalize_dir};
pub use snapshot::{FileDigest, MergedSnapshot, PathCollision, Snapshot, SnapshotEntry};
pub use sources::{LegacyTarget, RAW_FILES_TYPE_ALIAS, SourcesDescriptor, SourcesKind};
