//! # sourceset-app
//!
//! Application use cases for resolving the source files of build targets.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod source_files;

pub use source_files::{
    AllSourceFilesInput, LegacyAllSourceFilesInput, ResolveLimits, SourceFiles, SourceFilesDeps,
    SpecifiedSourceFilesInput, all_source_files, legacy_all_source_files, specified_source_files,
};
