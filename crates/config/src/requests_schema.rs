//! JSON Schema exports for request DTOs.

use crate::{
    AllSourceFilesRequestDto, LegacyAllSourceFilesRequestDto, SpecifiedSourceFilesRequestDto,
};
use schemars::{Schema, schema_for};

/// JSON Schema for `AllSourceFilesRequestDto`.
#[must_use]
pub fn all_source_files_request_schema() -> Schema {
    schema_for!(AllSourceFilesRequestDto)
}

/// JSON Schema for `SpecifiedSourceFilesRequestDto`.
#[must_use]
pub fn specified_source_files_request_schema() -> Schema {
    schema_for!(SpecifiedSourceFilesRequestDto)
}

/// JSON Schema for `LegacyAllSourceFilesRequestDto`.
#[must_use]
pub fn legacy_all_source_files_request_schema() -> Schema {
    schema_for!(LegacyAllSourceFilesRequestDto)
}
