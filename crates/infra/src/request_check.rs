//! Request validation helpers for CLI surfaces.

use crate::InfraResult;
use sourceset_config::{
    ValidatedAllSourceFilesRequest, ValidatedLegacyAllSourceFilesRequest,
    ValidatedSpecifiedSourceFilesRequest, parse_all_source_files_request_json,
    parse_legacy_all_source_files_request_json, parse_specified_source_files_request_json,
};
use sourceset_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;
use std::str::FromStr;

/// Supported request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Everything the listed targets own.
    AllSourceFiles,
    /// What the caller named, restricted to ownership.
    SpecifiedSourceFiles,
    /// Older target representation with captured files.
    LegacyAllSourceFiles,
}

/// Validated request payloads by kind.
#[derive(Debug)]
pub enum ValidatedRequest {
    /// Validated all-sources request.
    AllSourceFiles(ValidatedAllSourceFilesRequest),
    /// Validated specified-sources request.
    SpecifiedSourceFiles(ValidatedSpecifiedSourceFilesRequest),
    /// Validated legacy request.
    LegacyAllSourceFiles(ValidatedLegacyAllSourceFilesRequest),
}

impl RequestKind {
    /// Canonical string representation (for CLI/UI).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllSourceFiles => "allSourceFiles",
            Self::SpecifiedSourceFiles => "specifiedSourceFiles",
            Self::LegacyAllSourceFiles => "legacyAllSourceFiles",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = ErrorEnvelope;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "allSourceFiles" | "all" => Ok(Self::AllSourceFiles),
            "specifiedSourceFiles" | "specified" => Ok(Self::SpecifiedSourceFiles),
            "legacyAllSourceFiles" | "legacy" => Ok(Self::LegacyAllSourceFiles),
            other => Err(ErrorEnvelope::expected(
                ErrorCode::new("config", "unknown_request_kind"),
                format!("unknown request kind: {other}"),
            )
            .with_metadata("request_kind", other)),
        }
    }
}

impl ValidatedRequest {
    /// Kind of the wrapped request.
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::AllSourceFiles(_) => RequestKind::AllSourceFiles,
            Self::SpecifiedSourceFiles(_) => RequestKind::SpecifiedSourceFiles,
            Self::LegacyAllSourceFiles(_) => RequestKind::LegacyAllSourceFiles,
        }
    }
}

/// Validate a request payload provided as JSON for the given kind.
pub fn validate_request_json(kind: RequestKind, input_json: &str) -> InfraResult<ValidatedRequest> {
    match kind {
        RequestKind::AllSourceFiles => {
            let request = parse_all_source_files_request_json(input_json)?;
            Ok(ValidatedRequest::AllSourceFiles(request))
        },
        RequestKind::SpecifiedSourceFiles => {
            let request = parse_specified_source_files_request_json(input_json)?;
            Ok(ValidatedRequest::SpecifiedSourceFiles(request))
        },
        RequestKind::LegacyAllSourceFiles => {
            let request = parse_legacy_all_source_files_request_json(input_json)?;
            Ok(ValidatedRequest::LegacyAllSourceFiles(request))
        },
    }
}
