//! Request DTOs and validation helpers.
//!
//! Requests are boundary inputs (CLI/API) and must be validated before being
//! passed into use-cases. Validation here is limited to shape (required
//! fields, trimming, tag recognition). Address and path rules are delegated to
//! domain constructors and not duplicated here.

use schemars::JsonSchema;
use sourceset_domain::{
    DomainError, OriginSpec, ProjectPath, SourcesDescriptor, SourcesKind, TargetAddress,
};
use sourceset_shared::{ErrorCode, ErrorEnvelope, Validated};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared sources of one target (boundary DTO).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SourcesDescriptorDto {
    /// Owning target address (`dir:name`).
    pub address: String,
    /// Declared patterns relative to the address directory; `!` excludes.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Descriptor kind; defaults to typed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SourcesKindDto>,
}

/// Descriptor kind tag (boundary DTO).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum SourcesKindDto {
    /// Source-rooted sources.
    Typed,
    /// Raw files, never stripped.
    RawFiles,
}

/// Selection intent (boundary DTO), tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OriginSpecDto {
    /// `dir:name`.
    SingleAddress {
        /// Target directory.
        directory: String,
        /// Target name.
        name: String,
    },
    /// `dir:`.
    SiblingAddresses {
        /// Directory.
        directory: String,
    },
    /// `dir::`.
    DescendantAddresses {
        /// Directory.
        directory: String,
    },
    /// `dir^`.
    AscendantAddresses {
        /// Directory.
        directory: String,
    },
    /// A file named directly.
    FilesystemLiteral {
        /// File path.
        file: String,
    },
    /// A glob with the files it matched at selection time.
    FilesystemResolvedGlob {
        /// Glob text.
        glob: String,
        /// Matched files.
        #[serde(default)]
        files: Vec<String>,
    },
    /// Any tag this build does not know.
    #[serde(other)]
    Unknown,
}

/// Descriptor paired with its selection intent (boundary DTO).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SourcesWithOriginDto {
    /// Declared sources.
    pub sources: SourcesDescriptorDto,
    /// How the target was selected.
    pub origin: OriginSpecDto,
}

/// "Everything these targets own" request payload (boundary DTO).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AllSourceFilesRequestDto {
    /// Descriptors to resolve.
    pub sources: Vec<SourcesDescriptorDto>,
    /// Strip source roots from typed descriptors.
    #[serde(default)]
    pub strip_source_roots: bool,
}

/// "What the caller named, restricted to ownership" request payload (boundary DTO).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SpecifiedSourceFilesRequestDto {
    /// Descriptor and intent pairs.
    pub sources_with_origins: Vec<SourcesWithOriginDto>,
    /// Strip source roots from typed descriptors.
    #[serde(default)]
    pub strip_source_roots: bool,
}

/// Legacy target (boundary DTO). Files are project-relative and captured by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LegacyTargetDto {
    /// Target address.
    pub address: String,
    /// Target type alias; `files` marks raw files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_alias: Option<String>,
    /// Owned files.
    #[serde(default)]
    pub files: Vec<String>,
}

/// Legacy request payload (boundary DTO).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LegacyAllSourceFilesRequestDto {
    /// Legacy targets.
    pub targets: Vec<LegacyTargetDto>,
    /// Strip source roots from non-`files` targets.
    #[serde(default)]
    pub strip_source_roots: bool,
}

/// Validated all-sources request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllSourceFilesRequest {
    /// Descriptors in request order.
    pub sources: Vec<SourcesDescriptor>,
    /// Strip source roots.
    pub strip_source_roots: bool,
}

/// Validated all-sources request proof.
pub type ValidatedAllSourceFilesRequest = Validated<AllSourceFilesRequest>;

/// Validated specified-sources request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifiedSourceFilesRequest {
    /// Descriptor and intent pairs in request order.
    pub sources_with_origins: Vec<(SourcesDescriptor, OriginSpec)>,
    /// Strip source roots.
    pub strip_source_roots: bool,
}

/// Validated specified-sources request proof.
pub type ValidatedSpecifiedSourceFilesRequest = Validated<SpecifiedSourceFilesRequest>;

/// Validated legacy target, files not yet captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTargetRequest {
    /// Target address.
    pub address: TargetAddress,
    /// Trimmed type alias.
    pub type_alias: Option<Box<str>>,
    /// Owned files, deduplicated and sorted.
    pub files: Vec<ProjectPath>,
}

/// Validated legacy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyAllSourceFilesRequest {
    /// Targets in request order.
    pub targets: Vec<LegacyTargetRequest>,
    /// Strip source roots.
    pub strip_source_roots: bool,
}

/// Validated legacy request proof.
pub type ValidatedLegacyAllSourceFilesRequest = Validated<LegacyAllSourceFilesRequest>;

/// Request validation errors mapped to `ErrorEnvelope`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestValidationError {
    /// A required string field is empty after trimming.
    EmptyField {
        /// Field name that failed validation.
        field: &'static str,
    },
    /// A string field contains invalid content.
    InvalidField {
        /// Field name that failed validation.
        field: &'static str,
        /// Short reason describing why validation failed.
        reason: &'static str,
    },
}

impl RequestValidationError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyField { .. } => ErrorCode::new("config", "empty_field"),
            Self::InvalidField { .. } => ErrorCode::new("config", "invalid_field"),
        }
    }
}

impl fmt::Display for RequestValidationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyField { field } => write!(formatter, "{field} must be non-empty"),
            Self::InvalidField { field, reason } => {
                write!(formatter, "{field} is invalid: {reason}")
            },
        }
    }
}

impl std::error::Error for RequestValidationError {}

impl From<RequestValidationError> for ErrorEnvelope {
    fn from(error: RequestValidationError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            RequestValidationError::EmptyField { field } => envelope.with_metadata("field", field),
            RequestValidationError::InvalidField { field, reason } => envelope
                .with_metadata("field", field)
                .with_metadata("reason", reason),
        }
    }
}

/// Validate and normalize an all-sources request.
pub fn validate_all_source_files_request(
    dto: &AllSourceFilesRequestDto,
) -> Result<ValidatedAllSourceFilesRequest, ErrorEnvelope> {
    let sources = dto
        .sources
        .iter()
        .map(validate_descriptor)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Validated::new(AllSourceFilesRequest {
        sources,
        strip_source_roots: dto.strip_source_roots,
    }))
}

/// Validate and normalize a specified-sources request.
pub fn validate_specified_source_files_request(
    dto: &SpecifiedSourceFilesRequestDto,
) -> Result<ValidatedSpecifiedSourceFilesRequest, ErrorEnvelope> {
    let sources_with_origins = dto
        .sources_with_origins
        .iter()
        .map(|pair| Ok((validate_descriptor(&pair.sources)?, validate_origin(&pair.origin)?)))
        .collect::<Result<Vec<_>, ErrorEnvelope>>()?;
    Ok(Validated::new(SpecifiedSourceFilesRequest {
        sources_with_origins,
        strip_source_roots: dto.strip_source_roots,
    }))
}

/// Validate and normalize a legacy request.
pub fn validate_legacy_all_source_files_request(
    dto: &LegacyAllSourceFilesRequestDto,
) -> Result<ValidatedLegacyAllSourceFilesRequest, ErrorEnvelope> {
    let targets = dto
        .targets
        .iter()
        .map(validate_legacy_target)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Validated::new(LegacyAllSourceFilesRequest {
        targets,
        strip_source_roots: dto.strip_source_roots,
    }))
}

/// Parse and validate an all-sources request JSON payload.
pub fn parse_all_source_files_request_json(
    input: &str,
) -> Result<ValidatedAllSourceFilesRequest, ErrorEnvelope> {
    let dto: AllSourceFilesRequestDto = parse_request_json("allSourceFiles", input)?;
    validate_all_source_files_request(&dto)
}

/// Parse and validate a specified-sources request JSON payload.
pub fn parse_specified_source_files_request_json(
    input: &str,
) -> Result<ValidatedSpecifiedSourceFilesRequest, ErrorEnvelope> {
    let dto: SpecifiedSourceFilesRequestDto = parse_request_json("specifiedSourceFiles", input)?;
    validate_specified_source_files_request(&dto)
}

/// Parse and validate a legacy request JSON payload.
pub fn parse_legacy_all_source_files_request_json(
    input: &str,
) -> Result<ValidatedLegacyAllSourceFilesRequest, ErrorEnvelope> {
    let dto: LegacyAllSourceFilesRequestDto =
        parse_request_json("legacyAllSourceFiles", input)?;
    validate_legacy_all_source_files_request(&dto)
}

fn parse_request_json<T: DeserializeOwned>(
    kind: &'static str,
    input: &str,
) -> Result<T, ErrorEnvelope> {
    serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid {kind} request JSON: {error}"),
        )
        .with_metadata("request_kind", kind)
    })
}

fn validate_descriptor(dto: &SourcesDescriptorDto) -> Result<SourcesDescriptor, ErrorEnvelope> {
    let address = TargetAddress::parse(require_trimmed("address", &dto.address)?)?;
    let sources = dto
        .sources
        .iter()
        .map(|pattern| require_trimmed("sources", pattern))
        .collect::<Result<Vec<_>, _>>()?;
    let kind = match dto.kind {
        None | Some(SourcesKindDto::Typed) => SourcesKind::Typed,
        Some(SourcesKindDto::RawFiles) => SourcesKind::RawFiles,
    };
    Ok(SourcesDescriptor::new(address, sources, kind))
}

/// Directories stay as given; classification ignores them. Unknown tags are a
/// caller/collaborator mismatch, not bad user data.
fn validate_origin(dto: &OriginSpecDto) -> Result<OriginSpec, ErrorEnvelope> {
    let origin = match dto {
        OriginSpecDto::SingleAddress { directory, name } => OriginSpec::SingleAddress {
            directory: directory.trim().into(),
            name: require_trimmed("origin.name", name)?,
        },
        OriginSpecDto::SiblingAddresses { directory } => OriginSpec::SiblingAddresses {
            directory: directory.trim().into(),
        },
        OriginSpecDto::DescendantAddresses { directory } => OriginSpec::DescendantAddresses {
            directory: directory.trim().into(),
        },
        OriginSpecDto::AscendantAddresses { directory } => OriginSpec::AscendantAddresses {
            directory: directory.trim().into(),
        },
        OriginSpecDto::FilesystemLiteral { file } => OriginSpec::FilesystemLiteral {
            file: require_trimmed("origin.file", file)?,
        },
        OriginSpecDto::FilesystemResolvedGlob { glob, files } => {
            OriginSpec::FilesystemResolvedGlob {
                glob: require_trimmed("origin.glob", glob)?,
                files: files.iter().map(|file| file.trim().into()).collect(),
            }
        },
        OriginSpecDto::Unknown => {
            return Err(DomainError::OriginContractViolation {
                origin: "unknown",
                value: "unrecognized origin type".to_owned(),
            }
            .into());
        },
    };
    Ok(origin)
}

fn validate_legacy_target(dto: &LegacyTargetDto) -> Result<LegacyTargetRequest, ErrorEnvelope> {
    let address = TargetAddress::parse(require_trimmed("address", &dto.address)?)?;
    let type_alias = match dto.type_alias.as_deref() {
        None => None,
        Some(raw) => Some(require_trimmed("typeAlias", raw)?),
    };
    let mut files = dto
        .files
        .iter()
        .map(|file| ProjectPath::parse(file).map_err(ErrorEnvelope::from))
        .collect::<Result<Vec<_>, _>>()?;
    files.sort_unstable();
    files.dedup();
    Ok(LegacyTargetRequest {
        address,
        type_alias,
        files,
    })
}

fn require_trimmed(field: &'static str, value: &str) -> Result<Box<str>, ErrorEnvelope> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RequestValidationError::EmptyField { field }.into());
    }
    if trimmed.contains('\0') {
        return Err(RequestValidationError::InvalidField {
            field,
            reason: "contains NUL byte",
        }
        .into());
    }
    Ok(trimmed.into())
}
