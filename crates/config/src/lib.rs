//! # sourceset-config
//!
//! Configuration schema, validation, and normalization for the resolver, plus
//! the boundary request DTOs. This crate depends on `domain` and `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Request DTOs and validation.
pub mod requests;
/// JSON Schema exports for request DTOs.
pub mod requests_schema;
/// Configuration schema types and helpers.
pub mod schema;

pub use schema::{
    CURRENT_CONFIG_VERSION, ConfigLimits, ConfigSchemaError, CoreConfig, ResolverConfig,
    SnapshotConfig, SourceRootsConfig, ValidatedResolverConfig, parse_resolver_config_json,
    parse_resolver_config_toml,
};

pub use env::{
    ENV_CORE_MAX_CONCURRENCY, ENV_CORE_TIMEOUT_MS, ENV_SNAPSHOT_MAX_FILE_SIZE_BYTES,
    ENV_SOURCE_ROOTS, EnvParseError, ResolverEnv, apply_env_overrides,
};
pub use load::{
    load_resolver_config_from_path, load_resolver_config_from_sources,
    load_resolver_config_std_env, to_pretty_json, to_pretty_toml,
};
pub use requests::{
    AllSourceFilesRequest, AllSourceFilesRequestDto, LegacyAllSourceFilesRequest,
    LegacyAllSourceFilesRequestDto, LegacyTargetDto, LegacyTargetRequest, OriginSpecDto,
    RequestValidationError, SourcesDescriptorDto, SourcesKindDto, SourcesWithOriginDto,
    SpecifiedSourceFilesRequest, SpecifiedSourceFilesRequestDto, ValidatedAllSourceFilesRequest,
    ValidatedLegacyAllSourceFilesRequest, ValidatedSpecifiedSourceFilesRequest,
    parse_all_source_files_request_json, parse_legacy_all_source_files_request_json,
    parse_specified_source_files_request_json, validate_all_source_files_request,
    validate_legacy_all_source_files_request, validate_specified_source_files_request,
};
pub use requests_schema::{
    all_source_files_request_schema, legacy_all_source_files_request_schema,
    specified_source_files_request_schema,
};
