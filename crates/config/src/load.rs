//! Config loading helpers (env + file + overrides).
//!
//! The loader owns the merge order and surfaces user-facing errors as typed
//! `ErrorEnvelope`s.

use crate::{ResolverConfig, ResolverEnv, ValidatedResolverConfig, apply_env_overrides};
use sourceset_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Load the resolver config from sources using a deterministic precedence order.
///
/// Precedence (highest wins):
/// - env overrides (`ResolverEnv`)
/// - overrides JSON (partial config)
/// - config JSON (file content)
/// - defaults (`ResolverConfig::default()`)
pub fn load_resolver_config_from_sources(
    config_json: Option<&str>,
    overrides_json: Option<&str>,
    env: &ResolverEnv,
) -> Result<ValidatedResolverConfig, ErrorEnvelope> {
    let config = match config_json {
        None => ResolverConfig::default(),
        Some(input) => parse_config_unvalidated(input, ConfigFormat::Json)?,
    };
    merge_and_validate(config, overrides_json, env)
}

/// Load the resolver config from an optional `.json` or `.toml` file.
pub fn load_resolver_config_from_path(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
    env: &ResolverEnv,
) -> Result<ValidatedResolverConfig, ErrorEnvelope> {
    let config = match config_path {
        None => ResolverConfig::default(),
        Some(path) => {
            let format = detect_config_format(path)?;
            let config_text = read_config_file(path)?;
            parse_config_unvalidated(&config_text, format)?
        },
    };
    merge_and_validate(config, overrides_json, env)
}

/// Load the resolver config from std env and an optional file path.
pub fn load_resolver_config_std_env(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<ValidatedResolverConfig, ErrorEnvelope> {
    let env = ResolverEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_resolver_config_from_path(config_path, overrides_json, &env)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &ResolverConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &ResolverConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn merge_and_validate(
    mut config: ResolverConfig,
    overrides_json: Option<&str>,
    env: &ResolverEnv,
) -> Result<ValidatedResolverConfig, ErrorEnvelope> {
    if let Some(input) = overrides_json {
        let overrides = parse_overrides_json(input)?;
        apply_overrides(&mut config, overrides);
    }

    // env goes last and also validates the merged result.
    apply_env_overrides(config, env)
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<ResolverConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn parse_overrides_json(input: &str) -> Result<ResolverConfigOverrides, ErrorEnvelope> {
    serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid overrides JSON: {error}"),
        )
        .with_metadata("source", "overrides")
    })
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct ResolverConfigOverrides {
    version: Option<u32>,
    core: CoreConfigOverrides,
    source_roots: SourceRootsOverrides,
    snapshot: SnapshotOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct CoreConfigOverrides {
    timeout_ms: Option<u64>,
    max_concurrency: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct SourceRootsOverrides {
    roots: Option<Vec<Box<str>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct SnapshotOverrides {
    max_file_size_bytes: Option<u64>,
}

fn apply_overrides(config: &mut ResolverConfig, overrides: ResolverConfigOverrides) {
    if let Some(version) = overrides.version {
        config.version = version;
    }
    if let Some(value) = overrides.core.timeout_ms {
        config.core.timeout_ms = value;
    }
    if let Some(value) = overrides.core.max_concurrency {
        config.core.max_concurrency = value;
    }
    if let Some(roots) = overrides.source_roots.roots {
        config.source_roots.roots = roots;
    }
    if let Some(value) = overrides.snapshot.max_file_size_bytes {
        config.snapshot.max_file_size_bytes = value;
    }
}
