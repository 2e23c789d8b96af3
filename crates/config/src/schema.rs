//! Resolver configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization enforces stable ordering for list fields.

use sourceset_domain::normalize_dir;
use sourceset_shared::{BoundedU32, BoundedU64, ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

const CORE_TIMEOUT_MIN_MS: u64 = 1_000;
const CORE_TIMEOUT_MAX_MS: u64 = 600_000;
const CORE_MAX_CONCURRENCY_MIN: u32 = 1;
const CORE_MAX_CONCURRENCY_MAX: u32 = 256;

const SNAPSHOT_MAX_FILE_SIZE_MIN_BYTES: u64 = 1;
const SNAPSHOT_MAX_FILE_SIZE_MAX_BYTES: u64 = 100_000_000;

const SOURCE_ROOTS_MAX: usize = 512;

/// Top-level resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ResolverConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Core runtime settings.
    pub core: CoreConfig,
    /// Source root patterns.
    pub source_roots: SourceRootsConfig,
    /// Snapshot capture settings.
    pub snapshot: SnapshotConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            core: CoreConfig::default(),
            source_roots: SourceRootsConfig::default(),
            snapshot: SnapshotConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedResolverConfig, ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }

        self.source_roots.normalize_and_validate()?;
        let limits = ConfigLimits::new(&self)?;
        Ok(ValidatedResolverConfig { raw: self, limits })
    }
}

/// Validated config wrapper carrying bounded numeric values.
#[derive(Debug, Clone)]
pub struct ValidatedResolverConfig {
    raw: ResolverConfig,
    limits: ConfigLimits,
}

impl ValidatedResolverConfig {
    /// Access validated numeric bounds.
    #[must_use]
    pub const fn limits(&self) -> &ConfigLimits {
        &self.limits
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> ResolverConfig {
        self.raw
    }
}

impl std::ops::Deref for ValidatedResolverConfig {
    type Target = ResolverConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Validated numeric limits derived from the config.
#[derive(Debug, Clone, Copy)]
pub struct ConfigLimits {
    /// Whole-request timeout (ms).
    pub core_timeout_ms: BoundedU64<CORE_TIMEOUT_MIN_MS, CORE_TIMEOUT_MAX_MS>,
    /// Per-item fan-out width.
    pub core_max_concurrency: BoundedU32<CORE_MAX_CONCURRENCY_MIN, CORE_MAX_CONCURRENCY_MAX>,
    /// Largest file the snapshot store will capture.
    pub snapshot_max_file_size_bytes:
        BoundedU64<SNAPSHOT_MAX_FILE_SIZE_MIN_BYTES, SNAPSHOT_MAX_FILE_SIZE_MAX_BYTES>,
}

impl ConfigLimits {
    fn new(config: &ResolverConfig) -> Result<Self, ConfigSchemaError> {
        Ok(Self {
            core_timeout_ms: BoundedU64::try_new(config.core.timeout_ms).map_err(|_| {
                ConfigSchemaError::TimeoutOutOfRange {
                    section: "core",
                    field: "timeoutMs",
                    value_ms: config.core.timeout_ms,
                    min_ms: CORE_TIMEOUT_MIN_MS,
                    max_ms: CORE_TIMEOUT_MAX_MS,
                }
            })?,
            core_max_concurrency: BoundedU32::try_new(config.core.max_concurrency).map_err(
                |error| ConfigSchemaError::LimitOutOfRange {
                    section: "core",
                    field: "maxConcurrency",
                    value: u64::from(error.value),
                    min: u64::from(error.min),
                    max: u64::from(error.max),
                },
            )?,
            snapshot_max_file_size_bytes: BoundedU64::try_new(config.snapshot.max_file_size_bytes)
                .map_err(|error| ConfigSchemaError::LimitOutOfRange {
                    section: "snapshot",
                    field: "maxFileSizeBytes",
                    value: error.value,
                    min: error.min,
                    max: error.max,
                })?,
        })
    }
}

/// Parse a resolver config from a JSON string, applying validation and normalization.
pub fn parse_resolver_config_json(input: &str) -> Result<ValidatedResolverConfig, ErrorEnvelope> {
    let config: ResolverConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a resolver config from a TOML string, applying validation and normalization.
pub fn parse_resolver_config_toml(input: &str) -> Result<ValidatedResolverConfig, ErrorEnvelope> {
    let config: ResolverConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Core runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CoreConfig {
    /// Maximum time (in ms) a single resolution request may take.
    pub timeout_ms: u64,
    /// Maximum number of descriptors resolved concurrently.
    pub max_concurrency: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_concurrency: 8,
        }
    }
}

/// Source root patterns.
///
/// Each pattern is a project-relative directory; a `*` segment matches any
/// single directory name (`src/*` matches `src/python` and `src/java`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SourceRootsConfig {
    /// Root patterns, normalized, deduplicated and sorted.
    pub roots: Vec<Box<str>>,
}

impl Default for SourceRootsConfig {
    fn default() -> Self {
        Self {
            roots: [
                "src/java",
                "src/python",
                "src/rust",
                "src/scala",
                "test/java",
                "test/python",
                "tests/java",
                "tests/python",
            ]
            .into_iter()
            .map(Into::into)
            .collect(),
        }
    }
}

impl SourceRootsConfig {
    fn normalize_and_validate(&mut self) -> Result<(), ConfigSchemaError> {
        self.roots = normalize_root_patterns(&self.roots)?;
        if self.roots.len() > SOURCE_ROOTS_MAX {
            return Err(ConfigSchemaError::ListTooLarge {
                section: "sourceRoots",
                field: "roots",
                len: self.roots.len(),
                max: SOURCE_ROOTS_MAX,
            });
        }
        Ok(())
    }
}

/// Snapshot capture configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SnapshotConfig {
    /// Files larger than this are rejected at capture time.
    pub max_file_size_bytes: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 10_000_000,
        }
    }
}

/// Typed validation errors for the configuration schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A timeout value is out of bounds.
    TimeoutOutOfRange {
        /// Schema section (e.g. `core`).
        section: &'static str,
        /// Field name in the config file (e.g. `timeoutMs`).
        field: &'static str,
        /// Value provided (ms).
        value_ms: u64,
        /// Minimum allowed value (ms).
        min_ms: u64,
        /// Maximum allowed value (ms).
        max_ms: u64,
    },
    /// A numeric limit is out of bounds.
    LimitOutOfRange {
        /// Schema section (e.g. `snapshot`).
        section: &'static str,
        /// Field name in the config file (e.g. `maxFileSizeBytes`).
        field: &'static str,
        /// Value provided.
        value: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },
    /// A list field exceeds the maximum allowed size.
    ListTooLarge {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
        /// Number of entries after deduplication.
        len: usize,
        /// Maximum allowed number of entries.
        max: usize,
    },
    /// A source root pattern is invalid.
    InvalidRootPattern {
        /// Invalid pattern value.
        pattern: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::TimeoutOutOfRange { .. } => ErrorCode::new("config", "invalid_timeout"),
            Self::LimitOutOfRange { .. } => ErrorCode::new("config", "invalid_limit"),
            Self::ListTooLarge { .. } => ErrorCode::new("config", "list_too_large"),
            Self::InvalidRootPattern { .. } => ErrorCode::new("config", "invalid_root_pattern"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => write!(
                formatter,
                "unsupported config version: {found} (supported: {supported})"
            ),
            Self::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min_ms}, {max_ms}] ms (got {value_ms})"
            ),
            Self::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min}, {max}] (got {value})"
            ),
            Self::ListTooLarge {
                section,
                field,
                len,
                max,
            } => write!(
                formatter,
                "{section}.{field} must have at most {max} entries (got {len})"
            ),
            Self::InvalidRootPattern { pattern } => {
                write!(formatter, "invalid source root pattern: {pattern}")
            },
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value_ms", value_ms.to_string())
                .with_metadata("min_ms", min_ms.to_string())
                .with_metadata("max_ms", max_ms.to_string()),
            ConfigSchemaError::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value", value.to_string())
                .with_metadata("min", min.to_string())
                .with_metadata("max", max.to_string()),
            ConfigSchemaError::ListTooLarge {
                section,
                field,
                len,
                max,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("len", len.to_string())
                .with_metadata("max", max.to_string()),
            ConfigSchemaError::InvalidRootPattern { pattern } => {
                envelope.with_metadata("pattern", pattern)
            },
        }
    }
}

fn normalize_root_patterns(input: &[Box<str>]) -> Result<Vec<Box<str>>, ConfigSchemaError> {
    let mut normalized = Vec::with_capacity(input.len());
    for pattern in input {
        let invalid = || ConfigSchemaError::InvalidRootPattern {
            pattern: pattern.as_ref().to_owned(),
        };
        if pattern.trim().is_empty() {
            return Err(invalid());
        }
        let dir = normalize_dir(pattern).map_err(|_| invalid())?;
        let has_partial_wildcard = dir
            .split('/')
            .any(|segment| segment != "*" && segment.contains(['*', '?', '[', ']', '{', '}']));
        if has_partial_wildcard {
            return Err(invalid());
        }
        normalized.push(dir);
    }

    normalized.sort_unstable();
    normalized.dedup();
    Ok(normalized)
}
