//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict: a present-but-invalid variable fails fast instead of
//! being ignored. CSV lists are normalized the same way file values are.

use crate::schema::{ResolverConfig, ValidatedResolverConfig};
use sourceset_shared::{ErrorCode, ErrorEnvelope, REDACTED, is_secret_key};
use std::collections::BTreeMap;
use std::fmt;

/// Env var: core timeout in milliseconds.
pub const ENV_CORE_TIMEOUT_MS: &str = "SOURCESET_CORE_TIMEOUT_MS";
/// Env var: core max concurrency.
pub const ENV_CORE_MAX_CONCURRENCY: &str = "SOURCESET_CORE_MAX_CONCURRENCY";
/// Env var: source root patterns as CSV (full replacement).
pub const ENV_SOURCE_ROOTS: &str = "SOURCESET_SOURCE_ROOTS";
/// Env var: snapshot max file size in bytes.
pub const ENV_SNAPSHOT_MAX_FILE_SIZE_BYTES: &str = "SOURCESET_SNAPSHOT_MAX_FILE_SIZE_BYTES";

const MAX_CSV_ITEMS: usize = 1_000;

/// Typed env-derived overrides for `ResolverConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverEnv {
    /// Override for `core.timeoutMs`.
    pub core_timeout_ms: Option<u64>,
    /// Override for `core.maxConcurrency`.
    pub core_max_concurrency: Option<u32>,
    /// Override for `sourceRoots.roots` (full replacement).
    pub source_roots: Option<Vec<Box<str>>>,
    /// Override for `snapshot.maxFileSizeBytes`.
    pub snapshot_max_file_size_bytes: Option<u64>,
}

impl ResolverEnv {
    /// Parse env overrides from a key/value map.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            core_timeout_ms: parse_optional_u64(map, ENV_CORE_TIMEOUT_MS)?,
            core_max_concurrency: parse_optional_u32(map, ENV_CORE_MAX_CONCURRENCY)?,
            source_roots: parse_optional_csv_roots(map, ENV_SOURCE_ROOTS)?,
            snapshot_max_file_size_bytes: parse_optional_u64(
                map,
                ENV_SNAPSHOT_MAX_FILE_SIZE_BYTES,
            )?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in [
            ENV_CORE_TIMEOUT_MS,
            ENV_CORE_MAX_CONCURRENCY,
            ENV_SOURCE_ROOTS,
            ENV_SNAPSHOT_MAX_FILE_SIZE_BYTES,
        ] {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }

        Self::from_map(&map)
    }

    /// True when no variable was set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.core_timeout_ms.is_none()
            && self.core_max_concurrency.is_none()
            && self.source_roots.is_none()
            && self.snapshot_max_file_size_bytes.is_none()
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: ResolverConfig,
    env: &ResolverEnv,
) -> Result<ValidatedResolverConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(value) = env.core_timeout_ms {
        config.core.timeout_ms = value;
    }
    if let Some(value) = env.core_max_concurrency {
        config.core.max_concurrency = value;
    }
    if let Some(roots) = env.source_roots.as_ref() {
        config.source_roots.roots.clone_from(roots);
    }
    if let Some(value) = env.snapshot_max_file_size_bytes {
        config.snapshot.max_file_size_bytes = value;
    }

    config.validate_and_normalize().map_err(Into::into)
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// CSV list exceeds a safety limit.
    CsvTooLarge {
        /// Env var name.
        var: &'static str,
        /// Number of parsed items.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
            Self::CsvTooLarge { .. } => ErrorCode::new("config", "invalid_env_csv"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
            Self::CsvTooLarge { var, len, max } => {
                write!(formatter, "{var} is too large ({len} items, max {max})")
            },
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());

        match error {
            EnvParseError::EmptyValue { var } => envelope.with_metadata("env_var", var),
            EnvParseError::InvalidInt { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_value(var, &value)),
            EnvParseError::CsvTooLarge { var, len, max } => envelope
                .with_metadata("env_var", var)
                .with_metadata("len", len.to_string())
                .with_metadata("max", max.to_string()),
        }
    }
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: raw.clone(),
        })
}

fn parse_optional_u32(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u32>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    trimmed
        .parse::<u32>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: raw.clone(),
        })
}

/// Root patterns are only split here; the schema normalizes and validates them.
fn parse_optional_csv_roots(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Vec<Box<str>>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Some(Vec::new()));
    }

    let items: Vec<Box<str>> = trimmed
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Into::into)
        .collect();
    if items.len() > MAX_CSV_ITEMS {
        return Err(EnvParseError::CsvTooLarge {
            var,
            len: items.len(),
            max: MAX_CSV_ITEMS,
        });
    }

    Ok(Some(items))
}

fn redact_value(var: &str, value: &str) -> String {
    if is_secret_key(var) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn missing_vars_default_to_none() -> Result<(), Box<dyn Error>> {
        let env = ResolverEnv::from_map(&BTreeMap::new())?;
        assert!(env.is_empty());
        Ok(())
    }

    #[test]
    fn csv_roots_skip_blank_items() -> Result<(), Box<dyn Error>> {
        let mut map = BTreeMap::new();
        map.insert(ENV_SOURCE_ROOTS.to_string(), " src/*, ,lib ".to_string());
        let env = ResolverEnv::from_map(&map)?;
        assert_eq!(
            env.source_roots,
            Some(vec![Box::<str>::from("src/*"), Box::<str>::from("lib")])
        );
        Ok(())
    }

    #[test]
    fn invalid_ints_echo_the_raw_value() -> Result<(), Box<dyn Error>> {
        let mut map = BTreeMap::new();
        map.insert(ENV_CORE_MAX_CONCURRENCY.to_string(), "eight".to_string());

        let envelope: ErrorEnvelope = ResolverEnv::from_map(&map)
            .err()
            .ok_or_else(|| std::io::Error::other("expected int error"))?
            .into();
        assert_eq!(envelope.code, ErrorCode::new("config", "invalid_env_int"));
        assert_eq!(
            envelope.metadata.get("value").map(String::as_str),
            Some("eight")
        );
        Ok(())
    }

    #[test]
    fn secret_named_vars_are_redacted() {
        assert_eq!(redact_value("SOURCESET_API_TOKEN", "abc"), REDACTED);
        assert_eq!(redact_value(ENV_CORE_TIMEOUT_MS, "abc"), "abc");
    }
}
