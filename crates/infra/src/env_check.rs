//! Environment validation helpers for CLI surfaces.

use sourceset_config::{ResolverConfig, ResolverEnv, apply_env_overrides};
use sourceset_shared::ErrorEnvelope;
use std::collections::BTreeMap;

/// Infra-level error type (shared error envelope).
pub type InfraError = ErrorEnvelope;

/// Infra-level result type.
pub type InfraResult<T> = Result<T, InfraError>;

/// Validate that the provided env overrides can be parsed and merged into a config.
pub fn validate_env_parsing(env: &BTreeMap<String, String>) -> InfraResult<()> {
    let parsed = ResolverEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    let _ = apply_env_overrides(ResolverConfig::default(), &parsed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sourceset_config::ENV_CORE_MAX_CONCURRENCY;

    #[test]
    fn empty_env_is_valid() {
        assert!(validate_env_parsing(&BTreeMap::new()).is_ok());
    }

    #[test]
    fn out_of_range_concurrency_is_rejected() {
        let env = BTreeMap::from([(ENV_CORE_MAX_CONCURRENCY.to_owned(), "0".to_owned())]);
        assert!(validate_env_parsing(&env).is_err());
    }
}
