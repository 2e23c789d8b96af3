//! Integration tests for env overrides layered over config sources.

use sourceset_config::{
    ENV_CORE_MAX_CONCURRENCY, ENV_CORE_TIMEOUT_MS, ENV_SNAPSHOT_MAX_FILE_SIZE_BYTES,
    ENV_SOURCE_ROOTS, ResolverEnv, load_resolver_config_from_sources,
};
use sourceset_shared::ErrorCode;
use std::collections::BTreeMap;
use std::error::Error;

fn env_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

#[test]
fn env_overrides_win_over_file_and_overrides() -> Result<(), Box<dyn Error>> {
    let env = ResolverEnv::from_map(&env_map(&[
        (ENV_CORE_TIMEOUT_MS, "90000"),
        (ENV_SOURCE_ROOTS, "lib/*, src/python"),
    ]))?;
    let config = load_resolver_config_from_sources(
        Some(r#"{ "core": { "timeoutMs": 40000 }, "sourceRoots": { "roots": ["a"] } }"#),
        Some(r#"{ "core": { "timeoutMs": 50000 } }"#),
        &env,
    )?;

    assert_eq!(config.core.timeout_ms, 90_000);
    let roots: Vec<&str> = config.source_roots.roots.iter().map(AsRef::as_ref).collect();
    assert_eq!(roots, vec!["lib/*", "src/python"]);
    Ok(())
}

#[test]
fn empty_roots_csv_clears_the_list() -> Result<(), Box<dyn Error>> {
    let env = ResolverEnv::from_map(&env_map(&[(ENV_SOURCE_ROOTS, "  ")]))?;
    let config = load_resolver_config_from_sources(None, None, &env)?;
    assert!(config.source_roots.roots.is_empty());
    Ok(())
}

#[test]
fn out_of_range_env_value_fails_validation() -> Result<(), Box<dyn Error>> {
    let env = ResolverEnv::from_map(&env_map(&[(ENV_CORE_MAX_CONCURRENCY, "1000")]))?;
    let error = load_resolver_config_from_sources(None, None, &env)
        .err()
        .ok_or("expected limit error")?;
    assert_eq!(error.code, ErrorCode::new("config", "invalid_limit"));
    assert_eq!(error.metadata.get("max").map(String::as_str), Some("256"));
    Ok(())
}

#[test]
fn blank_numeric_env_value_is_rejected() {
    let result = ResolverEnv::from_map(&env_map(&[(ENV_SNAPSHOT_MAX_FILE_SIZE_BYTES, " ")]));
    assert!(result.is_err());
}
