//! Integration tests for parsing config fixtures from the workspace testkit.

use sourceset_config::{
    CURRENT_CONFIG_VERSION, parse_resolver_config_json, parse_resolver_config_toml,
};
use sourceset_shared::ErrorCode;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest_dir.to_path_buf())
}

fn read_fixture(relative: &str) -> Result<String, Box<dyn Error>> {
    let path = workspace_root()
        .join("crates")
        .join("testkit")
        .join("fixtures")
        .join(relative);
    Ok(fs::read_to_string(path)?)
}

#[test]
fn parses_valid_fixture_and_normalizes() -> Result<(), Box<dyn Error>> {
    let config = parse_resolver_config_json(&read_fixture("config/resolver-config.valid.json")?)?;

    assert_eq!(config.version, CURRENT_CONFIG_VERSION);
    assert_eq!(config.core.max_concurrency, 16);
    assert_eq!(config.limits().core_timeout_ms.get(), 45_000);
    assert_eq!(config.limits().snapshot_max_file_size_bytes.get(), 2_000_000);

    let roots: Vec<&str> = config.source_roots.roots.iter().map(AsRef::as_ref).collect();
    assert_eq!(roots, vec!["3rdparty/python", "src/*", "tests/python"]);
    Ok(())
}

#[test]
fn json_and_toml_fixtures_agree() -> Result<(), Box<dyn Error>> {
    let json = parse_resolver_config_json(&read_fixture("config/resolver-config.valid.json")?)?;
    let toml = parse_resolver_config_toml(&read_fixture("config/resolver-config.valid.toml")?)?;
    assert_eq!(json.into_inner(), toml.into_inner());
    Ok(())
}

#[test]
fn rejects_unsupported_version() -> Result<(), Box<dyn Error>> {
    let result =
        parse_resolver_config_json(&read_fixture("config/resolver-config.invalid-version.json")?);
    let error = result.err().ok_or("expected version error")?;
    assert_eq!(error.code, ErrorCode::new("config", "unsupported_version"));
    assert_eq!(error.metadata.get("found").map(String::as_str), Some("2"));
    Ok(())
}

#[test]
fn rejects_recursive_root_pattern() -> Result<(), Box<dyn Error>> {
    let result =
        parse_resolver_config_json(&read_fixture("config/resolver-config.invalid-root.json")?);
    let error = result.err().ok_or("expected root pattern error")?;
    assert_eq!(error.code, ErrorCode::new("config", "invalid_root_pattern"));
    assert_eq!(
        error.metadata.get("pattern").map(String::as_str),
        Some("src/**")
    );
    Ok(())
}

#[test]
fn rejects_unknown_fields() -> Result<(), Box<dyn Error>> {
    let result =
        parse_resolver_config_json(&read_fixture("config/resolver-config.unknown-field.json")?);
    let error = result.err().ok_or("expected unknown field error")?;
    assert_eq!(error.code, ErrorCode::new("config", "invalid_json"));
    Ok(())
}
