//! # sourceset-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Dependency wiring from config.
pub mod composition;
/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;
/// Logger and telemetry selection.
pub mod observability;
/// Request validation helpers used by CLI surfaces.
pub mod request_check;
/// Request execution.
pub mod runner;

pub use composition::{build_source_files_deps, resolve_limits};
pub use config_check::load_effective_config_json;
pub use env_check::{InfraError, InfraResult, validate_env_parsing};
pub use observability::{ENV_LOG_LEVEL, ENV_TELEMETRY, Observability, log_level_from_env};
pub use request_check::{RequestKind, ValidatedRequest, validate_request_json};
pub use runner::{
    LocalRun, SourceFilesReport, capture_legacy_targets, run_request, run_request_json_local,
};

#[cfg(test)]
mod tests {
    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.starts_with('[') {
                in_deps = line == "[dependencies]";
                continue;
            }
            if in_deps && line.starts_with("sourceset-") {
                let key = line.split(['=', '.']).next().unwrap_or("").trim();
                deps.push(key.to_string());
            }
        }

        deps
    }

    #[test]
    fn infra_depends_on_app_adapters_config() {
        let deps = workspace_deps();
        let required = ["sourceset-app", "sourceset-adapters", "sourceset-config"];

        for expected in required {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
        assert!(!deps.iter().any(|dep| dep == "sourceset-testkit"));
    }
}
