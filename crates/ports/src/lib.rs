//! # sourceset-ports
//!
//! Collaborator contracts for source-file resolution: hydration of declared
//! sources, the content store, source-root inference, filesystem access,
//! logging and telemetry. Depends only on `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub mod filesystem;
pub mod hydration;
pub mod logger;
pub mod snapshot_store;
pub mod source_roots;
pub mod telemetry;

pub use filesystem::*;
pub use hydration::*;
pub use logger::*;
pub use snapshot_store::*;
pub use source_roots::*;
pub use telemetry::*;

#[cfg(test)]
mod tests {
    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
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
    fn ports_depend_only_on_domain_and_shared() {
        let deps = workspace_deps();
        let allowed = ["sourceset-domain", "sourceset-shared"];

        for dep in &deps {
            assert!(
                allowed.contains(&dep.as_str()),
                "unexpected dependency found: {dep}"
            );
        }
        for expected in allowed {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
    }
}
