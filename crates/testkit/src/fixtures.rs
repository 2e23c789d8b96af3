//! Fixture loading for project layouts and request payloads.

use crate::in_memory::{InMemoryFileSystem, InMemorySnapshotStore, StaticSourcesHydrator};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sourceset_domain::{ProjectPath, SourcesDescriptor, SourcesKind, TargetAddress};
use sourceset_ports::SnapshotStorePort;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fmt, fs};

/// Errors raised while loading fixtures.
#[derive(Debug)]
pub enum FixtureError {
    /// Fixture file does not exist.
    MissingFixture {
        /// Path that could not be found.
        path: PathBuf,
    },
    /// Fixture file could not be read.
    FixtureRead {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Fixture file could not be parsed.
    FixtureParse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

impl fmt::Display for FixtureError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFixture { path } => {
                write!(formatter, "missing fixture: {}", path.display())
            },
            Self::FixtureRead { path, source } => {
                write!(
                    formatter,
                    "failed to read fixture {}: {}",
                    path.display(),
                    source
                )
            },
            Self::FixtureParse { path, source } => {
                write!(
                    formatter,
                    "failed to parse fixture {}: {}",
                    path.display(),
                    source
                )
            },
        }
    }
}

impl std::error::Error for FixtureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FixtureRead { source, .. } => Some(source),
            Self::FixtureParse { source, .. } => Some(source),
            Self::MissingFixture { .. } => None,
        }
    }
}

/// One target in a project fixture.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetFixture {
    /// Target address.
    pub address: TargetAddress,
    /// Declared patterns, relative to the address directory.
    pub sources: Vec<Box<str>>,
    /// Descriptor kind.
    #[serde(default)]
    pub kind: SourcesKind,
    /// Files the declared patterns expand to.
    pub owned: Vec<ProjectPath>,
}

impl TargetFixture {
    /// The sources descriptor for this target.
    pub fn descriptor(&self) -> SourcesDescriptor {
        SourcesDescriptor::new(self.address.clone(), self.sources.clone(), self.kind)
    }
}

/// A small project: file contents, targets and source roots.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFixture {
    /// Source root directories.
    pub source_roots: Vec<Box<str>>,
    /// File contents keyed by project path.
    pub files: BTreeMap<String, String>,
    /// Targets and their owned sets.
    pub targets: Vec<TargetFixture>,
}

impl ProjectFixture {
    /// Look up a target by address. Panics when the fixture lacks it.
    pub fn target(&self, address: &str) -> &TargetFixture {
        let address = TargetAddress::parse(address).unwrap();
        self.targets
            .iter()
            .find(|target| target.address == address)
            .unwrap_or_else(|| panic!("fixture has no target {address}"))
    }

    /// Descriptor of the target at `address`.
    pub fn descriptor(&self, address: &str) -> SourcesDescriptor {
        self.target(address).descriptor()
    }

    /// The fixture files as an in-memory filesystem.
    pub fn file_system(&self) -> InMemoryFileSystem {
        InMemoryFileSystem::new(&self.files)
    }

    /// A hydrator returning each target's owned set, captured through `store`.
    pub fn hydrator(&self, store: Arc<dyn SnapshotStorePort>) -> StaticSourcesHydrator {
        self.targets
            .iter()
            .fold(StaticSourcesHydrator::new(store), |hydrator, target| {
                let owned: Vec<&str> = target.owned.iter().map(ProjectPath::as_str).collect();
                hydrator.with_owned(&target.address.to_string(), &owned)
            })
    }

    /// Snapshot store serving the fixture files.
    pub fn snapshot_store(&self) -> InMemorySnapshotStore {
        InMemorySnapshotStore::new(&self.file_system())
    }

    /// Write the fixture files under `root` on disk.
    pub fn write_to(&self, root: &Path) -> std::io::Result<()> {
        for (path, contents) in &self.files {
            let full = root.join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(full, contents)?;
        }
        Ok(())
    }
}

/// Load the resolution project fixture shared by the use-case tests.
pub fn resolution_project() -> Result<ProjectFixture, FixtureError> {
    load_json_fixture("projects/resolution.json")
}

/// Absolute path of a file under the testkit fixture directory.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(relative_path)
}

/// Read a fixture file as text.
pub fn read_fixture(relative_path: &str) -> Result<String, FixtureError> {
    let path = fixture_path(relative_path);
    match fs::read_to_string(&path) {
        Ok(contents) => Ok(contents),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            Err(FixtureError::MissingFixture { path })
        },
        Err(error) => Err(FixtureError::FixtureRead {
            path,
            source: error,
        }),
    }
}

/// Read and deserialize a JSON fixture.
pub fn load_json_fixture<T: DeserializeOwned>(relative_path: &str) -> Result<T, FixtureError> {
    let contents = read_fixture(relative_path)?;
    serde_json::from_str(&contents).map_err(|error| FixtureError::FixtureParse {
        path: fixture_path(relative_path),
        source: error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn missing_fixture_errors_are_reported() {
        let result: Result<Value, FixtureError> = load_json_fixture("projects/missing.json");
        assert!(matches!(result, Err(FixtureError::MissingFixture { .. })));
    }

    #[test]
    fn resolution_project_owned_files_exist() -> Result<(), Box<dyn std::error::Error>> {
        let project = resolution_project()?;
        for target in &project.targets {
            for owned in &target.owned {
                assert!(
                    project.files.contains_key(owned.as_str()),
                    "{} owns missing file {owned}",
                    target.address
                );
            }
        }
        assert_eq!(project.target("src/python:files").kind, SourcesKind::RawFiles);
        assert!(!project.descriptor("docs:empty").has_declared_sources());
        Ok(())
    }
}
