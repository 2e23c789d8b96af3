//! Content-addressed snapshots and their path-set algebra.
//!
//! A [`Snapshot`] is an immutable, path-sorted list of captured files. Every
//! operation returns a new snapshot; entries are never mutated in place.

use crate::{DomainError, ProjectPath};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// SHA-256 content digest plus byte length of a single file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDigest {
    sha256: Box<str>,
    size_bytes: u64,
}

impl FileDigest {
    /// Digest raw file bytes.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self {
            sha256: format!("{:x}", hasher.finalize()).into_boxed_str(),
            size_bytes: bytes.len() as u64,
        }
    }

    /// Rebuild a digest from a stored hex string.
    pub fn from_hex(sha256: &str, size_bytes: u64) -> Result<Self, DomainError> {
        let valid = sha256.len() == 64
            && sha256
                .bytes()
                .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte));
        if !valid {
            return Err(DomainError::InvalidDigest {
                input: sha256.to_owned(),
            });
        }
        Ok(Self {
            sha256: sha256.into(),
            size_bytes,
        })
    }

    /// Lowercase hex SHA-256.
    #[must_use]
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Content length in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.sha256, self.size_bytes)
    }
}

/// One captured file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Project-relative path (or root-relative after stripping).
    pub path: ProjectPath,
    /// Content digest.
    pub digest: FileDigest,
}

impl SnapshotEntry {
    /// Build an entry.
    #[must_use]
    pub const fn new(path: ProjectPath, digest: FileDigest) -> Self {
        Self { path, digest }
    }
}

/// Immutable, sorted, path-unique set of captured files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    entries: Box<[SnapshotEntry]>,
    digest: Box<str>,
}

/// A path that reached the merged set with more than one content digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathCollision {
    /// Colliding path.
    pub path: ProjectPath,
    /// Every distinct digest seen for the path, sorted; the first one is kept.
    pub digests: Vec<FileDigest>,
}

/// Result of merging snapshots: the union plus any path collisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedSnapshot {
    /// Deduplicated union.
    pub snapshot: Snapshot,
    /// Paths that carried differing content.
    pub collisions: Vec<PathCollision>,
}

impl Snapshot {
    /// The empty snapshot.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_sorted(Vec::new())
    }

    /// Build a snapshot from entries in any order.
    ///
    /// Identical entries collapse; the same path with two digests is rejected.
    pub fn from_entries(
        entries: impl IntoIterator<Item = SnapshotEntry>,
    ) -> Result<Self, DomainError> {
        let mut entries: Vec<SnapshotEntry> = entries.into_iter().collect();
        entries.sort();
        entries.dedup();
        let duplicate = entries.windows(2).find_map(|pair| match pair {
            [left, right] if left.path == right.path => Some(left.path.to_string()),
            _ => None,
        });
        if let Some(path) = duplicate {
            return Err(DomainError::DuplicatePath { path });
        }
        Ok(Self::from_sorted(entries))
    }

    fn from_sorted(entries: Vec<SnapshotEntry>) -> Self {
        let mut hasher = Sha256::new();
        for entry in &entries {
            hasher.update(entry.path.as_str().as_bytes());
            hasher.update(b"\0");
            hasher.update(entry.digest.sha256().as_bytes());
            hasher.update(b"\0");
            hasher.update(entry.digest.size_bytes().to_string().as_bytes());
            hasher.update(b"\n");
        }
        Self {
            entries: entries.into_boxed_slice(),
            digest: format!("{:x}", hasher.finalize()).into_boxed_str(),
        }
    }

    /// Entries sorted by path.
    #[must_use]
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    /// Number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the snapshot has no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Digest identifying the full content of the snapshot.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &ProjectPath> {
        self.entries.iter().map(|entry| &entry.path)
    }

    /// Paths in sorted order, as strings.
    #[must_use]
    pub fn files(&self) -> Vec<String> {
        self.paths().map(ToString::to_string).collect()
    }

    /// Keep only entries whose path is in `paths`.
    #[must_use]
    pub fn subset(&self, paths: &BTreeSet<ProjectPath>) -> Self {
        let kept = self
            .entries
            .iter()
            .filter(|entry| paths.contains(&entry.path))
            .cloned()
            .collect();
        Self::from_sorted(kept)
    }

    /// Remove `prefix` from every path. An empty prefix is the identity.
    pub fn strip_prefix(&self, prefix: &str) -> Result<Self, DomainError> {
        if prefix.is_empty() {
            return Ok(self.clone());
        }
        let mut stripped = Vec::with_capacity(self.entries.len());
        for entry in &*self.entries {
            let Some(path) = entry.path.strip_dir(prefix) else {
                return Err(DomainError::PrefixMismatch {
                    path: entry.path.to_string(),
                    prefix: prefix.to_owned(),
                });
            };
            stripped.push(SnapshotEntry::new(path, entry.digest.clone()));
        }
        // Removing a shared prefix keeps relative order and uniqueness.
        Ok(Self::from_sorted(stripped))
    }

    /// Union of several snapshots.
    ///
    /// Exact duplicates collapse. A path seen with different digests keeps the
    /// smallest digest and is reported as a collision, so the outcome does not
    /// depend on input order.
    #[must_use]
    pub fn merge<'a>(snapshots: impl IntoIterator<Item = &'a Self>) -> MergedSnapshot {
        let mut by_path: BTreeMap<&ProjectPath, BTreeSet<&FileDigest>> = BTreeMap::new();
        for snapshot in snapshots {
            for entry in &*snapshot.entries {
                by_path.entry(&entry.path).or_default().insert(&entry.digest);
            }
        }

        let mut entries = Vec::with_capacity(by_path.len());
        let mut collisions = Vec::new();
        for (path, digests) in by_path {
            let Some(first) = digests.first() else {
                continue;
            };
            entries.push(SnapshotEntry::new(path.clone(), (*first).clone()));
            if digests.len() > 1 {
                collisions.push(PathCollision {
                    path: path.clone(),
                    digests: digests.into_iter().cloned().collect(),
                });
            }
        }

        MergedSnapshot {
            snapshot: Self::from_sorted(entries),
            collisions,
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, content: &str) -> Result<SnapshotEntry, DomainError> {
        Ok(SnapshotEntry::new(
            ProjectPath::parse(path)?,
            FileDigest::of_bytes(content.as_bytes()),
        ))
    }

    #[test]
    fn empty_snapshot_has_stable_digest() {
        assert_eq!(
            Snapshot::empty().digest(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert!(Snapshot::empty().is_empty());
    }

    #[test]
    fn construction_order_does_not_matter() -> Result<(), DomainError> {
        let a = Snapshot::from_entries([entry("b.py", "b")?, entry("a.py", "a")?])?;
        let b = Snapshot::from_entries([
            entry("a.py", "a")?,
            entry("b.py", "b")?,
            entry("a.py", "a")?,
        ])?;
        assert_eq!(a, b);
        assert_eq!(a.files(), vec!["a.py", "b.py"]);
        Ok(())
    }

    #[test]
    fn conflicting_entries_are_rejected() -> Result<(), DomainError> {
        let result = Snapshot::from_entries([entry("a.py", "one")?, entry("a.py", "two")?]);
        assert!(matches!(result, Err(DomainError::DuplicatePath { .. })));
        Ok(())
    }

    #[test]
    fn subset_keeps_only_named_paths() -> Result<(), DomainError> {
        let snapshot =
            Snapshot::from_entries([entry("c/j1.java", "1")?, entry("c/j2.java", "2")?])?;
        let wanted: BTreeSet<ProjectPath> = ["c/j1.java", "other_target.java", "c/j.tmp.java"]
            .into_iter()
            .map(ProjectPath::parse)
            .collect::<Result<_, _>>()?;
        assert_eq!(snapshot.subset(&wanted).files(), vec!["c/j1.java"]);
        Ok(())
    }

    #[test]
    fn strip_prefix_rejects_foreign_paths() -> Result<(), DomainError> {
        let snapshot = Snapshot::from_entries([entry("src/python/s1.py", "1")?])?;
        assert_eq!(snapshot.strip_prefix("src/python")?.files(), vec!["s1.py"]);
        assert_eq!(snapshot.strip_prefix("")?, snapshot);
        assert!(matches!(
            snapshot.strip_prefix("src/java"),
            Err(DomainError::PrefixMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn merge_reports_collisions_deterministically() -> Result<(), DomainError> {
        let left = Snapshot::from_entries([entry("s1.py", "left")?, entry("x.py", "x")?])?;
        let right = Snapshot::from_entries([entry("s1.py", "right")?, entry("x.py", "x")?])?;

        let forward = Snapshot::merge([&left, &right]);
        let backward = Snapshot::merge([&right, &left]);
        assert_eq!(forward, backward);
        assert_eq!(forward.snapshot.files(), vec!["s1.py", "x.py"]);
        assert_eq!(forward.collisions.len(), 1);
        assert_eq!(forward.collisions[0].path.as_str(), "s1.py");
        assert_eq!(forward.collisions[0].digests.len(), 2);
        Ok(())
    }
}
