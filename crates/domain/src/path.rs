//! Project-relative paths.

use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized, non-empty, project-relative file path.
///
/// Separators are always `/`; the path never starts with `/`, never contains
/// `.` or `..` segments and never contains empty segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectPath(Box<str>);

impl ProjectPath {
    /// Parse and normalize a project-relative file path.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, DomainError> {
        let raw = input.as_ref();
        let normalized = normalize_dir(raw)?;
        if normalized.is_empty() {
            return Err(DomainError::EmptyPath {
                input_length: raw.len(),
            });
        }
        Ok(Self(normalized))
    }

    /// Join a relative pattern-free path onto a directory.
    pub fn join(dir: &str, relative: &str) -> Result<Self, DomainError> {
        if dir.is_empty() {
            return Self::parse(relative);
        }
        Self::parse(format!("{dir}/{relative}"))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory portion of the path (empty for files at the project root).
    #[must_use]
    pub fn parent(&self) -> &str {
        self.0.rsplit_once('/').map_or("", |(parent, _)| parent)
    }

    /// Final path segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit_once('/').map_or(&self.0, |(_, name)| name)
    }

    /// Returns true when the path lives below `dir` (any depth).
    #[must_use]
    pub fn is_under(&self, dir: &str) -> bool {
        dir.is_empty()
            || self
                .0
                .strip_prefix(dir)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Remove a leading directory, returning `None` when the path is not under it.
    #[must_use]
    pub fn strip_dir(&self, dir: &str) -> Option<Self> {
        if dir.is_empty() {
            return Some(self.clone());
        }
        self.0
            .strip_prefix(dir)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(|rest| Self(rest.into()))
    }
}

impl AsRef<str> for ProjectPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<String> for ProjectPath {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ProjectPath> for String {
    fn from(value: ProjectPath) -> Self {
        value.0.into_string()
    }
}

/// Normalize a project-relative directory. The project root is the empty string.
pub fn normalize_dir(input: &str) -> Result<Box<str>, DomainError> {
    let unified = input.trim().replace('\\', "/");
    if unified.starts_with('/') || has_drive_prefix(&unified) {
        return Err(DomainError::AbsolutePath {
            input: input.to_owned(),
        });
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                return Err(DomainError::ParentTraversal {
                    input: input.to_owned(),
                });
            },
            other => segments.push(other),
        }
    }
    Ok(segments.join("/").into_boxed_str())
}

fn has_drive_prefix(value: &str) -> bool {
    let bytes = value.as_bytes();
    matches!(bytes, [letter, b':', ..] if letter.is_ascii_alphabetic())
}
