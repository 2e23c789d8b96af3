//! Build target addresses.

use crate::DomainError;
use crate::path::normalize_dir;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally unique identity of a build target: a directory plus a local name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetAddress {
    spec_path: Box<str>,
    target_name: Box<str>,
}

impl TargetAddress {
    /// Build an address from an already split directory and name.
    pub fn new(spec_path: &str, target_name: &str) -> Result<Self, DomainError> {
        let name = target_name.trim();
        if name.is_empty() || name.contains('/') {
            return Err(DomainError::InvalidAddress {
                input: format!("{spec_path}:{target_name}"),
            });
        }
        Ok(Self {
            spec_path: normalize_dir(spec_path)?,
            target_name: name.into(),
        })
    }

    /// Parse `dir:name`, `//dir:name` or `dir` (name defaults to the last segment).
    pub fn parse(input: impl AsRef<str>) -> Result<Self, DomainError> {
        let raw = input.as_ref().trim();
        let raw = raw.strip_prefix("//").unwrap_or(raw);
        match raw.rsplit_once(':') {
            Some((dir, name)) => Self::new(dir, name),
            None => {
                let spec_path = normalize_dir(raw)?;
                let name = spec_path.rsplit('/').next().unwrap_or_default().to_owned();
                Self::new(&spec_path, &name).map_err(|_| DomainError::InvalidAddress {
                    input: input.as_ref().to_owned(),
                })
            },
        }
    }

    /// Directory containing the target definition (empty for the project root).
    #[must_use]
    pub fn spec_path(&self) -> &str {
        &self.spec_path
    }

    /// Local target name.
    #[must_use]
    pub fn target_name(&self) -> &str {
        &self.target_name
    }
}

impl fmt::Display for TargetAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.spec_path.is_empty() {
            write!(formatter, "//:{}", self.target_name)
        } else {
            write!(formatter, "{}:{}", self.spec_path, self.target_name)
        }
    }
}

impl TryFrom<String> for TargetAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TargetAddress> for String {
    fn from(value: TargetAddress) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_explicit_and_default_names() -> Result<(), DomainError> {
        let explicit = TargetAddress::parse("src/python:lib")?;
        assert_eq!(explicit.spec_path(), "src/python");
        assert_eq!(explicit.target_name(), "lib");

        let implicit = TargetAddress::parse("src/python")?;
        assert_eq!(implicit.target_name(), "python");
        assert_eq!(implicit.to_string(), "src/python:python");
        Ok(())
    }

    #[test]
    fn root_addresses_display_with_double_slash() -> Result<(), DomainError> {
        let root = TargetAddress::parse("//:lib")?;
        assert_eq!(root.spec_path(), "");
        assert_eq!(root.to_string(), "//:lib");
        assert_eq!(TargetAddress::parse(":lib")?, root);
        Ok(())
    }

    #[test]
    fn rejects_empty_names() {
        assert!(matches!(
            TargetAddress::parse("src/python:"),
            Err(DomainError::InvalidAddress { .. })
        ));
        assert!(matches!(
            TargetAddress::parse(""),
            Err(DomainError::InvalidAddress { .. })
        ));
    }
}
