//! Selection intents and their classification.

use crate::{DomainError, ProjectPath};
use std::collections::BTreeSet;

/// How a target came to be included in a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OriginSpec {
    /// `dir:name` - exactly one target.
    SingleAddress {
        /// Target directory.
        directory: Box<str>,
        /// Target name.
        name: Box<str>,
    },
    /// `dir:` - every target in a directory.
    SiblingAddresses {
        /// Directory scanned.
        directory: Box<str>,
    },
    /// `dir::` - every target below a directory.
    DescendantAddresses {
        /// Directory scanned recursively.
        directory: Box<str>,
    },
    /// `dir^` - every target in the directory and its ancestors.
    AscendantAddresses {
        /// Starting directory.
        directory: Box<str>,
    },
    /// A single file named on the command line.
    FilesystemLiteral {
        /// Named file.
        file: Box<str>,
    },
    /// A glob named on the command line, with the files it matched at selection time.
    FilesystemResolvedGlob {
        /// Original glob.
        glob: Box<str>,
        /// Files the glob expanded to, possibly owned by other targets.
        files: Vec<Box<str>>,
    },
}

/// Whether a target's owned files are restricted by the selection intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Everything the target owns.
    Unrestricted,
    /// Only owned files that are also in this set.
    Restricted(BTreeSet<ProjectPath>),
}

impl Classification {
    /// Returns true for the unrestricted classification.
    #[must_use]
    pub const fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }
}

impl OriginSpec {
    /// Variant name used in logs and errors.
    #[must_use]
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::SingleAddress { .. } => "singleAddress",
            Self::SiblingAddresses { .. } => "siblingAddresses",
            Self::DescendantAddresses { .. } => "descendantAddresses",
            Self::AscendantAddresses { .. } => "ascendantAddresses",
            Self::FilesystemLiteral { .. } => "filesystemLiteral",
            Self::FilesystemResolvedGlob { .. } => "filesystemResolvedGlob",
        }
    }

    /// Returns true for graph-coordinate intents.
    #[must_use]
    pub const fn is_address_based(&self) -> bool {
        matches!(
            self,
            Self::SingleAddress { .. }
                | Self::SiblingAddresses { .. }
                | Self::DescendantAddresses { .. }
                | Self::AscendantAddresses { .. }
        )
    }

    /// Map the intent to the file restriction it implies.
    ///
    /// A filesystem intent naming a path that cannot be a project path is a
    /// contract violation of the collaborator that produced it.
    pub fn classify(&self) -> Result<Classification, DomainError> {
        match self {
            Self::SingleAddress { .. }
            | Self::SiblingAddresses { .. }
            | Self::DescendantAddresses { .. }
            | Self::AscendantAddresses { .. } => Ok(Classification::Unrestricted),
            Self::FilesystemLiteral { file } => {
                let path = self.contract_path(file)?;
                Ok(Classification::Restricted(BTreeSet::from([path])))
            },
            Self::FilesystemResolvedGlob { files, .. } => files
                .iter()
                .map(|file| self.contract_path(file))
                .collect::<Result<BTreeSet<_>, _>>()
                .map(Classification::Restricted),
        }
    }

    fn contract_path(&self, file: &str) -> Result<ProjectPath, DomainError> {
        ProjectPath::parse(file).map_err(|_| DomainError::OriginContractViolation {
            origin: self.variant_name(),
            value: file.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_intents_are_unrestricted() -> Result<(), DomainError> {
        let intents = [
            OriginSpec::SingleAddress {
                directory: "src/python".into(),
                name: "lib".into(),
            },
            OriginSpec::SiblingAddresses {
                directory: "src/python".into(),
            },
            OriginSpec::DescendantAddresses {
                directory: "src".into(),
            },
            OriginSpec::AscendantAddresses {
                directory: "src/python".into(),
            },
        ];
        for intent in &intents {
            assert!(intent.is_address_based());
            assert_eq!(intent.classify()?, Classification::Unrestricted);
        }
        Ok(())
    }

    #[test]
    fn literal_restricts_to_one_path() -> Result<(), DomainError> {
        let intent = OriginSpec::FilesystemLiteral {
            file: "src/python/s1.py".into(),
        };
        let expected = BTreeSet::from([ProjectPath::parse("src/python/s1.py")?]);
        assert_eq!(intent.classify()?, Classification::Restricted(expected));
        Ok(())
    }

    #[test]
    fn glob_restricts_to_every_expanded_file() -> Result<(), DomainError> {
        let intent = OriginSpec::FilesystemResolvedGlob {
            glob: "src/java/*.java".into(),
            files: vec![
                "src/java/j1.java".into(),
                "other_target.java".into(),
                "src/java/j.tmp.java".into(),
            ],
        };
        let Classification::Restricted(paths) = intent.classify()? else {
            return Err(DomainError::EmptyPath { input_length: 0 });
        };
        assert_eq!(paths.len(), 3);
        Ok(())
    }

    #[test]
    fn unparseable_paths_violate_the_contract() {
        let intent = OriginSpec::FilesystemLiteral {
            file: "../outside.py".into(),
        };
        assert!(matches!(
            intent.classify(),
            Err(DomainError::OriginContractViolation {
                origin: "filesystemLiteral",
                ..
            })
        ));
    }
}
