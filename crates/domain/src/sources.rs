//! Target source declarations.

use crate::{Snapshot, TargetAddress};
use serde::{Deserialize, Serialize};

/// Type alias that marks a legacy target as a raw files collection.
pub const RAW_FILES_TYPE_ALIAS: &str = "files";

/// Whether a descriptor's files participate in source-root stripping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourcesKind {
    /// Language sources that live under a source root.
    #[default]
    Typed,
    /// Untyped file collections; never stripped.
    RawFiles,
}

impl SourcesKind {
    /// Returns true for raw file collections.
    #[must_use]
    pub const fn is_raw_files(self) -> bool {
        matches!(self, Self::RawFiles)
    }

    /// Stable name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Typed => "typed",
            Self::RawFiles => "rawFiles",
        }
    }
}

/// One target's declaration of the files it owns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcesDescriptor {
    /// Owning target.
    pub address: TargetAddress,
    /// Declared patterns, relative to the address's directory, in author order.
    /// A leading `!` marks an exclude pattern.
    pub sources: Vec<Box<str>>,
    /// Stripping behaviour.
    #[serde(default)]
    pub kind: SourcesKind,
}

impl SourcesDescriptor {
    /// Build a descriptor.
    pub fn new<S: Into<Box<str>>>(
        address: TargetAddress,
        sources: impl IntoIterator<Item = S>,
        kind: SourcesKind,
    ) -> Self {
        Self {
            address,
            sources: sources.into_iter().map(Into::into).collect(),
            kind,
        }
    }

    /// Returns false when the target declares no sources at all.
    #[must_use]
    pub fn has_declared_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Include patterns, in declaration order.
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .map(AsRef::as_ref)
            .filter(|pattern: &&str| !pattern.starts_with('!'))
    }

    /// Exclude patterns with the leading `!` removed.
    pub fn excludes(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .filter_map(|pattern| pattern.strip_prefix('!'))
    }
}

/// A target in the older representation: files already captured, no intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTarget {
    /// Owning target.
    pub address: TargetAddress,
    /// Target type alias, if known.
    pub type_alias: Option<Box<str>>,
    /// Owned files.
    pub snapshot: Snapshot,
}

impl LegacyTarget {
    /// Stripping behaviour derived from the type alias.
    #[must_use]
    pub fn kind(&self) -> SourcesKind {
        if self.type_alias.as_deref() == Some(RAW_FILES_TYPE_ALIAS) {
            SourcesKind::RawFiles
        } else {
            SourcesKind::Typed
        }
    }
}
