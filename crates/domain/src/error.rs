//! Typed domain failures and their envelope mapping.

use sourceset_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;

/// Validation and contract failures raised by the domain model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A project path is empty after normalization.
    EmptyPath {
        /// Length of the raw input.
        input_length: usize,
    },
    /// A project path is absolute.
    AbsolutePath {
        /// Raw input.
        input: String,
    },
    /// A project path escapes the project root with `..`.
    ParentTraversal {
        /// Raw input.
        input: String,
    },
    /// A target address has an empty name.
    InvalidAddress {
        /// Raw input.
        input: String,
    },
    /// A digest is not 64 lowercase hex characters.
    InvalidDigest {
        /// Raw input.
        input: String,
    },
    /// Selection intent carries a value that cannot be classified.
    OriginContractViolation {
        /// Origin variant name.
        origin: &'static str,
        /// Offending value.
        value: String,
    },
    /// A snapshot path lies outside the prefix being stripped.
    PrefixMismatch {
        /// Path being stripped.
        path: String,
        /// Prefix that was expected.
        prefix: String,
    },
    /// One snapshot carries the same path twice with different content.
    DuplicatePath {
        /// Duplicated path.
        path: String,
    },
}

impl DomainError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyPath { .. } | Self::AbsolutePath { .. } | Self::ParentTraversal { .. } => {
                ErrorCode::invalid_input()
            },
            Self::InvalidAddress { .. } => ErrorCode::new("domain", "invalid_address"),
            Self::InvalidDigest { .. } => ErrorCode::new("domain", "invalid_digest"),
            Self::OriginContractViolation { .. } => {
                ErrorCode::new("origin", "contract_violation")
            },
            Self::PrefixMismatch { .. } => ErrorCode::new("snapshot", "prefix_mismatch"),
            Self::DuplicatePath { .. } => ErrorCode::new("snapshot", "duplicate_path"),
        }
    }

    const fn is_invariant(&self) -> bool {
        matches!(
            self,
            Self::OriginContractViolation { .. }
                | Self::PrefixMismatch { .. }
                | Self::DuplicatePath { .. }
        )
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPath { .. } => formatter.write_str("path must be non-empty"),
            Self::AbsolutePath { input } => {
                write!(formatter, "path must be project-relative: {input}")
            },
            Self::ParentTraversal { input } => {
                write!(formatter, "path must not contain `..`: {input}")
            },
            Self::InvalidAddress { input } => {
                write!(formatter, "address must have a non-empty name: {input}")
            },
            Self::InvalidDigest { .. } => {
                formatter.write_str("digest must be 64 lowercase hex characters")
            },
            Self::OriginContractViolation { origin, value } => {
                write!(formatter, "unclassifiable {origin} origin: {value}")
            },
            Self::PrefixMismatch { path, prefix } => {
                write!(formatter, "path {path} is not under {prefix}")
            },
            Self::DuplicatePath { path } => {
                write!(formatter, "snapshot lists {path} twice with different content")
            },
        }
    }
}

impl std::error::Error for DomainError {}

impl From<DomainError> for ErrorEnvelope {
    fn from(error: DomainError) -> Self {
        let envelope = if error.is_invariant() {
            Self::invariant(error.error_code(), error.to_string())
        } else {
            Self::expected(error.error_code(), error.to_string())
        };

        match error {
            DomainError::EmptyPath { input_length } => {
                envelope.with_metadata("inputLength", input_length.to_string())
            },
            DomainError::AbsolutePath { input }
            | DomainError::ParentTraversal { input }
            | DomainError::InvalidAddress { input }
            | DomainError::InvalidDigest { input } => envelope.with_metadata("input", input),
            DomainError::OriginContractViolation { origin, value } => envelope
                .with_metadata("origin", origin)
                .with_metadata("value", value),
            DomainError::PrefixMismatch { path, prefix } => envelope
                .with_metadata("path", path)
                .with_metadata("prefix", prefix),
            DomainError::DuplicatePath { path } => envelope.with_metadata("path", path),
        }
    }
}
