//! # sourceset-shared
//!
//! Shared utilities, result types, and error handling for the sourceset workspace.
//!
//! - Result and error envelope types
//! - Request context, cancellation, and bounded ordered fan-out
//! - Timeouts and secret-key detection for logging
//!
//! This crate has no workspace dependencies.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod concurrency;
pub mod errors;
pub mod invariants;
pub mod redaction;
pub mod result;
pub mod timeout;

pub use concurrency::{CorrelationId, RequestContext, map_ordered};
pub use errors::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use invariants::{BoundedU32, BoundedU64, BoundsError, Validated};
pub use redaction::{REDACTED, is_secret_key};
pub use result::{Result, ResultExt};
pub use timeout::timeout_with_context;
