//! Source root inference boundary contract.

use crate::BoxFuture;
use sourceset_shared::{RequestContext, Result};

/// A leading directory that marks a language package boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRoot {
    /// Normalized project-relative directory (`""` means the project root).
    pub path: Box<str>,
}

impl SourceRoot {
    /// Build a source root from a normalized directory.
    pub fn new(path: impl Into<Box<str>>) -> Self {
        Self { path: path.into() }
    }
}

/// Decides which source root a project path belongs to.
pub trait SourceRootPort: Send + Sync {
    /// Return the root owning `path`, or `None` when no root applies.
    fn find_root(
        &self,
        ctx: &RequestContext,
        path: Box<str>,
    ) -> BoxFuture<'_, Result<Option<SourceRoot>>>;
}
