//! Source root inference from configured root patterns.

use sourceset_ports::{BoxFuture, SourceRoot, SourceRootPort};
use sourceset_shared::{RequestContext, Result};

/// Matches root patterns against the leading segments of a directory.
///
/// A `*` segment matches any single directory name. When several patterns
/// match, the one with the most segments wins; the returned root is the
/// concrete prefix of the queried path, not the pattern.
#[derive(Debug, Clone, Default)]
pub struct PatternSourceRoots {
    patterns: Vec<Vec<Box<str>>>,
}

impl PatternSourceRoots {
    /// Build from normalized root patterns (`""` is the project root).
    pub fn new<S: AsRef<str>>(roots: impl IntoIterator<Item = S>) -> Self {
        let patterns = roots
            .into_iter()
            .map(|root| segments(root.as_ref()).map(Box::from).collect())
            .collect();
        Self { patterns }
    }

    /// Synchronous lookup behind [`SourceRootPort::find_root`].
    #[must_use]
    pub fn find(&self, path: &str) -> Option<SourceRoot> {
        let parts: Vec<&str> = segments(path).collect();
        let depth = self
            .patterns
            .iter()
            .filter(|pattern| matches_prefix(pattern, &parts))
            .map(Vec::len)
            .max()?;
        let prefix = parts.get(..depth).unwrap_or_default().join("/");
        Some(SourceRoot::new(prefix))
    }
}

impl SourceRootPort for PatternSourceRoots {
    fn find_root(
        &self,
        ctx: &RequestContext,
        path: Box<str>,
    ) -> BoxFuture<'_, Result<Option<SourceRoot>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("source_roots.find_root")?;
            Ok(self.find(&path))
        })
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn matches_prefix(pattern: &[Box<str>], parts: &[&str]) -> bool {
    pattern.len() <= parts.len()
        && pattern
            .iter()
            .zip(parts)
            .all(|(expected, actual)| &**expected == "*" || &**expected == *actual)
}
