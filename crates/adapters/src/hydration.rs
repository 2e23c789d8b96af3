//! Glob-based expansion of declared sources.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use sourceset_domain::{ProjectPath, Snapshot, SourcesDescriptor};
use sourceset_ports::{
    BoxFuture, FileSystemEntryKind, FileSystemPort, SnapshotStorePort, SourcesHydrationPort,
};
use sourceset_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

const GLOB_CHARS: [char; 5] = ['*', '?', '[', '{', '}'];

/// Expands declared patterns against the filesystem, then captures the matches.
///
/// Patterns are relative to the descriptor's directory. A pattern without glob
/// characters names one file that must exist; glob patterns match whatever is
/// present. `!pattern` removes matches from either kind.
#[derive(Clone)]
pub struct GlobSourcesHydrator {
    fs: Arc<dyn FileSystemPort>,
    store: Arc<dyn SnapshotStorePort>,
}

impl GlobSourcesHydrator {
    /// Build a hydrator walking `fs` and capturing through `store`.
    pub fn new(fs: Arc<dyn FileSystemPort>, store: Arc<dyn SnapshotStorePort>) -> Self {
        Self { fs, store }
    }

    async fn expand(
        &self,
        ctx: &RequestContext,
        descriptor: &SourcesDescriptor,
    ) -> Result<BTreeSet<ProjectPath>> {
        let base = descriptor.address.spec_path();
        let excludes = build_glob_set(base, descriptor.excludes())?;

        let mut owned = BTreeSet::new();
        let mut globs = Vec::new();
        for pattern in descriptor.includes() {
            if pattern.contains(GLOB_CHARS) {
                globs.push(pattern);
            } else {
                let path = ProjectPath::join(base, pattern)?;
                if !excludes.is_match(path.as_str()) {
                    owned.insert(path);
                }
            }
        }
        if globs.is_empty() {
            return Ok(owned);
        }

        let includes = build_glob_set(base, globs.iter().copied())?;
        let max_depth = walk_depth(&globs);
        for path in self.walk(ctx, base, max_depth).await? {
            if includes.is_match(path.as_str()) && !excludes.is_match(path.as_str()) {
                owned.insert(path);
            }
        }
        Ok(owned)
    }

    /// Breadth-first listing of regular files under `base`, in sorted order.
    async fn walk(
        &self,
        ctx: &RequestContext,
        base: &str,
        max_depth: Option<usize>,
    ) -> Result<Vec<ProjectPath>> {
        let mut files = Vec::new();
        let mut queue = VecDeque::from([(Box::<str>::from(base), 1_usize)]);
        while let Some((dir, depth)) = queue.pop_front() {
            ctx.ensure_not_cancelled("hydrate.walk")?;
            let entries = match self.fs.read_dir(ctx, dir.clone()).await {
                Ok(entries) => entries,
                // A directory that does not exist simply matches nothing.
                Err(error) if error.is_not_found() => continue,
                Err(error) => return Err(error),
            };
            for entry in entries {
                let path = ProjectPath::join(&dir, &entry.name)?;
                match entry.kind {
                    FileSystemEntryKind::File => files.push(path),
                    FileSystemEntryKind::Directory
                        if max_depth.is_none_or(|limit| depth < limit) =>
                    {
                        queue.push_back((path.as_str().into(), depth + 1));
                    },
                    FileSystemEntryKind::Directory | FileSystemEntryKind::Other => {},
                }
            }
        }
        files.sort_unstable();
        Ok(files)
    }
}

impl SourcesHydrationPort for GlobSourcesHydrator {
    fn hydrate(
        &self,
        ctx: &RequestContext,
        descriptor: SourcesDescriptor,
    ) -> BoxFuture<'_, Result<Snapshot>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            if !descriptor.has_declared_sources() {
                return Ok(Snapshot::empty());
            }
            let owned = self.expand(&ctx, &descriptor).await?;
            tracing::debug!(
                address = %descriptor.address,
                files = owned.len(),
                "expanded declared sources"
            );
            self.store.capture(&ctx, owned.into_iter().collect()).await
        })
    }
}

fn build_glob_set<'a>(base: &str, patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let base = globset::escape(base);
    for pattern in patterns {
        let full = if base.is_empty() {
            pattern.to_owned()
        } else {
            format!("{base}/{pattern}")
        };
        let glob = GlobBuilder::new(&full)
            .literal_separator(true)
            .build()
            .map_err(|error| invalid_glob(pattern, &error))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|error| invalid_glob("<set>", &error))
}

/// Deepest directory level any glob can reach; `None` when one uses `**`.
fn walk_depth(globs: &[&str]) -> Option<usize> {
    globs.iter().try_fold(0, |deepest, glob| {
        if glob.contains("**") {
            None
        } else {
            Some(deepest.max(glob.split('/').count()))
        }
    })
}

fn invalid_glob(pattern: &str, error: &globset::Error) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("sources", "invalid_glob"),
        format!("invalid source pattern: {error}"),
    )
    .with_metadata("pattern", pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFileSystem;
    use crate::snapshot_store::DigestSnapshotStore;
    use sourceset_domain::{SourcesKind, TargetAddress};
    use std::fs;
    use std::path::PathBuf;

    fn project(name: &str) -> Result<PathBuf> {
        let root = std::env::temp_dir().join(format!(
            "sourceset_hydrate_{name}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        for dir in ["src/java", "src/java/nested"] {
            fs::create_dir_all(root.join(dir)).map_err(ErrorEnvelope::from)?;
        }
        for file in [
            "src/java/j1.java",
            "src/java/j2.java",
            "src/java/j.tmp.java",
            "src/java/README",
            "src/java/nested/deep.java",
        ] {
            fs::write(root.join(file), file).map_err(ErrorEnvelope::from)?;
        }
        Ok(root)
    }

    fn hydrator(root: PathBuf) -> GlobSourcesHydrator {
        let fs: Arc<dyn FileSystemPort> = Arc::new(LocalFileSystem::new(root, None));
        let store = Arc::new(DigestSnapshotStore::new(Arc::clone(&fs), None));
        GlobSourcesHydrator::new(fs, store)
    }

    fn descriptor(patterns: &[&str]) -> Result<SourcesDescriptor> {
        Ok(SourcesDescriptor::new(
            TargetAddress::parse("src/java:lib")?,
            patterns.iter().copied(),
            SourcesKind::Typed,
        ))
    }

    #[tokio::test]
    async fn globs_stay_in_one_directory_and_honour_excludes() -> Result<()> {
        let hydrator = hydrator(project("glob")?);
        let snapshot = hydrator
            .hydrate(
                &RequestContext::new_request(),
                descriptor(&["*.java", "!*.tmp.java"])?,
            )
            .await?;
        assert_eq!(snapshot.files(), vec!["src/java/j1.java", "src/java/j2.java"]);
        Ok(())
    }

    #[tokio::test]
    async fn recursive_globs_descend() -> Result<()> {
        let hydrator = hydrator(project("recursive")?);
        let snapshot = hydrator
            .hydrate(&RequestContext::new_request(), descriptor(&["**/deep.java"])?)
            .await?;
        assert_eq!(snapshot.files(), vec!["src/java/nested/deep.java"]);
        Ok(())
    }

    #[tokio::test]
    async fn missing_literal_is_not_found() -> Result<()> {
        let hydrator = hydrator(project("literal")?);
        let result = hydrator
            .hydrate(&RequestContext::new_request(), descriptor(&["j1.java", "gone.java"])?)
            .await;
        assert!(matches!(result, Err(error) if error.is_not_found()));
        Ok(())
    }

    #[tokio::test]
    async fn no_declared_sources_is_empty() -> Result<()> {
        let hydrator = hydrator(project("empty")?);
        let snapshot = hydrator
            .hydrate(&RequestContext::new_request(), descriptor(&[])?)
            .await?;
        assert!(snapshot.is_empty());
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn literals_and_globs_agree_on_symlinked_files() -> Result<()> {
        let root = project("symlink")?;
        fs::write(root.join("shared.java"), "shared").map_err(ErrorEnvelope::from)?;
        std::os::unix::fs::symlink("../../shared.java", root.join("src/java/link.java"))
            .map_err(ErrorEnvelope::from)?;
        let hydrator = hydrator(root);
        let ctx = RequestContext::new_request();

        let literal = hydrator.hydrate(&ctx, descriptor(&["link.java"])?).await?;
        assert_eq!(literal.files(), vec!["src/java/link.java"]);

        let glob = hydrator
            .hydrate(&ctx, descriptor(&["*.java", "!*.tmp.java"])?)
            .await?;
        assert_eq!(
            glob.files(),
            vec!["src/java/j1.java", "src/java/j2.java", "src/java/link.java"]
        );
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn globs_ignore_non_utf8_names() -> Result<()> {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = project("non_utf8")?;
        fs::write(
            root.join("src/java").join(OsStr::from_bytes(b"bad\xff.java")),
            "bad",
        )
        .map_err(ErrorEnvelope::from)?;
        let hydrator = hydrator(root);

        let snapshot = hydrator
            .hydrate(
                &RequestContext::new_request(),
                descriptor(&["*.java", "!*.tmp.java"])?,
            )
            .await?;
        assert_eq!(snapshot.files(), vec!["src/java/j1.java", "src/java/j2.java"]);
        Ok(())
    }

    #[tokio::test]
    async fn glob_syntax_in_the_target_directory_is_literal() -> Result<()> {
        let root = project("escaped")?;
        fs::create_dir_all(root.join("gen[1]")).map_err(ErrorEnvelope::from)?;
        fs::write(root.join("gen[1]/a.py"), "a").map_err(ErrorEnvelope::from)?;
        fs::write(root.join("gen[1]/b.py"), "b").map_err(ErrorEnvelope::from)?;
        let hydrator = hydrator(root);
        let descriptor = SourcesDescriptor::new(
            TargetAddress::parse("gen[1]:gen")?,
            ["*.py", "!b.py"],
            SourcesKind::Typed,
        );

        let snapshot = hydrator
            .hydrate(&RequestContext::new_request(), descriptor)
            .await?;
        assert_eq!(snapshot.files(), vec!["gen[1]/a.py"]);
        Ok(())
    }

    #[test]
    fn walk_depth_tracks_pattern_segments() {
        assert_eq!(walk_depth(&["*.java"]), Some(1));
        assert_eq!(walk_depth(&["*.java", "a/*/b.py"]), Some(3));
        assert_eq!(walk_depth(&["a/**/b.py"]), None);
    }
}
