//! Build use-case dependencies from a validated config and a project root.

use crate::{InfraResult, Observability};
use sourceset_adapters::{
    DigestSnapshotStore, GlobSourcesHydrator, LocalFileSystem, PatternSourceRoots,
};
use sourceset_app::{ResolveLimits, SourceFilesDeps};
use sourceset_config::ValidatedResolverConfig;
use sourceset_ports::{FileSystemPort, SnapshotStorePort};
use sourceset_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Fan-out width and request deadline from the validated config.
pub fn resolve_limits(config: &ValidatedResolverConfig) -> InfraResult<ResolveLimits> {
    let limits = config.limits();
    let max_concurrency = usize::try_from(limits.core_max_concurrency.get()).map_err(|_| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            "core.maxConcurrency overflow",
            ErrorClass::NonRetriable,
        )
    })?;
    Ok(ResolveLimits {
        max_concurrency,
        timeout: Duration::from_millis(limits.core_timeout_ms.get()),
    })
}

/// Wire the local adapters under `project_root`.
///
/// Every adapter reads through one [`LocalFileSystem`]; the hydrator captures
/// through the same store the use cases subset and merge with.
pub fn build_source_files_deps(
    config: &ValidatedResolverConfig,
    project_root: &Path,
    observability: &Observability,
) -> InfraResult<SourceFilesDeps> {
    let max_file_size = Some(config.limits().snapshot_max_file_size_bytes.get());
    let fs: Arc<dyn FileSystemPort> = Arc::new(LocalFileSystem::new(project_root, max_file_size));
    let store: Arc<dyn SnapshotStorePort> =
        Arc::new(DigestSnapshotStore::new(Arc::clone(&fs), max_file_size));
    let hydrator = Arc::new(GlobSourcesHydrator::new(fs, Arc::clone(&store)));
    let source_roots = Arc::new(PatternSourceRoots::new(config.source_roots.roots.iter()));

    tracing::debug!(
        root = %project_root.display(),
        roots = config.source_roots.roots.len(),
        "built source-files deps"
    );

    Ok(SourceFilesDeps {
        hydrator,
        store,
        source_roots,
        limits: resolve_limits(config)?,
        logger: observability.logger.clone(),
        telemetry: observability.telemetry.clone(),
    })
}
