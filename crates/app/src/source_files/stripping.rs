//! Source-root stripping, applied per target before aggregation.

use super::types::{ResolvedTarget, SourceFilesDeps};
use serde_json::Value;
use sourceset_ports::LogFields;
use sourceset_shared::{RequestContext, Result, ResultExt};

/// Remove the target's source root from every resolved path.
///
/// Raw-files targets pass through unchanged. The root is looked up once, from
/// the target's directory; without a root the paths stay fully qualified.
pub async fn strip_source_roots(
    ctx: &RequestContext,
    deps: &SourceFilesDeps,
    target: ResolvedTarget,
) -> Result<ResolvedTarget> {
    if target.kind.is_raw_files() || target.snapshot.is_empty() {
        return Ok(target);
    }
    ctx.ensure_not_cancelled("source_files.strip")?;

    let root = deps
        .source_roots
        .find_root(ctx, target.address.spec_path().into())
        .await?;
    let Some(root) = root else {
        if let Some(logger) = deps.logger.as_ref() {
            let mut fields = LogFields::new();
            fields.insert("address".into(), Value::String(target.address.to_string()));
            logger.warn(
                "sourceFiles.sourceRoot.missing",
                "No source root for target; paths left unstripped",
                Some(fields),
            );
        }
        return Ok(target);
    };

    let snapshot = deps
        .store
        .strip_prefix(ctx, target.snapshot, root.path)
        .await
        .with_metadata_lazy("address", || target.address.to_string())?;
    Ok(ResolvedTarget {
        snapshot,
        ..target
    })
}
