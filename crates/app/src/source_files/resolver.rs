//! Per-target resolution: owned files, optionally restricted by intent.

use super::types::{ResolvedTarget, SourceFilesDeps};
use serde_json::Value;
use sourceset_domain::{Classification, SourcesDescriptor};
use sourceset_ports::LogFields;
use sourceset_shared::{RequestContext, Result};

/// Resolve one descriptor under its classification.
///
/// Named files the descriptor does not own are dropped without error; an
/// empty intersection is an empty snapshot. Capture failures propagate as-is.
pub async fn resolve_target(
    ctx: &RequestContext,
    deps: &SourceFilesDeps,
    descriptor: SourcesDescriptor,
    classification: Classification,
) -> Result<ResolvedTarget> {
    ctx.ensure_not_cancelled("source_files.resolve")?;
    let address = descriptor.address.clone();
    let kind = descriptor.kind;

    let owned = deps.hydrator.hydrate(ctx, descriptor).await?;
    let owned_count = owned.len();
    let snapshot = match classification {
        Classification::Unrestricted => owned,
        Classification::Restricted(paths) => deps.store.subset(ctx, owned, paths).await?,
    };

    if let Some(logger) = deps.logger.as_ref() {
        let mut fields = LogFields::new();
        fields.insert("address".into(), Value::String(address.to_string()));
        fields.insert("owned".into(), Value::from(owned_count));
        fields.insert("resolved".into(), Value::from(snapshot.len()));
        logger.debug(
            "sourceFiles.target.resolved",
            "Target resolved",
            Some(fields),
        );
    }

    Ok(ResolvedTarget {
        address,
        kind,
        snapshot,
    })
}
