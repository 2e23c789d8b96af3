//! Aggregation of per-target results into the final file set.

use super::types::{SourceFiles, SourceFilesDeps, SourceFilesRequestKind};
use serde_json::Value;
use sourceset_domain::{PathCollision, Snapshot};
use sourceset_ports::LogFields;
use sourceset_shared::{RequestContext, Result};

/// Union the per-target snapshots, sorted by path with duplicates collapsed.
///
/// Paths that arrive with different content are kept once and reported as
/// collisions; they never fail the request.
pub async fn aggregate(
    ctx: &RequestContext,
    deps: &SourceFilesDeps,
    request: SourceFilesRequestKind,
    snapshots: Vec<Snapshot>,
) -> Result<SourceFiles> {
    ctx.ensure_not_cancelled("source_files.aggregate")?;
    let merged = deps.store.merge(ctx, snapshots).await?;

    if let Some(logger) = deps.logger.as_ref() {
        for collision in &merged.collisions {
            logger.warn(
                "sourceFiles.collision",
                "Distinct files resolved to the same path",
                Some(log_fields_collision(request, collision)),
            );
        }
    }

    Ok(SourceFiles {
        snapshot: merged.snapshot,
        collisions: merged.collisions,
    })
}

fn log_fields_collision(request: SourceFilesRequestKind, collision: &PathCollision) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("request".into(), Value::from(request.as_str()));
    fields.insert("path".into(), Value::String(collision.path.to_string()));
    fields.insert(
        "digests".into(),
        Value::Array(
            collision
                .digests
                .iter()
                .map(|digest| Value::String(digest.to_string()))
                .collect(),
        ),
    );
    fields
}
