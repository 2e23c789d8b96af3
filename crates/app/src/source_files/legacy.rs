//! Compatibility path for targets without selection intents.

use super::pipeline::{PipelineOptions, run_observed, run_pipeline};
use super::types::{
    LegacyAllSourceFilesInput, ResolvedTarget, SourceFiles, SourceFilesDeps,
    SourceFilesRequestKind,
};
use sourceset_domain::LegacyTarget;
use sourceset_shared::{RequestContext, Result};
use std::future::ready;

/// Resolve legacy targets: always full ownership, then the shared
/// stripping and aggregation steps.
#[tracing::instrument(
    name = "source_files.legacy",
    skip_all,
    fields(items = input.targets.len(), strip = input.strip_source_roots)
)]
pub async fn legacy_all_source_files(
    ctx: &RequestContext,
    deps: &SourceFilesDeps,
    input: LegacyAllSourceFilesInput,
) -> Result<SourceFiles> {
    let options = PipelineOptions {
        request: SourceFilesRequestKind::Legacy,
        strip_source_roots: input.strip_source_roots,
    };
    let item_count = input.targets.len();
    let work = run_pipeline(
        ctx,
        deps,
        options,
        input.targets,
        |_ctx, _deps, target: LegacyTarget| {
            let kind = target.kind();
            ready(Ok(ResolvedTarget {
                address: target.address,
                kind,
                snapshot: target.snapshot,
            }))
        },
    );
    run_observed(ctx, deps, options, item_count, work).await
}
