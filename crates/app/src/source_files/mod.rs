//! Resolve the source files contributed by a set of build targets.
//!
//! Every request goes through the same pipeline: each item is resolved on
//! its own (classification, ownership, optional restriction), stripped of
//! its source root when asked, and the results are merged into one sorted,
//! deduplicated [`SourceFiles`].

mod aggregator;
mod classifier;
mod legacy;
mod pipeline;
mod resolver;
mod stripping;
mod types;

pub use aggregator::aggregate;
pub use classifier::{classify_origin, classify_pairs};
pub use legacy::legacy_all_source_files;
pub use pipeline::{PipelineOptions, run_observed, run_pipeline};
pub use resolver::resolve_target;
pub use stripping::strip_source_roots;
pub use types::{
    AllSourceFilesInput, LegacyAllSourceFilesInput, ResolveLimits, ResolvedTarget, SourceFiles,
    SourceFilesDeps, SourceFilesRequestKind, SpecifiedSourceFilesInput,
};

use sourceset_domain::Classification;
use sourceset_shared::{RequestContext, Result};

/// Resolve everything the descriptors own. Intents play no part.
#[tracing::instrument(
    name = "source_files.all",
    skip_all,
    fields(items = input.sources.len(), strip = input.strip_source_roots)
)]
pub async fn all_source_files(
    ctx: &RequestContext,
    deps: &SourceFilesDeps,
    input: AllSourceFilesInput,
) -> Result<SourceFiles> {
    let options = PipelineOptions {
        request: SourceFilesRequestKind::All,
        strip_source_roots: input.strip_source_roots,
    };
    let item_count = input.sources.len();
    let work = run_pipeline(ctx, deps, options, input.sources, |ctx, deps, descriptor| {
        async move { resolve_target(&ctx, &deps, descriptor, Classification::Unrestricted).await }
    });
    run_observed(ctx, deps, options, item_count, work).await
}

/// Resolve the files the caller named, restricted to what each descriptor owns.
///
/// Address-based intents yield full ownership; filesystem intents intersect
/// ownership with the named files.
#[tracing::instrument(
    name = "source_files.specified",
    skip_all,
    fields(items = input.sources_with_origins.len(), strip = input.strip_source_roots)
)]
pub async fn specified_source_files(
    ctx: &RequestContext,
    deps: &SourceFilesDeps,
    input: SpecifiedSourceFilesInput,
) -> Result<SourceFiles> {
    let options = PipelineOptions {
        request: SourceFilesRequestKind::Specified,
        strip_source_roots: input.strip_source_roots,
    };
    let item_count = input.sources_with_origins.len();
    let work = async move {
        let pairs = classify_pairs(input.sources_with_origins)?;
        run_pipeline(
            ctx,
            deps,
            options,
            pairs,
            |ctx, deps, (descriptor, classification)| async move {
                resolve_target(&ctx, &deps, descriptor, classification).await
            },
        )
        .await
    };
    run_observed(ctx, deps, options, item_count, work).await
}
