//! The pipeline shared by every source-files request:
//! resolve per item (bounded fan-out) -> strip per item -> aggregate.

use super::aggregator::aggregate;
use super::stripping::strip_source_roots;
use super::types::{ResolvedTarget, SourceFiles, SourceFilesDeps, SourceFilesRequestKind};
use serde_json::Value;
use sourceset_ports::{LogFields, TelemetryTags, telemetry_tags};
use sourceset_shared::{ErrorEnvelope, RequestContext, Result, map_ordered, timeout_with_context};
use std::future::Future;
use std::time::Instant;

/// Options of one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Request being served.
    pub request: SourceFilesRequestKind,
    /// Strip source roots after resolution.
    pub strip_source_roots: bool,
}

/// Resolve `items` with `resolve`, strip each result, then aggregate.
///
/// Items run concurrently up to `limits.max_concurrency`; results are awaited
/// in input order. The first failure aborts the request.
pub async fn run_pipeline<T, F, Fut>(
    ctx: &RequestContext,
    deps: &SourceFilesDeps,
    options: PipelineOptions,
    items: Vec<T>,
    resolve: F,
) -> Result<SourceFiles>
where
    T: Send + 'static,
    F: Fn(RequestContext, SourceFilesDeps, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ResolvedTarget>> + Send + 'static,
{
    let task_ctx = ctx.clone();
    let task_deps = deps.clone();
    let strip = options.strip_source_roots;

    let snapshots = map_ordered(
        ctx,
        deps.limits.max_concurrency,
        items,
        move |item, _index| {
            let ctx = task_ctx.clone();
            let deps = task_deps.clone();
            let resolving = resolve(ctx.clone(), deps.clone(), item);
            async move {
                let resolved = resolving.await?;
                let resolved = if strip {
                    strip_source_roots(&ctx, &deps, resolved).await?
                } else {
                    resolved
                };
                Ok(resolved.snapshot)
            }
        },
    )
    .await?;

    aggregate(ctx, deps, options.request, snapshots).await
}

/// Run a request under the deadline, with start/completed/failed/aborted
/// events, counters and a total timer.
pub async fn run_observed<Fut>(
    ctx: &RequestContext,
    deps: &SourceFilesDeps,
    options: PipelineOptions,
    item_count: usize,
    work: Fut,
) -> Result<SourceFiles>
where
    Fut: Future<Output = Result<SourceFiles>>,
{
    let request = options.request;
    let started_at = Instant::now();
    let tags = tags_request(options);
    let total_timer = deps
        .telemetry
        .as_ref()
        .map(|telemetry| telemetry.start_timer(&request.event("total"), Some(&tags)));

    if let Some(logger) = deps.logger.as_ref() {
        logger.info(
            &request.event("start"),
            "Source files resolution started",
            Some(log_fields_start(ctx, options, item_count)),
        );
    }

    let result = timeout_with_context(ctx, deps.limits.timeout, request.operation(), work).await;

    if let Some(timer) = total_timer.as_ref() {
        timer.stop();
    }

    let duration_ms = duration_ms(started_at);
    match result {
        Ok(files) => {
            if let Some(telemetry) = deps.telemetry.as_ref() {
                telemetry.count(&request.event("executed"), Some(&tags));
            }
            if let Some(logger) = deps.logger.as_ref() {
                logger.info(
                    &request.event("completed"),
                    "Source files resolution completed",
                    Some(log_fields_completed(ctx, options, duration_ms, &files)),
                );
            }
            Ok(files)
        },
        Err(error) => {
            if error.is_cancelled() {
                if let Some(telemetry) = deps.telemetry.as_ref() {
                    telemetry.count(&request.event("aborted"), Some(&tags));
                }
                if let Some(logger) = deps.logger.as_ref() {
                    logger.info(
                        &request.event("aborted"),
                        "Source files resolution aborted",
                        Some(log_fields_base(ctx, duration_ms)),
                    );
                }
            } else {
                if let Some(telemetry) = deps.telemetry.as_ref() {
                    telemetry.count(&request.event("failed"), Some(&tags));
                }
                if let Some(logger) = deps.logger.as_ref() {
                    logger.error(
                        &request.event("failed"),
                        "Source files resolution failed",
                        Some(log_fields_error(ctx, duration_ms, &error)),
                        serde_json::to_value(&error).ok(),
                    );
                }
            }
            Err(error)
        },
    }
}

fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn tags_request(options: PipelineOptions) -> TelemetryTags {
    let strip = if options.strip_source_roots { "true" } else { "false" };
    telemetry_tags([("request", options.request.as_str()), ("stripSourceRoots", strip)])
}

fn log_fields_start(
    ctx: &RequestContext,
    options: PipelineOptions,
    item_count: usize,
) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert(
        "correlationId".into(),
        Value::String(ctx.correlation_id().as_str().to_owned()),
    );
    fields.insert("items".into(), Value::from(item_count));
    fields.insert(
        "stripSourceRoots".into(),
        Value::Bool(options.strip_source_roots),
    );
    fields
}

fn log_fields_completed(
    ctx: &RequestContext,
    options: PipelineOptions,
    duration_ms: u64,
    files: &SourceFiles,
) -> LogFields {
    let mut fields = log_fields_base(ctx, duration_ms);
    fields.insert(
        "stripSourceRoots".into(),
        Value::Bool(options.strip_source_roots),
    );
    fields.insert("files".into(), Value::from(files.snapshot.len()));
    fields.insert("collisions".into(), Value::from(files.collisions.len()));
    fields.insert(
        "snapshotDigest".into(),
        Value::String(files.snapshot.digest().to_owned()),
    );
    fields
}

fn log_fields_base(ctx: &RequestContext, duration_ms: u64) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert(
        "correlationId".into(),
        Value::String(ctx.correlation_id().as_str().to_owned()),
    );
    fields.insert("durationMs".into(), Value::from(duration_ms));
    fields
}

fn log_fields_error(ctx: &RequestContext, duration_ms: u64, error: &ErrorEnvelope) -> LogFields {
    let mut fields = log_fields_base(ctx, duration_ms);
    fields.insert("errorCode".into(), Value::String(error.code.to_string()));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use sourceset_domain::Snapshot;
    use sourceset_shared::ErrorCode;

    #[test]
    fn outcome_fields_extend_the_base_set() {
        let ctx = RequestContext::new_request();
        let options = PipelineOptions {
            request: SourceFilesRequestKind::All,
            strip_source_roots: true,
        };
        let files = SourceFiles {
            snapshot: Snapshot::empty(),
            collisions: Vec::new(),
        };
        let error = ErrorEnvelope::expected(ErrorCode::not_found(), "missing");

        let base = log_fields_base(&ctx, 7);
        assert_eq!(base.len(), 2);
        for fields in [
            log_fields_completed(&ctx, options, 7, &files),
            log_fields_error(&ctx, 7, &error),
        ] {
            for (key, value) in &base {
                assert_eq!(fields.get(key), Some(value), "{key}");
            }
        }
        assert_eq!(
            log_fields_error(&ctx, 7, &error).get("errorCode"),
            Some(&Value::String(ErrorCode::not_found().to_string()))
        );
    }
}
