//! Run validated requests against wired dependencies.

use crate::composition::build_source_files_deps;
use crate::request_check::{RequestKind, ValidatedRequest, validate_request_json};
use crate::{InfraError, InfraResult, Observability};
use serde::Serialize;
use sourceset_app::{
    AllSourceFilesInput, LegacyAllSourceFilesInput, SourceFiles, SourceFilesDeps,
    SpecifiedSourceFilesInput, all_source_files, legacy_all_source_files, specified_source_files,
};
use sourceset_config::{LegacyTargetRequest, ResolverEnv, load_resolver_config_from_path};
use sourceset_domain::{LegacyTarget, PathCollision};
use sourceset_ports::SnapshotStorePort;
use sourceset_shared::{
    CorrelationId, ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, ResultExt,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;

/// Serializable outcome of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFilesReport {
    /// Sorted project-relative (or root-stripped) paths.
    pub files: Vec<String>,
    /// Digest of the merged snapshot.
    pub snapshot_digest: String,
    /// Paths that reached the result with more than one content digest.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collisions: Vec<PathCollision>,
}

impl From<&SourceFiles> for SourceFilesReport {
    fn from(files: &SourceFiles) -> Self {
        Self {
            files: files.files(),
            snapshot_digest: files.snapshot.digest().to_owned(),
            collisions: files.collisions.clone(),
        }
    }
}

impl SourceFilesReport {
    /// Pretty JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> InfraResult<String> {
        let mut output = serde_json::to_string_pretty(self).map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::internal(),
                format!("failed to serialize report: {error}"),
                ErrorClass::NonRetriable,
            )
        })?;
        output.push('\n');
        Ok(output)
    }
}

/// Capture the files of legacy targets through the store.
///
/// Targets are captured one after another; the first missing file fails the
/// whole request.
pub async fn capture_legacy_targets(
    ctx: &RequestContext,
    store: &dyn SnapshotStorePort,
    targets: Vec<LegacyTargetRequest>,
) -> InfraResult<Vec<LegacyTarget>> {
    let mut captured = Vec::with_capacity(targets.len());
    for target in targets {
        let snapshot = store
            .capture(ctx, target.files)
            .await
            .with_metadata_lazy("address", || target.address.to_string())?;
        captured.push(LegacyTarget {
            address: target.address,
            type_alias: target.type_alias,
            snapshot,
        });
    }
    Ok(captured)
}

/// Dispatch a validated request to its use case.
pub async fn run_request(
    ctx: &RequestContext,
    deps: &SourceFilesDeps,
    request: ValidatedRequest,
) -> InfraResult<SourceFiles> {
    match request {
        ValidatedRequest::AllSourceFiles(request) => {
            let request = request.into_inner();
            let input = AllSourceFilesInput {
                sources: request.sources,
                strip_source_roots: request.strip_source_roots,
            };
            all_source_files(ctx, deps, input).await
        },
        ValidatedRequest::SpecifiedSourceFiles(request) => {
            let request = request.into_inner();
            let input = SpecifiedSourceFilesInput {
                sources_with_origins: request.sources_with_origins,
                strip_source_roots: request.strip_source_roots,
            };
            specified_source_files(ctx, deps, input).await
        },
        ValidatedRequest::LegacyAllSourceFiles(request) => {
            let request = request.into_inner();
            let targets =
                capture_legacy_targets(ctx, deps.store.as_ref(), request.targets).await?;
            let input = LegacyAllSourceFilesInput {
                targets,
                strip_source_roots: request.strip_source_roots,
            };
            legacy_all_source_files(ctx, deps, input).await
        },
    }
}

/// Inputs of a local, one-shot run.
#[derive(Debug, Clone, Copy)]
pub struct LocalRun<'a> {
    /// Project root every path is relative to.
    pub project_root: &'a Path,
    /// Environment variables (config overrides, log level).
    pub env: &'a BTreeMap<String, String>,
    /// Optional `.json` or `.toml` config file.
    pub config_path: Option<&'a Path>,
    /// Optional partial config JSON.
    pub overrides_json: Option<&'a str>,
    /// Caller-supplied correlation id; a `req_*` id is generated when absent.
    pub correlation_id: Option<&'a str>,
}

impl LocalRun<'_> {
    fn request_context(&self) -> InfraResult<RequestContext> {
        match self.correlation_id {
            Some(id) => Ok(RequestContext::new(CorrelationId::parse(id)?)),
            None => Ok(RequestContext::new_request()),
        }
    }
}

/// Load config, wire local adapters, validate the JSON request and run it.
#[tracing::instrument(name = "infra.run_request_local", skip_all, fields(kind = %kind))]
pub fn run_request_json_local(
    run: LocalRun<'_>,
    kind: RequestKind,
    input_json: &str,
) -> InfraResult<SourceFilesReport> {
    let env = ResolverEnv::from_map(run.env).map_err(ErrorEnvelope::from)?;
    let config = load_resolver_config_from_path(run.config_path, run.overrides_json, &env)?;
    let request = validate_request_json(kind, input_json)?;

    let ctx = run.request_context()?;
    let observability = Observability::from_env(run.env).scoped(&ctx);
    let deps = build_source_files_deps(&config, run.project_root, &observability)?;

    let files = run_async_with_ctx(ctx, |ctx| async move {
        run_request(&ctx, &deps, request).await
    })?;
    Ok(SourceFilesReport::from(&files))
}

fn run_async_with_ctx<F, T>(
    ctx: RequestContext,
    op: impl FnOnce(RequestContext) -> F,
) -> InfraResult<T>
where
    F: Future<Output = Result<T, ErrorEnvelope>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(InfraError::from)?;
    runtime.block_on(async { op(ctx).await })
}
