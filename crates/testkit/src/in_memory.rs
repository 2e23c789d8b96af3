//! In-memory adapter implementations for port contracts.
//!
//! These implementations are intended for:
//! - Unit/integration tests of the resolution use cases
//! - Deterministic contract tests for the ports layer
//! - Recording what the use cases logged and measured

use sourceset_domain::{
    FileDigest, MergedSnapshot, ProjectPath, Snapshot, SnapshotEntry, SourcesDescriptor,
    TargetAddress,
};
use sourceset_ports::{
    BoxFuture, FileSystemDirEntry, FileSystemEntryKind, FileSystemPort, FileSystemStat, LogEvent,
    LogFields, LogLevel, LoggerPort, SnapshotStorePort, SourceRoot, SourceRootPort,
    SourcesHydrationPort, TelemetryPort, TelemetryTags, TelemetryTimer, telemetry_tags,
};
use sourceset_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// A no-op telemetry timer.
#[derive(Debug, Default)]
pub struct NoopTimer;

impl TelemetryTimer for NoopTimer {
    fn stop(&self) {}
}

/// A no-op telemetry implementation.
#[derive(Debug, Default)]
pub struct NoopTelemetry;

impl TelemetryPort for NoopTelemetry {
    fn increment_counter(&self, _name: &str, _value: u64, _tags: Option<&TelemetryTags>) {}

    fn record_timer_ms(&self, _name: &str, _duration_ms: u64, _tags: Option<&TelemetryTags>) {}

    fn start_timer(&self, _name: &str, _tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(NoopTimer)
    }
}

/// Logger that keeps every event; children share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    events: Arc<Mutex<Vec<LogEvent>>>,
    base_fields: LogFields,
}

impl RecordingLogger {
    /// All events recorded so far, in emission order.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Names of all recorded events.
    pub fn event_names(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|event| event.event.into_string())
            .collect()
    }

    /// Events with the given name.
    pub fn events_named(&self, name: &str) -> Vec<LogEvent> {
        self.events()
            .into_iter()
            .filter(|event| &*event.event == name)
            .collect()
    }
}

impl LoggerPort for RecordingLogger {
    fn log(&self, mut event: LogEvent) {
        if !self.base_fields.is_empty() {
            let mut fields = self.base_fields.clone();
            fields.extend(event.fields.take().unwrap_or_default());
            event.fields = Some(fields);
        }
        self.events.lock().unwrap().push(event);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut base_fields = self.base_fields.clone();
        base_fields.extend(fields);
        Box::new(Self {
            events: Arc::clone(&self.events),
            base_fields,
        })
    }
}

/// A metric captured by [`RecordingTelemetry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMetric {
    /// Metric name.
    pub name: String,
    /// Counter increment or timer duration.
    pub value: u64,
    /// Tags attached to the metric.
    pub tags: TelemetryTags,
}

/// Telemetry that records counters and timers.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    counters: Arc<Mutex<Vec<RecordedMetric>>>,
    timers: Arc<Mutex<Vec<RecordedMetric>>>,
}

impl RecordingTelemetry {
    /// Recorded counter increments.
    pub fn counters(&self) -> Vec<RecordedMetric> {
        self.counters.lock().unwrap().clone()
    }

    /// Recorded timers.
    pub fn timers(&self) -> Vec<RecordedMetric> {
        self.timers.lock().unwrap().clone()
    }

    /// Sum of all increments recorded for a counter.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counters()
            .iter()
            .filter(|metric| metric.name == name)
            .map(|metric| metric.value)
            .sum()
    }
}

impl TelemetryPort for RecordingTelemetry {
    fn increment_counter(&self, name: &str, value: u64, tags: Option<&TelemetryTags>) {
        self.counters.lock().unwrap().push(RecordedMetric {
            name: name.to_owned(),
            value,
            tags: tags.cloned().unwrap_or_default(),
        });
    }

    fn record_timer_ms(&self, name: &str, duration_ms: u64, tags: Option<&TelemetryTags>) {
        self.timers.lock().unwrap().push(RecordedMetric {
            name: name.to_owned(),
            value: duration_ms,
            tags: tags.cloned().unwrap_or_default(),
        });
    }

    fn start_timer(&self, name: &str, tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(RecordingTimer {
            timers: Arc::clone(&self.timers),
            name: name.to_owned(),
            tags: tags.cloned().unwrap_or_default(),
        })
    }
}

struct RecordingTimer {
    timers: Arc<Mutex<Vec<RecordedMetric>>>,
    name: String,
    tags: TelemetryTags,
}

impl TelemetryTimer for RecordingTimer {
    fn stop(&self) {
        self.timers.lock().unwrap().push(RecordedMetric {
            name: self.name.clone(),
            value: 0,
            tags: self.tags.clone(),
        });
    }
}

/// File contents keyed by project path.
pub type InMemoryFiles = BTreeMap<ProjectPath, Vec<u8>>;

/// Filesystem backed by a map of project paths to contents.
///
/// Directories exist implicitly as parents of files.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileSystem {
    files: Arc<InMemoryFiles>,
}

impl InMemoryFileSystem {
    /// Build from `(path, contents)` pairs. Panics on invalid paths.
    pub fn new<P: AsRef<str>, C: AsRef<[u8]>>(files: impl IntoIterator<Item = (P, C)>) -> Self {
        let files = files
            .into_iter()
            .map(|(path, contents)| {
                (
                    ProjectPath::parse(path).unwrap(),
                    contents.as_ref().to_vec(),
                )
            })
            .collect();
        Self {
            files: Arc::new(files),
        }
    }

    /// The stored files.
    pub fn files(&self) -> &InMemoryFiles {
        &self.files
    }

    fn is_dir(&self, dir: &str) -> bool {
        self.files.keys().any(|path| path.is_under(dir))
    }
}

impl FileSystemPort for InMemoryFileSystem {
    fn read_dir(
        &self,
        ctx: &RequestContext,
        dir: Box<str>,
    ) -> BoxFuture<'_, Result<Vec<FileSystemDirEntry>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("fs.read_dir")?;
            if !self.is_dir(&dir) {
                return Err(not_found(&dir));
            }
            let mut entries = BTreeMap::new();
            for path in self.files.keys() {
                let Some(rest) = path.strip_dir(&dir) else {
                    continue;
                };
                let (name, kind) = match rest.as_str().split_once('/') {
                    Some((name, _)) => (name, FileSystemEntryKind::Directory),
                    None => (rest.as_str(), FileSystemEntryKind::File),
                };
                entries.insert(Box::<str>::from(name), kind);
            }
            Ok(entries
                .into_iter()
                .map(|(name, kind)| FileSystemDirEntry { name, kind })
                .collect())
        })
    }

    fn read_file_bytes(
        &self,
        ctx: &RequestContext,
        file: ProjectPath,
    ) -> BoxFuture<'_, Result<Vec<u8>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("fs.read_file_bytes")?;
            self.files
                .get(&file)
                .cloned()
                .ok_or_else(|| not_found(file.as_str()))
        })
    }

    fn stat(&self, ctx: &RequestContext, path: ProjectPath) -> BoxFuture<'_, Result<FileSystemStat>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("fs.stat")?;
            if let Some(contents) = self.files.get(&path) {
                return Ok(FileSystemStat {
                    kind: FileSystemEntryKind::File,
                    size_bytes: contents.len() as u64,
                });
            }
            if self.is_dir(path.as_str()) {
                return Ok(FileSystemStat {
                    kind: FileSystemEntryKind::Directory,
                    size_bytes: 0,
                });
            }
            Err(not_found(path.as_str()))
        })
    }
}

/// Snapshot store over in-memory contents that counts capture calls.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotStore {
    files: Arc<InMemoryFiles>,
    captured_paths: Arc<AtomicUsize>,
}

impl InMemorySnapshotStore {
    /// Build a store serving the files of `fs`.
    pub fn new(fs: &InMemoryFileSystem) -> Self {
        Self {
            files: Arc::clone(&fs.files),
            captured_paths: Arc::default(),
        }
    }

    /// Total number of paths captured (read and digested) so far.
    pub fn captured_paths(&self) -> usize {
        self.captured_paths.load(Ordering::SeqCst)
    }
}

impl SnapshotStorePort for InMemorySnapshotStore {
    fn capture(
        &self,
        ctx: &RequestContext,
        paths: Vec<ProjectPath>,
    ) -> BoxFuture<'_, Result<Snapshot>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("snapshot.capture")?;
            let unique: BTreeSet<ProjectPath> = paths.into_iter().collect();
            let mut entries = Vec::with_capacity(unique.len());
            for path in unique {
                let contents = self
                    .files
                    .get(&path)
                    .ok_or_else(|| not_found(path.as_str()))?;
                self.captured_paths.fetch_add(1, Ordering::SeqCst);
                entries.push(SnapshotEntry::new(path, FileDigest::of_bytes(contents)));
            }
            Snapshot::from_entries(entries).map_err(ErrorEnvelope::from)
        })
    }

    fn subset(
        &self,
        _ctx: &RequestContext,
        snapshot: Snapshot,
        paths: BTreeSet<ProjectPath>,
    ) -> BoxFuture<'_, Result<Snapshot>> {
        Box::pin(async move { Ok(snapshot.subset(&paths)) })
    }

    fn merge(
        &self,
        _ctx: &RequestContext,
        snapshots: Vec<Snapshot>,
    ) -> BoxFuture<'_, Result<MergedSnapshot>> {
        Box::pin(async move { Ok(Snapshot::merge(&snapshots)) })
    }

    fn strip_prefix(
        &self,
        _ctx: &RequestContext,
        snapshot: Snapshot,
        prefix: Box<str>,
    ) -> BoxFuture<'_, Result<Snapshot>> {
        Box::pin(async move { snapshot.strip_prefix(&prefix).map_err(ErrorEnvelope::from) })
    }
}

/// Hydrator with a fixed owned file set per target.
///
/// Descriptors with declared sources but no registered owned set own nothing.
#[derive(Clone)]
pub struct StaticSourcesHydrator {
    store: Arc<dyn SnapshotStorePort>,
    owned: BTreeMap<TargetAddress, Vec<ProjectPath>>,
}

impl StaticSourcesHydrator {
    /// Build a hydrator capturing through `store`.
    pub fn new(store: Arc<dyn SnapshotStorePort>) -> Self {
        Self {
            store,
            owned: BTreeMap::new(),
        }
    }

    /// Register the owned files of `address`. Panics on invalid input.
    #[must_use]
    pub fn with_owned(mut self, address: &str, files: &[&str]) -> Self {
        let address = TargetAddress::parse(address).unwrap();
        let files = files
            .iter()
            .map(|file| ProjectPath::parse(file).unwrap())
            .collect();
        self.owned.insert(address, files);
        self
    }
}

impl SourcesHydrationPort for StaticSourcesHydrator {
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
            let files = self
                .owned
                .get(&descriptor.address)
                .cloned()
                .unwrap_or_default();
            self.store.capture(&ctx, files).await
        })
    }
}

/// Source roots given as plain directories; the longest prefix wins.
#[derive(Debug, Clone, Default)]
pub struct FixedSourceRoots {
    roots: Vec<Box<str>>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl FixedSourceRoots {
    /// Build from root directories.
    pub fn new<S: Into<Box<str>>>(roots: impl IntoIterator<Item = S>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            queries: Arc::default(),
        }
    }

    /// Paths passed to `find_root`, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl SourceRootPort for FixedSourceRoots {
    fn find_root(
        &self,
        ctx: &RequestContext,
        path: Box<str>,
    ) -> BoxFuture<'_, Result<Option<SourceRoot>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("source_roots.find_root")?;
            self.queries.lock().unwrap().push(path.to_string());
            let root = self
                .roots
                .iter()
                .filter(|root| {
                    root.is_empty()
                        || *path == ***root
                        || path
                            .strip_prefix(&***root)
                            .is_some_and(|rest| rest.starts_with('/'))
                })
                .max_by_key(|root| root.len())
                .map(|root| SourceRoot::new(root.clone()));
            Ok(root)
        })
    }
}

fn not_found(path: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::not_found(), "file not found").with_metadata("path", path)
}

/// Build a `LogEvent` helper for tests.
#[must_use]
pub fn log_event(level: LogLevel, event: &str, message: &str) -> LogEvent {
    LogEvent::new(level, event, message, None)
}

/// Build a single-tag map for tests.
#[must_use]
pub fn tags_1(key: &str, value: &str) -> TelemetryTags {
    telemetry_tags([(key, value)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project() -> InMemoryFileSystem {
        InMemoryFileSystem::new([
            ("src/python/s1.py", "one"),
            ("src/python/pkg/s2.py", "two"),
            ("README.md", "readme"),
        ])
    }

    #[tokio::test]
    async fn in_memory_fs_lists_implicit_directories() -> Result<()> {
        let fs = project();
        let ctx = RequestContext::new_request();

        let top = fs.read_dir(&ctx, "".into()).await?;
        let names: Vec<&str> = top.iter().map(|entry| &*entry.name).collect();
        assert_eq!(names, vec!["README.md", "src"]);
        assert_eq!(top[1].kind, FileSystemEntryKind::Directory);

        let stat = fs.stat(&ctx, ProjectPath::parse("src/python")?).await?;
        assert_eq!(stat.kind, FileSystemEntryKind::Directory);

        let missing = fs.read_dir(&ctx, "docs".into()).await;
        assert!(matches!(missing, Err(error) if error.is_not_found()));
        Ok(())
    }

    #[tokio::test]
    async fn snapshot_store_counts_captures_and_reports_missing() -> Result<()> {
        let fs = project();
        let store = InMemorySnapshotStore::new(&fs);
        let ctx = RequestContext::new_request();

        let snapshot = store
            .capture(
                &ctx,
                vec![
                    ProjectPath::parse("src/python/s1.py")?,
                    ProjectPath::parse("src/python/s1.py")?,
                ],
            )
            .await?;
        assert_eq!(snapshot.files(), vec!["src/python/s1.py"]);
        assert_eq!(store.captured_paths(), 1);

        let missing = store
            .capture(&ctx, vec![ProjectPath::parse("src/python/gone.py")?])
            .await;
        assert!(matches!(missing, Err(error) if error.is_not_found()));
        Ok(())
    }

    #[tokio::test]
    async fn static_hydrator_returns_registered_files() -> Result<()> {
        let fs = project();
        let store: Arc<dyn SnapshotStorePort> = Arc::new(InMemorySnapshotStore::new(&fs));
        let hydrator = StaticSourcesHydrator::new(store)
            .with_owned("src/python:lib", &["src/python/s1.py", "src/python/pkg/s2.py"]);
        let ctx = RequestContext::new_request();

        let descriptor = SourcesDescriptor::new(
            TargetAddress::parse("src/python:lib")?,
            ["**/*.py"],
            sourceset_domain::SourcesKind::Typed,
        );
        let snapshot = hydrator.hydrate(&ctx, descriptor).await?;
        assert_eq!(
            snapshot.files(),
            vec!["src/python/pkg/s2.py", "src/python/s1.py"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn fixed_roots_pick_longest_prefix_and_record_queries() -> Result<()> {
        let roots = FixedSourceRoots::new(["src", "src/python"]);
        let ctx = RequestContext::new_request();

        let root = roots.find_root(&ctx, "src/python/pkg".into()).await?;
        assert_eq!(root, Some(SourceRoot::new("src/python")));
        assert_eq!(roots.find_root(&ctx, "srcx".into()).await?, None);
        assert_eq!(roots.queries(), vec!["src/python/pkg", "srcx"]);
        Ok(())
    }

    #[test]
    fn recording_logger_children_share_events() {
        let logger = RecordingLogger::default();
        let child = logger.child(LogFields::from([("request".into(), json!("all"))]));
        child.info("sourceFiles.all.start", "start", None);
        logger.log(log_event(LogLevel::Warn, "plain", "message"));

        assert_eq!(logger.event_names(), vec!["sourceFiles.all.start", "plain"]);
        let start = &logger.events_named("sourceFiles.all.start")[0];
        assert_eq!(
            start.fields.as_ref().and_then(|fields| fields.get("request")),
            Some(&json!("all"))
        );
    }

    #[test]
    fn recording_telemetry_sums_counters() {
        let telemetry = RecordingTelemetry::default();
        telemetry.increment_counter("executed", 1, Some(&tags_1("request", "all")));
        telemetry.increment_counter("executed", 2, None);
        telemetry.start_timer("total", None).stop();

        assert_eq!(telemetry.counter_total("executed"), 3);
        assert_eq!(telemetry.timers().len(), 1);
    }

    #[test]
    fn noop_logger_and_telemetry_are_safe() {
        let logger = NoopLogger::default();
        let child = logger.child(LogFields::new());
        child.log(log_event(LogLevel::Info, "event", "message"));

        let telemetry = NoopTelemetry::default();
        telemetry.increment_counter("counter", 1, None);
        telemetry.record_timer_ms("timer", 10, None);
        let timer = telemetry.start_timer("timer2", None);
        timer.stop();
    }
}
