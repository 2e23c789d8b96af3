//! Logger and telemetry selection for the composition root.

use serde_json::Value;
use sourceset_adapters::{JsonLogger, JsonTelemetry, LogSink, StderrLogSink};
use sourceset_ports::{LogFields, LogLevel, LoggerPort, TelemetryPort};
use sourceset_shared::RequestContext;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Minimum log level (`debug|info|warn|error`).
pub const ENV_LOG_LEVEL: &str = "SOURCESET_LOG_LEVEL";
/// Set to `off` to disable JSON telemetry lines.
pub const ENV_TELEMETRY: &str = "SOURCESET_TELEMETRY";

/// Optional logger and telemetry handed to the use cases.
#[derive(Clone, Default)]
pub struct Observability {
    /// Structured logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Counters and timers.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

impl Observability {
    /// JSON logger and, when enabled, JSON telemetry over one sink.
    #[must_use]
    pub fn json(sink: Arc<dyn LogSink>, level: LogLevel, telemetry: bool) -> Self {
        let logger: Arc<dyn LoggerPort> =
            Arc::new(JsonLogger::new(Arc::clone(&sink)).with_min_level(level));
        let telemetry: Option<Arc<dyn TelemetryPort>> = if telemetry {
            Some(Arc::new(JsonTelemetry::new(sink)))
        } else {
            None
        };
        Self {
            logger: Some(logger),
            telemetry,
        }
    }

    /// Read the level and telemetry switch from an env map and write to stderr.
    #[must_use]
    pub fn from_env(env: &BTreeMap<String, String>) -> Self {
        let telemetry = env
            .get(ENV_TELEMETRY)
            .is_none_or(|value| !value.trim().eq_ignore_ascii_case("off"));
        Self::json(Arc::new(StderrLogSink), log_level_from_env(env), telemetry)
    }

    /// Copy whose logger carries the request's correlation id on every event.
    #[must_use]
    pub fn scoped(&self, ctx: &RequestContext) -> Self {
        let correlation_id = ctx.correlation_id().as_str().to_owned();
        let logger = self.logger.as_ref().map(|logger| {
            let mut fields = LogFields::new();
            fields.insert("correlationId".into(), Value::String(correlation_id));
            Arc::from(logger.child(fields))
        });
        Self {
            logger,
            telemetry: self.telemetry.clone(),
        }
    }
}

/// Parse the minimum log level, falling back to `info` when unset or unknown.
#[must_use]
pub fn log_level_from_env(env: &BTreeMap<String, String>) -> LogLevel {
    env.get(ENV_LOG_LEVEL)
        .map(String::as_str)
        .and_then(LogLevel::parse)
        .unwrap_or(LogLevel::Info)
}
