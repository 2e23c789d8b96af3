//! JSON telemetry adapter (counters and timers).

use crate::log_sink::LogSink;
use serde_json::{Map, Value};
use sourceset_ports::{TelemetryPort, TelemetryTags, TelemetryTimer};
use sourceset_shared::{REDACTED, is_secret_key};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Telemetry adapter that emits one JSON line per metric.
#[derive(Clone)]
pub struct JsonTelemetry {
    sink: Arc<dyn LogSink>,
    base_tags: TelemetryTags,
}

impl JsonTelemetry {
    /// Create a telemetry adapter backed by the provided sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            base_tags: TelemetryTags::new(),
        }
    }

    /// Set base tags applied to every metric.
    #[must_use]
    pub fn with_base_tags(mut self, tags: TelemetryTags) -> Self {
        self.base_tags = tags;
        self
    }

    fn merged(&self, tags: Option<&TelemetryTags>) -> TelemetryTags {
        let mut merged = self.base_tags.clone();
        if let Some(tags) = tags {
            merged.extend(tags.iter().map(|(key, value)| (key.clone(), value.clone())));
        }
        merged
    }
}

impl TelemetryPort for JsonTelemetry {
    fn increment_counter(&self, name: &str, value: u64, tags: Option<&TelemetryTags>) {
        let line = metric_line("counter", name, value, &self.merged(tags));
        self.sink.write_line(&line);
    }

    fn record_timer_ms(&self, name: &str, duration_ms: u64, tags: Option<&TelemetryTags>) {
        let line = metric_line("timer", name, duration_ms, &self.merged(tags));
        self.sink.write_line(&line);
    }

    fn start_timer(&self, name: &str, tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(JsonTelemetryTimer {
            sink: Arc::clone(&self.sink),
            name: name.into(),
            tags: self.merged(tags),
            started_at: Instant::now(),
            stopped: AtomicBool::new(false),
        })
    }
}

struct JsonTelemetryTimer {
    sink: Arc<dyn LogSink>,
    name: Box<str>,
    tags: TelemetryTags,
    started_at: Instant,
    stopped: AtomicBool,
}

impl TelemetryTimer for JsonTelemetryTimer {
    fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let duration_ms = u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.sink
            .write_line(&metric_line("timer", &self.name, duration_ms, &self.tags));
    }
}

fn metric_line(kind: &str, name: &str, value: u64, tags: &TelemetryTags) -> String {
    let tags: Map<String, Value> = tags
        .iter()
        .map(|(key, value)| {
            let rendered = if is_secret_key(key) { REDACTED } else { &**value };
            (key.to_string(), Value::from(rendered))
        })
        .collect();
    let mut payload = Map::new();
    payload.insert("type".to_owned(), Value::from(kind));
    payload.insert("name".to_owned(), Value::from(name));
    payload.insert("value".to_owned(), Value::from(value));
    if kind == "timer" {
        payload.insert("unit".to_owned(), Value::from("ms"));
    }
    if !tags.is_empty() {
        payload.insert("tags".to_owned(), Value::Object(tags));
    }

    let mut line = Value::Object(payload).to_string();
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_sink::MemoryLogSink;
    use serde_json::json;

    fn tags(pairs: &[(&str, &str)]) -> TelemetryTags {
        pairs
            .iter()
            .map(|(key, value)| ((*key).into(), (*value).into()))
            .collect()
    }

    #[test]
    fn counters_carry_merged_tags() -> Result<(), Box<dyn std::error::Error>> {
        let sink = Arc::new(MemoryLogSink::default());
        let telemetry = JsonTelemetry::new(sink.clone())
            .with_base_tags(tags(&[("service", "sourceset"), ("request", "base")]));

        telemetry.increment_counter(
            "sourceFiles.all.executed",
            1,
            Some(&tags(&[("request", "all"), ("apiToken", "x")])),
        );

        let lines = sink.take();
        let line = lines.first().ok_or("missing counter line")?;
        let payload: Value = serde_json::from_str(line.trim_end())?;
        assert_eq!(payload["type"], json!("counter"));
        assert_eq!(payload["tags"]["request"], json!("all"));
        assert_eq!(payload["tags"]["service"], json!("sourceset"));
        assert_eq!(payload["tags"]["apiToken"], json!(REDACTED));
        Ok(())
    }

    #[test]
    fn timer_records_once() -> Result<(), Box<dyn std::error::Error>> {
        let sink = Arc::new(MemoryLogSink::default());
        let telemetry = JsonTelemetry::new(sink.clone());

        let timer = telemetry.start_timer("sourceFiles.all.total", None);
        timer.stop();
        timer.stop();

        let lines = sink.take();
        assert_eq!(lines.len(), 1);
        let payload: Value = serde_json::from_str(lines.concat().trim_end())?;
        assert_eq!(payload["unit"], json!("ms"));
        assert!(payload.get("tags").is_none());
        Ok(())
    }
}
