//! Metrics emitted by the resolution pipeline.
//!
//! Names are dotted and scoped by request kind: `sourceFiles.<request>.total`
//! is a timer, `sourceFiles.<request>.{executed,failed,aborted}` are counters.

use std::collections::BTreeMap;

/// Low-cardinality tags attached to a metric.
pub type TelemetryTags = BTreeMap<Box<str>, Box<str>>;

/// Build tags from key/value pairs; later pairs win on duplicate keys.
pub fn telemetry_tags<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> TelemetryTags {
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Handle returned by [`TelemetryPort::start_timer`].
pub trait TelemetryTimer: Send + Sync {
    /// Record the elapsed time. Later calls record nothing.
    fn stop(&self);
}

/// Sink for pipeline counters and timers.
pub trait TelemetryPort: Send + Sync {
    /// Add `value` to a counter.
    fn increment_counter(&self, name: &str, value: u64, tags: Option<&TelemetryTags>);

    /// Record an already-measured duration.
    fn record_timer_ms(&self, name: &str, duration_ms: u64, tags: Option<&TelemetryTags>);

    /// Start timing `name`; the duration is recorded when the handle stops.
    fn start_timer(&self, name: &str, tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer>;

    /// Count one outcome.
    fn count(&self, name: &str, tags: Option<&TelemetryTags>) {
        self.increment_counter(name, 1, tags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_pairs_override_earlier_ones() {
        let tags = telemetry_tags([("request", "all"), ("request", "legacy"), ("strip", "true")]);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.get("request").map(AsRef::as_ref), Some("legacy"));
    }
}
