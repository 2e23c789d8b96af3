//! Line sinks for the JSON logger.

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A sink that receives pre-formatted log lines (newline included).
pub trait LogSink: Send + Sync {
    /// Write a line to the sink.
    fn write_line(&self, line: &str);
}

/// Log sink that writes to stderr.
#[derive(Debug, Default)]
pub struct StderrLogSink;

impl LogSink for StderrLogSink {
    fn write_line(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        if let Err(error) = stderr.write_all(line.as_bytes()) {
            eprintln!("log sink write failed: {error}");
        }
    }
}

/// Log sink that keeps lines in memory, for inspection by callers.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    /// Drain every captured line.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.guard())
    }

    fn guard(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogSink for MemoryLogSink {
    fn write_line(&self, line: &str) {
        self.guard().push(line.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_drains_lines_in_order() {
        let sink = MemoryLogSink::default();
        sink.write_line("first\n");
        sink.write_line("second\n");

        assert_eq!(sink.take(), vec!["first\n", "second\n"]);
        assert!(sink.take().is_empty());
    }
}
