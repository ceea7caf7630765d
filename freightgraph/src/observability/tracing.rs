//! Subscriber setup and rebuild phase timing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Installs a global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to `default_filter`. Only the
/// first call has any effect; later calls and an already installed subscriber
/// are ignored.
pub fn init_tracing(format: LogFormat, default_filter: &str) {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true);
        let _ = match format {
            LogFormat::Text => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
    });
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: &'static str,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stops the timer and returns the elapsed milliseconds.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

/// Milliseconds spent in each phase of one rebuild.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTimings {
    phases: BTreeMap<&'static str, f64>,
}

impl PhaseTimings {
    /// Creates an empty set of timings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops `timer` and records it under its name.
    pub fn record(&mut self, timer: SpanTimer) {
        let name = timer.name();
        *self.phases.entry(name).or_default() += timer.finish();
    }

    /// Returns the time recorded for a phase.
    #[must_use]
    pub fn get(&self, phase: &str) -> Option<f64> {
        self.phases.get(phase).copied()
    }

    /// Sum of all phases.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.phases.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("layout");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(timer.name(), "layout");
        assert!(timer.finish() >= 10.0);
    }

    #[test]
    fn test_phase_timings_accumulate() {
        let mut timings = PhaseTimings::new();
        timings.record(SpanTimer::start("graph"));
        timings.record(SpanTimer::start("graph"));
        timings.record(SpanTimer::start("layout"));

        assert!(timings.get("graph").is_some());
        assert!(timings.get("stack").is_none());
        assert!(timings.total_ms() >= timings.get("layout").unwrap_or_default());
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing(LogFormat::Text, "info");
        init_tracing(LogFormat::Json, "debug");
    }
}
