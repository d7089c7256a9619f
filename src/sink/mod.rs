//! Destinations for check events and request samples.
//!
//! The core only appends; implementations own their own synchronisation.

#[cfg(feature = "metrics")]
pub mod prometheus;
pub mod summary;

#[cfg(feature = "metrics")]
pub use prometheus::PrometheusSink;
pub use summary::{RunSummary, SummarySink};

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::check::CheckEvent;
use crate::executor::OutcomeStatus;

/// One HTTP request as seen by the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSample {
    pub step: &'static str,
    pub status: OutcomeStatus,
    pub latency: Duration,
}

/// One finished workflow iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationSample {
    pub vu: usize,
    pub iteration: u64,
    pub started_at: Instant,
    pub elapsed: Duration,
}

pub trait MetricsSink: Send + Sync {
    fn record_check(&self, event: &CheckEvent);

    fn record_request(&self, _sample: &RequestSample) {}

    fn record_iteration(&self, _sample: &IterationSample) {}
}

/// Keeps everything in memory. Meant for tests and short runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    checks: Mutex<Vec<CheckEvent>>,
    requests: Mutex<Vec<RequestSample>>,
    iterations: Mutex<Vec<IterationSample>>,
}

impl MemorySink {
    pub fn checks(&self) -> Vec<CheckEvent> {
        self.checks.lock().clone()
    }

    pub fn requests(&self) -> Vec<RequestSample> {
        self.requests.lock().clone()
    }

    pub fn iterations(&self) -> Vec<IterationSample> {
        self.iterations.lock().clone()
    }
}

impl MetricsSink for MemorySink {
    fn record_check(&self, event: &CheckEvent) {
        self.checks.lock().push(event.clone());
    }

    fn record_request(&self, sample: &RequestSample) {
        self.requests.lock().push(sample.clone());
    }

    fn record_iteration(&self, sample: &IterationSample) {
        self.iterations.lock().push(sample.clone());
    }
}

/// Logs failed checks at `warn`, everything else at `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn record_check(&self, event: &CheckEvent) {
        if event.passed {
            debug!(label = %event.label, "check passed");
        } else {
            warn!(label = %event.label, "check failed");
        }
    }

    fn record_request(&self, sample: &RequestSample) {
        debug!(
            step = sample.step,
            status = %sample.status,
            latency_ms = sample.latency.as_secs_f64() * 1000.0,
            "request"
        );
    }

    fn record_iteration(&self, sample: &IterationSample) {
        debug!(
            vu = sample.vu,
            iteration = sample.iteration,
            elapsed_ms = sample.elapsed.as_secs_f64() * 1000.0,
            "iteration finished"
        );
    }
}

/// Forwards every record to each inner sink in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn MetricsSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn MetricsSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn MetricsSink>) {
        self.sinks.push(sink);
    }
}

impl MetricsSink for FanoutSink {
    fn record_check(&self, event: &CheckEvent) {
        for sink in &self.sinks {
            sink.record_check(event);
        }
    }

    fn record_request(&self, sample: &RequestSample) {
        for sink in &self.sinks {
            sink.record_request(sample);
        }
    }

    fn record_iteration(&self, sample: &IterationSample) {
        for sink in &self.sinks {
            sink.record_iteration(sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fanout_reaches_every_sink() {
        let a = Arc::new(MemorySink::default());
        let b = Arc::new(MemorySink::default());
        let sinks: Vec<Arc<dyn MetricsSink>> = vec![a.clone(), b.clone(), Arc::new(TracingSink)];
        let fanout = FanoutSink::new(sinks);

        fanout.record_check(&CheckEvent::new("merge ok", false));
        fanout.record_request(&RequestSample {
            step: "merge",
            status: OutcomeStatus::Http(200),
            latency: Duration::from_millis(4),
        });

        assert_eq!(a.checks(), vec![CheckEvent::new("merge ok", false)]);
        assert_eq!(b.checks().len(), 1);
        assert_eq!(b.requests()[0].step, "merge");
        assert!(a.iterations().is_empty());
    }

    #[test]
    fn test_tracing_sink_accepts_extreme_durations() {
        let memory = Arc::new(MemorySink::default());
        let sinks: Vec<Arc<dyn MetricsSink>> = vec![Arc::new(TracingSink), memory.clone()];
        let fanout = FanoutSink::new(sinks);

        fanout.record_iteration(&IterationSample {
            vu: 3,
            iteration: u64::MAX,
            started_at: Instant::now(),
            elapsed: Duration::MAX,
        });

        assert_eq!(memory.iterations()[0].elapsed, Duration::MAX);
    }
}
