//! End-of-run aggregation, in the shape of a k6 summary.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use super::{IterationSample, MetricsSink, RequestSample};
use crate::check::CheckEvent;

#[derive(Debug, Default)]
struct CheckTally {
    passes: u64,
    fails: u64,
}

/// Upper bound on retained samples per distribution.
const MAX_SAMPLES: usize = 8192;

/// Exact count, sum and extremes, plus a bounded sample set for percentiles.
///
/// Once the sample set is full every other sample is dropped and the keep
/// stride doubles, so retained samples stay evenly spread over the run.
#[derive(Debug)]
struct Distribution {
    limit: usize,
    count: u64,
    total: Duration,
    min: Duration,
    max: Duration,
    stride: u64,
    samples: Vec<Duration>,
}

impl Default for Distribution {
    fn default() -> Self {
        Self::with_limit(MAX_SAMPLES)
    }
}

impl Distribution {
    fn with_limit(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            count: 0,
            total: Duration::ZERO,
            min: Duration::MAX,
            max: Duration::ZERO,
            stride: 1,
            samples: Vec::new(),
        }
    }

    fn record(&mut self, value: Duration) {
        let index = self.count;
        self.count += 1;
        self.total = self.total.saturating_add(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);

        if index % self.stride != 0 {
            return;
        }
        if self.samples.len() >= self.limit {
            let mut position = 0;
            self.samples.retain(|_| {
                position += 1;
                position % 2 == 1
            });
            self.stride *= 2;
            if index % self.stride != 0 {
                return;
            }
        }
        self.samples.push(value);
    }

    fn summary(&self) -> LatencySummary {
        if self.count == 0 {
            return LatencySummary::default();
        }
        let mut sorted = self.samples.iter().map(|d| millis(*d)).collect::<Vec<_>>();
        sorted.sort_by(|a, b| a.total_cmp(b));

        LatencySummary {
            min: millis(self.min),
            avg: self.total.as_nanos() as f64 / self.count as f64 / 1_000_000.0,
            med: percentile(&sorted, 50.0),
            p90: percentile(&sorted, 90.0),
            p95: percentile(&sorted, 95.0),
            max: millis(self.max),
        }
    }
}

fn millis(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

#[derive(Debug, Default)]
struct StepStats {
    latency: Distribution,
    transport_errors: u64,
    statuses: BTreeMap<String, u64>,
}

#[derive(Debug, Default)]
struct SummaryState {
    checks: BTreeMap<String, CheckTally>,
    steps: BTreeMap<&'static str, StepStats>,
    iterations: Distribution,
}

/// Aggregates pass rates and latency distributions for the whole run.
#[derive(Debug, Default)]
pub struct SummarySink {
    state: Mutex<SummaryState>,
}

impl SummarySink {
    pub fn snapshot(&self) -> RunSummary {
        let state = self.state.lock();

        let checks = state
            .checks
            .iter()
            .map(|(label, tally)| CheckSummary {
                label: label.clone(),
                passes: tally.passes,
                fails: tally.fails,
                rate: ratio(tally.passes, tally.passes + tally.fails),
            })
            .collect::<Vec<_>>();

        let requests = state
            .steps
            .iter()
            .map(|(step, stats)| RequestSummary {
                step: (*step).to_string(),
                count: stats.latency.count,
                transport_errors: stats.transport_errors,
                latency: stats.latency.summary(),
                statuses: stats.statuses.clone(),
            })
            .collect::<Vec<_>>();

        let passes: u64 = checks.iter().map(|c| c.passes).sum();
        let total: u64 = checks.iter().map(|c| c.passes + c.fails).sum();

        RunSummary {
            checks_rate: ratio(passes, total),
            checks,
            requests,
            iterations: IterationSummary {
                count: state.iterations.count,
                duration: state.iterations.summary(),
            },
        }
    }
}

impl MetricsSink for SummarySink {
    fn record_check(&self, event: &CheckEvent) {
        let mut state = self.state.lock();
        let tally = state.checks.entry(event.label.clone()).or_default();
        if event.passed {
            tally.passes += 1;
        } else {
            tally.fails += 1;
        }
    }

    fn record_request(&self, sample: &RequestSample) {
        let mut state = self.state.lock();
        let stats = state.steps.entry(sample.step).or_default();
        stats.latency.record(sample.latency);
        if sample.status.is_transport_error() {
            stats.transport_errors += 1;
        }
        *stats.statuses.entry(sample.status.to_string()).or_default() += 1;
    }

    fn record_iteration(&self, sample: &IterationSample) {
        self.state.lock().iterations.record(sample.elapsed);
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub checks_rate: f64,
    pub checks: Vec<CheckSummary>,
    pub requests: Vec<RequestSummary>,
    pub iterations: IterationSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckSummary {
    pub label: String,
    pub passes: u64,
    pub fails: u64,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSummary {
    pub step: String,
    pub count: u64,
    pub transport_errors: u64,
    pub latency: LatencySummary,
    /// Response count per status, transport failures as `transport:<kind>`.
    pub statuses: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationSummary {
    pub count: u64,
    pub duration: LatencySummary,
}

/// Milliseconds. Percentiles are nearest-rank over the retained samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LatencySummary {
    pub min: f64,
    pub avg: f64,
    pub med: f64,
    pub p90: f64,
    pub p95: f64,
    pub max: f64,
}

// Nearest-rank on an ascending slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

impl RunSummary {
    pub fn log(&self) {
        for check in &self.checks {
            info!(
                label = %check.label,
                passes = check.passes,
                fails = check.fails,
                rate = check.rate,
                "check summary"
            );
        }
        for req in &self.requests {
            info!(
                step = %req.step,
                count = req.count,
                transport_errors = req.transport_errors,
                avg_ms = req.latency.avg,
                p95_ms = req.latency.p95,
                statuses = ?req.statuses,
                "request summary"
            );
        }
        info!(
            iterations = self.iterations.count,
            iteration_avg_ms = self.iterations.duration.avg,
            checks_rate = self.checks_rate,
            "run summary"
        );
    }

    pub async fn write_json(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}
