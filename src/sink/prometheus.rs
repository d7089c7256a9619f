use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use super::{IterationSample, MetricsSink, RequestSample};
use crate::check::CheckEvent;

/// Publishes through the `metrics` facade for scraping during a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl PrometheusSink {
    /// Installs the global recorder and starts the scrape endpoint.
    pub fn install(listen: SocketAddr) -> anyhow::Result<Self> {
        PrometheusBuilder::new()
            .with_http_listener(listen)
            .install()?;
        Ok(Self)
    }
}

impl MetricsSink for PrometheusSink {
    fn record_check(&self, event: &CheckEvent) {
        let result = if event.passed { "pass" } else { "fail" };
        counter!(
            "loadgen_checks_total",
            "label" => event.label.clone(),
            "result" => result
        )
        .increment(1);
    }

    fn record_request(&self, sample: &RequestSample) {
        histogram!(
            "loadgen_request_duration_seconds",
            "step" => sample.step,
            "status" => sample.status.to_string()
        )
        .record(sample.latency.as_secs_f64());
    }

    fn record_iteration(&self, sample: &IterationSample) {
        counter!("loadgen_iterations_total").increment(1);
        histogram!("loadgen_iteration_duration_seconds").record(sample.elapsed.as_secs_f64());
    }
}
