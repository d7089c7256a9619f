use anyhow::Result;
use pr_review_loadgen::{config, executor, ids, scenario, scheduler, sink, telemetry};
use config::Config;
use executor::HttpStepExecutor;
use scenario::Scenario;
use scheduler::Scheduler;
use sink::{FanoutSink, MetricsSink, SummarySink, TracingSink};
use std::sync::Arc;
use telemetry::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;
    let test_cfg = cfg.test_configuration()?;

    let executor = HttpStepExecutor::new(
        test_cfg.base_url.clone(),
        cfg.http_timeout(),
        &cfg.http.user_agent,
    )?;

    let summary = Arc::new(SummarySink::default());
    let sinks: Vec<Arc<dyn MetricsSink>> = vec![summary.clone(), Arc::new(TracingSink)];
    #[cfg_attr(not(feature = "metrics"), allow(unused_mut))]
    let mut fanout = FanoutSink::new(sinks);

    #[cfg(feature = "metrics")]
    if let Some(listen) = &cfg.metrics.listen {
        let addr: std::net::SocketAddr = listen.parse()?;
        fanout.push(Arc::new(sink::PrometheusSink::install(addr)?));
        info!(%addr, "prometheus exporter listening");
    }
    #[cfg(not(feature = "metrics"))]
    if cfg.metrics.listen.is_some() {
        tracing::warn!("metrics.listen is set but the binary was built without the `metrics` feature");
    }

    let sink: Arc<dyn MetricsSink> = Arc::new(fanout);
    let scenario = Arc::new(Scenario::new(
        Arc::new(ids::UuidGenerator),
        Arc::new(executor),
        sink,
        cfg.scenario_settings(),
    ));

    let scheduler = Scheduler::new(test_cfg, scenario)?;
    let report = scheduler.run().await;

    let summary = summary.snapshot();
    summary.log();
    if let Some(path) = &cfg.report.summary_path {
        summary.write_json(path).await?;
        info!(path = %path, "summary written");
    }

    info!(
        started_at = %report.started_at,
        iterations = report.total_iterations(),
        checks_rate = summary.checks_rate,
        "done"
    );
    Ok(())
}
