//! Stress Suite for the load generator itself
//!
//! These runs point many virtual users at a local stub and check that the
//! harness keeps its own guarantees under pressure:
//! - Every iteration emits exactly four checks
//! - Identifiers never collide across virtual users
//! - Virtual users make independent progress
//! - A slow or failing service never stops a virtual user

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use pr_review_loadgen::config::TestConfiguration;
use pr_review_loadgen::executor::HttpStepExecutor;
use pr_review_loadgen::ids::UuidGenerator;
use pr_review_loadgen::scenario::{Scenario, ScenarioSettings};
use pr_review_loadgen::scheduler::Scheduler;
use pr_review_loadgen::sink::{FanoutSink, MemorySink, MetricsSink, SummarySink};
use reqwest::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn stub(delay: Duration, reassign_status: u16) -> MockServer {
    let server = MockServer::start().await;
    for (route, status) in [
        ("/team/add", 201),
        ("/pullRequest/create", 201),
        ("/pullRequest/reassign", reassign_status),
        ("/pullRequest/merge", 200),
    ] {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_delay(delay))
            .mount(&server)
            .await;
    }
    server
}

fn build(
    server: &MockServer,
    vus: usize,
    duration: Duration,
    pause: Duration,
    timeout: Duration,
) -> (Scheduler, Arc<MemorySink>, Arc<SummarySink>) {
    let memory = Arc::new(MemorySink::default());
    let summary = Arc::new(SummarySink::default());
    let sinks: Vec<Arc<dyn MetricsSink>> = vec![memory.clone(), summary.clone()];

    let base_url = Url::parse(&server.uri()).unwrap();
    let executor =
        HttpStepExecutor::new(base_url.clone(), timeout, "pr-review-loadgen/stress").unwrap();
    let scenario = Arc::new(Scenario::new(
        Arc::new(UuidGenerator),
        Arc::new(executor),
        Arc::new(FanoutSink::new(sinks)),
        ScenarioSettings::default(),
    ));
    let config = TestConfiguration {
        virtual_user_count: vus,
        duration,
        base_url,
        inter_iteration_pause: pause,
    };
    (Scheduler::new(config, scenario).unwrap(), memory, summary)
}

/// Test: 100 virtual users for 3 seconds
///
/// Verifies check cardinality and identifier uniqueness across the full run.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore] // Ignore by default as this is a slow test
async fn test_many_virtual_users() {
    let server = stub(Duration::from_millis(5), 409).await;
    let (scheduler, memory, summary) = build(
        &server,
        100,
        Duration::from_secs(3),
        Duration::from_millis(50),
        Duration::from_secs(5),
    );

    let report = scheduler.run().await;

    assert_eq!(report.vus.len(), 100);
    assert!(report.vus.iter().all(|v| v.iterations > 0));
    assert_eq!(memory.checks().len() as u64, report.total_iterations() * 4);
    assert_eq!(summary.snapshot().checks_rate, 1.0);

    let mut ids = HashSet::new();
    for request in server.received_requests().await.unwrap() {
        if request.url.path() != "/team/add" {
            continue;
        }
        let team: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert!(ids.insert(team["team_name"].as_str().unwrap().to_string()));
        for member in team["members"].as_array().unwrap() {
            assert!(ids.insert(member["user_id"].as_str().unwrap().to_string()));
        }
    }
    assert_eq!(ids.len() as u64, report.total_iterations() * 6);
}

/// Test: Service slower than the client timeout
///
/// Every request times out, yet each virtual user keeps iterating until the
/// deadline and every check is recorded as failed.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Ignore by default as this is a slow test
async fn test_timeouts_do_not_stop_virtual_users() {
    let server = stub(Duration::from_millis(300), 200).await;
    let (scheduler, memory, summary) = build(
        &server,
        10,
        Duration::from_secs(2),
        Duration::from_millis(10),
        Duration::from_millis(50),
    );

    let report = scheduler.run().await;

    assert!(report.vus.iter().all(|v| v.iterations >= 2));
    assert!(memory.checks().iter().all(|c| !c.passed));
    let summary = summary.snapshot();
    assert!(summary
        .requests
        .iter()
        .all(|r| r.statuses.contains_key("transport:timeout")));
}

/// Test: Independent progress
///
/// Virtual users share nothing but the deadline, so their iteration counts
/// should be close to each other under a uniform service.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Ignore by default as this is a slow test
async fn test_virtual_users_progress_independently() {
    let server = stub(Duration::from_millis(10), 500).await;
    let (scheduler, _memory, _summary) = build(
        &server,
        20,
        Duration::from_secs(3),
        Duration::from_millis(100),
        Duration::from_secs(5),
    );

    let report = scheduler.run().await;

    let counts = report.vus.iter().map(|v| v.iterations).collect::<Vec<_>>();
    let min = *counts.iter().min().unwrap();
    let max = *counts.iter().max().unwrap();
    println!("iterations per vu - min: {min}, max: {max}");
    assert!(max - min <= 2, "uneven progress: {counts:?}");
}
