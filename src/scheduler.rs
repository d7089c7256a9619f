//! Virtual user scheduling.
//!
//! Each virtual user is its own task looping the scenario until the shared
//! deadline passes. The deadline is only consulted between iterations, so an
//! iteration that has started always runs all of its steps.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info};

use crate::config::TestConfiguration;
use crate::error::ConfigError;
use crate::scenario::Scenario;
use crate::sink::IterationSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VuState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VuReport {
    pub vu: usize,
    pub iterations: u64,
    pub state: VuState,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub vus: Vec<VuReport>,
}

impl RunReport {
    pub fn total_iterations(&self) -> u64 {
        self.vus.iter().map(|v| v.iterations).sum()
    }
}

pub struct Scheduler {
    config: TestConfiguration,
    scenario: Arc<Scenario>,
}

impl Scheduler {
    /// Rejects invalid configuration before anything is spawned.
    pub fn new(config: TestConfiguration, scenario: Arc<Scenario>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, scenario })
    }

    /// Runs every virtual user to completion and reports what each one did.
    pub async fn run(&self) -> RunReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let deadline = start + self.config.duration;

        info!(
            vus = self.config.virtual_user_count,
            duration_secs = self.config.duration.as_secs_f64(),
            pause_secs = self.config.inter_iteration_pause.as_secs_f64(),
            base_url = %self.config.base_url,
            "starting load run"
        );

        let mut tasks = JoinSet::new();
        for vu in 0..self.config.virtual_user_count {
            let scenario = Arc::clone(&self.scenario);
            let pause = self.config.inter_iteration_pause;
            tasks.spawn(run_virtual_user(vu, scenario, deadline, pause));
        }

        let mut vus = Vec::with_capacity(self.config.virtual_user_count);
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(report) => vus.push(report),
                Err(e) => error!(error = %e, "virtual user task failed"),
            }
        }
        vus.sort_by_key(|r| r.vu);

        let report = RunReport {
            started_at,
            elapsed: start.elapsed(),
            vus,
        };
        info!(
            iterations = report.total_iterations(),
            elapsed_secs = report.elapsed.as_secs_f64(),
            "load run finished"
        );
        report
    }
}

async fn run_virtual_user(
    vu: usize,
    scenario: Arc<Scenario>,
    deadline: Instant,
    pause: Duration,
) -> VuReport {
    let mut state = VuState::Running;
    let mut iterations = 0u64;
    debug!(vu, ?state, "virtual user started");

    while state == VuState::Running {
        let started_at = Instant::now();
        if started_at >= deadline {
            state = VuState::Stopped;
            continue;
        }

        scenario.run_iteration().await;
        scenario.sink().record_iteration(&IterationSample {
            vu,
            iteration: iterations,
            started_at,
            elapsed: started_at.elapsed(),
        });
        iterations += 1;

        // A pause that would outlast the deadline is cut short.
        sleep_until((Instant::now() + pause).min(deadline)).await;
    }

    debug!(vu, iterations, ?state, "virtual user stopped");
    VuReport {
        vu,
        iterations,
        state,
    }
}
