//! The four-step review workflow replayed by every virtual user.
//!
//! Steps run strictly in order and each one always runs, whatever happened
//! to the previous step. A failed step is a failed check, nothing more.

use reqwest::Method;
use std::sync::Arc;
use strum::{Display, EnumIter, IntoStaticStr};

use crate::check::{check, Acceptance, CheckEvent};
use crate::domain::{MergeRequest, PullRequestRecord, ReassignRequest, StepPayload, TeamRecord};
use crate::executor::StepExecutor;
use crate::ids::IdGenerator;
use crate::sink::{MetricsSink, RequestSample};

/// An author and an initial reviewer are both required.
pub const MIN_TEAM_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum StepKind {
    CreateTeam,
    CreatePullRequest,
    Reassign,
    Merge,
}

#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub kind: StepKind,
    pub label: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub acceptance: Acceptance,
}

/// Reassignment races with other virtual users by design: 400, 409 and 500
/// are expected under load and count as passes.
pub static WORKFLOW: [StepDefinition; 4] = [
    StepDefinition {
        kind: StepKind::CreateTeam,
        label: "team created",
        method: Method::POST,
        path: "/team/add",
        acceptance: Acceptance::AnyOf(&[201]),
    },
    StepDefinition {
        kind: StepKind::CreatePullRequest,
        label: "pr created",
        method: Method::POST,
        path: "/pullRequest/create",
        acceptance: Acceptance::AnyOf(&[201]),
    },
    StepDefinition {
        kind: StepKind::Reassign,
        label: "reassign ok",
        method: Method::POST,
        path: "/pullRequest/reassign",
        acceptance: Acceptance::AnyOf(&[200, 400, 409, 500]),
    },
    StepDefinition {
        kind: StepKind::Merge,
        label: "merge ok",
        method: Method::POST,
        path: "/pullRequest/merge",
        acceptance: Acceptance::AnyOf(&[200]),
    },
];

/// Every entity one iteration touches, generated up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationPlan {
    pub team: TeamRecord,
    pub pull_request: PullRequestRecord,
    pub reassign: ReassignRequest,
    pub merge: MergeRequest,
}

impl IterationPlan {
    pub fn generate(ids: &dyn IdGenerator, team_size: usize, pull_request_name: &str) -> Self {
        let team = TeamRecord::generate(ids, team_size.max(MIN_TEAM_SIZE));
        let author_id = team.members[0].user_id.clone();
        let reviewer_id = team.members[1].user_id.clone();

        let pull_request = PullRequestRecord::generate(ids, pull_request_name, &author_id);
        let reassign = ReassignRequest {
            pull_request_id: pull_request.pull_request_id.clone(),
            old_reviewer_id: reviewer_id,
        };
        let merge = MergeRequest {
            pull_request_id: pull_request.pull_request_id.clone(),
        };

        Self {
            team,
            pull_request,
            reassign,
            merge,
        }
    }

    pub fn payload(&self, kind: StepKind) -> StepPayload {
        match kind {
            StepKind::CreateTeam => StepPayload::CreateTeam(self.team.clone()),
            StepKind::CreatePullRequest => {
                StepPayload::CreatePullRequest(self.pull_request.clone())
            }
            StepKind::Reassign => StepPayload::Reassign(self.reassign.clone()),
            StepKind::Merge => StepPayload::Merge(self.merge.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    pub team_size: usize,
    pub pull_request_name: String,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            team_size: 5,
            pull_request_name: "load_test_pr".to_string(),
        }
    }
}

pub struct Scenario {
    ids: Arc<dyn IdGenerator>,
    executor: Arc<dyn StepExecutor>,
    sink: Arc<dyn MetricsSink>,
    settings: ScenarioSettings,
}

impl Scenario {
    pub fn new(
        ids: Arc<dyn IdGenerator>,
        executor: Arc<dyn StepExecutor>,
        sink: Arc<dyn MetricsSink>,
        settings: ScenarioSettings,
    ) -> Self {
        Self {
            ids,
            executor,
            sink,
            settings,
        }
    }

    pub fn sink(&self) -> &Arc<dyn MetricsSink> {
        &self.sink
    }

    /// Runs one iteration and returns its check events, one per step.
    pub async fn run_iteration(&self) -> Vec<CheckEvent> {
        let plan = IterationPlan::generate(
            self.ids.as_ref(),
            self.settings.team_size,
            &self.settings.pull_request_name,
        );

        let mut events = Vec::with_capacity(WORKFLOW.len());
        for step in &WORKFLOW {
            let payload = plan.payload(step.kind);
            let outcome = self
                .executor
                .execute(step.method.clone(), step.path, &payload)
                .await;

            self.sink.record_request(&RequestSample {
                step: step.kind.into(),
                status: outcome.status,
                latency: outcome.latency,
            });
            events.push(check(
                step.label,
                &outcome,
                &step.acceptance,
                self.sink.as_ref(),
            ));
        }
        events
    }
}
