pub mod pull_request;
pub mod team;

pub use pull_request::*;
pub use team::*;

use serde::Serialize;

/// Request body of one workflow step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StepPayload {
    CreateTeam(TeamRecord),
    CreatePullRequest(PullRequestRecord),
    Reassign(ReassignRequest),
    Merge(MergeRequest),
}
