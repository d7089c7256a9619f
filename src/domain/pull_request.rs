use serde::{Deserialize, Serialize};

use crate::ids::IdGenerator;

/// Body of `/pullRequest/create`. Lives for exactly one iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

impl PullRequestRecord {
    pub fn generate(ids: &dyn IdGenerator, name: &str, author_id: &str) -> Self {
        Self {
            pull_request_id: ids.generate_id("pr"),
            pull_request_name: name.to_string(),
            author_id: author_id.to_string(),
        }
    }
}

/// Body of `/pullRequest/reassign`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_reviewer_id: String,
}

/// Body of `/pullRequest/merge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    pub pull_request_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::MockIdGenerator;

    #[test]
    fn test_generate_uses_pr_prefix() {
        let mut ids = MockIdGenerator::new();
        ids.expect_generate_id()
            .withf(|prefix| prefix == "pr")
            .times(1)
            .returning(|p| format!("{p}_fixed"));

        let pr = PullRequestRecord::generate(&ids, "load_test_pr", "u_1");
        assert_eq!(pr.pull_request_id, "pr_fixed");
        assert_eq!(pr.pull_request_name, "load_test_pr");
        assert_eq!(pr.author_id, "u_1");
    }

    #[test]
    fn test_reassign_wire_format() {
        let body = serde_json::to_value(ReassignRequest {
            pull_request_id: "pr_1".into(),
            old_reviewer_id: "u_2".into(),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"pull_request_id": "pr_1", "old_reviewer_id": "u_2"})
        );
    }
}
