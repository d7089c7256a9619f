use serde::{Deserialize, Serialize};

use crate::ids::IdGenerator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl UserRecord {
    /// Active user with fresh identifiers. `index` only decorates the username.
    pub fn generate(ids: &dyn IdGenerator, index: usize) -> Self {
        Self {
            user_id: ids.generate_id("u"),
            username: ids.generate_id(&format!("user_{index}")),
            is_active: true,
        }
    }
}

/// A team as sent to `/team/add`. The service is the system of record; the
/// harness drops this value once the iteration ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    #[serde(rename = "team_name")]
    pub team_id: String,
    pub members: Vec<UserRecord>,
}

impl TeamRecord {
    pub fn generate(ids: &dyn IdGenerator, size: usize) -> Self {
        Self {
            team_id: ids.generate_id("team"),
            members: (0..size).map(|i| UserRecord::generate(ids, i)).collect(),
        }
    }
}
