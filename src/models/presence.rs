use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// Derived presence of one user as seen by another. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    pub user_id: String,
    pub is_online: bool,
    pub is_typing: bool,
    #[serde(default, with = "timestamp::option")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl UserStatus {
    pub fn offline(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            is_online: false,
            is_typing: false,
            last_seen: None,
        }
    }
}
