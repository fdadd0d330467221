use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, timestamp};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", default = "new_id")]
    pub id: String,
    pub user: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub related_user: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user: &str, kind: &str, message: String, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            user: user.to_string(),
            kind: kind.to_string(),
            message,
            related_user: None,
            link: None,
            is_read: false,
            created_at: now,
        }
    }

    pub fn from_user(mut self, user: &str) -> Self {
        self.related_user = Some(user.to_string());
        self
    }

    pub fn linking_to(mut self, link: String) -> Self {
        self.link = Some(link);
        self
    }
}
