use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Provider,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Provider => "provider",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Unverified => "unverified",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDocuments {
    pub pan_card_url: String,
    pub aadhar_card_url: String,
}

/// Admin-reviewed identity check. Posting jobs requires `Verified`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    #[serde(default)]
    pub status: VerificationStatus,
    #[serde(default, with = "timestamp::option")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub documents: Option<VerificationDocuments>,
}

/// A marketplace account as stored in the `users` collection.
///
/// Note:
/// - `_id` is the hex representation of an ObjectId.
/// - `hashed_password` never leaves the server; respond with [`UserProfile`]
///   or [`UserSummary`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserModel {
    #[serde(rename = "_id", default = "new_id")]
    pub id: String,

    pub full_name: String,

    /// Always stored lowercased.
    pub email: String,

    pub hashed_password: String,

    pub role: Role,

    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,

    #[serde(default)]
    pub verification: Verification,

    /// Defaults to `false` if omitted.
    #[serde(default)]
    pub email_verified: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// What a user sees about themselves.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
    pub profile_picture: Option<String>,
    pub verification: Verification,
    pub email_verified: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl From<&UserModel> for UserProfile {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
            phone: user.phone.clone(),
            city: user.city.clone(),
            area: user.area.clone(),
            profile_picture: user.profile_picture.clone(),
            verification: user.verification.clone(),
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

/// What other users see when a user is embedded in a conversation or post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub city: Option<String>,
    pub profile_picture: Option<String>,
}

impl From<&UserModel> for UserSummary {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
            city: user.city.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_never_carries_the_password_hash() {
        let now = timestamp::now();
        let user = UserModel {
            id: new_id(),
            full_name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            hashed_password: "$2b$12$secret".into(),
            role: Role::Provider,
            phone: None,
            city: Some("Pune".into()),
            area: None,
            profile_picture: None,
            verification: Verification::default(),
            email_verified: false,
            verification_code: Some("ABC123".into()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&UserProfile::from(&user)).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("ABC123"));
        assert!(json.contains("\"fullName\":\"Asha Rao\""));
        assert!(json.contains("\"status\":\"unverified\""));
    }
}
