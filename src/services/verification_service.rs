use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::notification::Notification;
use crate::models::timestamp;
use crate::models::user::{UserModel, VerificationDocuments, VerificationStatus};
use crate::services::notification_service;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDocuments {
    pub pan_card_url: Option<String>,
    pub aadhar_card_url: Option<String>,
}

impl SubmitDocuments {
    pub fn validate(self) -> AppResult<VerificationDocuments> {
        let pick = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        match (pick(self.pan_card_url), pick(self.aadhar_card_url)) {
            (Some(pan_card_url), Some(aadhar_card_url)) => Ok(VerificationDocuments {
                pan_card_url,
                aadhar_card_url,
            }),
            _ => Err(AppError::bad_request(
                "Both PAN card and Aadhaar card documents are required",
            )),
        }
    }
}

fn after() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

pub async fn submit(
    state: &AppState,
    user: &UserModel,
    documents: SubmitDocuments,
) -> AppResult<UserModel> {
    if user.verification.status == VerificationStatus::Verified {
        return Err(AppError::bad_request("Your account is already verified"));
    }
    let documents = documents.validate()?;
    let now = timestamp::format(&timestamp::now());
    state
        .users_collection
        .find_one_and_update(
            doc! { "_id": user.id.as_str() },
            doc! {
                "$set": {
                    "verification.status": VerificationStatus::Pending.as_str(),
                    "verification.submittedAt": now.as_str(),
                    "verification.documents": {
                        "panCardUrl": documents.pan_card_url,
                        "aadharCardUrl": documents.aadhar_card_url,
                    },
                    "updatedAt": now.as_str(),
                },
                "$unset": { "verification.rejectionReason": "" },
            },
            after(),
        )
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn list_by_status(
    state: &AppState,
    status: VerificationStatus,
) -> AppResult<Vec<UserModel>> {
    let options = FindOptions::builder()
        .sort(doc! { "verification.submittedAt": 1 })
        .build();
    Ok(state
        .users_collection
        .find(doc! { "verification.status": status.as_str() }, options)
        .await?
        .try_collect()
        .await?)
}

/// Approves a pending request. Anything not pending is left untouched.
pub async fn approve(state: &AppState, user_id: &str) -> AppResult<UserModel> {
    let now = timestamp::format(&timestamp::now());
    let user = state
        .users_collection
        .find_one_and_update(
            doc! { "_id": user_id, "verification.status": "pending" },
            doc! { "$set": {
                "verification.status": VerificationStatus::Verified.as_str(),
                "verification.verifiedAt": now.as_str(),
                "updatedAt": now.as_str(),
            } },
            after(),
        )
        .await?
        .ok_or_else(|| AppError::bad_request("No pending verification for this user"))?;

    notification_service::notify(
        &state.notifications_collection,
        Notification::new(
            &user.id,
            "verification_approved",
            "✅ Your profile verification has been approved".into(),
            timestamp::now(),
        )
        .linking_to("/verification".into()),
    )
    .await;
    Ok(user)
}

pub async fn reject(state: &AppState, user_id: &str, reason: Option<String>) -> AppResult<UserModel> {
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "Documents could not be verified".to_string());
    let now = timestamp::format(&timestamp::now());
    let user = state
        .users_collection
        .find_one_and_update(
            doc! { "_id": user_id, "verification.status": "pending" },
            doc! { "$set": {
                "verification.status": VerificationStatus::Rejected.as_str(),
                "verification.rejectionReason": reason.as_str(),
                "updatedAt": now.as_str(),
            } },
            after(),
        )
        .await?
        .ok_or_else(|| AppError::bad_request("No pending verification for this user"))?;

    notification_service::notify(
        &state.notifications_collection,
        Notification::new(
            &user.id,
            "verification_rejected",
            format!("Your profile verification was rejected: {reason}"),
            timestamp::now(),
        )
        .linking_to("/verification".into()),
    )
    .await;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_documents_are_required() {
        let missing = SubmitDocuments {
            pan_card_url: Some("https://files/pan.jpg".into()),
            aadhar_card_url: Some("  ".into()),
        };
        assert!(missing.validate().is_err());

        let complete = SubmitDocuments {
            pan_card_url: Some("https://files/pan.jpg".into()),
            aadhar_card_url: Some("https://files/aadhar.jpg".into()),
        };
        assert_eq!(
            complete.validate().unwrap().aadhar_card_url,
            "https://files/aadhar.jpg"
        );
    }
}
