// src/controllers/verification_controller.rs

use actix_web::{get, post, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::user::{UserProfile, VerificationStatus};
use crate::models::parse_id;
use crate::services::verification_service::{self, SubmitDocuments};
use crate::services::auth_service;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<VerificationStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectForm {
    pub reason: Option<String>,
}

/// POST /verification/submit
#[post("/submit")]
pub async fn submit_verification(
    auth: AuthUser,
    body: web::Json<SubmitDocuments>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let user = auth_service::require_user(&data.users_collection, &auth.id).await?;
    let user = verification_service::submit(&data, &user, body.into_inner()).await?;
    log::info!("verification submitted by {}", user.id);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Verification documents submitted. An admin will review them shortly.",
        "data": { "verification": user.verification },
    })))
}

/// GET /verification/status
#[get("/status")]
pub async fn verification_status(
    auth: AuthUser,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let user = auth_service::require_user(&data.users_collection, &auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "verification": user.verification },
    })))
}

/// GET /admin/verifications?status
/// Defaults to the pending queue.
#[get("/verifications")]
pub async fn list_verifications(
    auth: AuthUser,
    query: web::Query<StatusQuery>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let status = query.status.unwrap_or(VerificationStatus::Pending);
    let users = verification_service::list_by_status(&data, status).await?;
    let users: Vec<UserProfile> = users.iter().map(UserProfile::from).collect();
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "users": users, "count": users.len() },
    })))
}

/// PUT /admin/verifications/{userId}/approve
#[put("/verifications/{user_id}/approve")]
pub async fn approve_verification(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let user_id = parse_id(&path.into_inner(), "user")?;
    let user = verification_service::approve(&data, &user_id).await?;
    log::info!("verification of {} approved by {}", user.id, auth.id);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Verification approved",
        "data": { "user": UserProfile::from(&user) },
    })))
}

/// PUT /admin/verifications/{userId}/reject
#[put("/verifications/{user_id}/reject")]
pub async fn reject_verification(
    auth: AuthUser,
    path: web::Path<String>,
    body: Option<web::Json<RejectForm>>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let user_id = parse_id(&path.into_inner(), "user")?;
    let reason = body.and_then(|b| b.into_inner().reason);
    let user = verification_service::reject(&data, &user_id, reason).await?;
    log::info!("verification of {} rejected by {}", user.id, auth.id);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Verification rejected",
        "data": { "user": UserProfile::from(&user) },
    })))
}
