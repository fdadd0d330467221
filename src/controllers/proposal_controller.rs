// src/controllers/proposal_controller.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use mongodb::bson::doc;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::proposal::{NewProposal, ProposalDecision, ProposalStatus, ProposalUpdate};
use crate::models::user::Role;
use crate::models::parse_id;
use crate::services::{auth_service, job_service, proposal_service};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<ProposalStatus>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionForm {
    pub status: ProposalDecision,
}

/// POST /proposals
#[post("")]
pub async fn submit_proposal(
    auth: AuthUser,
    body: web::Json<NewProposal>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth.require_role(Role::Provider)?;
    let provider = auth_service::require_user(&data.users_collection, &auth.id).await?;
    let proposal = proposal_service::submit(&data, &provider, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Proposal submitted successfully",
        "data": { "proposal": proposal },
    })))
}

/// GET /proposals/my-proposals?status
#[get("/my-proposals")]
pub async fn my_proposals(
    auth: AuthUser,
    query: web::Query<StatusFilter>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth.require_role(Role::Provider)?;
    let mut filter = doc! { "provider": auth.id.as_str() };
    if let Some(status) = query.status {
        filter.insert("status", status.as_str());
    }
    let proposals = proposal_service::list(&data, filter).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "proposals": proposals },
    })))
}

/// GET /proposals/job/{jobId}
/// Only the job owner may list its proposals.
#[get("/job/{job_id}")]
pub async fn job_proposals(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let job_id = parse_id(&path.into_inner(), "job")?;
    let job = job_service::find_active(&data, &job_id).await?;
    if job.client != auth.id {
        return Err(AppError::forbidden("Not authorized to view these proposals"));
    }
    let proposals = proposal_service::list(&data, doc! { "job": job.id.as_str() }).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "proposals": proposals },
    })))
}

/// GET /proposals/{id}
/// Visible to the provider who sent it and the owner of the job.
#[get("/{id}")]
pub async fn get_proposal(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "proposal")?;
    let proposal = proposal_service::find(&data, &id).await?;
    if proposal.provider != auth.id {
        let job = job_service::find_active(&data, &proposal.job).await?;
        if job.client != auth.id {
            return Err(AppError::forbidden("Not authorized to view this proposal"));
        }
    }
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "proposal": proposal },
    })))
}

/// PUT /proposals/{id}
#[put("/{id}")]
pub async fn update_proposal(
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<ProposalUpdate>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "proposal")?;
    proposal_service::find_pending_owned(&data, &id, &auth.id).await?;
    let proposal = proposal_service::update(&data, &id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Proposal updated successfully",
        "data": { "proposal": proposal },
    })))
}

/// DELETE /proposals/{id}
/// Withdraws the proposal; the record is kept.
#[delete("/{id}")]
pub async fn withdraw_proposal(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "proposal")?;
    let proposal = proposal_service::find_pending_owned(&data, &id, &auth.id).await?;
    let proposal = proposal_service::withdraw(&data, &proposal).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Proposal withdrawn successfully",
        "data": { "proposal": proposal },
    })))
}

/// PUT /proposals/{id}/status
#[put("/{id}/status")]
pub async fn decide_proposal(
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<DecisionForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth.require_role(Role::Client)?;
    let id = parse_id(&path.into_inner(), "proposal")?;
    let proposal = proposal_service::find(&data, &id).await?;
    let job = job_service::find_owned(&data, &proposal.job, &auth.id).await?;

    let decision = body.status;
    let proposal = proposal_service::decide(&data, &job, &proposal, decision).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Proposal {}", decision.status().as_str()),
        "data": { "proposal": proposal },
    })))
}
