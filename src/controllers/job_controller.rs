// src/controllers/job_controller.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use mongodb::bson::doc;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::job::{JobUpdate, NewJob};
use crate::models::user::{Role, VerificationStatus};
use crate::models::{parse_id, timestamp, PageQuery};
use crate::services::job_service::{self, JobFilters};
use crate::services::{auth_service, proposal_service};
use crate::state::AppState;

/// POST /jobs
/// Clients must be verified before they can post.
#[post("")]
pub async fn create_job(
    auth: AuthUser,
    body: web::Json<NewJob>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth.require_role(Role::Client)?;
    let user = auth_service::require_user(&data.users_collection, &auth.id).await?;
    if user.verification.status != VerificationStatus::Verified {
        return Err(AppError::forbidden(
            "Please complete profile verification before posting jobs",
        ));
    }

    let input = body.into_inner();
    input.validate()?;
    let job = input.into_job(&user.id, timestamp::now());
    data.jobs_collection.insert_one(&job, None).await?;
    log::info!("job {} posted by {}", job.id, user.id);

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Job posted successfully",
        "data": { "job": job },
    })))
}

/// GET /jobs?category&status&city&search&page&limit
#[get("")]
pub async fn list_jobs(
    auth: AuthUser,
    filters: web::Query<JobFilters>,
    page: web::Query<PageQuery>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let filter = job_service::list_filter(&filters, auth.role);
    let (jobs, pagination) = job_service::list(&data, filter, page.resolve(10)).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "jobs": jobs, "pagination": pagination },
    })))
}

/// GET /jobs/my-jobs
/// Clients get the jobs they posted, providers the jobs assigned to them.
#[get("/my-jobs")]
pub async fn my_jobs(
    auth: AuthUser,
    page: web::Query<PageQuery>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let filter = match auth.role {
        Role::Provider => doc! { "assignedProvider": auth.id.as_str(), "isActive": true },
        _ => doc! { "client": auth.id.as_str(), "isActive": true },
    };
    let (jobs, pagination) = job_service::list(&data, filter, page.resolve(10)).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "jobs": jobs, "pagination": pagination },
    })))
}

/// GET /jobs/{id}
/// The owner also gets the proposals received.
#[get("/{id}")]
pub async fn get_job(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "job")?;
    let job = job_service::find_active(&data, &id).await?;
    let proposals = if job.client == auth.id {
        Some(proposal_service::list(&data, doc! { "job": job.id.as_str() }).await?)
    } else {
        None
    };
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "job": job, "proposals": proposals },
    })))
}

/// PUT /jobs/{id}
#[put("/{id}")]
pub async fn update_job(
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<JobUpdate>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "job")?;
    let update = body.into_inner();
    update.validate()?;
    job_service::find_owned(&data, &id, &auth.id).await?;

    let set = job_service::update_document(&update)?;
    let job = job_service::apply_update(&data, &id, set).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Job updated successfully",
        "data": { "job": job },
    })))
}

/// DELETE /jobs/{id}
/// Soft delete; the job disappears from every listing.
#[delete("/{id}")]
pub async fn delete_job(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "job")?;
    job_service::find_owned(&data, &id, &auth.id).await?;
    job_service::soft_delete(&data, &id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Job deleted successfully",
    })))
}
