// src/controllers/notification_controller.rs

use actix_web::{get, put, web, HttpResponse};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{parse_id, PageQuery};
use crate::services::notification_service;
use crate::state::AppState;

/// GET /notifications?page&limit
#[get("")]
pub async fn list_notifications(
    auth: AuthUser,
    page: web::Query<PageQuery>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let page = page.resolve(20);
    let (notifications, total, unread) =
        notification_service::list(&data.notifications_collection, &auth.id, page).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "notifications": notifications,
            "unreadCount": unread,
            "pagination": page.pagination(total),
        },
    })))
}

/// PUT /notifications/read-all
#[put("/read-all")]
pub async fn mark_all_read(auth: AuthUser, data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let updated =
        notification_service::mark_all_read(&data.notifications_collection, &auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "All notifications marked as read",
        "data": { "updated": updated },
    })))
}

/// PUT /notifications/{id}/read
#[put("/{id}/read")]
pub async fn mark_read(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "notification")?;
    if !notification_service::mark_read(&data.notifications_collection, &auth.id, &id).await? {
        return Err(AppError::not_found("Notification not found"));
    }
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Notification marked as read",
    })))
}
