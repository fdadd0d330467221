// src/controllers/order_controller.rs

use actix_web::{get, put, web, HttpResponse};
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::order::{CancelForm, OrderFilter, OrderStatusForm};
use crate::models::user::Role;
use crate::models::{parse_id, PageQuery};
use crate::services::order_service;
use crate::state::AppState;

/// GET /orders/my-orders?status&page&limit
#[get("/my-orders")]
pub async fn my_orders(
    auth: AuthUser,
    filter: web::Query<OrderFilter>,
    page: web::Query<PageQuery>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let mut query = order_service::participant_filter(&auth.id, auth.role);
    if let Some(status) = filter.status()? {
        query.insert("status", status.as_str());
    }
    let (orders, pagination) = order_service::list(&data, query, page.resolve(20)).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "orders": orders, "pagination": pagination },
    })))
}

/// GET /orders/stats
#[get("/stats")]
pub async fn order_stats(auth: AuthUser, data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let filter = order_service::participant_filter(&auth.id, auth.role);
    let stats = order_service::stats(&data, filter).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": stats })))
}

/// GET /orders/{id}
/// Client and provider only.
#[get("/{id}")]
pub async fn get_order(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "order")?;
    let order = order_service::find_for_participant(&data, &id, &auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "order": order },
    })))
}

/// PUT /orders/{id}/status
/// Provider reports `in_progress` or `completed`.
#[put("/{id}/status")]
pub async fn update_order_status(
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<OrderStatusForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth.require_role(Role::Provider)?;
    let id = parse_id(&path.into_inner(), "order")?;
    let order = order_service::find(&data, &id).await?;
    let order = order_service::update_status(&data, &order, &auth.id, &body.status).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Order marked as {}", order.status.as_str()),
        "data": { "order": order },
    })))
}

/// PUT /orders/{id}/accept-delivery
#[put("/{id}/accept-delivery")]
pub async fn accept_delivery(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth.require_role(Role::Client)?;
    let id = parse_id(&path.into_inner(), "order")?;
    let order = order_service::find(&data, &id).await?;
    let order = order_service::accept_delivery(&data, &order, &auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Delivery accepted and payment released",
        "data": { "order": order },
    })))
}

/// PUT /orders/{id}/cancel
/// Body is optional: `{ "reason": "..." }`.
#[put("/{id}/cancel")]
pub async fn cancel_order(
    auth: AuthUser,
    path: web::Path<String>,
    body: Option<web::Json<CancelForm>>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "order")?;
    let reason = body.and_then(|b| b.into_inner().reason);
    let order = order_service::find(&data, &id).await?;
    let order = order_service::cancel(&data, &order, &auth.id, reason).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Order cancelled successfully",
        "data": { "order": order },
    })))
}
