// src/controllers/health_controller.rs

use actix_web::{get, web, HttpResponse};
use serde_json::json;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/health
/// Reports 503 when the database does not answer a ping.
#[get("/health")]
pub async fn health(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    db::ping(&data.db).await.map_err(|e| AppError::ServiceUnavailable {
        message: "Database unavailable".into(),
        detail: e.to_string(),
    })?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "ConnectO API is running",
        "mistralConfigured": data.config.mistral_api_key.is_some(),
    })))
}
