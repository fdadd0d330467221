// src/controllers/voice_controller.rs

use actix_web::{get, post, web, HttpResponse};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::services::voice_intent;
use crate::state::AppState;

/// POST /voice-intent
/// Body `{ "command": "..." }`. `command` is read loosely so that a missing
/// or non-string value gets the same 400 as a blank one.
#[post("/voice-intent")]
pub async fn process_voice_intent(
    _auth: AuthUser,
    body: web::Json<Value>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let command = body.get("command").and_then(Value::as_str);
    let intent = voice_intent::interpret(&data.http, &data.config, command).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": intent })))
}

/// GET /voice-intent/test
#[get("/voice-intent/test")]
pub async fn voice_intent_status(
    _auth: AuthUser,
    data: web::Data<AppState>,
) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Voice intent API is operational",
        "mistralConfigured": data.config.mistral_api_key.is_some(),
    }))
}
