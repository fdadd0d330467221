// src/controllers/message_controller.rs

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{get, post, put, web, HttpResponse};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::conversation::key_includes;
use crate::models::message::{SendMessageRequest, MAX_ATTACHMENT_BYTES};
use crate::models::{parse_id, timestamp};
use crate::services::{auth_service, message_service, upload_service};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusForm {
    pub is_online: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingForm {
    pub receiver_id: String,
    pub is_typing: bool,
}

/// GET /messages/conversations
#[get("/conversations")]
pub async fn get_conversations(
    auth: AuthUser,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let conversations = message_service::conversations_for(&data, &auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "conversations": conversations },
    })))
}

/// GET /messages/conversation/{userId}
/// Oldest first. Reading marks the thread read for the caller.
#[get("/conversation/{user_id}")]
pub async fn get_messages(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let other = parse_id(&path.into_inner(), "user")?;
    let messages = message_service::messages_between(&data, &auth.id, &other).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "messages": messages },
    })))
}

/// POST /messages/send
#[post("/send")]
pub async fn send_message(
    auth: AuthUser,
    body: web::Json<SendMessageRequest>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let mut request = body.into_inner();
    request.receiver_id = parse_id(&request.receiver_id, "receiver")?;
    let sender = auth_service::require_user(&data.users_collection, &auth.id).await?;

    let message = message_service::send_message(&data, &sender, request).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Message sent successfully",
        "data": { "message": message },
    })))
}

/// PUT /messages/read/{conversationId}
#[put("/read/{conversation_id}")]
pub async fn mark_as_read(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let conversation = path.into_inner();
    if !key_includes(&conversation, &auth.id) {
        return Err(AppError::forbidden("Not a participant of this conversation"));
    }
    let updated =
        message_service::mark_conversation_read(&data, &conversation, &auth.id, timestamp::now())
            .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Messages marked as read",
        "data": { "updated": updated },
    })))
}

/// GET /messages/unread
#[get("/unread")]
pub async fn get_unread_count(
    auth: AuthUser,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let count = message_service::unread_count(&data, &auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "count": count },
    })))
}

/// POST /messages/upload
/// Multipart with a single `file` field, at most 10MB.
#[post("/upload")]
pub async fn upload_attachment(
    _auth: AuthUser,
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::bad_request(format!("Multipart error: {e}")))?;
        if field.name() != Some("file") {
            // Drain fields we do not care about.
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| AppError::bad_request(format!("Multipart error: {e}")))?;
            }
            continue;
        }

        let original_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or("attachment")
            .to_string();
        let mimetype = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::bad_request(format!("File read error: {e}")))?;
            if (bytes.len() + chunk.len()) as u64 > MAX_ATTACHMENT_BYTES {
                return Err(AppError::bad_request("File too large. Maximum size is 10MB"));
            }
            bytes.extend_from_slice(&chunk);
        }
        upload = Some((original_name, mimetype, bytes));
    }

    let (original_name, mimetype, bytes) =
        upload.ok_or_else(|| AppError::bad_request("No file uploaded"))?;
    let attachment = upload_service::store_attachment(
        &data.config.upload_dir,
        &original_name,
        &mimetype,
        &bytes,
        timestamp::now(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "File uploaded successfully",
        "data": { "attachment": attachment },
    })))
}

/// PUT /messages/status
/// Presence heartbeat.
#[put("/status")]
pub async fn update_status(
    auth: AuthUser,
    form: web::Json<StatusForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    data.presence.set_online(&auth.id, form.is_online);
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// PUT /messages/typing
#[put("/typing")]
pub async fn update_typing(
    auth: AuthUser,
    form: web::Json<TypingForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let receiver = parse_id(&form.receiver_id, "receiver")?;
    data.presence.set_typing(&auth.id, &receiver, form.is_typing);
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// GET /messages/status/{userId}
#[get("/status/{user_id}")]
pub async fn get_status(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let user_id = parse_id(&path.into_inner(), "user")?;
    let status = data.presence.status(&user_id, &auth.id);
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": status })))
}

fn content_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or_default();
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// GET /uploads/messages/{filename}
#[get("/uploads/messages/{filename}")]
pub async fn serve_upload(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let filename = path.into_inner();
    if !upload_service::is_servable_name(&filename) {
        return Err(AppError::not_found("File not found"));
    }
    let full = std::path::Path::new(&data.config.upload_dir)
        .join("messages")
        .join(&filename);
    let bytes = tokio::fs::read(&full)
        .await
        .map_err(|_| AppError::not_found("File not found"))?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type_for(&filename)))
        .body(bytes))
}
