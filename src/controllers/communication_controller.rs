// src/controllers/communication_controller.rs

use actix_web::{get, post, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::call::{CallKind, CallStatus};
use crate::models::message::MessageKind;
use crate::models::{parse_id, timestamp, PageQuery};
use crate::services::{auth_service, call_service};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateForm {
    pub receiver_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndForm {
    pub duration: Option<u64>,
    pub recording_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(rename = "type")]
    pub kind: Option<MessageKind>,
}

fn call_kind(segment: &str) -> AppResult<CallKind> {
    CallKind::from_segment(segment).ok_or_else(|| AppError::not_found("Unknown call type"))
}

/// POST /communication/{video-call|voice-call|screen-share}/initiate
#[post("/{kind}/initiate")]
pub async fn initiate_call(
    auth: AuthUser,
    path: web::Path<String>,
    form: web::Json<InitiateForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let kind = call_kind(&path.into_inner())?;
    let receiver = form
        .receiver_id
        .as_deref()
        .map(|id| parse_id(id, "receiver"))
        .transpose()?;
    let caller = auth_service::require_user(&data.users_collection, &auth.id).await?;

    let message = call_service::initiate(&data, &caller, receiver.as_deref(), kind).await?;
    let call = message.call_data.as_ref();
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("{} initiated", kind.label()),
        "data": {
            "messageId": message.id,
            "roomId": call.map(|c| c.room_id.as_str()),
            "callData": call,
        },
    })))
}

/// PUT /communication/{video-call|voice-call}/{messageId}/join
#[put("/{kind}/{message_id}/join")]
pub async fn join_call(
    auth: AuthUser,
    path: web::Path<(String, String)>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let (segment, message_id) = path.into_inner();
    let kind = call_kind(&segment)?;
    if kind == CallKind::ScreenShare {
        return Err(AppError::not_found("Unknown call type"));
    }
    let message_id = parse_id(&message_id, "call")?;

    let (message, mut call) =
        call_service::find_call(&data, &message_id, &[kind.message_kind()], &auth.id).await?;
    if matches!(call.status, CallStatus::Ended | CallStatus::Declined) {
        return Err(AppError::bad_request("This call has already finished"));
    }
    call.join(&auth.id, timestamp::now());
    call_service::save_call(&data, &message.id, &call).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Joined call successfully",
        "data": { "roomId": call.room_id, "callData": call },
    })))
}

/// PUT /communication/{video-call|voice-call|screen-share}/{messageId}/end
/// Screen shares end at once; calls end when the last participant leaves.
#[put("/{kind}/{message_id}/end")]
pub async fn end_call(
    auth: AuthUser,
    path: web::Path<(String, String)>,
    form: Option<web::Json<EndForm>>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let (segment, message_id) = path.into_inner();
    let kind = call_kind(&segment)?;
    let message_id = parse_id(&message_id, "call")?;
    let form = form.map(web::Json::into_inner).unwrap_or_default();

    let (message, mut call) =
        call_service::find_call(&data, &message_id, &[kind.message_kind()], &auth.id).await?;
    let now = timestamp::now();
    match kind {
        CallKind::ScreenShare => call.end(now, form.duration),
        _ => call.leave(&auth.id, now, form.duration, form.recording_url),
    }
    call_service::save_call(&data, &message.id, &call).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("{} ended", kind.label()),
        "data": { "callData": call },
    })))
}

/// PUT /communication/call/{messageId}/decline
#[put("/call/{message_id}/decline")]
pub async fn decline_call(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let message_id = parse_id(&path.into_inner(), "call")?;
    let kinds = [
        MessageKind::VideoCall,
        MessageKind::VoiceCall,
        MessageKind::ScreenShare,
    ];
    let (message, mut call) = call_service::find_call(&data, &message_id, &kinds, &auth.id).await?;
    if call.status != CallStatus::Initiated {
        return Err(AppError::bad_request("Only ringing calls can be declined"));
    }
    call.decline(timestamp::now());
    call_service::save_call(&data, &message.id, &call).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Call declined",
        "data": { "callData": call },
    })))
}

/// GET /communication/call-history?type&page&limit
#[get("/call-history")]
pub async fn call_history(
    auth: AuthUser,
    filter: web::Query<HistoryQuery>,
    page: web::Query<PageQuery>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let (calls, pagination) =
        call_service::history(&data, &auth.id, filter.kind, page.resolve(20)).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "calls": calls, "pagination": pagination },
    })))
}
