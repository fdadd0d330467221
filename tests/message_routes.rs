mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use connecto::models::conversation::conversation_key;
use connecto::models::message::MAX_ATTACHMENT_BYTES;
use connecto::routes;
use connecto::state::AppState;

const BOUNDARY: &str = "connecto-test-boundary";
const STRANGER_A: &str = "65f0c2a9e4b0a1b2c3d4e5a1";
const STRANGER_B: &str = "65f0c2a9e4b0a1b2c3d4e5b2";

async fn app_state() -> AppState {
    common::state(common::config("http://127.0.0.1:9/v1/chat/completions", None)).await
}

/// Runs one request against a fresh app over `state`. Clones share the
/// presence registry, so several calls see each other's effects.
async fn call(state: &AppState, req: test::TestRequest) -> (StatusCode, web::Bytes) {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::init),
    )
    .await;
    let resp = test::call_service(&app, req.to_request()).await;
    let status = resp.status();
    (status, test::read_body(resp).await)
}

fn json_body(bytes: &web::Bytes) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

fn authed(req: test::TestRequest) -> test::TestRequest {
    req.insert_header(("Authorization", common::bearer()))
}

fn multipart(field: &str, filename: &str, content: &[u8]) -> test::TestRequest {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    authed(test::TestRequest::post().uri("/api/messages/upload"))
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
}

#[actix_web::test]
async fn reading_someone_elses_conversation_is_forbidden() {
    let state = app_state().await;
    let key = conversation_key(STRANGER_A, STRANGER_B);
    let (status, body) = call(
        &state,
        authed(test::TestRequest::put().uri(&format!("/api/messages/read/{key}"))),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json_body(&body)["success"], false);
}

#[actix_web::test]
async fn malformed_user_ids_are_rejected() {
    let state = app_state().await;
    for uri in [
        "/api/messages/conversation/not-an-id",
        "/api/messages/status/unreadCount.x",
    ] {
        let (status, body) = call(&state, authed(test::TestRequest::get().uri(uri))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json_body(&body)["message"], "Invalid user id");
    }

    let (status, _) = call(
        &state,
        authed(test::TestRequest::put().uri("/api/messages/typing"))
            .set_json(json!({ "receiverId": "nope", "isTyping": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn heartbeat_shows_up_in_status() {
    let state = app_state().await;
    let status_uri = format!("/api/messages/status/{}", common::USER_ID);

    let (_, body) = call(&state, authed(test::TestRequest::get().uri(&status_uri))).await;
    assert_eq!(json_body(&body)["data"]["isOnline"], false);

    let (status, _) = call(
        &state,
        authed(test::TestRequest::put().uri("/api/messages/status"))
            .set_json(json!({ "isOnline": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&state, authed(test::TestRequest::get().uri(&status_uri))).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["data"]["userId"], common::USER_ID);
    assert_eq!(body["data"]["isOnline"], true);
    assert_eq!(body["data"]["isTyping"], false);
}

#[actix_web::test]
async fn oversized_uploads_are_refused() {
    let state = app_state().await;
    let content = vec![b'x'; MAX_ATTACHMENT_BYTES as usize + 1];
    let (status, body) = call(&state, multipart("file", "big.txt", &content)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["message"], "File too large. Maximum size is 10MB");
}

#[actix_web::test]
async fn uploads_without_a_file_field_are_refused() {
    let state = app_state().await;
    let (status, body) = call(&state, multipart("document", "note.txt", b"hello")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["message"], "No file uploaded");
}

#[actix_web::test]
async fn uploaded_files_are_served_back() {
    let state = app_state().await;
    let (status, body) = call(&state, multipart("file", "note.txt", b"hello there")).await;
    assert_eq!(status, StatusCode::OK);
    let attachment = json_body(&body)["data"]["attachment"].clone();
    assert_eq!(attachment["originalName"], "note.txt");
    assert_eq!(attachment["size"], 11);

    let url = attachment["url"].as_str().unwrap().to_string();
    let (status, body) = call(&state, test::TestRequest::get().uri(&url)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"hello there");
}

#[actix_web::test]
async fn hidden_files_in_the_upload_dir_are_not_served() {
    let state = app_state().await;
    let dir = std::path::Path::new(&state.config.upload_dir).join("messages");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(dir.join(".secret"), b"do not serve").await.unwrap();

    let (status, _) = call(&state, test::TestRequest::get().uri("/uploads/messages/.secret")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&state, test::TestRequest::get().uri("/uploads/messages/..")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn message_routes_require_a_token() {
    let state = app_state().await;
    let (status, body) = call(&state, test::TestRequest::get().uri("/api/messages/unread")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["success"], false);
}
