mod common;

use std::collections::HashMap;

use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::fake::{ME, PEER};
use connecto::client::{ApiClient, ClientError, MessagingApi, PendingFile};
use connecto::models::conversation::{conversation_key, ConversationView};
use connecto::models::message::{Message, MessageKind, SendMessageRequest};
use connecto::models::timestamp;
use connecto::models::user::{Role, UserSummary};

const TOKEN: &str = "tok-123";

fn summary(id: &str, name: &str) -> UserSummary {
    UserSummary {
        id: id.into(),
        full_name: name.into(),
        email: format!("{}@example.com", name.to_lowercase()),
        role: Role::Client,
        city: Some("Pune".into()),
        profile_picture: None,
    }
}

fn message(content: &str) -> Message {
    Message::new(
        conversation_key(ME, PEER),
        ME,
        PEER,
        content.into(),
        MessageKind::Text,
        Vec::new(),
        timestamp::now(),
    )
}

fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
}

async fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&format!("{}/", server.uri()), TOKEN)
}

#[tokio::test]
async fn conversations_are_read_from_the_envelope() {
    let server = MockServer::start().await;
    let now = timestamp::now();
    let view = ConversationView {
        id: conversation_key(ME, PEER),
        participants: vec![summary(ME, "Asha"), summary(PEER, "Ravi")],
        last_message: Some(message("hi")),
        last_message_at: now,
        unread_count: HashMap::from([(ME.to_string(), 2)]),
        created_at: now,
        updated_at: now,
    };
    Mock::given(method("GET"))
        .and(path("/api/messages/conversations"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ok(json!({ "conversations": [view] })))
        .expect(1)
        .mount(&server)
        .await;

    let conversations = client(&server).await.conversations().await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].participants[1].full_name, "Ravi");
    assert_eq!(conversations[0].unread_count[ME], 2);
    assert_eq!(
        conversations[0].last_message.as_ref().map(|m| m.content.as_str()),
        Some("hi")
    );
}

#[tokio::test]
async fn status_data_is_the_user_status_itself() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/messages/status/{PEER}")))
        .respond_with(ok(json!({
            "userId": PEER,
            "isOnline": true,
            "isTyping": true,
            "lastSeen": "2024-05-20T12:00:00.000Z",
        })))
        .mount(&server)
        .await;

    let status = client(&server).await.status(PEER).await.unwrap();
    assert_eq!(status.user_id, PEER);
    assert!(status.is_online);
    assert!(status.is_typing);
    assert!(status.last_seen.is_some());
}

#[tokio::test]
async fn unread_count_and_thread_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages/unread"))
        .respond_with(ok(json!({ "count": 7 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/messages/conversation/{PEER}")))
        .respond_with(ok(json!({ "messages": [message("one"), message("two")] })))
        .mount(&server)
        .await;

    let api = client(&server).await;
    assert_eq!(api.unread_count().await.unwrap(), 7);
    let messages = api.messages(PEER).await.unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["one", "two"]);
}

#[tokio::test]
async fn error_statuses_carry_the_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages/unread"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "message": "Not a participant of this conversation",
        })))
        .mount(&server)
        .await;

    let err = client(&server).await.unread_count().await.unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Not a participant of this conversation");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_bodies_and_missing_data_are_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages/unread"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/messages/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let api = client(&server).await;
    assert!(matches!(
        api.unread_count().await,
        Err(ClientError::Api { status: 502, .. })
    ));
    match api.conversations().await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 200);
            assert!(message.contains("no data"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn uploads_use_the_file_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/messages/upload"))
        .and(body_string_contains(r#"name="file""#))
        .and(body_string_contains(r#"filename="plan.pdf""#))
        .and(body_string_contains("%PDF-1.4"))
        .respond_with(ok(json!({ "attachment": {
            "filename": "1700000000000-a1b2c3.pdf",
            "originalName": "plan.pdf",
            "mimetype": "application/pdf",
            "size": 8,
            "url": "/uploads/messages/1700000000000-a1b2c3.pdf",
            "uploadedAt": "2024-05-20T12:00:00.000Z",
        } })))
        .expect(1)
        .mount(&server)
        .await;

    let file = PendingFile {
        name: "plan.pdf".into(),
        mimetype: "application/pdf".into(),
        bytes: b"%PDF-1.4".to_vec(),
    };
    let attachment = client(&server).await.upload(&file).await.unwrap();
    assert_eq!(attachment.original_name, "plan.pdf");
    assert_eq!(attachment.url, "/uploads/messages/1700000000000-a1b2c3.pdf");
}

#[tokio::test]
async fn send_posts_the_request_and_accepts_embedded_users() {
    let server = MockServer::start().await;
    let request = SendMessageRequest {
        receiver_id: PEER.into(),
        content: "See you at 5".into(),
        kind: MessageKind::Text,
        attachments: Vec::new(),
    };
    let stored = message("See you at 5").populated(summary(ME, "Asha"), summary(PEER, "Ravi"));
    Mock::given(method("POST"))
        .and(path("/api/messages/send"))
        .and(body_json(&request))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "message": "Message sent successfully",
            "data": { "message": stored },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sent = client(&server).await.send(&request).await.unwrap();
    assert_eq!(sent.sender, ME);
    assert_eq!(sent.receiver, PEER);
    assert_eq!(sent.content, "See you at 5");
}

#[tokio::test]
async fn typing_updates_are_put_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/messages/typing"))
        .and(body_json(json!({ "receiverId": PEER, "isTyping": true })))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server).await;
    api.set_typing(PEER, true).await.unwrap();
    // Unmatched bodies fall through to wiremock's 404.
    assert!(matches!(
        api.set_typing(PEER, false).await,
        Err(ClientError::Api { status: 404, .. })
    ));
}
