mod common;

use connecto::client::{select_files, send_message, ClientError, PendingFile};
use connecto::models::message::{ATTACHMENT_PLACEHOLDER, MAX_ATTACHMENT_BYTES};

use common::fake::{FakeApi, PEER};

fn file(name: &str, size: usize) -> PendingFile {
    PendingFile {
        name: name.into(),
        mimetype: "image/png".into(),
        bytes: vec![1; size],
    }
}

#[tokio::test]
async fn text_message_is_sent_once() {
    let api = FakeApi::default();
    let message = send_message(&api, PEER, "  hello there ", &[]).await.unwrap();

    assert_eq!(message.content, "hello there");
    let sent = api.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].attachments.is_empty());
}

#[tokio::test]
async fn empty_message_is_rejected_before_any_request() {
    let api = FakeApi::default();
    let err = send_message(&api, PEER, "   ", &[]).await.unwrap_err();

    assert!(matches!(err, ClientError::Invalid(_)));
    assert!(api.sent.lock().unwrap().is_empty());
    assert!(api.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn files_only_get_the_placeholder_text() {
    let api = FakeApi::default();
    let files = [file("a.png", 10), file("b.png", 20)];
    let message = send_message(&api, PEER, "", &files).await.unwrap();

    assert_eq!(message.content, ATTACHMENT_PLACEHOLDER);
    assert_eq!(message.attachments.len(), 2);
    assert_eq!(api.uploads.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn a_failed_upload_aborts_the_send() {
    let api = FakeApi {
        failing_upload: Some("broken.png".into()),
        ..Default::default()
    };
    let files = [file("a.png", 10), file("broken.png", 10)];
    let result = send_message(&api, PEER, "see attached", &files).await;

    assert!(result.is_err());
    assert!(api.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_selection_falls_back_to_rejection() {
    let api = FakeApi::default();
    let selection = select_files(vec![file("huge.mov", MAX_ATTACHMENT_BYTES as usize + 1)]);
    assert!(selection.files.is_empty());
    assert_eq!(selection.warnings.len(), 1);

    // Nothing valid left and no text: the send is refused locally.
    let err = send_message(&api, PEER, "", &selection.files).await.unwrap_err();
    assert!(matches!(err, ClientError::Invalid(_)));
    assert!(api.uploads.lock().unwrap().is_empty());
}
