mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use connecto::client::sync::{self, CHAT_EVERY, UNREAD_EVERY};
use connecto::client::typing::{TypingNotifier, TYPING_IDLE};
use connecto::client::Notice;

use common::fake::{FakeApi, PEER};

/// Lets spawned tasks run up to their next await point.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn chat_snapshot_is_replaced_each_tick() {
    let api = Arc::new(FakeApi::default());
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut chat = sync::chat(api.clone(), PEER.to_string(), tx);

    assert_eq!(chat.changed().await.map(|m| m.len()), Some(1));
    tokio::time::advance(CHAT_EVERY).await;
    assert_eq!(chat.changed().await.map(|m| m.len()), Some(2));
    assert_eq!(chat.latest().map(|m| m.len()), Some(2));
}

#[tokio::test(start_paused = true)]
async fn failures_surface_a_notice_and_polling_continues() {
    let api = Arc::new(FakeApi {
        failing_fetches: 1,
        ..Default::default()
    });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut unread = sync::unread(api.clone(), tx);

    assert_eq!(
        rx.recv().await,
        Some(Notice::Error("Failed to load unread count".into()))
    );
    assert!(unread.latest().is_none());

    tokio::time::advance(UNREAD_EVERY).await;
    assert_eq!(unread.changed().await, Some(2));
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_polling() {
    let api = Arc::new(FakeApi::default());
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut conversations = sync::conversations(api.clone(), tx);
    conversations.changed().await;
    drop(conversations);
    settle().await;

    let before = api.fetch_count();
    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;
    assert_eq!(api.fetch_count(), before);
}

#[tokio::test(start_paused = true)]
async fn typing_is_debounced() {
    let api = Arc::new(FakeApi::default());
    let notifier = TypingNotifier::spawn(api.clone(), PEER.to_string(), TYPING_IDLE);

    notifier.keystroke();
    notifier.keystroke();
    settle().await;
    tokio::time::advance(Duration::from_millis(1500)).await;
    notifier.keystroke();
    settle().await;
    assert_eq!(*api.typing.lock().unwrap(), vec![true]);

    tokio::time::advance(TYPING_IDLE + Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(*api.typing.lock().unwrap(), vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn sending_clears_typing_at_once() {
    let api = Arc::new(FakeApi::default());
    let notifier = TypingNotifier::spawn(api.clone(), PEER.to_string(), TYPING_IDLE);

    notifier.keystroke();
    settle().await;
    notifier.message_sent();
    settle().await;
    assert_eq!(*api.typing.lock().unwrap(), vec![true, false]);
}
