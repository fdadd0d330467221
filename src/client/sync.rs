//! Interval polling. Each poller is its own task that replaces the
//! snapshot with whatever the latest fetch returned.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::{ClientError, MessagingApi, Notice};
use crate::models::conversation::ConversationView;
use crate::models::message::Message;
use crate::models::presence::UserStatus;

pub const CONVERSATIONS_EVERY: Duration = Duration::from_secs(5);
pub const CHAT_EVERY: Duration = Duration::from_secs(3);
pub const PRESENCE_EVERY: Duration = Duration::from_secs(2);
pub const UNREAD_EVERY: Duration = Duration::from_secs(10);

/// Latest snapshot of one poller. Dropping the handle stops the poller.
pub struct PollHandle<T> {
    snapshot: watch::Receiver<Option<T>>,
    task: JoinHandle<()>,
}

impl<T: Clone> PollHandle<T> {
    /// `None` until the first successful fetch.
    pub fn latest(&self) -> Option<T> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.snapshot.clone()
    }

    /// Waits for the next replacement of the snapshot.
    pub async fn changed(&mut self) -> Option<T> {
        self.snapshot.changed().await.ok()?;
        self.snapshot.borrow_and_update().clone()
    }
}

impl<T> Drop for PollHandle<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Fetches immediately, then every `every`. A failed fetch keeps the old
/// snapshot, logs, and posts an error notice; the next tick tries again.
pub fn spawn_poller<T, F, Fut>(
    label: &'static str,
    every: Duration,
    notices: mpsc::UnboundedSender<Notice>,
    fetch: F,
) -> PollHandle<T>
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
{
    let (tx, rx) = watch::channel(None);
    let task = tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match fetch().await {
                Ok(value) => {
                    if tx.send(Some(value)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("failed to load {}: {}", label, e);
                    let _ = notices.send(Notice::Error(format!("Failed to load {label}")));
                }
            }
        }
    });
    PollHandle { snapshot: rx, task }
}

pub fn conversations<A>(
    api: Arc<A>,
    notices: mpsc::UnboundedSender<Notice>,
) -> PollHandle<Vec<ConversationView>>
where
    A: MessagingApi + ?Sized + 'static,
{
    spawn_poller("conversations", CONVERSATIONS_EVERY, notices, move || {
        let api = api.clone();
        async move { api.conversations().await }
    })
}

/// The open chat with `other_user`. Each fetch also marks it read server-side.
pub fn chat<A>(
    api: Arc<A>,
    other_user: String,
    notices: mpsc::UnboundedSender<Notice>,
) -> PollHandle<Vec<Message>>
where
    A: MessagingApi + ?Sized + 'static,
{
    spawn_poller("messages", CHAT_EVERY, notices, move || {
        let api = api.clone();
        let other_user = other_user.clone();
        async move { api.messages(&other_user).await }
    })
}

pub fn presence<A>(
    api: Arc<A>,
    other_user: String,
    notices: mpsc::UnboundedSender<Notice>,
) -> PollHandle<UserStatus>
where
    A: MessagingApi + ?Sized + 'static,
{
    spawn_poller("user status", PRESENCE_EVERY, notices, move || {
        let api = api.clone();
        let other_user = other_user.clone();
        async move { api.status(&other_user).await }
    })
}

pub fn unread<A>(api: Arc<A>, notices: mpsc::UnboundedSender<Notice>) -> PollHandle<u64>
where
    A: MessagingApi + ?Sized + 'static,
{
    spawn_poller("unread count", UNREAD_EVERY, notices, move || {
        let api = api.clone();
        async move { api.unread_count().await }
    })
}
