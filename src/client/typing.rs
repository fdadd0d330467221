use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::MessagingApi;

pub const TYPING_IDLE: Duration = Duration::from_secs(2);

#[derive(Debug)]
enum Input {
    Keystroke,
    Sent,
}

/// Debounces the typing indicator for one chat: `isTyping=true` on the first
/// keystroke of a burst, `false` after [`TYPING_IDLE`] without keystrokes
/// or as soon as a message is sent.
pub struct TypingNotifier {
    tx: mpsc::UnboundedSender<Input>,
    task: JoinHandle<()>,
}

impl TypingNotifier {
    pub fn spawn<A>(api: Arc<A>, receiver_id: String, idle: Duration) -> Self
    where
        A: MessagingApi + ?Sized + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let mut typing = false;
            loop {
                let input = if typing {
                    match timeout(idle, rx.recv()).await {
                        Ok(input) => input,
                        Err(_) => {
                            publish(&*api, &receiver_id, false).await;
                            typing = false;
                            continue;
                        }
                    }
                } else {
                    rx.recv().await
                };

                match input {
                    Some(Input::Keystroke) if !typing => {
                        publish(&*api, &receiver_id, true).await;
                        typing = true;
                    }
                    Some(Input::Keystroke) => {}
                    Some(Input::Sent) if typing => {
                        publish(&*api, &receiver_id, false).await;
                        typing = false;
                    }
                    Some(Input::Sent) => {}
                    None => {
                        if typing {
                            publish(&*api, &receiver_id, false).await;
                        }
                        break;
                    }
                }
            }
        });
        Self { tx, task }
    }

    pub fn keystroke(&self) {
        let _ = self.tx.send(Input::Keystroke);
    }

    pub fn message_sent(&self) {
        let _ = self.tx.send(Input::Sent);
    }
}

impl Drop for TypingNotifier {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn publish<A: MessagingApi + ?Sized>(api: &A, receiver_id: &str, typing: bool) {
    if let Err(e) = api.set_typing(receiver_id, typing).await {
        log::debug!("typing update failed: {}", e);
    }
}
