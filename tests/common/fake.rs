use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use connecto::client::{ClientError, MessagingApi, PendingFile};
use connecto::models::conversation::{conversation_key, ConversationView};
use connecto::models::message::{Attachment, Message, SendMessageRequest};
use connecto::models::presence::UserStatus;

pub const ME: &str = "65f0c2a9e4b0a1b2c3d4e5f1";
pub const PEER: &str = "65f0c2a9e4b0a1b2c3d4e5f2";

/// In-memory stand-in for the server, recording every call.
#[derive(Default)]
pub struct FakeApi {
    /// Uploads of files with this name fail.
    pub failing_upload: Option<String>,
    /// The first N fetches of any poller fail.
    pub failing_fetches: usize,
    pub uploads: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<SendMessageRequest>>,
    pub typing: Mutex<Vec<bool>>,
    pub fetches: AtomicUsize,
}

impl FakeApi {
    fn fetch(&self) -> Result<usize, ClientError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.failing_fetches {
            return Err(ClientError::Api {
                status: 500,
                message: "Server error".into(),
            });
        }
        Ok(n)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingApi for FakeApi {
    async fn conversations(&self) -> Result<Vec<ConversationView>, ClientError> {
        self.fetch()?;
        Ok(Vec::new())
    }

    async fn messages(&self, user_id: &str) -> Result<Vec<Message>, ClientError> {
        let n = self.fetch()?;
        // One more message per fetch so each snapshot is distinguishable.
        Ok((0..n)
            .map(|i| {
                Message::new(
                    conversation_key(ME, user_id),
                    user_id,
                    ME,
                    format!("message {i}"),
                    Default::default(),
                    Vec::new(),
                    Utc::now(),
                )
            })
            .collect())
    }

    async fn status(&self, user_id: &str) -> Result<UserStatus, ClientError> {
        self.fetch()?;
        Ok(UserStatus::offline(user_id))
    }

    async fn unread_count(&self) -> Result<u64, ClientError> {
        Ok(self.fetch()? as u64)
    }

    async fn set_typing(&self, _receiver_id: &str, is_typing: bool) -> Result<(), ClientError> {
        self.typing.lock().unwrap().push(is_typing);
        Ok(())
    }

    async fn upload(&self, file: &PendingFile) -> Result<Attachment, ClientError> {
        if self.failing_upload.as_deref() == Some(file.name.as_str()) {
            return Err(ClientError::Api {
                status: 500,
                message: "Upload failed".into(),
            });
        }
        self.uploads.lock().unwrap().push(file.name.clone());
        Ok(Attachment {
            filename: format!("1700000000000-abc-{}", file.name),
            original_name: file.name.clone(),
            mimetype: file.mimetype.clone(),
            size: file.size(),
            url: format!("/uploads/messages/1700000000000-abc-{}", file.name),
            uploaded_at: Utc::now(),
        })
    }

    async fn send(&self, request: &SendMessageRequest) -> Result<Message, ClientError> {
        self.sent.lock().unwrap().push(request.clone());
        Ok(Message::new(
            conversation_key(ME, &request.receiver_id),
            ME,
            &request.receiver_id,
            request.content.clone(),
            request.kind,
            request.attachments.clone(),
            Utc::now(),
        ))
    }
}
