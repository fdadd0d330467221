use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::outbox::PendingFile;
use super::ClientError;
use crate::models::conversation::ConversationView;
use crate::models::message::{Attachment, Message, MessageView, SendMessageRequest};
use crate::models::presence::UserStatus;

/// The calls the pollers and the send path need. Implemented over HTTP by
/// [`ApiClient`]; tests substitute in-memory fakes.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    async fn conversations(&self) -> Result<Vec<ConversationView>, ClientError>;
    async fn messages(&self, user_id: &str) -> Result<Vec<Message>, ClientError>;
    async fn status(&self, user_id: &str) -> Result<UserStatus, ClientError>;
    async fn unread_count(&self) -> Result<u64, ClientError>;
    async fn set_typing(&self, receiver_id: &str, is_typing: bool) -> Result<(), ClientError>;
    async fn upload(&self, file: &PendingFile) -> Result<Attachment, ClientError>;
    async fn send(&self, request: &SendMessageRequest) -> Result<Message, ClientError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct ConversationsData {
    conversations: Vec<ConversationView>,
}

#[derive(Deserialize)]
struct MessagesData {
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct MessageData {
    message: MessageView,
}

#[derive(Deserialize)]
struct AttachmentData {
    attachment: Attachment,
}

#[derive(Deserialize)]
struct CountData {
    count: u64,
}

/// HTTP implementation against a running server. `base_url` is the server
/// root, e.g. `http://localhost:5000`.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/messages{}", self.base_url, path)
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        let envelope: Envelope<T> = response.json().await.map_err(|e| ClientError::Api {
            status: status.as_u16(),
            message: format!("unexpected response body: {e}"),
        })?;

        if !status.is_success() || !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "Request failed".to_string()),
            });
        }
        envelope.data.ok_or_else(|| ClientError::Api {
            status: status.as_u16(),
            message: "response carried no data".to_string(),
        })
    }
}

#[async_trait]
impl MessagingApi for ApiClient {
    async fn conversations(&self) -> Result<Vec<ConversationView>, ClientError> {
        let data: ConversationsData = self.call(self.http.get(self.url("/conversations"))).await?;
        Ok(data.conversations)
    }

    async fn messages(&self, user_id: &str) -> Result<Vec<Message>, ClientError> {
        let url = self.url(&format!("/conversation/{user_id}"));
        let data: MessagesData = self.call(self.http.get(url)).await?;
        Ok(data.messages)
    }

    async fn status(&self, user_id: &str) -> Result<UserStatus, ClientError> {
        self.call(self.http.get(self.url(&format!("/status/{user_id}"))))
            .await
    }

    async fn unread_count(&self) -> Result<u64, ClientError> {
        let data: CountData = self.call(self.http.get(self.url("/unread"))).await?;
        Ok(data.count)
    }

    async fn set_typing(&self, receiver_id: &str, is_typing: bool) -> Result<(), ClientError> {
        let response = self
            .http
            .put(self.url("/typing"))
            .bearer_auth(&self.token)
            .json(&json!({ "receiverId": receiver_id, "isTyping": is_typing }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Api {
                status: response.status().as_u16(),
                message: "Could not update typing status".to_string(),
            });
        }
        Ok(())
    }

    async fn upload(&self, file: &PendingFile) -> Result<Attachment, ClientError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mimetype)?;
        let form = Form::new().part("file", part);
        let data: AttachmentData = self
            .call(self.http.post(self.url("/upload")).multipart(form))
            .await?;
        Ok(data.attachment)
    }

    async fn send(&self, request: &SendMessageRequest) -> Result<Message, ClientError> {
        let data: MessageData = self
            .call(self.http.post(self.url("/send")).json(request))
            .await?;
        Ok(data.message.into_message())
    }
}
