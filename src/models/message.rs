use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::call::CallData;
use super::user::UserSummary;
use super::{new_id, timestamp};

/// Per-file limit for message attachments, enforced on both ends.
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Content used when a message carries attachments but no text.
pub const ATTACHMENT_PLACEHOLDER: &str = "📎 Attachment";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    File,
    Image,
    VideoCall,
    VoiceCall,
    ScreenShare,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::File => "file",
            MessageKind::Image => "image",
            MessageKind::VideoCall => "video_call",
            MessageKind::VoiceCall => "voice_call",
            MessageKind::ScreenShare => "screen_share",
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(
            self,
            MessageKind::VideoCall | MessageKind::VoiceCall | MessageKind::ScreenShare
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: u64,
    pub url: String,
    #[serde(with = "timestamp")]
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id", default = "new_id")]
    pub id: String,
    /// Conversation key, see [`super::conversation::conversation_key`].
    pub conversation: String,
    pub sender: String,
    pub receiver: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, with = "timestamp::option")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_data: Option<CallData>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// A message as returned by the send endpoint, with both users resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(rename = "_id")]
    pub id: String,
    pub conversation: String,
    pub sender: UserSummary,
    pub receiver: UserSummary,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub attachments: Vec<Attachment>,
    pub is_read: bool,
    #[serde(default, with = "timestamp::option")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_data: Option<CallData>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl MessageView {
    /// Drops the embedded users back to their ids.
    pub fn into_message(self) -> Message {
        Message {
            id: self.id,
            conversation: self.conversation,
            sender: self.sender.id,
            receiver: self.receiver.id,
            content: self.content,
            kind: self.kind,
            attachments: self.attachments,
            is_read: self.is_read,
            read_at: self.read_at,
            call_data: self.call_data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Body of `POST /messages/send`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn new(
        conversation: String,
        sender: &str,
        receiver: &str,
        content: String,
        kind: MessageKind,
        attachments: Vec<Attachment>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(),
            conversation,
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            content,
            kind,
            attachments,
            is_read: false,
            read_at: None,
            call_data: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn populated(self, sender: UserSummary, receiver: UserSummary) -> MessageView {
        MessageView {
            id: self.id,
            conversation: self.conversation,
            sender,
            receiver,
            content: self.content,
            kind: self.kind,
            attachments: self.attachments,
            is_read: self.is_read,
            read_at: self.read_at,
            call_data: self.call_data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.sender == user_id || self.receiver == user_id
    }
}

/// Trims the text and substitutes the attachment placeholder when only files
/// are being sent. `None` means there is nothing to send.
pub fn resolve_content(text: &str, attachment_count: usize) -> Option<String> {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        Some(trimmed.to_string())
    } else if attachment_count > 0 {
        Some(ATTACHMENT_PLACEHOLDER.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_without_files_is_nothing_to_send() {
        assert_eq!(resolve_content("   ", 0), None);
    }

    #[test]
    fn files_alone_get_the_placeholder() {
        assert_eq!(resolve_content("", 2).as_deref(), Some(ATTACHMENT_PLACEHOLDER));
        assert_eq!(resolve_content("  hi ", 2).as_deref(), Some("hi"));
    }

    #[test]
    fn sent_messages_embed_both_users() {
        use crate::models::user::Role;

        let summary = |id: &str, name: &str| UserSummary {
            id: id.into(),
            full_name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            role: Role::Client,
            city: None,
            profile_picture: Some(format!("/avatars/{id}.png")),
        };
        let message = Message::new(
            "a_b".into(),
            "a",
            "b",
            "hello".into(),
            MessageKind::Text,
            Vec::new(),
            timestamp::now(),
        );
        let view = message.populated(summary("a", "Asha"), summary("b", "Ravi"));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["sender"]["fullName"], "Asha");
        assert_eq!(json["receiver"]["email"], "ravi@example.com");
        assert_eq!(json["receiver"]["profilePicture"], "/avatars/b.png");
        assert_eq!(json["type"], "text");

        let back: MessageView = serde_json::from_value(json).unwrap();
        let plain = back.into_message();
        assert_eq!((plain.sender.as_str(), plain.receiver.as_str()), ("a", "b"));
    }

    #[test]
    fn kind_uses_the_wire_names() {
        let json = serde_json::to_string(&MessageKind::ScreenShare).unwrap();
        assert_eq!(json, "\"screen_share\"");
        assert!(MessageKind::VoiceCall.is_call());
        assert!(!MessageKind::Image.is_call());
    }
}
