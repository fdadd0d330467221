//! Call lifecycle bookkeeping. Calls are stored as messages carrying a
//! [`CallData`]; no media or signalling happens server-side.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::message::MessageKind;
use super::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Video,
    Voice,
    ScreenShare,
}

impl CallKind {
    /// Parses the route segment used by the communication endpoints.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "video-call" => Some(CallKind::Video),
            "voice-call" => Some(CallKind::Voice),
            "screen-share" => Some(CallKind::ScreenShare),
            _ => None,
        }
    }

    pub fn message_kind(&self) -> MessageKind {
        match self {
            CallKind::Video => MessageKind::VideoCall,
            CallKind::Voice => MessageKind::VoiceCall,
            CallKind::ScreenShare => MessageKind::ScreenShare,
        }
    }

    fn room_prefix(&self) -> &'static str {
        match self {
            CallKind::Video => "video",
            CallKind::Voice => "voice",
            CallKind::ScreenShare => "screen",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CallKind::Video => "Video call",
            CallKind::Voice => "Voice call",
            CallKind::ScreenShare => "Screen share session",
        }
    }

    pub fn opening_line(&self, caller_name: &str) -> String {
        match self {
            CallKind::Video => format!("📹 Video call initiated by {caller_name}"),
            CallKind::Voice => format!("📞 Voice call initiated by {caller_name}"),
            CallKind::ScreenShare => format!("🖥️ Screen sharing session started by {caller_name}"),
        }
    }

    pub fn notification(&self, caller_name: &str) -> (&'static str, String) {
        match self {
            CallKind::Video => ("video_call_incoming", format!("📹 {caller_name} is calling you")),
            CallKind::Voice => ("voice_call_incoming", format!("📞 {caller_name} is calling you")),
            CallKind::ScreenShare => (
                "screen_share_request",
                format!("🖥️ {caller_name} wants to share their screen"),
            ),
        }
    }

    /// `<prefix>_<unix millis>_<16 hex chars>`
    pub fn new_room_id(&self, now: DateTime<Utc>) -> String {
        let mut bytes = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut bytes);
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        format!("{}_{}_{}", self.room_prefix(), now.timestamp_millis(), hex)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Initiated,
    Answered,
    Ended,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallParticipant {
    pub user_id: String,
    #[serde(with = "timestamp")]
    pub joined_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub left_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallData {
    pub status: CallStatus,
    pub room_id: String,
    #[serde(with = "timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub recording_url: Option<String>,
    #[serde(default)]
    pub participants: Vec<CallParticipant>,
}

impl CallData {
    pub fn initiate(kind: CallKind, caller: &str, now: DateTime<Utc>) -> Self {
        Self {
            status: CallStatus::Initiated,
            room_id: kind.new_room_id(now),
            started_at: now,
            ended_at: None,
            duration: None,
            recording_url: None,
            participants: vec![CallParticipant {
                user_id: caller.to_string(),
                joined_at: now,
                left_at: None,
            }],
        }
    }

    pub fn join(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.status = CallStatus::Answered;
        self.participants.push(CallParticipant {
            user_id: user_id.to_string(),
            joined_at: now,
            left_at: None,
        });
    }

    /// Stamps the leaver; the call ends once every participant has left.
    pub fn leave(
        &mut self,
        user_id: &str,
        now: DateTime<Utc>,
        duration: Option<u64>,
        recording_url: Option<String>,
    ) {
        if let Some(p) = self
            .participants
            .iter_mut()
            .find(|p| p.user_id == user_id && p.left_at.is_none())
        {
            p.left_at = Some(now);
        }

        if self.participants.iter().all(|p| p.left_at.is_some()) {
            self.status = CallStatus::Ended;
            self.ended_at = Some(now);
        }
        if duration.is_some() {
            self.duration = duration;
        }
        if recording_url.is_some() {
            self.recording_url = recording_url;
        }
    }

    pub fn end(&mut self, now: DateTime<Utc>, duration: Option<u64>) {
        self.status = CallStatus::Ended;
        self.ended_at = Some(now);
        if duration.is_some() {
            self.duration = duration;
        }
    }

    pub fn decline(&mut self, now: DateTime<Utc>) {
        self.status = CallStatus::Declined;
        self.ended_at = Some(now);
    }
}
