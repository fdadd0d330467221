use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use super::message::Message;
use super::timestamp;
use super::user::UserSummary;

/// The key shared by a pair of users: both ids sorted and joined by `_`.
/// It is the conversation's `_id` and every message's `conversation` field,
/// so either participant derives the same thread.
pub fn conversation_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}_{b}")
    } else {
        format!("{b}_{a}")
    }
}

/// Whether `user_id` is one of the two ids a conversation key was built from.
pub fn key_includes(key: &str, user_id: &str) -> bool {
    key.split_once('_')
        .map_or(false, |(a, b)| a == user_id || b == user_id)
}

/// A two-participant message thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: String,
    pub participants: Vec<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(with = "timestamp")]
    pub last_message_at: DateTime<Utc>,
    #[serde(default)]
    pub unread_count: HashMap<String, i64>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Upsert applied to the conversation document when `sender` messages
/// `receiver`. Creates the thread on first contact; afterwards bumps the
/// receiver's unread counter atomically.
pub fn send_update(sender: &str, receiver: &str, message_id: &str, at: DateTime<Utc>) -> Document {
    let at = timestamp::format(&at);
    let mut participants = vec![sender.to_string(), receiver.to_string()];
    participants.sort();
    doc! {
        "$set": {
            "lastMessage": message_id,
            "lastMessageAt": at.as_str(),
            "updatedAt": at.as_str(),
        },
        "$inc": {
            format!("unreadCount.{receiver}"): 1_i64,
            format!("unreadCount.{sender}"): 0_i64,
        },
        "$setOnInsert": {
            "participants": participants,
            "createdAt": at.as_str(),
        },
    }
}

/// Resets the reader's unread counter and nobody else's.
pub fn read_update(reader: &str, at: DateTime<Utc>) -> Document {
    doc! {
        "$set": {
            format!("unreadCount.{reader}"): 0_i64,
            "updatedAt": timestamp::format(&at),
        }
    }
}

/// A conversation as returned to clients: participants populated, last
/// message embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: String,
    pub participants: Vec<UserSummary>,
    pub last_message: Option<Message>,
    #[serde(with = "timestamp")]
    pub last_message_at: DateTime<Utc>,
    pub unread_count: HashMap<String, i64>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "65f0c2a9e4b0a1b2c3d4e5f1";
    const BOB: &str = "65f0c2a9e4b0a1b2c3d4e5f2";

    #[test]
    fn key_is_order_independent() {
        assert_eq!(conversation_key(ALICE, BOB), conversation_key(BOB, ALICE));
        assert_eq!(conversation_key(BOB, ALICE), format!("{ALICE}_{BOB}"));
    }

    #[test]
    fn key_membership() {
        let key = conversation_key(ALICE, BOB);
        assert!(key_includes(&key, ALICE));
        assert!(key_includes(&key, BOB));
        assert!(!key_includes(&key, "65f0c2a9e4b0a1b2c3d4e5f3"));
        assert!(!key_includes(ALICE, ALICE));
    }

    #[test]
    fn sender_and_receiver_get_distinct_counters() {
        let update = send_update(BOB, ALICE, "m2", timestamp::now());
        let inc = update.get_document("$inc").unwrap();
        assert_eq!(inc.get_i64(&format!("unreadCount.{ALICE}")).unwrap(), 1);
        assert_eq!(inc.get_i64(&format!("unreadCount.{BOB}")).unwrap(), 0);
        let participants = update
            .get_document("$setOnInsert")
            .unwrap()
            .get_array("participants")
            .unwrap();
        assert_eq!(participants[0].as_str(), Some(ALICE));
        assert_eq!(participants[1].as_str(), Some(BOB));
    }

    #[test]
    fn read_update_touches_a_single_counter() {
        let update = read_update(BOB, timestamp::now());
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_i64(&format!("unreadCount.{BOB}")).unwrap(), 0);
        assert!(set.get(&format!("unreadCount.{ALICE}")).is_none());
    }

    #[test]
    fn send_update_increments_receiver_and_seeds_sender() {
        let update = send_update(ALICE, BOB, "m1", timestamp::now());
        let inc = update.get_document("$inc").unwrap();
        assert_eq!(inc.get_i64(&format!("unreadCount.{BOB}")).unwrap(), 1);
        assert_eq!(inc.get_i64(&format!("unreadCount.{ALICE}")).unwrap(), 0);
        let on_insert = update.get_document("$setOnInsert").unwrap();
        assert_eq!(on_insert.get_array("participants").unwrap().len(), 2);
        assert_eq!(
            update.get_document("$set").unwrap().get_str("lastMessage").unwrap(),
            "m1"
        );
    }
}
