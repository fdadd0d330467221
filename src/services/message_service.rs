// src/services/message_service.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{FindOptions, UpdateOptions};

use crate::error::{AppError, AppResult};
use crate::models::conversation::{
    conversation_key, read_update, send_update, Conversation, ConversationView,
};
use crate::models::message::{resolve_content, Message, MessageView, SendMessageRequest};
use crate::models::timestamp;
use crate::models::user::{UserModel, UserSummary};
use crate::services::{auth_service, notification_service};
use crate::state::AppState;

async fn summaries(state: &AppState, ids: &[String]) -> AppResult<HashMap<String, UserSummary>> {
    let users: Vec<UserModel> = state
        .users_collection
        .find(doc! { "_id": { "$in": ids.to_vec() } }, None)
        .await?
        .try_collect()
        .await?;
    Ok(users
        .iter()
        .map(|u| (u.id.clone(), UserSummary::from(u)))
        .collect())
}

/// The caller's conversations, most recently active first, with participants
/// and last message resolved.
pub async fn conversations_for(state: &AppState, user_id: &str) -> AppResult<Vec<ConversationView>> {
    let options = FindOptions::builder()
        .sort(doc! { "lastMessageAt": -1 })
        .build();
    let conversations: Vec<Conversation> = state
        .conversations_collection
        .find(doc! { "participants": user_id }, options)
        .await?
        .try_collect()
        .await?;

    let mut user_ids: Vec<String> = conversations
        .iter()
        .flat_map(|c| c.participants.iter().cloned())
        .collect();
    user_ids.sort();
    user_ids.dedup();
    let users = summaries(state, &user_ids).await?;

    let message_ids: Vec<String> = conversations
        .iter()
        .filter_map(|c| c.last_message.clone())
        .collect();
    let mut last_messages: HashMap<String, Message> = state
        .messages_collection
        .find(doc! { "_id": { "$in": message_ids } }, None)
        .await?
        .try_collect::<Vec<Message>>()
        .await?
        .into_iter()
        .map(|m| (m.id.clone(), m))
        .collect();

    Ok(conversations
        .into_iter()
        .map(|c| ConversationView {
            participants: c
                .participants
                .iter()
                .filter_map(|p| users.get(p).cloned())
                .collect(),
            last_message: c.last_message.as_ref().and_then(|id| last_messages.remove(id)),
            id: c.id,
            last_message_at: c.last_message_at,
            unread_count: c.unread_count,
            created_at: c.created_at,
            updated_at: c.updated_at,
        })
        .collect())
}

/// Marks everything addressed to `reader` in the conversation as read and
/// zeroes the reader's unread counter. The other participant's counter is
/// left alone. Returns how many messages changed.
pub async fn mark_conversation_read(
    state: &AppState,
    conversation: &str,
    reader: &str,
    now: DateTime<Utc>,
) -> AppResult<u64> {
    let at = timestamp::format(&now);
    let result = state
        .messages_collection
        .update_many(
            doc! { "conversation": conversation, "receiver": reader, "isRead": false },
            doc! { "$set": { "isRead": true, "readAt": at.as_str(), "updatedAt": at.as_str() } },
            None,
        )
        .await?;

    state
        .conversations_collection
        .update_one(
            doc! { "_id": conversation, "participants": reader },
            read_update(reader, now),
            None,
        )
        .await?;

    Ok(result.modified_count)
}

/// Messages between the caller and `other`, oldest first. Reading the thread
/// marks it read for the caller.
pub async fn messages_between(
    state: &AppState,
    user_id: &str,
    other: &str,
) -> AppResult<Vec<Message>> {
    let key = conversation_key(user_id, other);
    let options = FindOptions::builder().sort(doc! { "createdAt": 1 }).build();
    let messages = state
        .messages_collection
        .find(doc! { "conversation": key.as_str() }, options)
        .await?
        .try_collect()
        .await?;

    mark_conversation_read(state, &key, user_id, timestamp::now()).await?;
    Ok(messages)
}

/// Creates one message and upserts its conversation. The receiver gets a
/// notification; failing to store it does not fail the send. The stored
/// message is returned with both users embedded.
pub async fn send_message(
    state: &AppState,
    sender: &UserModel,
    request: SendMessageRequest,
) -> AppResult<MessageView> {
    let receiver_id = request.receiver_id.trim();
    if receiver_id.is_empty() {
        return Err(AppError::bad_request("Receiver ID is required"));
    }
    if receiver_id == sender.id {
        return Err(AppError::bad_request("You cannot message yourself"));
    }
    if request.kind.is_call() {
        return Err(AppError::bad_request(
            "Calls are started through the communication endpoints",
        ));
    }
    let content = resolve_content(&request.content, request.attachments.len())
        .ok_or_else(|| AppError::bad_request("Message content or an attachment is required"))?;

    let receiver = auth_service::get_user_by_id(&state.users_collection, receiver_id)
        .await?
        .ok_or_else(|| AppError::not_found("Receiver not found"))?;

    let now = timestamp::now();
    let key = conversation_key(&sender.id, &receiver.id);
    let message = Message::new(
        key.clone(),
        &sender.id,
        &receiver.id,
        content,
        request.kind,
        request.attachments,
        now,
    );
    state.messages_collection.insert_one(&message, None).await?;

    state
        .conversations_collection
        .update_one(
            doc! { "_id": key.as_str() },
            send_update(&sender.id, &receiver.id, &message.id, now),
            UpdateOptions::builder().upsert(true).build(),
        )
        .await?;
    log::debug!("message {} stored in {}", message.id, key);

    notification_service::message_received(
        &state.notifications_collection,
        &receiver.id,
        &sender.id,
        &sender.full_name,
        &key,
    )
    .await;

    Ok(message.populated(UserSummary::from(sender), UserSummary::from(&receiver)))
}

pub async fn unread_count(state: &AppState, user_id: &str) -> AppResult<u64> {
    Ok(state
        .messages_collection
        .count_documents(doc! { "receiver": user_id, "isRead": false }, None)
        .await?)
}
