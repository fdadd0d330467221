use futures::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::FindOptions;

use crate::error::{AppError, AppResult};
use crate::models::call::{CallData, CallKind};
use crate::models::conversation::conversation_key;
use crate::models::message::{Message, MessageKind};
use crate::models::notification::Notification;
use crate::models::user::UserModel;
use crate::models::{timestamp, Page, Pagination};
use crate::services::{auth_service, notification_service};
use crate::state::AppState;

const CALL_KINDS: [&str; 3] = ["video_call", "voice_call", "screen_share"];

/// Stores a call message from `caller` to `receiver_id` and notifies the
/// receiver.
pub async fn initiate(
    state: &AppState,
    caller: &UserModel,
    receiver_id: Option<&str>,
    kind: CallKind,
) -> AppResult<Message> {
    let receiver_id = receiver_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("Receiver ID is required"))?;
    if receiver_id == caller.id {
        return Err(AppError::bad_request("You cannot call yourself"));
    }
    let receiver = auth_service::get_user_by_id(&state.users_collection, receiver_id)
        .await?
        .ok_or_else(|| AppError::not_found("Receiver not found"))?;

    let now = timestamp::now();
    let mut message = Message::new(
        conversation_key(&caller.id, &receiver.id),
        &caller.id,
        &receiver.id,
        kind.opening_line(&caller.full_name),
        kind.message_kind(),
        Vec::new(),
        now,
    );
    message.call_data = Some(CallData::initiate(kind, &caller.id, now));
    state.messages_collection.insert_one(&message, None).await?;
    log::info!("{} {} started by {}", kind.label(), message.id, caller.id);

    let (notification_kind, text) = kind.notification(&caller.full_name);
    notification_service::notify(
        &state.notifications_collection,
        Notification::new(&receiver.id, notification_kind, text, now).from_user(&caller.id),
    )
    .await;

    Ok(message)
}

/// Loads a call message of one of `kinds` that `user_id` takes part in.
pub async fn find_call(
    state: &AppState,
    message_id: &str,
    kinds: &[MessageKind],
    user_id: &str,
) -> AppResult<(Message, CallData)> {
    let message = state
        .messages_collection
        .find_one(doc! { "_id": message_id }, None)
        .await?
        .filter(|m| kinds.contains(&m.kind))
        .ok_or_else(|| AppError::not_found("Call not found"))?;

    if !message.involves(user_id) {
        return Err(AppError::forbidden("Not authorized to access this call"));
    }
    let call = message
        .call_data
        .clone()
        .ok_or_else(|| AppError::not_found("Call not found"))?;
    Ok((message, call))
}

pub async fn save_call(state: &AppState, message_id: &str, call: &CallData) -> AppResult<()> {
    let call_doc = bson::to_bson(call)?;
    state
        .messages_collection
        .update_one(
            doc! { "_id": message_id },
            doc! { "$set": {
                "callData": call_doc,
                "updatedAt": timestamp::format(&timestamp::now()),
            } },
            None,
        )
        .await?;
    Ok(())
}

/// The caller's calls, newest first. `kind` narrows to one call type.
pub async fn history(
    state: &AppState,
    user_id: &str,
    kind: Option<MessageKind>,
    page: Page,
) -> AppResult<(Vec<Message>, Pagination)> {
    let kind_filter = match kind {
        Some(kind) if kind.is_call() => bson::Bson::String(kind.as_str().to_string()),
        Some(_) => return Err(AppError::bad_request("Unknown call type")),
        None => bson::Bson::Document(doc! { "$in": CALL_KINDS.to_vec() }),
    };
    let filter: Document = doc! {
        "$or": [ { "sender": user_id }, { "receiver": user_id } ],
        "type": kind_filter,
    };

    let options = FindOptions::builder()
        .sort(doc! { "createdAt": -1 })
        .skip(page.skip())
        .limit(page.limit as i64)
        .build();
    let calls = state
        .messages_collection
        .find(filter.clone(), options)
        .await?
        .try_collect()
        .await?;
    let total = state.messages_collection.count_documents(filter, None).await?;
    Ok((calls, page.pagination(total)))
}
