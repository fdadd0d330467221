use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use mongodb::Collection;

use crate::error::AppResult;
use crate::models::notification::Notification;
use crate::models::{timestamp, Page};

/// Stores a notification. Failures are logged and swallowed: a missed
/// notification never fails the action that triggered it.
pub async fn notify(collection: &Collection<Notification>, notification: Notification) {
    if let Err(e) = collection.insert_one(&notification, None).await {
        log::warn!(
            "could not store {} notification for {}: {}",
            notification.kind,
            notification.user,
            e
        );
    }
}

pub async fn message_received(
    collection: &Collection<Notification>,
    receiver: &str,
    sender: &str,
    sender_name: &str,
    conversation: &str,
) {
    let notification = Notification::new(
        receiver,
        "message_received",
        format!("💬 New message from {sender_name}"),
        timestamp::now(),
    )
    .from_user(sender)
    .linking_to(format!("/messages?conversation={conversation}"));
    notify(collection, notification).await;
}

pub async fn list(
    collection: &Collection<Notification>,
    user: &str,
    page: Page,
) -> AppResult<(Vec<Notification>, u64, u64)> {
    let options = FindOptions::builder()
        .sort(doc! { "createdAt": -1 })
        .skip(page.skip())
        .limit(page.limit as i64)
        .build();
    let notifications = collection
        .find(doc! { "user": user }, options)
        .await?
        .try_collect()
        .await?;
    let total = collection.count_documents(doc! { "user": user }, None).await?;
    let unread = collection
        .count_documents(doc! { "user": user, "isRead": false }, None)
        .await?;
    Ok((notifications, total, unread))
}

/// Returns false when the notification does not exist or is not the user's.
pub async fn mark_read(
    collection: &Collection<Notification>,
    user: &str,
    id: &str,
) -> AppResult<bool> {
    let result = collection
        .update_one(
            doc! { "_id": id, "user": user },
            doc! { "$set": { "isRead": true } },
            None,
        )
        .await?;
    Ok(result.matched_count > 0)
}

pub async fn mark_all_read(collection: &Collection<Notification>, user: &str) -> AppResult<u64> {
    let result = collection
        .update_many(
            doc! { "user": user, "isRead": false },
            doc! { "$set": { "isRead": true } },
            None,
        )
        .await?;
    Ok(result.modified_count)
}
