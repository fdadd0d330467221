// src/services/order_service.rs

use futures::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};

use crate::error::{AppError, AppResult};
use crate::models::job::{Job, JobStatus};
use crate::models::notification::Notification;
use crate::models::order::{
    provider_transition, Order, OrderStats, OrderStatus, PaymentStatus, StatusGroup,
};
use crate::models::proposal::Proposal;
use crate::models::user::Role;
use crate::models::{timestamp, Page, Pagination};
use crate::services::{job_service, notification_service, wallet_service};
use crate::state::AppState;

fn after() -> Option<FindOneAndUpdateOptions> {
    Some(
        FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build(),
    )
}

/// Orders the caller takes part in. Admins see every order.
pub fn participant_filter(user_id: &str, role: Role) -> Document {
    match role {
        Role::Provider => doc! { "provider": user_id },
        Role::Client => doc! { "client": user_id },
        Role::Admin => doc! {},
    }
}

/// Opens the order for an accepted proposal.
pub async fn open_for_accepted(state: &AppState, job: &Job, proposal: &Proposal) -> AppResult<Order> {
    let order = Order::for_accepted(job, proposal, timestamp::now());
    state.orders_collection.insert_one(&order, None).await?;
    log::info!(
        "order {} opened for job {} at {}",
        order.id,
        job.id,
        order.amount
    );
    Ok(order)
}

pub async fn find(state: &AppState, id: &str) -> AppResult<Order> {
    state
        .orders_collection
        .find_one(doc! { "_id": id }, None)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))
}

/// Loads an order the caller is client or provider on.
pub async fn find_for_participant(state: &AppState, id: &str, user_id: &str) -> AppResult<Order> {
    let order = find(state, id).await?;
    if !order.involves(user_id) {
        return Err(AppError::forbidden("Not authorized to view this order"));
    }
    Ok(order)
}

pub async fn list(
    state: &AppState,
    filter: Document,
    page: Page,
) -> AppResult<(Vec<Order>, Pagination)> {
    let options = FindOptions::builder()
        .sort(doc! { "createdAt": -1 })
        .skip(page.skip())
        .limit(page.limit as i64)
        .build();
    let orders = state
        .orders_collection
        .find(filter.clone(), options)
        .await?
        .try_collect()
        .await?;
    let total = state.orders_collection.count_documents(filter, None).await?;
    Ok((orders, page.pagination(total)))
}

pub async fn stats(state: &AppState, filter: Document) -> AppResult<OrderStats> {
    let pipeline = vec![
        doc! { "$match": filter },
        doc! { "$group": {
            "_id": "$status",
            "count": { "$sum": 1 },
            "totalAmount": { "$sum": "$amount" },
        } },
    ];
    let rows: Vec<Document> = state
        .orders_collection
        .aggregate(pipeline, None)
        .await?
        .try_collect()
        .await?;
    let groups = rows
        .into_iter()
        .map(bson::from_document::<StatusGroup>)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(OrderStats::from_groups(&groups))
}

/// Provider progress report. The status guard on the update makes two
/// concurrent reports resolve to one winner.
pub async fn update_status(
    state: &AppState,
    order: &Order,
    provider_id: &str,
    requested: &str,
) -> AppResult<Order> {
    if order.provider != provider_id {
        return Err(AppError::forbidden("Not authorized to update this order"));
    }
    let next = provider_transition(order.status, requested)?;
    let now = timestamp::format(&timestamp::now());

    let mut set = doc! { "status": next.as_str(), "updatedAt": now.as_str() };
    match next {
        OrderStatus::InProgress if order.start_date.is_none() => {
            set.insert("startDate", now.as_str());
        }
        OrderStatus::Completed if order.completed_date.is_none() => {
            set.insert("completedDate", now.as_str());
        }
        _ => {}
    }

    let updated = state
        .orders_collection
        .find_one_and_update(
            doc! { "_id": order.id.as_str(), "status": order.status.as_str() },
            doc! { "$set": set },
            after(),
        )
        .await?
        .ok_or_else(|| AppError::Conflict("The order was changed by someone else".into()))?;

    if next == OrderStatus::Completed {
        state
            .jobs_collection
            .update_one(
                doc! { "_id": order.job.as_str() },
                doc! { "$set": {
                    "status": JobStatus::Completed.as_str(),
                    "updatedAt": now.as_str(),
                } },
                None,
            )
            .await?;
    }

    let message = match next {
        OrderStatus::Completed => "✅ Your order was marked as completed. Review and accept delivery",
        _ => "🔧 Work on your order has started",
    };
    notification_service::notify(
        &state.notifications_collection,
        Notification::new(&order.client, "order_update", message.to_string(), timestamp::now())
            .from_user(&order.provider)
            .linking_to(format!("/orders/{}", order.id)),
    )
    .await;

    Ok(updated)
}

/// Client sign-off on completed work. Charges the client, releases the
/// payment on the order and credits the provider. The charge happens first;
/// if the order was released concurrently the charge is refunded.
pub async fn accept_delivery(state: &AppState, order: &Order, client_id: &str) -> AppResult<Order> {
    if order.client != client_id {
        return Err(AppError::forbidden(
            "Not authorized to accept delivery for this order",
        ));
    }
    if order.status != OrderStatus::Completed {
        return Err(AppError::bad_request("Order is not marked as completed yet"));
    }
    if order.payment.status == PaymentStatus::Released {
        return Err(AppError::bad_request("Payment has already been released"));
    }

    let title = job_service::find_active(state, &order.job)
        .await
        .map(|job| job.title)
        .unwrap_or_else(|_| "your job".to_string());
    wallet_service::charge_for_job(state, &order.client, &order.job, order.amount, &title).await?;

    let now = timestamp::format(&timestamp::now());
    let released = state
        .orders_collection
        .find_one_and_update(
            doc! {
                "_id": order.id.as_str(),
                "status": OrderStatus::Completed.as_str(),
                "payment.status": { "$ne": "released" },
            },
            doc! { "$set": {
                "payment.status": "released",
                "payment.releasedAt": now.as_str(),
                "updatedAt": now.as_str(),
            } },
            after(),
        )
        .await?;

    let Some(released) = released else {
        wallet_service::refund_job_payment(state, &order.client, &order.job, order.amount, &title)
            .await?;
        return Err(AppError::bad_request("Payment has already been released"));
    };

    wallet_service::pay_provider(state, &order.provider, &order.job, order.amount, &title).await?;
    log::info!(
        "order {}: {} released to {}",
        order.id,
        order.amount,
        order.provider
    );

    notification_service::notify(
        &state.notifications_collection,
        Notification::new(
            &order.provider,
            "payment_released",
            format!("💰 ₹{} was released for \"{}\"", order.amount, title),
            timestamp::now(),
        )
        .from_user(&order.client)
        .linking_to(format!("/orders/{}", order.id)),
    )
    .await;

    Ok(released)
}

/// Either party may cancel until the work is completed. The job goes back
/// to the marketplace.
pub async fn cancel(
    state: &AppState,
    order: &Order,
    user_id: &str,
    reason: Option<String>,
) -> AppResult<Order> {
    if !order.involves(user_id) {
        return Err(AppError::forbidden("Not authorized to cancel this order"));
    }
    if order.status.is_closed() {
        return Err(AppError::bad_request(format!(
            "Cannot cancel a {} order",
            order.status.as_str()
        )));
    }

    let now = timestamp::format(&timestamp::now());
    let notes = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "Order cancelled".to_string());
    let cancelled = state
        .orders_collection
        .find_one_and_update(
            doc! {
                "_id": order.id.as_str(),
                "status": { "$nin": ["completed", "cancelled"] },
            },
            doc! { "$set": {
                "status": OrderStatus::Cancelled.as_str(),
                "notes": notes,
                "updatedAt": now.as_str(),
            } },
            after(),
        )
        .await?
        .ok_or_else(|| AppError::bad_request("This order can no longer be cancelled"))?;

    state
        .jobs_collection
        .update_one(
            doc! { "_id": order.job.as_str(), "assignedProvider": order.provider.as_str() },
            doc! {
                "$set": { "status": JobStatus::Open.as_str(), "updatedAt": now.as_str() },
                "$unset": { "assignedProvider": "" },
            },
            None,
        )
        .await?;

    let other = if user_id == order.client {
        &order.provider
    } else {
        &order.client
    };
    notification_service::notify(
        &state.notifications_collection,
        Notification::new(
            other,
            "order_cancelled",
            "❌ An order you are part of was cancelled".to_string(),
            timestamp::now(),
        )
        .from_user(user_id)
        .linking_to(format!("/orders/{}", order.id)),
    )
    .await;

    Ok(cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_follow_the_callers_side_of_the_order() {
        assert_eq!(participant_filter("u1", Role::Provider), doc! { "provider": "u1" });
        assert_eq!(participant_filter("u1", Role::Client), doc! { "client": "u1" });
        assert!(participant_filter("u1", Role::Admin).is_empty());
    }
}
