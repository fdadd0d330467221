use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::Job;
use super::proposal::Proposal;
use super::{new_id, timestamp};
use crate::error::AppError;

/// Lifecycle of the work agreed when a client accepts a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Disputed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Disputed => "disputed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(OrderStatus::Pending),
            "in_progress" => Some(OrderStatus::InProgress),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            "disputed" => Some(OrderStatus::Disputed),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Released,
    Refunded,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayment {
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default, with = "timestamp::option")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub released_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", default = "new_id")]
    pub id: String,
    pub job: String,
    pub proposal: String,
    pub client: String,
    pub provider: String,
    pub amount: f64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, with = "timestamp::option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub completed_date: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub payment: OrderPayment,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The order opened when `proposal` wins `job`: priced at the proposed
    /// budget, due by the job's deadline.
    pub fn for_accepted(job: &Job, proposal: &Proposal, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            job: job.id.clone(),
            proposal: proposal.id.clone(),
            client: job.client.clone(),
            provider: proposal.provider.clone(),
            amount: proposal.proposed_budget,
            status: OrderStatus::Pending,
            start_date: None,
            completed_date: None,
            deadline: job.deadline,
            payment: OrderPayment::default(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.client == user_id || self.provider == user_id
    }
}

/// `?status=` on `GET /orders/my-orders`; `all` or nothing lists every order.
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
}

impl OrderFilter {
    pub fn status(&self) -> Result<Option<OrderStatus>, AppError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(raw) => OrderStatus::parse(raw)
                .map(Some)
                .ok_or_else(|| AppError::bad_request(format!("Unknown order status '{raw}'"))),
        }
    }
}

/// Body of `PUT /orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct OrderStatusForm {
    pub status: String,
}

/// Body of `PUT /orders/{id}/cancel`.
#[derive(Debug, Default, Deserialize)]
pub struct CancelForm {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Statuses a provider may report, and from where. A provider can start
/// work or finish it; closed orders stay closed.
pub fn provider_transition(current: OrderStatus, requested: &str) -> Result<OrderStatus, AppError> {
    let next = match OrderStatus::parse(requested) {
        Some(next @ (OrderStatus::InProgress | OrderStatus::Completed)) => next,
        _ => return Err(AppError::bad_request("Invalid status")),
    };
    match (current, next) {
        (OrderStatus::Pending, _) | (OrderStatus::InProgress, OrderStatus::Completed) => Ok(next),
        _ => Err(AppError::bad_request(format!(
            "Order cannot move from {} to {}",
            current.as_str(),
            next.as_str()
        ))),
    }
}

/// One `$group` row of the stats aggregation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusGroup {
    #[serde(rename = "_id")]
    pub status: OrderStatus,
    pub count: u64,
    #[serde(default)]
    pub total_amount: f64,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct OrderStats {
    pub total: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub disputed: u64,
    #[serde(rename = "totalEarnings")]
    pub total_earnings: f64,
}

impl OrderStats {
    pub fn from_groups(groups: &[StatusGroup]) -> Self {
        groups.iter().fold(Self::default(), |mut stats, group| {
            stats.total += group.count;
            match group.status {
                OrderStatus::Pending => stats.pending = group.count,
                OrderStatus::InProgress => stats.in_progress = group.count,
                OrderStatus::Completed => {
                    stats.completed = group.count;
                    stats.total_earnings = group.total_amount;
                }
                OrderStatus::Cancelled => stats.cancelled = group.count,
                OrderStatus::Disputed => stats.disputed = group.count,
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers_start_then_finish() {
        assert_eq!(
            provider_transition(OrderStatus::Pending, "in_progress").unwrap(),
            OrderStatus::InProgress
        );
        assert_eq!(
            provider_transition(OrderStatus::InProgress, "completed").unwrap(),
            OrderStatus::Completed
        );
        assert_eq!(
            provider_transition(OrderStatus::Pending, "completed").unwrap(),
            OrderStatus::Completed
        );
    }

    #[test]
    fn closed_orders_and_unknown_statuses_are_refused() {
        assert!(provider_transition(OrderStatus::Completed, "in_progress").is_err());
        assert!(provider_transition(OrderStatus::Cancelled, "completed").is_err());
        assert!(provider_transition(OrderStatus::InProgress, "in_progress").is_err());
        assert!(provider_transition(OrderStatus::Pending, "cancelled").is_err());
    }

    #[test]
    fn status_filter_treats_all_as_no_filter() {
        let filter = |raw: Option<&str>| OrderFilter { status: raw.map(String::from) };
        assert_eq!(filter(None).status().unwrap(), None);
        assert_eq!(filter(Some("all")).status().unwrap(), None);
        assert_eq!(
            filter(Some("in_progress")).status().unwrap(),
            Some(OrderStatus::InProgress)
        );
        assert!(filter(Some("shipped")).status().is_err());
    }

    #[test]
    fn stats_count_every_status_and_earn_only_on_completion() {
        let groups = vec![
            StatusGroup { status: OrderStatus::Pending, count: 2, total_amount: 900.0 },
            StatusGroup { status: OrderStatus::Completed, count: 3, total_amount: 4500.0 },
            StatusGroup { status: OrderStatus::Cancelled, count: 1, total_amount: 300.0 },
        ];
        let stats = OrderStats::from_groups(&groups);
        assert_eq!(stats.total, 6);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.total_earnings, 4500.0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["in_progress"], 0);
        assert_eq!(json["totalEarnings"], 4500.0);
    }

    #[test]
    fn status_groups_read_aggregation_rows() {
        let row = mongodb::bson::doc! { "_id": "in_progress", "count": 4_i32, "totalAmount": 1200.5 };
        let group: StatusGroup = mongodb::bson::from_document(row).unwrap();
        assert_eq!(group.status, OrderStatus::InProgress);
        assert_eq!(group.count, 4);
    }
}
