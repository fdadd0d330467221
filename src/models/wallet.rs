use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, timestamp};
use crate::error::AppError;

pub const MIN_TOP_UP: f64 = 100.0;
pub const MAX_TOP_UP: f64 = 100_000.0;
pub const MIN_WITHDRAWAL: f64 = 100.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    #[serde(rename = "_id", default = "new_id")]
    pub id: String,
    pub user: String,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub total_earned: f64,
    #[serde(default)]
    pub total_spent: f64,
    #[serde(default)]
    pub pending_amount: f64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    Deposit,
    Withdrawal,
    JobPayment,
    JobEarning,
    Refund,
    Commission,
    Bonus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    #[default]
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id", default = "new_id")]
    pub id: String,
    pub wallet: String,
    pub user: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub category: TransactionCategory,
    pub description: String,
    #[serde(default)]
    pub related_job: Option<String>,
    #[serde(default)]
    pub status: TransactionStatus,
    pub balance_after: f64,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    pub amount: f64,
}

pub fn validate_top_up(amount: f64) -> Result<(), AppError> {
    if !amount.is_finite() || amount < MIN_TOP_UP {
        return Err(AppError::bad_request("Minimum amount is ₹100"));
    }
    if amount > MAX_TOP_UP {
        return Err(AppError::bad_request("Maximum amount is ₹1,00,000"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalMethod {
    BankTransfer,
    Upi,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub account_holder: String,
    pub account_number: String,
    pub ifsc: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub amount: f64,
    pub method: Option<String>,
    pub bank_details: Option<BankDetails>,
    pub upi_id: Option<String>,
}

impl WithdrawalRequest {
    pub fn validate(&self) -> Result<WithdrawalMethod, AppError> {
        if !self.amount.is_finite() || self.amount < MIN_WITHDRAWAL {
            return Err(AppError::bad_request("Minimum withdrawal amount is ₹100"));
        }
        let method = match self.method.as_deref() {
            Some("bank_transfer") => WithdrawalMethod::BankTransfer,
            Some("upi") => WithdrawalMethod::Upi,
            _ => return Err(AppError::bad_request("Invalid withdrawal method")),
        };
        match method {
            WithdrawalMethod::BankTransfer if self.bank_details.is_none() => {
                Err(AppError::bad_request("Bank details are required"))
            }
            WithdrawalMethod::Upi
                if self.upi_id.as_deref().map_or(true, |id| id.trim().is_empty()) =>
            {
                Err(AppError::bad_request("UPI ID is required"))
            }
            _ => Ok(method),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotals {
    pub monthly_earnings: f64,
    pub monthly_spending: f64,
}

pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// Sums credits and debits created at or after `since`.
pub fn monthly_totals(transactions: &[Transaction], since: DateTime<Utc>) -> MonthlyTotals {
    transactions
        .iter()
        .filter(|t| t.created_at >= since)
        .fold(MonthlyTotals::default(), |mut acc, t| {
            match t.kind {
                TransactionKind::Credit => acc.monthly_earnings += t.amount,
                TransactionKind::Debit => acc.monthly_spending += t.amount,
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tx(kind: TransactionKind, amount: f64, at: DateTime<Utc>) -> Transaction {
        Transaction {
            id: new_id(),
            wallet: "w".into(),
            user: "u".into(),
            kind,
            amount,
            category: TransactionCategory::Deposit,
            description: "test".into(),
            related_job: None,
            status: TransactionStatus::Completed,
            balance_after: 0.0,
            metadata: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn top_up_bounds() {
        assert!(validate_top_up(99.0).is_err());
        assert!(validate_top_up(100.0).is_ok());
        assert!(validate_top_up(100_000.0).is_ok());
        assert!(validate_top_up(100_001.0).is_err());
    }

    #[test]
    fn withdrawal_needs_details_for_its_method() {
        let mut req = WithdrawalRequest {
            amount: 500.0,
            method: Some("upi".into()),
            bank_details: None,
            upi_id: None,
        };
        assert!(req.validate().is_err());
        req.upi_id = Some("asha@okbank".into());
        assert_eq!(req.validate().unwrap(), WithdrawalMethod::Upi);

        req.method = Some("bank_transfer".into());
        assert!(req.validate().is_err());
        req.method = Some("cheque".into());
        assert!(req.validate().is_err());
    }

    #[test]
    fn monthly_totals_ignore_older_transactions() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
        let month = start_of_month(now);
        let txs = vec![
            tx(TransactionKind::Credit, 500.0, now),
            tx(TransactionKind::Debit, 200.0, now),
            tx(TransactionKind::Credit, 900.0, month - Duration::days(1)),
        ];
        let totals = monthly_totals(&txs, month);
        assert_eq!(totals.monthly_earnings, 500.0);
        assert_eq!(totals.monthly_spending, 200.0);
    }
}
