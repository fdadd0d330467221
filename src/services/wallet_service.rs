// src/services/wallet_service.rs

use futures::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::wallet::{
    monthly_totals, start_of_month, validate_top_up, MonthlyTotals, Transaction,
    TransactionCategory, TransactionKind, TransactionStatus, Wallet, WithdrawalMethod,
    WithdrawalRequest,
};
use crate::models::{new_id, timestamp, Page, Pagination};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TransactionFilters {
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    pub category: Option<TransactionCategory>,
    pub status: Option<TransactionStatus>,
}

impl TransactionFilters {
    pub fn to_document(&self, user_id: &str) -> AppResult<Document> {
        let mut filter = doc! { "user": user_id };
        if let Some(kind) = self.kind {
            filter.insert("type", bson::to_bson(&kind)?);
        }
        if let Some(category) = self.category {
            filter.insert("category", bson::to_bson(&category)?);
        }
        if let Some(status) = self.status {
            filter.insert("status", bson::to_bson(&status)?);
        }
        Ok(filter)
    }
}

fn after() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

/// Returns the user's wallet, creating an empty one on first access.
pub async fn get_or_create(state: &AppState, user_id: &str) -> AppResult<Wallet> {
    let now = timestamp::format(&timestamp::now());
    let options = FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build();
    state
        .wallets_collection
        .find_one_and_update(
            doc! { "user": user_id },
            doc! { "$setOnInsert": {
                "_id": new_id(),
                "balance": 0.0,
                "totalEarned": 0.0,
                "totalSpent": 0.0,
                "pendingAmount": 0.0,
                "createdAt": now.as_str(),
                "updatedAt": now.as_str(),
            } },
            options,
        )
        .await?
        .ok_or_else(|| AppError::Internal("wallet upsert returned nothing".into()))
}

/// One ledger line, recorded against the wallet state it produced.
struct Posting {
    kind: TransactionKind,
    category: TransactionCategory,
    status: TransactionStatus,
    amount: f64,
    description: String,
    related_job: Option<String>,
    metadata: Option<serde_json::Value>,
}

impl Posting {
    fn completed(
        kind: TransactionKind,
        category: TransactionCategory,
        amount: f64,
        description: String,
    ) -> Self {
        Self {
            kind,
            category,
            status: TransactionStatus::Completed,
            amount,
            description,
            related_job: None,
            metadata: None,
        }
    }

    fn for_job(mut self, job_id: &str) -> Self {
        self.related_job = Some(job_id.to_string());
        self
    }
}

async fn record(state: &AppState, wallet: &Wallet, posting: Posting) -> AppResult<Transaction> {
    let now = timestamp::now();
    let transaction = Transaction {
        id: new_id(),
        wallet: wallet.id.clone(),
        user: wallet.user.clone(),
        kind: posting.kind,
        amount: posting.amount,
        category: posting.category,
        description: posting.description,
        related_job: posting.related_job,
        status: posting.status,
        balance_after: wallet.balance,
        metadata: posting.metadata,
        created_at: now,
        updated_at: now,
    };
    state
        .transactions_collection
        .insert_one(&transaction, None)
        .await?;
    Ok(transaction)
}

/// Applies `$inc` to the user's wallet, optionally only while the balance
/// covers `required`. `None` means the guard failed.
async fn adjust(
    state: &AppState,
    user_id: &str,
    inc: Document,
    required: Option<f64>,
) -> AppResult<Option<Wallet>> {
    let wallet = get_or_create(state, user_id).await?;
    let mut filter = doc! { "_id": wallet.id.as_str() };
    if let Some(required) = required {
        filter.insert("balance", doc! { "$gte": required });
    }
    Ok(state
        .wallets_collection
        .find_one_and_update(
            filter,
            doc! {
                "$inc": inc,
                "$set": { "updatedAt": timestamp::format(&timestamp::now()) },
            },
            after(),
        )
        .await?)
}

/// Credits a top-up straight to the balance as a completed deposit.
pub async fn add_money(
    state: &AppState,
    user_id: &str,
    amount: f64,
) -> AppResult<(Wallet, Transaction)> {
    validate_top_up(amount)?;
    let wallet = adjust(state, user_id, doc! { "balance": amount }, None)
        .await?
        .ok_or_else(|| AppError::not_found("Wallet not found"))?;

    let transaction = record(
        state,
        &wallet,
        Posting::completed(
            TransactionKind::Credit,
            TransactionCategory::Deposit,
            amount,
            format!("Added ₹{amount} to wallet"),
        ),
    )
    .await?;
    log::info!("wallet {} credited {}", wallet.id, amount);
    Ok((wallet, transaction))
}

/// Moves `amount` from the balance to `pendingAmount` and records a pending
/// withdrawal. The balance check and the debit are one atomic update, so
/// concurrent withdrawals cannot overdraw the wallet.
pub async fn withdraw(
    state: &AppState,
    user_id: &str,
    request: &WithdrawalRequest,
) -> AppResult<(Wallet, Transaction)> {
    let method = request.validate()?;
    let amount = request.amount;
    let wallet = adjust(
        state,
        user_id,
        doc! { "balance": -amount, "pendingAmount": amount },
        Some(amount),
    )
    .await?
    .ok_or_else(|| AppError::bad_request("Insufficient balance"))?;

    let metadata = match method {
        WithdrawalMethod::BankTransfer => json!({
            "method": "bank_transfer",
            "bankDetails": request.bank_details,
        }),
        WithdrawalMethod::Upi => json!({ "method": "upi", "upiId": request.upi_id }),
    };
    let transaction = record(
        state,
        &wallet,
        Posting {
            kind: TransactionKind::Debit,
            category: TransactionCategory::Withdrawal,
            status: TransactionStatus::Pending,
            amount,
            description: format!("Withdrawal request of ₹{amount}"),
            related_job: None,
            metadata: Some(metadata),
        },
    )
    .await?;
    log::info!("withdrawal {} of {} pending for {}", transaction.id, amount, user_id);
    Ok((wallet, transaction))
}

/// Debits the client for a delivered job. The balance check and the debit
/// are one update.
pub async fn charge_for_job(
    state: &AppState,
    client_id: &str,
    job_id: &str,
    amount: f64,
    title: &str,
) -> AppResult<Transaction> {
    let wallet = adjust(
        state,
        client_id,
        doc! { "balance": -amount, "totalSpent": amount },
        Some(amount),
    )
    .await?
    .ok_or_else(|| AppError::bad_request("Insufficient balance"))?;
    record(
        state,
        &wallet,
        Posting::completed(
            TransactionKind::Debit,
            TransactionCategory::JobPayment,
            amount,
            format!("Payment for \"{title}\""),
        )
        .for_job(job_id),
    )
    .await
}

/// Returns a job payment to the client, undoing [`charge_for_job`].
pub async fn refund_job_payment(
    state: &AppState,
    client_id: &str,
    job_id: &str,
    amount: f64,
    title: &str,
) -> AppResult<Transaction> {
    let wallet = adjust(
        state,
        client_id,
        doc! { "balance": amount, "totalSpent": -amount },
        None,
    )
    .await?
    .ok_or_else(|| AppError::not_found("Wallet not found"))?;
    record(
        state,
        &wallet,
        Posting::completed(
            TransactionKind::Credit,
            TransactionCategory::Refund,
            amount,
            format!("Refund for \"{title}\""),
        )
        .for_job(job_id),
    )
    .await
}

/// Credits the provider's earning for a delivered job.
pub async fn pay_provider(
    state: &AppState,
    provider_id: &str,
    job_id: &str,
    amount: f64,
    title: &str,
) -> AppResult<Transaction> {
    let wallet = adjust(
        state,
        provider_id,
        doc! { "balance": amount, "totalEarned": amount },
        None,
    )
    .await?
    .ok_or_else(|| AppError::not_found("Wallet not found"))?;
    record(
        state,
        &wallet,
        Posting::completed(
            TransactionKind::Credit,
            TransactionCategory::JobEarning,
            amount,
            format!("Earning from \"{title}\""),
        )
        .for_job(job_id),
    )
    .await
}

pub async fn transactions(
    state: &AppState,
    filter: Document,
    page: Page,
) -> AppResult<(Vec<Transaction>, Pagination)> {
    let options = FindOptions::builder()
        .sort(doc! { "createdAt": -1 })
        .skip(page.skip())
        .limit(page.limit as i64)
        .build();
    let items = state
        .transactions_collection
        .find(filter.clone(), options)
        .await?
        .try_collect()
        .await?;
    let total = state
        .transactions_collection
        .count_documents(filter, None)
        .await?;
    Ok((items, page.pagination(total)))
}

/// Owner-only lookup; someone else's transaction is reported as missing.
pub async fn transaction(state: &AppState, user_id: &str, id: &str) -> AppResult<Transaction> {
    state
        .transactions_collection
        .find_one(doc! { "_id": id, "user": user_id }, None)
        .await?
        .ok_or_else(|| AppError::not_found("Transaction not found"))
}

pub struct WalletStats {
    pub wallet: Wallet,
    pub month: MonthlyTotals,
    pub recent: Vec<Transaction>,
}

pub async fn stats(state: &AppState, user_id: &str) -> AppResult<WalletStats> {
    let wallet = get_or_create(state, user_id).await?;
    let since = start_of_month(timestamp::now());

    let this_month: Vec<Transaction> = state
        .transactions_collection
        .find(
            doc! {
                "user": user_id,
                "status": "completed",
                "createdAt": { "$gte": timestamp::format(&since) },
            },
            None,
        )
        .await?
        .try_collect()
        .await?;

    let recent_options = FindOptions::builder()
        .sort(doc! { "createdAt": -1 })
        .limit(5)
        .build();
    let recent = state
        .transactions_collection
        .find(doc! { "user": user_id }, recent_options)
        .await?
        .try_collect()
        .await?;

    Ok(WalletStats {
        wallet,
        month: monthly_totals(&this_month, since),
        recent,
    })
}
