// src/controllers/wallet_controller.rs

use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::wallet::{TopUpRequest, WithdrawalRequest};
use crate::models::{parse_id, PageQuery};
use crate::services::wallet_service::{self, TransactionFilters};
use crate::state::AppState;

/// GET /wallet
#[get("")]
pub async fn get_wallet(auth: AuthUser, data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let wallet = wallet_service::get_or_create(&data, &auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "wallet": wallet },
    })))
}

/// GET /wallet/transactions?type&category&status&page&limit
#[get("/transactions")]
pub async fn list_transactions(
    auth: AuthUser,
    filters: web::Query<TransactionFilters>,
    page: web::Query<PageQuery>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let filter = filters.to_document(&auth.id)?;
    let (transactions, pagination) =
        wallet_service::transactions(&data, filter, page.resolve(20)).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "transactions": transactions, "pagination": pagination },
    })))
}

/// GET /wallet/transactions/{id}
#[get("/transactions/{id}")]
pub async fn get_transaction(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "transaction")?;
    let transaction = wallet_service::transaction(&data, &auth.id, &id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "transaction": transaction },
    })))
}

/// GET /wallet/stats
#[get("/stats")]
pub async fn wallet_stats(auth: AuthUser, data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let stats = wallet_service::stats(&data, &auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "balance": stats.wallet.balance,
            "totalEarned": stats.wallet.total_earned,
            "totalSpent": stats.wallet.total_spent,
            "pendingAmount": stats.wallet.pending_amount,
            "monthlyEarnings": stats.month.monthly_earnings,
            "monthlySpending": stats.month.monthly_spending,
            "recentTransactions": stats.recent,
        },
    })))
}

/// POST /wallet/add-money
#[post("/add-money")]
pub async fn add_money(
    auth: AuthUser,
    body: web::Json<TopUpRequest>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let (wallet, transaction) = wallet_service::add_money(&data, &auth.id, body.amount).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Money added successfully",
        "data": { "wallet": wallet, "transaction": transaction },
    })))
}

/// POST /wallet/withdraw
/// The amount is held as pending until the payout is processed.
#[post("/withdraw")]
pub async fn withdraw(
    auth: AuthUser,
    body: web::Json<WithdrawalRequest>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let (wallet, transaction) = wallet_service::withdraw(&data, &auth.id, &body).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Withdrawal request submitted successfully",
        "data": { "wallet": wallet, "transaction": transaction },
    })))
}
