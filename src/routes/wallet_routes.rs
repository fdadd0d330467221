// src/routes/wallet_routes.rs

use actix_web::web;

use crate::controllers::wallet_controller::{
    add_money, get_transaction, get_wallet, list_transactions, wallet_stats, withdraw,
};

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/wallet")
            .service(get_wallet)
            .service(list_transactions)
            .service(get_transaction)
            .service(wallet_stats)
            .service(add_money)
            .service(withdraw),
    );
}
