// src/routes/auth_routes.rs

use actix_web::web;

use crate::controllers::auth_controller::{login, me, register, resend_verification, verify_email};

/// Registers account endpoints under `/auth`.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(login)
            .service(me)
            .service(verify_email)
            .service(resend_verification),
    );
}
