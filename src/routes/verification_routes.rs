// src/routes/verification_routes.rs

use actix_web::web;

use crate::controllers::verification_controller::{
    approve_verification, list_verifications, reject_verification, submit_verification,
    verification_status,
};

/// User-facing endpoints live under `/verification`, the review queue
/// under `/admin`.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/verification")
            .service(submit_verification)
            .service(verification_status),
    )
    .service(
        web::scope("/admin")
            .service(list_verifications)
            .service(approve_verification)
            .service(reject_verification),
    );
}
