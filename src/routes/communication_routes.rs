// src/routes/communication_routes.rs

use actix_web::web;

use crate::controllers::communication_controller::{
    call_history, decline_call, end_call, initiate_call, join_call,
};

/// Registers call endpoints under `/communication`.
/// `/call-history` and `/call/...` come before the `{kind}` patterns.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/communication")
            .service(call_history)
            .service(decline_call)
            .service(initiate_call)
            .service(join_call)
            .service(end_call),
    );
}
