use actix_web::{error, web, HttpRequest};

use crate::controllers::{health_controller, message_controller, voice_controller};
use crate::error::AppError;

mod auth_routes;
mod communication_routes;
mod community_routes;
mod job_routes;
mod message_routes;
mod notification_routes;
mod order_routes;
mod proposal_routes;
mod verification_routes;
mod wallet_routes;

/// Every endpoint lives under `/api`, except stored attachments which are
/// served from `/uploads`.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(message_controller::serve_upload)
        .service(
            web::scope("/api")
                .service(health_controller::health)
                .service(voice_controller::voice_intent_status)
                .service(voice_controller::process_voice_intent)
                .configure(auth_routes::init)
                .configure(message_routes::init)
                .configure(communication_routes::init)
                .configure(job_routes::init)
                .configure(proposal_routes::init)
                .configure(order_routes::init)
                .configure(wallet_routes::init)
                .configure(community_routes::init)
                .configure(verification_routes::init)
                .configure(notification_routes::init),
        );
}

/// Malformed bodies get the same `{success:false,message}` shape as every
/// other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(1024 * 1024)
        .error_handler(|err: error::JsonPayloadError, _req: &HttpRequest| {
            AppError::bad_request(format!("Invalid request body: {err}")).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, _req: &HttpRequest| {
        AppError::bad_request(format!("Invalid query: {err}")).into()
    })
}
