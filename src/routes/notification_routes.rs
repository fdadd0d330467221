// src/routes/notification_routes.rs

use actix_web::web;

use crate::controllers::notification_controller::{list_notifications, mark_all_read, mark_read};

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .service(list_notifications)
            .service(mark_all_read)
            .service(mark_read),
    );
}
