// src/routes/message_routes.rs

use actix_web::web;

use crate::controllers::message_controller::{
    get_conversations, get_messages, get_status, get_unread_count, mark_as_read, send_message,
    update_status, update_typing, upload_attachment,
};

/// Registers messaging endpoints under `/messages`.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/messages")
            .service(get_conversations)
            .service(get_messages)
            .service(send_message)
            .service(mark_as_read)
            .service(get_unread_count)
            .service(upload_attachment)
            .service(update_status)
            .service(update_typing)
            .service(get_status),
    );
}
