// src/routes/order_routes.rs

use actix_web::web;

use crate::controllers::order_controller::{
    accept_delivery, cancel_order, get_order, my_orders, order_stats, update_order_status,
};

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .service(my_orders)
            .service(order_stats)
            .service(get_order)
            .service(update_order_status)
            .service(accept_delivery)
            .service(cancel_order),
    );
}
