mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use connecto::models::user::Role;
use connecto::routes;

const ORDER_ID: &str = "65f0c2a9e4b0a1b2c3d4e5c3";

async fn call(req: test::TestRequest) -> (StatusCode, Value) {
    let state = common::state(common::config("http://127.0.0.1:9/v1/chat/completions", None)).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::init),
    )
    .await;
    let resp = test::call_service(&app, req.to_request()).await;
    let status = resp.status();
    (status, test::read_body_json(resp).await)
}

#[actix_web::test]
async fn only_providers_report_progress() {
    let (status, body) = call(
        test::TestRequest::put()
            .uri(&format!("/api/orders/{ORDER_ID}/status"))
            .insert_header(("Authorization", common::bearer_as(Role::Client)))
            .set_json(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only providers can perform this action");
}

#[actix_web::test]
async fn only_clients_accept_delivery() {
    let (status, body) = call(
        test::TestRequest::put()
            .uri(&format!("/api/orders/{ORDER_ID}/accept-delivery"))
            .insert_header(("Authorization", common::bearer_as(Role::Provider))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn order_ids_are_validated() {
    let (status, body) = call(
        test::TestRequest::get()
            .uri("/api/orders/not-an-order")
            .insert_header(("Authorization", common::bearer())),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid order id");
}

#[actix_web::test]
async fn unknown_status_filters_are_rejected() {
    let (status, body) = call(
        test::TestRequest::get()
            .uri("/api/orders/my-orders?status=shipped")
            .insert_header(("Authorization", common::bearer())),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Unknown order status 'shipped'");
}
