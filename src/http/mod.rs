// ============================================================================
// HTTP layer - JSON routes over OrderService
// ============================================================================
//
//   POST   /orders              create
//   GET    /orders              list
//   PUT    /orders/{orderId}    replace
//   DELETE /orders/{orderId}    delete
//
// The app must carry `web::Data<OrderService>`.
//
// ============================================================================

mod errors;
mod handlers;

use actix_web::{error, web, HttpResponse};

/// Register the order routes and the JSON body config.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/orders")
            .route("", web::post().to(handlers::create_order))
            .route("", web::get().to(handlers::list_orders))
            .route("/{order_id}", web::put().to(handlers::replace_order))
            .route("/{order_id}", web::delete().to(handlers::delete_order)),
    );
}

/// Malformed bodies become `400 {"error": ...}` instead of actix's plain text.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(serde_json::json!({ "error": message })),
        )
        .into()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use super::*;
    use crate::db::InMemoryOrderStore;
    use crate::metrics::Metrics;
    use crate::service::OrderService;

    fn app_data() -> web::Data<OrderService> {
        let metrics = Arc::new(Metrics::new().unwrap());
        web::Data::new(OrderService::new(Arc::new(InMemoryOrderStore::new()), metrics))
    }

    fn alice() -> Value {
        json!({
            "customerName": "Alice",
            "orderedAt": "2024-03-01T12:00:00Z",
            "items": [{"itemCode": "A1", "description": "Widget", "quantity": 3}]
        })
    }

    #[actix_web::test]
    async fn test_create_then_list() {
        let app = test::init_service(App::new().app_data(app_data()).configure(configure)).await;

        let req = test::TestRequest::post().uri("/orders").set_json(alice()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["orderId"], 1);
        assert_eq!(body["message"], "Order added successfully");

        let req = test::TestRequest::get().uri("/orders").to_request();
        let orders: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            orders,
            json!([{
                "orderId": 1,
                "customerName": "Alice",
                "orderedAt": "2024-03-01T12:00:00Z",
                "items": [{"itemId": 1, "itemCode": "A1", "description": "Widget", "quantity": 3}]
            }])
        );
    }

    #[actix_web::test]
    async fn test_empty_list_is_array() {
        let app = test::init_service(App::new().app_data(app_data()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/orders").to_request();
        let orders: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(orders, json!([]));
    }

    #[actix_web::test]
    async fn test_replace_and_delete() {
        let app = test::init_service(App::new().app_data(app_data()).configure(configure)).await;

        let req = test::TestRequest::post().uri("/orders").set_json(alice()).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let replacement = json!({
            "customerName": "Alice B",
            "orderedAt": "2024-03-02T08:30:00Z",
            "items": []
        });
        let req = test::TestRequest::put().uri("/orders/1").set_json(replacement).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/orders").to_request();
        let orders: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(orders[0]["customerName"], "Alice B");
        assert_eq!(orders[0]["items"], json!([]));

        let req = test::TestRequest::delete().uri("/orders/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::delete().uri("/orders/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Order not found");
    }

    #[actix_web::test]
    async fn test_replace_unknown_order_is_404() {
        let app = test::init_service(App::new().app_data(app_data()).configure(configure)).await;

        let req = test::TestRequest::put().uri("/orders/999").set_json(alice()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_invalid_order_id_is_400() {
        let app = test::init_service(App::new().app_data(app_data()).configure(configure)).await;

        let req = test::TestRequest::delete().uri("/orders/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid order ID");
    }

    #[actix_web::test]
    async fn test_malformed_body_is_400_json() {
        let app = test::init_service(App::new().app_data(app_data()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(json!({"customerName": "Alice"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn test_oversized_quantity_is_400() {
        let app = test::init_service(App::new().app_data(app_data()).configure(configure)).await;

        let body = json!({
            "customerName": "Alice",
            "orderedAt": "2024-03-01T12:00:00Z",
            "items": [{"itemCode": "A1", "description": "Widget", "quantity": 4_000_000_000u64}]
        });
        let req = test::TestRequest::post().uri("/orders").set_json(body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
