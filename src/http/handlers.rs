use actix_web::{web, HttpResponse};
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::order::{NewOrder, OrderError};
use crate::service::OrderService;

fn request_span(operation: &'static str) -> tracing::Span {
    tracing::info_span!("http_request", operation = operation, request_id = %Uuid::new_v4())
}

fn parse_order_id(raw: &str) -> Result<i64, OrderError> {
    raw.parse()
        .map_err(|_| OrderError::InvalidInput("Invalid order ID".to_string()))
}

pub(super) async fn create_order(
    service: web::Data<OrderService>,
    body: web::Json<NewOrder>,
) -> Result<HttpResponse, OrderError> {
    let order_id = service
        .create(body.into_inner())
        .instrument(request_span("create"))
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Order added successfully",
        "orderId": order_id
    })))
}

pub(super) async fn list_orders(
    service: web::Data<OrderService>,
) -> Result<HttpResponse, OrderError> {
    let orders = service.list().instrument(request_span("list")).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub(super) async fn replace_order(
    service: web::Data<OrderService>,
    path: web::Path<String>,
    body: web::Json<NewOrder>,
) -> Result<HttpResponse, OrderError> {
    let order_id = parse_order_id(&path)?;

    service
        .replace(order_id, body.into_inner())
        .instrument(request_span("replace"))
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Order updated successfully" })))
}

pub(super) async fn delete_order(
    service: web::Data<OrderService>,
    path: web::Path<String>,
) -> Result<HttpResponse, OrderError> {
    let order_id = parse_order_id(&path)?;

    service
        .delete(order_id)
        .instrument(request_span("delete"))
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Order deleted successfully" })))
}
