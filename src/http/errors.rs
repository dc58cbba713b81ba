use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::order::OrderError;

impl ResponseError for OrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            OrderError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            OrderError::NotFound(_) => StatusCode::NOT_FOUND,
            OrderError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            OrderError::InvalidInput(msg) | OrderError::Store(msg) => msg.clone(),
            OrderError::NotFound(_) => "Order not found".to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}
