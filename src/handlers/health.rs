use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::{error::AppError, response::ApiResponse};

#[derive(Serialize)]
struct Health {
    timestamp: String,
}

pub async fn health() -> Response {
    ApiResponse::success()
        .message("Car Pooling API is running")
        .data(Health {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
        .into_response()
}

pub async fn not_found() -> AppError {
    AppError::route_not_found()
}
