use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The JSON envelope every endpoint answers with:
/// `{status: "success"|"error", message?, token?, data?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T = ()> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl ApiResponse<()> {
    pub fn success() -> Self {
        Self {
            status: "success",
            message: None,
            token: None,
            data: None,
        }
    }

    pub fn error() -> Self {
        Self {
            status: "error",
            ..Self::success()
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn data<U>(self, data: U) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            message: self.message,
            token: self.token,
            data: Some(data),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match sonic_rs::to_string(&self) {
            Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
            Err(e) => {
                tracing::error!("❌ Response serialization failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Answer for routes whose controller does not exist yet.
pub fn not_implemented(endpoint: &str) -> Response {
    (
        StatusCode::NOT_IMPLEMENTED,
        ApiResponse::error().message(format!("{} endpoint - To be implemented", endpoint)),
    )
        .into_response()
}
