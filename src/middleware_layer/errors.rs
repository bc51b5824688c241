use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::{AppError, RaisedFailure},
    state::AppState,
};

/// The outermost error boundary.
///
/// Any response produced from an [`crate::error::AppError`] is logged and
/// re-rendered by the run-mode aware translator. Headers already on the
/// response (cookies, CORS) are kept. A path served under another method is
/// answered like an unknown route.
pub async fn translate_errors(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    let failure = match response.extensions().get::<RaisedFailure>().cloned() {
        Some(RaisedFailure(failure)) => failure,
        None if response.status() == StatusCode::METHOD_NOT_ALLOWED => {
            Arc::new(AppError::route_not_found())
        }
        None => return response,
    };

    let normalized = state.translator().translate(&failure);
    let rendered = normalized.into_response();

    let (mut parts, _) = response.into_parts();
    let (rendered_parts, body) = rendered.into_parts();
    parts.status = rendered_parts.status;
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::ALLOW);
    parts.headers.extend(rendered_parts.headers);
    parts.extensions.remove::<RaisedFailure>();

    Response::from_parts(parts, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, RunMode};
    use crate::error::AppError;
    use crate::repositories::user::MemoryIdentityStore;
    use axum::{middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    async fn boom() -> Result<&'static str, AppError> {
        Err(AppError::Status {
            status: None,
            message: Some("boom".to_string()),
        })
    }

    async fn fine() -> &'static str {
        "fine"
    }

    fn app(run_mode: RunMode) -> Router {
        let mut config = Config::new("boundary-secret");
        config.run_mode = run_mode;
        let state = AppState::with_store(config, Arc::new(MemoryIdentityStore::new()));

        Router::new()
            .route("/boom", get(boom))
            .route("/fine", get(fine))
            .layer(from_fn_with_state(state, translate_errors))
    }

    async fn call(app: Router, path: &str) -> (StatusCode, serde_json::Value) {
        call_with(app, "GET", path).await
    }

    async fn call_with(app: Router, method: &str, path: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = app
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        assert!(response.extensions().get::<RaisedFailure>().is_none());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn production_hides_the_stack() {
        let (status, body) = call(app(RunMode::Production), "/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"status": "error", "message": "boom"}));
    }

    #[tokio::test]
    async fn development_adds_the_stack() {
        let (status, body) = call(app(RunMode::Development), "/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "boom");
        assert!(body["stack"].as_str().unwrap().contains("Status"));
    }

    #[tokio::test]
    async fn wrong_method_is_an_unknown_route() {
        let (status, body) = call_with(app(RunMode::Production), "DELETE", "/fine").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            serde_json::json!({"status": "error", "message": "Route not found"})
        );
    }

    #[tokio::test]
    async fn successful_responses_pass_through() {
        let response = app(RunMode::Development)
            .oneshot(Request::builder().uri("/fine").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"fine");
    }
}
