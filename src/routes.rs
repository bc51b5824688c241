use std::time::Duration;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use http::{header, HeaderValue, Method};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::Config,
    handlers,
    middleware_layer::{
        auth::{optional_auth, require_auth, require_role, RoleGate},
        errors::translate_errors,
    },
    models::user::Role,
    state::AppState,
};

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::COOKIE,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    match config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!(
                "⚠️ FRONTEND_URL '{}' is not a valid origin ({}); cross-origin requests will be refused",
                config.frontend_url,
                e
            );
            cors
        }
    }
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/rides/{id}", get(handlers::rides::get_ride))
        .route("/api/users/{id}", get(handlers::users::get_user))
        .route("/api/users/{id}/reviews", get(handlers::users::user_reviews))
        .route("/api/users/{id}/vehicles", get(handlers::users::user_vehicles))
        .with_state(state.clone());

    let optional_routes = Router::new()
        .route("/api/rides", get(handlers::rides::search_rides))
        .route_layer(from_fn_with_state(state.clone(), optional_auth))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route(
            "/api/auth/updatepassword",
            put(handlers::auth::update_password),
        )
        .route("/api/rides/user/my-rides", get(handlers::rides::my_rides))
        .route(
            "/api/bookings",
            get(handlers::bookings::list_bookings).post(handlers::bookings::create_booking),
        )
        .route("/api/bookings/{id}", get(handlers::bookings::get_booking))
        .route(
            "/api/bookings/{id}/confirm",
            put(handlers::bookings::confirm_booking),
        )
        .route(
            "/api/bookings/{id}/cancel",
            put(handlers::bookings::cancel_booking),
        )
        .route(
            "/api/bookings/{id}/complete",
            put(handlers::bookings::complete_booking),
        )
        .route(
            "/api/bookings/ride/{ride_id}",
            get(handlers::bookings::ride_bookings),
        )
        .route(
            "/api/users/profile",
            get(handlers::users::get_profile).put(handlers::users::update_profile),
        )
        .route("/api/users/vehicles", post(handlers::users::add_vehicle))
        .route(
            "/api/users/vehicles/{vehicle_id}",
            put(handlers::users::update_vehicle).delete(handlers::users::delete_vehicle),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    let driver_routes = Router::new()
        .route("/api/rides", post(handlers::rides::create_ride))
        .route(
            "/api/rides/{id}",
            put(handlers::rides::update_ride).delete(handlers::rides::delete_ride),
        )
        .route_layer(from_fn_with_state(
            RoleGate::new([Role::Driver, Role::Admin]),
            require_role,
        ))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    Router::new()
        .merge(public_routes)
        .merge(optional_routes)
        .merge(protected_routes)
        .merge(driver_routes)
        .fallback(handlers::health::not_found)
        .layer(from_fn_with_state(state.clone(), translate_errors))
        .layer(CookieManagerLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(cors_layer(&state.config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::user::MemoryIdentityStore;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let state = AppState::with_store(
            Config::new("router-secret"),
            Arc::new(MemoryIdentityStore::new()),
        );
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn unknown_route_is_404_envelope() {
        let (status, body) = send(get("/api/nowhere")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Route not found");
    }

    #[tokio::test]
    async fn health_reports_running() {
        let (status, body) = send(get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Car Pooling API is running");
        assert!(body["data"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn ride_search_is_public_and_stubbed() {
        let (status, body) = send(get("/api/rides?origin=Porto&seats=2")).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body["message"], "Search rides endpoint - To be implemented");
    }

    #[tokio::test]
    async fn ride_search_validates_query() {
        let (status, body) = send(get("/api/rides?seats=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().starts_with("seats"));
    }

    #[tokio::test]
    async fn bookings_need_a_token() {
        let (status, body) = send(get("/api/bookings")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized to access this route");
        assert!(body["stack"].is_string());
    }

    #[tokio::test]
    async fn ride_creation_needs_a_token_before_role() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/rides")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_method_gets_the_not_found_envelope() {
        let (status, body) = send(get("/api/auth/login")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Route not found");
    }

    #[tokio::test]
    async fn non_numeric_user_id_gets_an_envelope() {
        let (status, body) = send(get("/api/users/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("abc"));
    }

    #[tokio::test]
    async fn registration_without_first_name_is_a_400() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({
                    "email": "ana@example.com",
                    "password": "secret123",
                    "last_name": "Silva",
                })
                .to_string(),
            ))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("first_name"));
    }
}
