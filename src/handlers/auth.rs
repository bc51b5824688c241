use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension,
};
use tower_cookies::Cookies;

use crate::{
    error::Result,
    models::user::Identity,
    response::ApiResponse,
    services::{
        auth as auth_service,
        session::{self, UserData},
    },
    state::AppState,
    validation::{
        auth::{LoginRequest, RegisterRequest, UpdatePasswordRequest},
        extract::ValidatedJson,
    },
};

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<Response> {
    tracing::info!("📝 Register attempt for: {}", payload.email);

    let identity = auth_service::register(
        state.store.as_ref(),
        auth_service::Registration {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
        },
    )
    .await?;

    tracing::info!("✅ User registered: {}", identity.id);
    session::send_token_response(&state, &cookies, identity, StatusCode::CREATED)
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt for: {}", payload.email);

    let user =
        auth_service::authenticate_user(state.store.as_ref(), &payload.email, &payload.password)
            .await?;

    session::send_token_response(&state, &cookies, user.into(), StatusCode::OK)
}

/// Returns the identity attached by the auth middleware.
pub async fn me(Extension(identity): Extension<Identity>) -> Response {
    ApiResponse::success()
        .data(UserData { user: identity })
        .into_response()
}

/// Handles user logout.
pub async fn logout(Extension(identity): Extension<Identity>, cookies: Cookies) -> Response {
    session::clear_session(&cookies);
    tracing::info!("👋 User logged out: {}", identity.id);

    ApiResponse::success()
        .message("Logged out successfully")
        .into_response()
}

/// Handles changing the current user's password and issues a fresh session.
#[axum::debug_handler]
pub async fn update_password(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    cookies: Cookies,
    ValidatedJson(payload): ValidatedJson<UpdatePasswordRequest>,
) -> Result<Response> {
    let identity = auth_service::change_password(
        state.store.as_ref(),
        identity.id,
        &payload.current_password,
        &payload.new_password,
    )
    .await?;

    session::send_token_response(&state, &cookies, identity, StatusCode::OK)
}
