use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_cookies::cookie::{time::Duration, SameSite};
use tower_cookies::{Cookie, Cookies};

use crate::{
    error::Result,
    models::user::Identity,
    response::ApiResponse,
    state::AppState,
};

/// Name of the session cookie.
pub const TOKEN_COOKIE: &str = "token";
/// Value written to the session cookie on logout.
pub const LOGGED_OUT_SENTINEL: &str = "none";

#[derive(Serialize)]
pub struct UserData {
    pub user: Identity,
}

/// Creates the http-only session cookie carrying `token`.
fn session_cookie(token: String, max_age_days: i64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(TOKEN_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_max_age(Duration::days(max_age_days));
    cookie.set_path("/");
    cookie
}

/// Issues a token for `identity`, sets it as the session cookie and returns
/// the success envelope carrying both the token and the identity.
pub fn send_token_response(
    state: &AppState,
    cookies: &Cookies,
    identity: Identity,
    status: StatusCode,
) -> Result<Response> {
    let token = state.tokens.issue(identity.id)?;

    cookies.add(session_cookie(
        token.clone(),
        state.config.cookie_expire_days,
        state.config.run_mode.is_production(),
    ));
    tracing::debug!("🍪 Session cookie set for user: {}", identity.id);

    let body = ApiResponse::success()
        .token(token)
        .data(UserData { user: identity });

    Ok((status, body).into_response())
}

/// Overwrites the session cookie with a sentinel that expires in ten seconds.
pub fn clear_session(cookies: &Cookies) {
    let mut cookie = Cookie::new(TOKEN_COOKIE, LOGGED_OUT_SENTINEL);
    cookie.set_http_only(true);
    cookie.set_max_age(Duration::seconds(10));
    cookie.set_path("/");
    cookies.add(cookie);
}
