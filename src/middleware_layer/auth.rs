use std::{convert::Infallible, sync::Arc};

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    error::{AppError, Result},
    models::user::{Identity, Role},
    repositories::user::Lookup,
    services::session::{LOGGED_OUT_SENTINEL, TOKEN_COOKIE},
    state::AppState,
};

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extracts the session token, preferring the bearer header over the cookie.
fn extract_token(headers: &HeaderMap, cookies: &Cookies) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token.to_string());
    }

    cookies
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty() && value != LOGGED_OUT_SENTINEL)
}

/// Looks up a subject, bounded by the configured timeout.
///
/// Every failure, including the timeout, becomes `InternalAuth`.
async fn lookup(state: &AppState, id: i64, filter: Lookup) -> Result<Option<Identity>> {
    let timeout = state.config.lookup_timeout;
    match tokio::time::timeout(timeout, state.store.find_by_id(id, filter)).await {
        Ok(Ok(found)) => Ok(found),
        Ok(Err(e)) => Err(AppError::InternalAuth(format!("identity lookup failed: {}", e))),
        Err(_) => Err(AppError::InternalAuth(format!(
            "identity lookup for {} timed out after {:?}",
            id, timeout
        ))),
    }
}

/// Resolves a token to an active identity or the reason it was rejected.
pub async fn authenticate(state: &AppState, token: Option<&str>) -> Result<Identity> {
    let token = token.ok_or_else(|| {
        tracing::debug!("❌ No bearer header or token cookie");
        AppError::Unauthenticated
    })?;

    let claims = state.tokens.verify(token).map_err(AppError::InvalidToken)?;

    let identity = lookup(state, claims.id, Lookup::Any)
        .await?
        .ok_or(AppError::UnknownSubject(claims.id))?;

    if !identity.is_active {
        return Err(AppError::AccountDisabled(identity.id));
    }

    Ok(identity)
}

/// Like [`authenticate`], but any failure just means "anonymous".
pub async fn authenticate_optional(state: &AppState, token: Option<&str>) -> Option<Identity> {
    let token = token?;

    let claims = match state.tokens.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Ignoring unusable token on optional route: {}", e);
            return None;
        }
    };

    match lookup(state, claims.id, Lookup::ActiveOnly).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!("⚠️ Optional auth continuing anonymously: {}", e);
            None
        }
    }
}

/// A middleware that requires a valid token for an active user.
///
/// On success the [`Identity`] is inserted into the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    tracing::debug!("🔐 Checking authentication...");

    let token = extract_token(request.headers(), &cookies);
    let identity = authenticate(&state, token.as_deref()).await?;

    tracing::debug!("✅ User authenticated: {}", identity.id);
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// A middleware that attaches an identity when it can and never rejects.
pub async fn optional_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = extract_token(request.headers(), &cookies);

    if let Some(identity) = authenticate_optional(&state, token.as_deref()).await {
        request.extensions_mut().insert(identity);
    }

    next.run(request).await
}

/// The identity [`optional_auth`] attached, if any.
pub struct Viewer(pub Option<Identity>);

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(Viewer(parts.extensions.get::<Identity>().cloned()))
    }
}

/// The roles a route accepts.
#[derive(Clone, Debug)]
pub struct RoleGate {
    allowed: Arc<[Role]>,
}

impl RoleGate {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: roles.into_iter().collect(),
        }
    }

    /// Checks the identity attached by [`require_auth`].
    ///
    /// A missing identity means the gate was mounted without `require_auth`
    /// in front of it; that is reported as a server error.
    pub fn check(&self, identity: Option<&Identity>, path: &str) -> Result<()> {
        let identity = identity.ok_or_else(|| {
            tracing::error!(
                "❌ Role gate on {} ran without an authenticated identity; require_auth must run first",
                path
            );
            AppError::InternalAuth(format!("role gate on {} has no identity", path))
        })?;

        match identity.role {
            Some(role) if self.allowed.contains(&role) => Ok(()),
            role => {
                tracing::warn!(
                    "❌ User {} with role {:?} denied on {}",
                    identity.id,
                    role,
                    path
                );
                Err(AppError::Forbidden)
            }
        }
    }
}

/// A middleware that only lets identities with an allowed role through.
pub async fn require_role(
    State(gate): State<RoleGate>,
    request: Request<Body>,
    next: Next,
) -> Result<Response> {
    gate.check(request.extensions().get::<Identity>(), request.uri().path())?;
    Ok(next.run(request).await)
}
