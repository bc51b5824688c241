use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tokio_postgres::error::SqlState;

use crate::config::RunMode;
use crate::crypto::token::TokenError;

/// Message used when a failure carries nothing safe to show.
pub const GENERIC_MESSAGE: &str = "Server Error";

/// A single failed field of a request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn describe_fields(fields: &[FieldError]) -> String {
    if fields.is_empty() {
        return "Validation failed".to_string();
    }
    fields
        .iter()
        .map(|f| {
            if f.field.is_empty() {
                f.message.clone()
            } else {
                format!("{}: {}", f.field, f.message)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// An error raised by the identity store.
///
/// `code` is the driver's error code: a SQLSTATE for PostgreSQL, or a MySQL
/// style symbolic code such as `ER_DUP_ENTRY`.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct StorageError {
    code: Option<String>,
    message: String,
}

impl StorageError {
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn uncoded(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Maps the driver code to a constraint violation, if it is one.
    fn violation(&self) -> Option<FailureKind> {
        let code = self.code()?;
        if code == "ER_DUP_ENTRY" || code == SqlState::UNIQUE_VIOLATION.code() {
            Some(FailureKind::DuplicateEntry)
        } else if code == "ER_NO_REFERENCED_ROW_2"
            || code == "ER_NO_REFERENCED_ROW"
            || code == SqlState::FOREIGN_KEY_VIOLATION.code()
        {
            Some(FailureKind::MissingReference)
        } else if code == "ER_BAD_NULL_ERROR" || code == SqlState::NOT_NULL_VIOLATION.code() {
            Some(FailureKind::RequiredFieldMissing)
        } else {
            None
        }
    }
}

impl From<tokio_postgres::Error> for StorageError {
    fn from(e: tokio_postgres::Error) -> Self {
        let message = e
            .as_db_error()
            .map(|db| db.message().to_string())
            .unwrap_or_else(|| e.to_string());
        match e.code() {
            Some(state) => StorageError::with_code(state.code(), message),
            None => StorageError::uncoded(message),
        }
    }
}

impl From<deadpool_postgres::PoolError> for StorageError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        StorageError::uncoded(format!("connection pool: {}", e))
    }
}

impl From<deadpool_postgres::CreatePoolError> for StorageError {
    fn from(e: deadpool_postgres::CreatePoolError) -> Self {
        StorageError::uncoded(format!("connection pool setup: {}", e))
    }
}

/// The classification the translator assigns to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unauthenticated,
    InvalidToken,
    UnknownSubject,
    AccountDisabled,
    Forbidden,
    InternalAuthError,
    InvalidCredentials,
    DuplicateEntry,
    MissingReference,
    RequiredFieldMissing,
    TokenMalformed,
    TokenExpired,
    ValidationFailed,
    Unclassified,
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// No bearer header and no session cookie.
    #[error("Not authorized to access this route")]
    Unauthenticated,

    /// The presented token failed signature or expiry checks.
    #[error("Invalid or expired token")]
    InvalidToken(#[source] TokenError),

    /// The token verified but its subject does not exist.
    #[error("User not found")]
    UnknownSubject(i64),

    /// The token verified but its subject is deactivated.
    #[error("User account is deactivated")]
    AccountDisabled(i64),

    /// The identity's role is not in the allowed set.
    #[error("User role is not authorized to access this route")]
    Forbidden,

    /// Authentication could not complete (store down, timeout, bad wiring).
    #[error("Server error during authentication: {0}")]
    InternalAuth(String),

    /// Wrong email or password on login.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A storage-layer error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A token error raised outside the auth middleware.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// A payload failed validation.
    #[error("Validation failed: {}", describe_fields(.0))]
    Validation(Vec<FieldError>),

    /// A failure that carries its own status and message.
    #[error("{}", .message.as_deref().unwrap_or(GENERIC_MESSAGE))]
    Status {
        status: Option<StatusCode>,
        message: Option<String>,
    },

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// A failure with an explicit status and message.
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        AppError::Status {
            status: Some(status),
            message: Some(message.into()),
        }
    }

    /// No route matches the request's path and method.
    pub fn route_not_found() -> Self {
        AppError::status(StatusCode::NOT_FOUND, "Route not found")
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            AppError::Unauthenticated => FailureKind::Unauthenticated,
            AppError::InvalidToken(_) => FailureKind::InvalidToken,
            AppError::UnknownSubject(_) => FailureKind::UnknownSubject,
            AppError::AccountDisabled(_) => FailureKind::AccountDisabled,
            AppError::Forbidden => FailureKind::Forbidden,
            AppError::InternalAuth(_) => FailureKind::InternalAuthError,
            AppError::InvalidCredentials => FailureKind::InvalidCredentials,
            AppError::Storage(e) => e.violation().unwrap_or(FailureKind::Unclassified),
            AppError::Token(TokenError::Expired) => FailureKind::TokenExpired,
            AppError::Token(TokenError::Malformed(_)) => FailureKind::TokenMalformed,
            AppError::Validation(_) => FailureKind::ValidationFailed,
            AppError::Status { .. } | AppError::Internal(_) => FailureKind::Unclassified,
        }
    }
}

impl From<tokio_postgres::Error> for AppError {
    fn from(e: tokio_postgres::Error) -> Self {
        AppError::Storage(e.into())
    }
}

impl From<deadpool_postgres::PoolError> for AppError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        AppError::Storage(e.into())
    }
}

impl From<deadpool_postgres::CreatePoolError> for AppError {
    fn from(e: deadpool_postgres::CreatePoolError) -> Self {
        AppError::Storage(e.into())
    }
}

impl From<garde::Report> for AppError {
    fn from(report: garde::Report) -> Self {
        let fields = report
            .iter()
            .map(|(path, error)| FieldError::new(path.to_string(), error.message()))
            .collect();
        AppError::Validation(fields)
    }
}

/// The uniform error shape sent to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedError {
    pub status: StatusCode,
    pub message: String,
    /// Diagnostic trace, only filled outside production.
    pub stack: Option<String>,
}

impl NormalizedError {
    /// Maps a failure to status and message without side effects.
    pub fn from_failure(failure: &AppError) -> Self {
        let (status, message) = match failure.kind() {
            FailureKind::DuplicateEntry => {
                (StatusCode::BAD_REQUEST, "Duplicate field value entered".to_string())
            }
            FailureKind::MissingReference => {
                (StatusCode::NOT_FOUND, "Referenced resource not found".to_string())
            }
            FailureKind::RequiredFieldMissing => {
                (StatusCode::BAD_REQUEST, "Required field is missing".to_string())
            }
            FailureKind::TokenMalformed => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
            FailureKind::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired".to_string()),
            FailureKind::ValidationFailed => match failure {
                AppError::Validation(fields) => (StatusCode::BAD_REQUEST, describe_fields(fields)),
                _ => (StatusCode::BAD_REQUEST, describe_fields(&[])),
            },
            FailureKind::Unauthenticated
            | FailureKind::InvalidToken
            | FailureKind::UnknownSubject
            | FailureKind::AccountDisabled
            | FailureKind::InvalidCredentials => (StatusCode::UNAUTHORIZED, failure.to_string()),
            FailureKind::Forbidden => (StatusCode::FORBIDDEN, failure.to_string()),
            FailureKind::InternalAuthError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server error during authentication".to_string(),
            ),
            FailureKind::Unclassified => match failure {
                AppError::Status { status, message } => (
                    status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    message.clone().unwrap_or_else(|| GENERIC_MESSAGE.to_string()),
                ),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_MESSAGE.to_string()),
            },
        };

        Self {
            status,
            message,
            stack: None,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<&'a str>,
}

impl IntoResponse for NormalizedError {
    fn into_response(self) -> Response {
        let body = sonic_rs::to_string(&ErrorBody {
            status: "error",
            message: &self.message,
            stack: self.stack.as_deref(),
        })
        .unwrap_or_else(|_| r#"{"status":"error","message":"Server Error"}"#.to_string());

        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

/// Turns raised failures into [`NormalizedError`]s for one run mode.
#[derive(Debug, Clone, Copy)]
pub struct ErrorTranslator {
    run_mode: RunMode,
}

impl ErrorTranslator {
    pub fn new(run_mode: RunMode) -> Self {
        Self { run_mode }
    }

    /// Logs the failure and maps it to the client-facing shape.
    ///
    /// Outside production the result carries a diagnostic trace; in
    /// production it never does.
    pub fn translate(&self, failure: &AppError) -> NormalizedError {
        let mut normalized = NormalizedError::from_failure(failure);

        if normalized.status.is_server_error() {
            tracing::error!("❌ {} {:?}: {:?}", normalized.status, failure.kind(), failure);
        } else {
            tracing::warn!("⚠️ {} {:?}: {}", normalized.status, failure.kind(), failure);
        }

        if !self.run_mode.is_production() {
            normalized.stack = Some(diagnostic_trace(failure));
        }

        normalized
    }
}

fn diagnostic_trace(failure: &AppError) -> String {
    let mut trace = format!("{:?}", failure);
    let mut source = std::error::Error::source(failure);
    while let Some(cause) = source {
        trace.push_str("\n    caused by: ");
        trace.push_str(&cause.to_string());
        source = cause.source();
    }
    trace
}

/// The failure behind an error response, left in the response extensions for
/// the error boundary.
#[derive(Clone, Debug)]
pub struct RaisedFailure(pub Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = NormalizedError::from_failure(&self).into_response();
        response
            .extensions_mut()
            .insert(RaisedFailure(Arc::new(self)));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_entry_maps_to_bad_request() {
        let failure = AppError::Storage(StorageError::with_code("ER_DUP_ENTRY", "Duplicate entry"));
        let normalized = NormalizedError::from_failure(&failure);
        assert_eq!(normalized.status, StatusCode::BAD_REQUEST);
        assert_eq!(normalized.message, "Duplicate field value entered");
    }

    #[test]
    fn postgres_sqlstates_map_like_mysql_codes() {
        let cases = [
            ("23505", StatusCode::BAD_REQUEST, "Duplicate field value entered"),
            ("23503", StatusCode::NOT_FOUND, "Referenced resource not found"),
            ("ER_NO_REFERENCED_ROW_2", StatusCode::NOT_FOUND, "Referenced resource not found"),
            ("23502", StatusCode::BAD_REQUEST, "Required field is missing"),
            ("ER_BAD_NULL_ERROR", StatusCode::BAD_REQUEST, "Required field is missing"),
        ];
        for (code, status, message) in cases {
            let failure = AppError::Storage(StorageError::with_code(code, "driver text"));
            let normalized = NormalizedError::from_failure(&failure);
            assert_eq!(normalized.status, status, "code {}", code);
            assert_eq!(normalized.message, message, "code {}", code);
        }
    }

    #[test]
    fn unknown_storage_errors_hide_driver_text() {
        let failure = AppError::Storage(StorageError::with_code("42P01", "relation \"users\" does not exist"));
        let normalized = NormalizedError::from_failure(&failure);
        assert_eq!(normalized.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(normalized.message, GENERIC_MESSAGE);
    }

    #[test]
    fn token_errors_are_distinguished() {
        let expired = NormalizedError::from_failure(&AppError::Token(TokenError::Expired));
        assert_eq!(expired.status, StatusCode::UNAUTHORIZED);
        assert_eq!(expired.message, "Token expired");

        let malformed =
            NormalizedError::from_failure(&AppError::Token(TokenError::Malformed("bad".into())));
        assert_eq!(malformed.status, StatusCode::UNAUTHORIZED);
        assert_eq!(malformed.message, "Invalid token");
    }

    #[test]
    fn validation_lists_every_field() {
        let failure = AppError::Validation(vec![
            FieldError::new("email", "not a valid email address"),
            FieldError::new("password", "length is lower than 6"),
        ]);
        let normalized = NormalizedError::from_failure(&failure);
        assert_eq!(normalized.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            normalized.message,
            "email: not a valid email address, password: length is lower than 6"
        );
    }

    #[test]
    fn unclassified_keeps_own_status_and_message() {
        let normalized =
            NormalizedError::from_failure(&AppError::status(StatusCode::CONFLICT, "Seat taken"));
        assert_eq!(normalized.status, StatusCode::CONFLICT);
        assert_eq!(normalized.message, "Seat taken");

        let bare = AppError::Status {
            status: None,
            message: None,
        };
        let normalized = NormalizedError::from_failure(&bare);
        assert_eq!(normalized.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(normalized.message, GENERIC_MESSAGE);
    }

    #[test]
    fn translating_a_normalized_failure_is_stable() {
        let failure = AppError::status(StatusCode::IM_A_TEAPOT, "short and stout");
        let first = NormalizedError::from_failure(&failure);
        let again = NormalizedError::from_failure(&AppError::status(first.status, first.message.clone()));
        assert_eq!(first, again);
    }

    #[test]
    fn auth_failures_keep_their_messages() {
        assert_eq!(
            NormalizedError::from_failure(&AppError::AccountDisabled(7)).message,
            "User account is deactivated"
        );
        let forbidden = NormalizedError::from_failure(&AppError::Forbidden);
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        let internal =
            NormalizedError::from_failure(&AppError::InternalAuth("store offline".into()));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message, "Server error during authentication");
    }

    #[test]
    fn production_never_carries_a_stack() {
        let failure = AppError::Status {
            status: None,
            message: Some("boom".to_string()),
        };
        let normalized = ErrorTranslator::new(RunMode::Production).translate(&failure);
        assert_eq!(normalized.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(normalized.message, "boom");
        assert!(normalized.stack.is_none());
    }

    #[test]
    fn development_carries_the_source_chain() {
        let failure = AppError::InvalidToken(TokenError::Expired);
        let normalized = ErrorTranslator::new(RunMode::Development).translate(&failure);
        let stack = normalized.stack.expect("stack in development");
        assert!(stack.contains("InvalidToken"));
        assert!(stack.contains("caused by: token has expired"));
    }

    #[tokio::test]
    async fn error_body_has_no_stack_field_by_default() {
        let response = AppError::status(StatusCode::BAD_GATEWAY, "upstream").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(response.extensions().get::<RaisedFailure>().is_some());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "upstream");
        assert!(body.get("stack").is_none());
    }
}
