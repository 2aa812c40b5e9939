// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::services::identity::{AuthError, AuthErrorCode};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Identity provider rejected credentials; shown inline on the sign-in form.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Federated or anonymous sign-in failed; carries the fixed form message.
    #[error("Sign-in failed: {0}")]
    SignInFailed(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message shown by the list view when a data call fails.
    pub const DATA_ACCESS_MESSAGE: &'static str =
        "Could not reach the habit store. Please try again.";

    /// Whether the client may retry the same action unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Database(_))
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

fn auth_status(code: &AuthErrorCode) -> StatusCode {
    match code {
        AuthErrorCode::EmailAlreadyInUse => StatusCode::CONFLICT,
        AuthErrorCode::InvalidEmail => StatusCode::BAD_REQUEST,
        AuthErrorCode::WrongPassword
        | AuthErrorCode::UserNotFound
        | AuthErrorCode::InvalidCredential => StatusCode::UNAUTHORIZED,
        AuthErrorCode::Transport => StatusCode::BAD_GATEWAY,
        AuthErrorCode::Other(_) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retryable = self.is_retryable();
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Auth(err) => {
                tracing::warn!(code = %err.code, message = %err.message, "Authentication error");
                (
                    auth_status(&err.code),
                    "auth_error",
                    Some(err.code.user_message().to_string()),
                )
            }
            AppError::SignInFailed(msg) => {
                (StatusCode::UNAUTHORIZED, "auth_error", Some(msg.to_string()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "database_error",
                    Some(Self::DATA_ACCESS_MESSAGE.to_string()),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            retryable,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
