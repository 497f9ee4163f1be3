//! Unified error handling.
//!
//! Provides a unified `AppError` type that maps every service error to an
//! HTTP status and a JSON body. All route handlers should return
//! `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::token::TokenError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] StoreError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => Self::Unauthorized("Invalid or expired token".to_string()),
            TokenError::Signing(e) => Self::Internal(e.to_string()),
        }
    }
}

/// JSON body returned for every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl AppError {
    /// Stable machine-readable reason code.
    const fn code(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Internal(_) => "internal",
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => "validation",
                AuthError::AccountNotFound => "not_found",
                AuthError::AccountAlreadyRegistered => "conflict",
                AuthError::AlreadyVerified
                | AuthError::InvalidOrExpiredCode
                | AuthError::NotYetVerified => "invalid_state",
                AuthError::InvalidCredentials => "unauthorized",
                AuthError::PasswordHash | AuthError::Token(_) | AuthError::Store(_) => "internal",
            },
            Self::Cart(err) => match err {
                CartError::InvalidQuantity => "validation",
                CartError::AccountNotFound
                | CartError::ProductNotFound
                | CartError::LineNotFound => "not_found",
                CartError::Unauthorized => "unauthorized",
                CartError::Store(_) => "internal",
            },
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::BadRequest(_) => "validation",
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::AccountNotFound => StatusCode::NOT_FOUND,
                AuthError::AccountAlreadyRegistered => StatusCode::CONFLICT,
                AuthError::AlreadyVerified
                | AuthError::InvalidOrExpiredCode
                | AuthError::NotYetVerified => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::PasswordHash | AuthError::Token(_) | AuthError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(err) => match err {
                CartError::InvalidQuantity => StatusCode::BAD_REQUEST,
                CartError::AccountNotFound
                | CartError::ProductNotFound
                | CartError::LineNotFound => StatusCode::NOT_FOUND,
                CartError::Unauthorized => StatusCode::UNAUTHORIZED,
                CartError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Internal details stay out of responses.
    fn message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                AuthError::PasswordHash | AuthError::Token(_) | AuthError::Store(_) => {
                    "Internal server error".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                other => other.to_string(),
            },
            Self::Cart(err) => match err {
                CartError::Store(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request error");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = ErrorBody {
            error: self.code(),
            message: self.message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
