//! Authentication error types.

use thiserror::Error;

use crate::db::StoreError;
use crate::services::token::TokenError;

/// Errors that can occur during identity lifecycle operations.
///
/// Each precondition violation has its own variant so callers get a
/// distinct, stable reason.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] gildedcart_core::EmailError),

    /// No account exists for this email.
    #[error("account not found")]
    AccountNotFound,

    /// An account with this email already exists.
    #[error("email already registered")]
    AccountAlreadyRegistered,

    /// The account is already verified.
    #[error("email already verified")]
    AlreadyVerified,

    /// The submitted code does not match or has expired.
    #[error("invalid or expired verification code")]
    InvalidOrExpiredCode,

    /// Wrong password (or no account; the two are indistinguishable to
    /// avoid account enumeration).
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The account has not completed email verification.
    #[error("email not verified yet")]
    NotYetVerified,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token issuance error.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
