//! Identity lifecycle endpoints.
//!
//! JSON API for signup, email verification, login, and password reset.
//! Verification and reset codes travel by email; delivery failures are
//! reported in the `notification` field, never as operation failures.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::services::email::Notification;
use crate::state::AppState;

/// Request to register a new account.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

/// Response after registration.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub email: String,
    pub message: &'static str,
    /// Whether the verification email reached the transport.
    pub notification: Notification,
}

/// Register a new, unverified account and send a verification code.
///
/// POST /api/auth/signup
///
/// # Errors
///
/// Returns 409 if the email is already registered, 400 on validation
/// failures.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let outcome = state.auth().signup(&req.email, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            email: outcome.email.into_inner(),
            message: "Registered. Check your email for the verification code.",
            notification: outcome.notification,
        }),
    ))
}

/// Request carrying an email and a one-time code.
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub email: String,
    pub code: String,
}

/// Plain message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Verify an account's email with a one-time code.
///
/// POST /api/auth/verify-email
///
/// # Errors
///
/// Returns 400 if the code is wrong or expired, or the account is
/// already verified.
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<MessageResponse>> {
    state.auth().verify_email(&req.email, &req.code).await?;
    Ok(Json(MessageResponse {
        message: "Email verified. You can now log in.",
    }))
}

/// Request carrying only an email.
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// Response for code-sending endpoints.
#[derive(Debug, Serialize)]
pub struct CodeSentResponse {
    pub message: &'static str,
    pub notification: Notification,
}

/// Issue a fresh verification code for an unverified account.
///
/// POST /api/auth/resend-otp
///
/// # Errors
///
/// Returns 400 if the account is already verified, 404 if unknown.
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<CodeSentResponse>> {
    let notification = state.auth().resend_code(&req.email).await?;
    Ok(Json(CodeSentResponse {
        message: "Verification code sent.",
        notification,
    }))
}

/// Request to log in.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response carrying a bearer token.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
}

/// Authenticate and mint a bearer token.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 on bad credentials, 400 if the email is not verified yet.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let outcome = state.auth().login(&req.email, &req.password).await?;
    Ok(Json(LoginResponse {
        token: outcome.token,
        email: outcome.email.into_inner(),
    }))
}

/// Send a password-reset code.
///
/// POST /api/auth/forgot-password
///
/// Works for verified and unverified accounts alike.
///
/// # Errors
///
/// Returns 404 if no account exists for the email.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<CodeSentResponse>> {
    let notification = state.auth().forgot_password(&req.email).await?;
    Ok(Json(CodeSentResponse {
        message: "Password reset code sent.",
        notification,
    }))
}

/// Request to reset a password with a one-time code.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Reset a password using a one-time code.
///
/// POST /api/auth/reset-password
///
/// # Errors
///
/// Returns 400 if the code is wrong or expired or the new password is
/// too weak.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .auth()
        .reset_password(&req.email, &req.code, &req.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password reset. You can now log in with your new password.",
    }))
}
