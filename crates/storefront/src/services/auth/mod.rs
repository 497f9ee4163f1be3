//! Identity lifecycle service.
//!
//! Drives the per-account state machine `Unverified -> Verified` and the
//! forgot/reset-password sub-flow, both gated by a single-use, time-bound
//! one-time code. Passwords are stored as Argon2id hashes; plaintext is
//! never persisted or logged.
//!
//! Email delivery is decoupled from state: every flow that sends a code
//! commits its account write first and reports the send outcome as a
//! [`Notification`] so a failed send never rolls back the transition.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;

use gildedcart_core::Email;

use crate::db::{AccountStore, NewAccount, StoreError};
use crate::models::Account;
use crate::services::email::{
    Mailer, Notification, password_reset_email, verification_email,
};
use crate::services::otp::{self, CodeGenerator};
use crate::services::token::TokenIssuer;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Result of a successful signup.
#[derive(Debug)]
pub struct SignupOutcome {
    /// The registered email.
    pub email: Email,
    /// Whether the verification code reached the transport.
    pub notification: Notification,
}

/// Result of a successful login.
#[derive(Debug)]
pub struct LoginOutcome {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The authenticated email.
    pub email: Email,
}

/// Identity lifecycle service.
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    mailer: Arc<dyn Mailer>,
    codes: Arc<dyn CodeGenerator>,
    tokens: TokenIssuer,
}

impl AuthService {
    /// Create a new identity lifecycle service.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        mailer: Arc<dyn Mailer>,
        codes: Arc<dyn CodeGenerator>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            accounts,
            mailer,
            codes,
            tokens,
        }
    }

    /// Register a new account and send a verification code.
    ///
    /// The account is created unverified with a pending code; the email
    /// send happens after the write and its failure is non-fatal.
    ///
    /// # Errors
    ///
    /// Returns `AccountAlreadyRegistered` if the email is taken,
    /// `InvalidEmail`/`WeakPassword` on validation failure.
    pub async fn signup(&self, email: &str, password: &str) -> Result<SignupOutcome, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        if self.accounts.exists_by_email(&email).await? {
            return Err(AuthError::AccountAlreadyRegistered);
        }

        let code = self.codes.generate();
        let account = self
            .accounts
            .insert(NewAccount {
                email: email.clone(),
                password_hash,
                otp_code: code.clone(),
                otp_expires_at: otp::expiry_from(Utc::now()),
            })
            .await
            .map_err(|e| match e {
                // Lost the race against a concurrent signup
                StoreError::Conflict(_) => AuthError::AccountAlreadyRegistered,
                other => AuthError::Store(other),
            })?;

        let (subject, body) = verification_email(&code);
        let notification = self.notify(&account.email, &subject, &body).await;

        Ok(SignupOutcome {
            email: account.email,
            notification,
        })
    }

    /// Verify an account's email with the pending one-time code.
    ///
    /// On success the code/expiry pair is consumed and the account flips
    /// to verified.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `AlreadyVerified`, or
    /// `InvalidOrExpiredCode` on the corresponding precondition failure.
    pub async fn verify_email(&self, email: &str, code: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let mut account = self.find_account(&email).await?;

        if account.verified {
            return Err(AuthError::AlreadyVerified);
        }

        self.consume_code(&mut account, code)?;
        account.verified = true;
        self.accounts.update(&account).await?;

        tracing::info!(email = %account.email, "Account verified");
        Ok(())
    }

    /// Regenerate and resend the verification code for an unverified
    /// account. The previous code is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `AlreadyVerified`.
    pub async fn resend_code(&self, email: &str) -> Result<Notification, AuthError> {
        let email = Email::parse(email)?;
        let mut account = self.find_account(&email).await?;

        if account.verified {
            return Err(AuthError::AlreadyVerified);
        }

        let code = self.issue_code(&mut account).await?;
        let (subject, body) = verification_email(&code);
        Ok(self.notify(&account.email, &subject, &body).await)
    }

    /// Authenticate with email and password, minting a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `NotYetVerified` for any unverified account regardless of
    /// password correctness, `InvalidCredentials` for a wrong password or
    /// unknown email.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let email = Email::parse(email)?;
        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !account.verified {
            return Err(AuthError::NotYetVerified);
        }

        verify_password(password, &account.password_hash)?;

        let token = self.tokens.issue(&account.email)?;
        Ok(LoginOutcome {
            token,
            email: account.email,
        })
    }

    /// Start the password-reset sub-flow: issue a fresh code and send it.
    /// Works for verified and unverified accounts alike.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no account exists for this email.
    pub async fn forgot_password(&self, email: &str) -> Result<Notification, AuthError> {
        let email = Email::parse(email)?;
        let mut account = self.find_account(&email).await?;

        let code = self.issue_code(&mut account).await?;
        let (subject, body) = password_reset_email(&code);
        Ok(self.notify(&account.email, &subject, &body).await)
    }

    /// Complete the password-reset sub-flow, consuming the code and
    /// storing a new password hash. The verification flag is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `InvalidOrExpiredCode`, or
    /// `WeakPassword`.
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        validate_password(new_password)?;
        let mut account = self.find_account(&email).await?;

        self.consume_code(&mut account, code)?;
        account.password_hash = hash_password(new_password)?;
        self.accounts.update(&account).await?;

        tracing::info!(email = %account.email, "Password reset");
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn find_account(&self, email: &Email) -> Result<Account, AuthError> {
        self.accounts
            .find_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    /// Check the submitted code against the account's pending pair and
    /// clear it on success. The caller persists the account.
    fn consume_code(&self, account: &mut Account, code: &str) -> Result<(), AuthError> {
        let valid = otp::verify(
            code,
            account.otp_code.as_deref(),
            account.otp_expires_at,
            Utc::now(),
        );
        if !valid {
            return Err(AuthError::InvalidOrExpiredCode);
        }
        account.clear_code();
        Ok(())
    }

    /// Overwrite the account's code/expiry pair and persist it.
    async fn issue_code(&self, account: &mut Account) -> Result<String, AuthError> {
        let code = self.codes.generate();
        account.set_code(code.clone(), otp::expiry_from(Utc::now()));
        self.accounts.update(account).await?;
        Ok(code)
    }

    /// Best-effort send. Failure is logged and reported, never propagated.
    async fn notify(&self, to: &Email, subject: &str, body: &str) -> Notification {
        match self.mailer.send(to, subject, body).await {
            Ok(()) => Notification::Sent,
            Err(e) => {
                tracing::warn!(to = %to, error = %e, "Failed to send email");
                Notification::Failed
            }
        }
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
