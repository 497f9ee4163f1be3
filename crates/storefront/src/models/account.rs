//! Account domain type.

use chrono::{DateTime, Utc};

use gildedcart_core::{AccountId, Email};

/// A storefront account (domain type).
///
/// Created at signup in the unverified state with a pending one-time
/// code. The code/expiry pair is overwritten on regeneration and cleared
/// exactly once when a verify or password reset succeeds.
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,
    /// Account email address (unique, case-sensitive key).
    pub email: Email,
    /// Argon2 password hash. Plaintext is never stored or logged.
    pub password_hash: String,
    /// Whether the email has been verified via one-time code.
    pub verified: bool,
    /// Pending one-time code, if any.
    pub otp_code: Option<String>,
    /// Expiry of the pending code. Only meaningful when `otp_code` is set.
    pub otp_expires_at: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Overwrite the pending one-time code and its expiry.
    pub fn set_code(&mut self, code: String, expires_at: DateTime<Utc>) {
        self.otp_code = Some(code);
        self.otp_expires_at = Some(expires_at);
    }

    /// Consume the pending one-time code (after a successful verify or reset).
    pub fn clear_code(&mut self) {
        self.otp_code = None;
        self.otp_expires_at = None;
    }
}
