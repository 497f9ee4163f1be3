//! One-time verification codes.
//!
//! Pure functions over an account's code/expiry pair; the caller is
//! responsible for persisting the pair and clearing it after a
//! successful verify. Generation sits behind [`CodeGenerator`] so tests
//! can supply deterministic codes without weakening production entropy.

use chrono::{DateTime, Duration, Utc};

/// How long a code stays valid after issuance.
pub const CODE_TTL_MINUTES: i64 = 10;

/// Source of fresh verification codes.
pub trait CodeGenerator: Send + Sync {
    /// Produce a uniformly random 6-digit numeric code (100000-999999).
    fn generate(&self) -> String;
}

/// Production generator backed by the thread-local CSPRNG.
///
/// Codes gate account takeover, so the randomness source must be
/// cryptographically strong; `rand::rng()` is.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodes;

impl CodeGenerator for RandomCodes {
    fn generate(&self) -> String {
        use rand::Rng;
        let code: u32 = rand::rng().random_range(100_000..1_000_000);
        code.to_string()
    }
}

/// Expiry timestamp for a code issued at `now`.
#[must_use]
pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(CODE_TTL_MINUTES)
}

/// Whether a code expiry has passed.
///
/// True iff `now` is strictly after `expiry`, or no expiry is stored
/// (a code without an expiry is never considered valid).
#[must_use]
pub fn is_expired(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expiry.is_none_or(|e| now > e)
}

/// Check a submitted code against the stored one.
///
/// False if no code is stored or the stored code has expired; otherwise
/// exact string equality. No case-folding or trimming: codes are
/// numeric-only.
#[must_use]
pub fn verify(
    input: &str,
    stored: Option<&str>,
    expiry: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    let Some(stored) = stored else {
        return false;
    };
    if is_expired(expiry, now) {
        return false;
    }
    input == stored
}
