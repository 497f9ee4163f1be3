//! Authentication extractor.
//!
//! Provides the [`Principal`] extractor that requires a valid bearer token
//! in route handlers.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use gildedcart_core::Email;

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires a valid `Authorization: Bearer <token>` header.
///
/// The wrapped email is the token's subject, verified against the server
/// signing secret. Handlers never read the caller identity from the
/// request body.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     Principal(email): Principal,
/// ) -> impl IntoResponse {
///     format!("Hello, {email}!")
/// }
/// ```
pub struct Principal(pub Email);

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        let email = state.tokens().validate(token)?;
        Ok(Self(email))
    }
}

/// Pull the token out of `Authorization: Bearer <token>`, if present.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/cart");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header_yields_none() {
        let parts = parts_with_auth(None);
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_wrong_scheme_yields_none() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwdw=="));
        assert_eq!(bearer_token(&parts), None);
    }
}
