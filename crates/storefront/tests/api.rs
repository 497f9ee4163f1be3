//! End-to-end API tests over in-memory stores.
//!
//! Each test builds the full router with `AppState::assemble`, swaps in
//! a fixed code generator and a no-op mailer, and drives it with
//! `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use async_trait::async_trait;
use gildedcart_core::Email;
use gildedcart_storefront::app;
use gildedcart_storefront::db::memory::MemoryStore;
use gildedcart_storefront::services::email::{MailError, Mailer};
use gildedcart_storefront::services::otp::CodeGenerator;
use gildedcart_storefront::services::token::TokenIssuer;
use gildedcart_storefront::state::AppState;

const CODE: &str = "123456";

struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
    async fn send(&self, _to: &Email, _subject: &str, _body: &str) -> Result<(), MailError> {
        Ok(())
    }
}

struct FixedCodes;

impl CodeGenerator for FixedCodes {
    fn generate(&self) -> String {
        CODE.to_owned()
    }
}

fn test_app() -> Router {
    let store = MemoryStore::new();
    let tokens = TokenIssuer::new(&SecretString::from("kR9$vLm2#qXw8!zPn4@jTb6&hYc0*dFe"));

    let state = AppState::assemble(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store),
        Arc::new(NullMailer),
        Arc::new(FixedCodes),
        tokens,
        None,
    );

    app(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Signup and verify an account, returning a login token.
async fn register_and_login(app: &Router, email: &str, password: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        app,
        "POST",
        "/api/auth/verify-email",
        None,
        Some(json!({"email": email, "code": CODE})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_owned()
}

/// Create a product through the API, returning its ID.
async fn create_product(app: &Router, name: &str, price: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/products/add",
        None,
        Some(json!({
            "name": name,
            "price": price,
            "stock": 50,
            "category": "kitchen",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // No database configured, so readiness is unconditional
    let response = app
        .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_info() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/api", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "gildedcart");
}

// ============================================================================
// Auth flow
// ============================================================================

#[tokio::test]
async fn test_signup_verify_login_flow() {
    let app = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({"email": "shopper@example.com", "password": "sturdy-pass-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["notification"], "sent");

    // Login before verification is rejected
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "shopper@example.com", "password": "sturdy-pass-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_state");

    // Wrong code is rejected
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/verify-email",
        None,
        Some(json!({"email": "shopper@example.com", "code": "000000"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/verify-email",
        None,
        Some(json!({"email": "shopper@example.com", "code": CODE})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "shopper@example.com", "password": "sturdy-pass-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["email"], "shopper@example.com");
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = test_app();

    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"email": "shopper@example.com", "password": "sturdy-pass-1"})),
        )
        .await;
        assert_eq!(status, expected);
    }
}

#[tokio::test]
async fn test_login_with_wrong_password_unauthorized() {
    let app = test_app();
    register_and_login(&app, "shopper@example.com", "sturdy-pass-1").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "shopper@example.com", "password": "wrong-pass-9"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_login_unknown_email_unauthorized() {
    let app = test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "ghost@example.com", "password": "whatever-pass"})),
    )
    .await;
    // Indistinguishable from a wrong password
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = test_app();
    register_and_login(&app, "shopper@example.com", "original-pass-1").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/forgot-password",
        None,
        Some(json!({"email": "shopper@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({
            "email": "shopper@example.com",
            "code": CODE,
            "new_password": "brand-new-pass-2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "shopper@example.com", "password": "original-pass-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // New one does
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "shopper@example.com", "password": "brand-new-pass-2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Codes are single-use
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({
            "email": "shopper@example.com",
            "code": CODE,
            "new_password": "yet-another-pass-3",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_cart_requires_token() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(
        &app,
        "POST",
        "/api/cart/add",
        Some("not-a-real-token"),
        Some(json!({"product_id": 1, "quantity": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_to_cart_merges_quantities() {
    let app = test_app();
    let token = register_and_login(&app, "shopper@example.com", "sturdy-pass-1").await;
    let product = create_product(&app, "Ceramic Mug", "19.99").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/cart/add",
        Some(&token),
        Some(json!({"product_id": product, "quantity": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["quantity"], 2);

    let (status, body) = send(
        &app,
        "POST",
        "/api/cart/add",
        Some(&token),
        Some(json!({"product_id": product, "quantity": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["quantity"], 5);

    let (status, body) = send(&app, "GET", "/api/cart", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lines"].as_array().unwrap().len(), 1);
    assert_eq!(body["lines"][0]["quantity"], 5);
    assert_eq!(body["total"], "99.95");
}

#[tokio::test]
async fn test_cart_update_and_remove() {
    let app = test_app();
    let token = register_and_login(&app, "shopper@example.com", "sturdy-pass-1").await;
    let product = create_product(&app, "Ceramic Mug", "10.00").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/cart/add",
        Some(&token),
        Some(json!({"product_id": product, "quantity": 2})),
    )
    .await;
    let line_id = body["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/cart/update/{line_id}"),
        Some(&token),
        Some(json!({"quantity": 7})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 7);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/cart/update/{line_id}"),
        Some(&token),
        Some(json!({"quantity": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/cart/remove/{line_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/api/cart", Some(&token), None).await;
    assert!(body["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_clear_is_idempotent() {
    let app = test_app();
    let token = register_and_login(&app, "shopper@example.com", "sturdy-pass-1").await;
    let product = create_product(&app, "Ceramic Mug", "10.00").await;

    send(
        &app,
        "POST",
        "/api/cart/add",
        Some(&token),
        Some(json!({"product_id": product, "quantity": 2})),
    )
    .await;

    for _ in 0..2 {
        let (status, _) = send(&app, "DELETE", "/api/cart/clear", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
async fn test_cart_lines_are_owner_scoped() {
    let app = test_app();
    let owner = register_and_login(&app, "owner@example.com", "sturdy-pass-1").await;
    let intruder = register_and_login(&app, "intruder@example.com", "sturdy-pass-2").await;
    let product = create_product(&app, "Ceramic Mug", "10.00").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/cart/add",
        Some(&owner),
        Some(json!({"product_id": product, "quantity": 2})),
    )
    .await;
    let line_id = body["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/cart/update/{line_id}"),
        Some(&intruder),
        Some(json!({"quantity": 99})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/cart/remove/{line_id}"),
        Some(&intruder),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The owner's line survived
    let (_, body) = send(&app, "GET", "/api/cart", Some(&owner), None).await;
    assert_eq!(body["lines"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_add_unknown_product_not_found() {
    let app = test_app();
    let token = register_and_login(&app, "shopper@example.com", "sturdy-pass-1").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/cart/add",
        Some(&token),
        Some(json!({"product_id": 404, "quantity": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_product_crud() {
    let app = test_app();
    let id = create_product(&app, "Ceramic Mug", "19.99").await;

    let (status, body) = send(&app, "GET", &format!("/api/products/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ceramic Mug");

    let (status, _) = send(&app, "GET", "/api/products/404", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/products/update/{id}"),
        None,
        Some(json!({
            "name": "Ceramic Mug (large)",
            "price": "24.99",
            "stock": 30,
            "category": "kitchen",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ceramic Mug (large)");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/products/delete/{id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/products/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_listing_and_search() {
    let app = test_app();
    create_product(&app, "Ceramic Mug", "19.99").await;
    create_product(&app, "Steel Mug", "24.99").await;

    let (status, body) = send(&app, "GET", "/api/products/all", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&app, "GET", "/api/products/search?name=steel", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Steel Mug");

    let (status, body) = send(&app, "GET", "/api/products/category/kitchen", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/api/products/category/garden", None, None).await;
    assert!(body.as_array().unwrap().is_empty());
}
