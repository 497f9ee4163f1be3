//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (database)
//! GET  /api                     - API info
//!
//! # Auth
//! POST /api/auth/signup          - Register, sends verification code
//! POST /api/auth/verify-email    - Verify email with code
//! POST /api/auth/resend-otp      - Resend verification code
//! POST /api/auth/login           - Login, returns bearer token
//! POST /api/auth/forgot-password - Send password-reset code
//! POST /api/auth/reset-password  - Reset password with code
//!
//! # Cart (requires bearer token)
//! GET    /api/cart               - List cart lines
//! POST   /api/cart/add           - Add product (merges quantities)
//! PUT    /api/cart/update/{id}   - Replace line quantity
//! DELETE /api/cart/remove/{id}   - Remove line
//! DELETE /api/cart/clear         - Remove all lines
//!
//! # Products
//! GET    /api/products/all                  - List all products
//! GET    /api/products/{id}                 - Product by ID
//! GET    /api/products/category/{category}  - Products in category
//! GET    /api/products/search?name=         - Search by name substring
//! POST   /api/products/add                  - Create product
//! PUT    /api/products/update/{id}          - Update product
//! DELETE /api/products/delete/{id}          - Delete product
//! ```

pub mod auth;
pub mod cart;
pub mod products;

use axum::{
    Json, Router,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/verify-email", post(auth::verify_email))
        .route("/resend-otp", post(auth::resend_otp))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::list))
        .route("/add", post(cart::add))
        .route("/update/{id}", put(cart::update))
        .route("/remove/{id}", delete(cart::remove))
        .route("/clear", delete(cart::clear))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(products::all))
        .route("/search", get(products::search))
        .route("/category/{category}", get(products::by_category))
        .route("/{id}", get(products::show))
        .route("/add", post(products::create))
        .route("/update/{id}", put(products::update))
        .route("/delete/{id}", delete(products::remove))
}

/// API info endpoint.
async fn api_info() -> Json<Value> {
    Json(json!({
        "name": "gildedcart",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api", get(api_info))
        .nest("/api/auth", auth_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/products", product_routes())
}
