//! Cart endpoints.
//!
//! Every endpoint requires a bearer token; the cart operated on is always
//! the authenticated account's own.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use gildedcart_core::{CartLineId, ProductId};

use crate::error::Result;
use crate::extract::Principal;
use crate::models::CartLineView;
use crate::state::AppState;

/// Request to add a product to the cart.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Request to replace a line's quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

/// Cart snapshot with per-line and grand totals.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub lines: Vec<CartLineView>,
    pub total: rust_decimal::Decimal,
}

impl CartResponse {
    fn from_lines(lines: Vec<CartLineView>) -> Self {
        let total = lines.iter().map(|l| l.line_total).sum();
        Self { lines, total }
    }
}

/// List the authenticated account's cart.
///
/// GET /api/cart
///
/// # Errors
///
/// Returns 401 without a valid token.
pub async fn list(
    State(state): State<AppState>,
    Principal(email): Principal,
) -> Result<Json<CartResponse>> {
    let lines = state.cart().list(&email).await?;
    Ok(Json(CartResponse::from_lines(lines)))
}

/// Add a product, merging quantities if a line already exists.
///
/// POST /api/cart/add
///
/// # Errors
///
/// Returns 404 for an unknown product, 400 for a non-positive quantity.
pub async fn add(
    State(state): State<AppState>,
    Principal(email): Principal,
    Json(req): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartLineView>)> {
    let line = state
        .cart()
        .add(&email, req.product_id, req.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(line)))
}

/// Replace a line's quantity.
///
/// PUT /api/cart/update/{id}
///
/// # Errors
///
/// Returns 404 for an unknown line, 401 if the line belongs to another
/// account.
pub async fn update(
    State(state): State<AppState>,
    Principal(email): Principal,
    Path(id): Path<CartLineId>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<CartLineView>> {
    let line = state.cart().update(&email, id, req.quantity).await?;
    Ok(Json(line))
}

/// Remove a single line.
///
/// DELETE /api/cart/remove/{id}
///
/// # Errors
///
/// Returns 404 for an unknown line, 401 if the line belongs to another
/// account.
pub async fn remove(
    State(state): State<AppState>,
    Principal(email): Principal,
    Path(id): Path<CartLineId>,
) -> Result<StatusCode> {
    state.cart().remove(&email, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove every line in the account's cart. Idempotent.
///
/// DELETE /api/cart/clear
///
/// # Errors
///
/// Returns 401 without a valid token.
pub async fn clear(
    State(state): State<AppState>,
    Principal(email): Principal,
) -> Result<StatusCode> {
    state.cart().clear(&email).await?;
    Ok(StatusCode::NO_CONTENT)
}
