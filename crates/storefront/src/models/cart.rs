//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use gildedcart_core::{AccountId, CartLineId, ProductId};

use super::Product;

/// A cart line: one (account, product) pair with a quantity.
///
/// At most one line exists per pair; adding the same product again merges
/// into the existing line. Prices are never cached here.
#[derive(Debug, Clone)]
pub struct CartLine {
    /// Unique line ID.
    pub id: CartLineId,
    /// Owning account. Only this account may mutate or remove the line.
    pub account_id: AccountId,
    /// Referenced product.
    pub product_id: ProductId,
    /// Quantity, always >= 1.
    pub quantity: i32,
    /// When the line was created.
    pub created_at: DateTime<Utc>,
    /// When the line was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A cart line joined with its product, as returned to callers.
///
/// `line_total` is computed at read time from the product's current
/// price.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

impl CartLineView {
    /// Build a view from a line and its product.
    #[must_use]
    pub fn from_line(line: &CartLine, product: &Product) -> Self {
        Self {
            id: line.id,
            product_id: product.id,
            product_name: product.name.clone(),
            product_image: product.image_url.clone(),
            unit_price: product.price,
            quantity: line.quantity,
            line_total: product.price * Decimal::from(line.quantity),
        }
    }
}
