//! Product domain type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use gildedcart_core::ProductId;

/// A catalog product.
///
/// Referenced (not owned) by cart lines; the cart computes line totals
/// from the product's current price at read time.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long description.
    pub description: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Units in stock.
    pub stock: i32,
    /// Category slug for browse/filter.
    pub category: String,
    /// Primary image URL, if any.
    pub image_url: Option<String>,
    /// Average review rating, if any.
    pub rating: Option<f32>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating or replacing a product.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub category: String,
    pub image_url: Option<String>,
    pub rating: Option<f32>,
}
