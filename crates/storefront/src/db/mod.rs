//! Storage contracts and `PostgreSQL` access for the storefront.
//!
//! The services depend on the [`AccountStore`], [`ProductStore`], and
//! [`CartStore`] traits rather than on a concrete database, so the
//! backing store can be swapped (the test suite runs against
//! [`memory::MemoryStore`]).
//!
//! # Tables
//!
//! - `account` - Credentials, verification flag, pending one-time code
//! - `product` - Catalog
//! - `cart_line` - One row per (account, product); UNIQUE constraint backs
//!   the add-to-cart merge
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and are applied on
//! startup via `sqlx::migrate!`.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use gildedcart_core::{AccountId, CartLineId, Email, ProductId};

use crate::models::product::ProductDraft;
use crate::models::{Account, CartLine, Product};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Fields needed to create an account at signup.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: Email,
    pub password_hash: String,
    pub otp_code: String,
    pub otp_expires_at: DateTime<Utc>,
}

/// Persistence contract for accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up an account by its email address (exact match).
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError>;

    /// Check whether an account exists for this email.
    async fn exists_by_email(&self, email: &Email) -> Result<bool, StoreError>;

    /// Create an account in the unverified state.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the email is already registered.
    async fn insert(&self, new: NewAccount) -> Result<Account, StoreError>;

    /// Persist changes to an existing account (verification flag,
    /// code/expiry pair, password hash).
    async fn update(&self, account: &Account) -> Result<(), StoreError>;
}

/// Persistence contract for the catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, StoreError>;

    /// Case-insensitive substring search on the product name.
    async fn search_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError>;

    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError>;

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the product does not exist.
    async fn update(&self, id: ProductId, draft: ProductDraft) -> Result<Product, StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the product does not exist.
    async fn delete(&self, id: ProductId) -> Result<(), StoreError>;
}

/// Persistence contract for cart lines.
///
/// `upsert_add` is the atomicity contract for the add-to-cart merge: the
/// implementation must guarantee that two concurrent calls for the same
/// (account, product) serialize to a single line whose quantity is the
/// sum of both requests. Postgres does this with a conditional upsert
/// against the unique key; the in-memory store holds one lock for the
/// whole check-then-act sequence.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// All lines owned by an account, oldest first.
    async fn find_by_account(&self, account_id: AccountId) -> Result<Vec<CartLine>, StoreError>;

    async fn find_by_account_and_product(
        &self,
        account_id: AccountId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, StoreError>;

    async fn find_by_id(&self, id: CartLineId) -> Result<Option<CartLine>, StoreError>;

    /// Insert a line, or merge the quantity into the existing line for
    /// this (account, product) pair. Atomic: no lost update under
    /// concurrent calls.
    async fn upsert_add(
        &self,
        account_id: AccountId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, StoreError>;

    /// Replace a line's quantity (no merge).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the line does not exist.
    async fn update_quantity(&self, id: CartLineId, quantity: i32) -> Result<CartLine, StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the line does not exist.
    async fn delete(&self, id: CartLineId) -> Result<(), StoreError>;

    /// Delete every line owned by an account. Idempotent.
    async fn delete_all_by_account(&self, account_id: AccountId) -> Result<(), StoreError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
