//! `PostgreSQL` implementations of the storage contracts.
//!
//! Queries use the runtime-checked sqlx API so the crate builds without
//! a live database. Row structs are kept separate from domain types and
//! converted explicitly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use gildedcart_core::{AccountId, CartLineId, Email, ProductId};

use super::{AccountStore, CartStore, NewAccount, ProductStore, StoreError};
use crate::models::product::ProductDraft;
use crate::models::{Account, CartLine, Product};

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    email: String,
    password_hash: String,
    verified: bool,
    otp_code: Option<String>,
    otp_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, StoreError> {
        let email = Email::parse(&row.email).map_err(|e| {
            StoreError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: AccountId::new(row.id),
            email,
            password_hash: row.password_hash,
            verified: row.verified,
            otp_code: row.otp_code,
            otp_expires_at: row.otp_expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
    category: String,
    image_url: Option<String>,
    rating: Option<f32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            category: row.category,
            image_url: row.image_url,
            rating: row.rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: i64,
    account_id: i64,
    product_id: i64,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: CartLineId::new(row.id),
            account_id: AccountId::new(row.account_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Map a unique-constraint violation to `StoreError::Conflict`.
fn map_insert_error(e: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict(format!("{what} already exists"));
    }
    StoreError::Database(e)
}

// =============================================================================
// Accounts
// =============================================================================

/// `PostgreSQL`-backed [`AccountStore`].
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, email, password_hash, verified, otp_code, otp_expires_at, created_at, updated_at";

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> Result<bool, StoreError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM account WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists.0)
    }

    async fn insert(&self, new: NewAccount) -> Result<Account, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "INSERT INTO account (email, password_hash, otp_code, otp_expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(new.email.as_str())
        .bind(&new.password_hash)
        .bind(&new.otp_code)
        .bind(new.otp_expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "email"))?;

        Account::try_from(row)
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE account
             SET password_hash = $2, verified = $3, otp_code = $4, otp_expires_at = $5,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(account.id.as_i64())
        .bind(&account.password_hash)
        .bind(account.verified)
        .bind(&account.otp_code)
        .bind(account.otp_expires_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Products
// =============================================================================

/// `PostgreSQL`-backed [`ProductStore`].
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, category, image_url, rating, created_at, updated_at";

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE category = $1 ORDER BY id"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn search_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product
             WHERE name ILIKE '%' || $1 || '%' ORDER BY id"
        ))
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO product (name, description, price, stock, category, image_url, rating)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.stock)
        .bind(&draft.category)
        .bind(&draft.image_url)
        .bind(draft.rating)
        .fetch_one(&self.pool)
        .await?;

        Ok(Product::from(row))
    }

    async fn update(&self, id: ProductId, draft: ProductDraft) -> Result<Product, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE product
             SET name = $2, description = $3, price = $4, stock = $5, category = $6,
                 image_url = $7, rating = $8, updated_at = now()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_i64())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.stock)
        .bind(&draft.category)
        .bind(&draft.image_url)
        .bind(draft.rating)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::from).ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Cart lines
// =============================================================================

/// `PostgreSQL`-backed [`CartStore`].
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CART_LINE_COLUMNS: &str = "id, account_id, product_id, quantity, created_at, updated_at";

#[async_trait]
impl CartStore for PgCartStore {
    async fn find_by_account(&self, account_id: AccountId) -> Result<Vec<CartLine>, StoreError> {
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            "SELECT {CART_LINE_COLUMNS} FROM cart_line WHERE account_id = $1 ORDER BY id"
        ))
        .bind(account_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    async fn find_by_account_and_product(
        &self,
        account_id: AccountId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, StoreError> {
        let row = sqlx::query_as::<_, CartLineRow>(&format!(
            "SELECT {CART_LINE_COLUMNS} FROM cart_line
             WHERE account_id = $1 AND product_id = $2"
        ))
        .bind(account_id.as_i64())
        .bind(product_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CartLine::from))
    }

    async fn find_by_id(&self, id: CartLineId) -> Result<Option<CartLine>, StoreError> {
        let row = sqlx::query_as::<_, CartLineRow>(&format!(
            "SELECT {CART_LINE_COLUMNS} FROM cart_line WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CartLine::from))
    }

    async fn upsert_add(
        &self,
        account_id: AccountId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, StoreError> {
        // Single conditional write against the unique (account, product)
        // key: concurrent adds serialize in the database and both merges
        // land. This is the atomicity contract of the add path.
        let row = sqlx::query_as::<_, CartLineRow>(&format!(
            "INSERT INTO cart_line (account_id, product_id, quantity)
             VALUES ($1, $2, $3)
             ON CONFLICT (account_id, product_id)
             DO UPDATE SET quantity = cart_line.quantity + EXCLUDED.quantity,
                           updated_at = now()
             RETURNING {CART_LINE_COLUMNS}"
        ))
        .bind(account_id.as_i64())
        .bind(product_id.as_i64())
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(CartLine::from(row))
    }

    async fn update_quantity(&self, id: CartLineId, quantity: i32) -> Result<CartLine, StoreError> {
        let row = sqlx::query_as::<_, CartLineRow>(&format!(
            "UPDATE cart_line SET quantity = $2, updated_at = now()
             WHERE id = $1
             RETURNING {CART_LINE_COLUMNS}"
        ))
        .bind(id.as_i64())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CartLine::from).ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: CartLineId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM cart_line WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_all_by_account(&self, account_id: AccountId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cart_line WHERE account_id = $1")
            .bind(account_id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
