//! Cart service.
//!
//! Owns add/update/remove/clear semantics for cart lines. Adding a
//! product an account already has merges quantities into the existing
//! line; the merge is atomic via [`CartStore::upsert_add`], so two
//! concurrent adds of the same product serialize to a single line with
//! the summed quantity. Every mutation is ownership-checked against the
//! authenticated subject.

use std::sync::Arc;

use thiserror::Error;

use gildedcart_core::{CartLineId, Email, ProductId};

use crate::db::{AccountStore, CartStore, ProductStore, StoreError};
use crate::models::{Account, CartLine, CartLineView};

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No account exists for the authenticated subject.
    #[error("account not found")]
    AccountNotFound,

    /// Referenced product does not exist.
    #[error("product not found")]
    ProductNotFound,

    /// Referenced cart line does not exist.
    #[error("cart line not found")]
    LineNotFound,

    /// The line belongs to a different account.
    #[error("not the owner of this cart line")]
    Unauthorized,

    /// Quantity must be a positive integer. Zero is not an implicit
    /// remove; removal has its own operation.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Cart service, keyed by the authenticated account's email.
///
/// The email always comes from a validated bearer token, never from the
/// request body: the authenticated subject is the account of record for
/// every lookup and mutation.
#[derive(Clone)]
pub struct CartService {
    accounts: Arc<dyn AccountStore>,
    products: Arc<dyn ProductStore>,
    carts: Arc<dyn CartStore>,
}

impl CartService {
    /// Create a new cart service.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        products: Arc<dyn ProductStore>,
        carts: Arc<dyn CartStore>,
    ) -> Self {
        Self {
            accounts,
            products,
            carts,
        }
    }

    /// Snapshot of the account's cart, one view per line, with totals
    /// computed from each product's current price.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the subject has no account.
    pub async fn list(&self, email: &Email) -> Result<Vec<CartLineView>, CartError> {
        let account = self.find_account(email).await?;
        let lines = self.carts.find_by_account(account.id).await?;

        let mut views = Vec::with_capacity(lines.len());
        for line in &lines {
            views.push(self.view(line).await?);
        }
        Ok(views)
    }

    /// Add a product to the cart, merging into an existing line if one
    /// exists for this (account, product) pair.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for quantity < 1 and `ProductNotFound`
    /// if the product does not exist.
    pub async fn add(
        &self,
        email: &Email,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLineView, CartError> {
        validate_quantity(quantity)?;
        let account = self.find_account(email).await?;

        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;

        let line = self
            .carts
            .upsert_add(account.id, product.id, quantity)
            .await?;

        Ok(CartLineView::from_line(&line, &product))
    }

    /// Replace a line's quantity (no merge).
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the line does not exist and
    /// `Unauthorized` if it belongs to another account.
    pub async fn update(
        &self,
        email: &Email,
        line_id: CartLineId,
        quantity: i32,
    ) -> Result<CartLineView, CartError> {
        validate_quantity(quantity)?;
        let account = self.find_account(email).await?;
        self.owned_line(&account, line_id).await?;

        let updated = self
            .carts
            .update_quantity(line_id, quantity)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => CartError::LineNotFound,
                other => CartError::Store(other),
            })?;

        self.view(&updated).await
    }

    /// Remove a single line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` or `Unauthorized` as for [`Self::update`].
    pub async fn remove(&self, email: &Email, line_id: CartLineId) -> Result<(), CartError> {
        let account = self.find_account(email).await?;
        self.owned_line(&account, line_id).await?;

        self.carts.delete(line_id).await.map_err(|e| match e {
            StoreError::NotFound => CartError::LineNotFound,
            other => CartError::Store(other),
        })
    }

    /// Remove every line owned by the account. Idempotent: clearing an
    /// already-empty cart succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the subject has no account.
    pub async fn clear(&self, email: &Email) -> Result<(), CartError> {
        let account = self.find_account(email).await?;
        self.carts.delete_all_by_account(account.id).await?;
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn find_account(&self, email: &Email) -> Result<Account, CartError> {
        self.accounts
            .find_by_email(email)
            .await?
            .ok_or(CartError::AccountNotFound)
    }

    /// Fetch a line and check it belongs to `account`.
    async fn owned_line(
        &self,
        account: &Account,
        line_id: CartLineId,
    ) -> Result<CartLine, CartError> {
        let line = self
            .carts
            .find_by_id(line_id)
            .await?
            .ok_or(CartError::LineNotFound)?;

        if line.account_id != account.id {
            return Err(CartError::Unauthorized);
        }
        Ok(line)
    }

    async fn view(&self, line: &CartLine) -> Result<CartLineView, CartError> {
        let product = self
            .products
            .find_by_id(line.product_id)
            .await?
            .ok_or_else(|| {
                CartError::Store(StoreError::DataCorruption(format!(
                    "cart line {} references missing product {}",
                    line.id, line.product_id
                )))
            })?;

        Ok(CartLineView::from_line(line, &product))
    }
}

const fn validate_quantity(quantity: i32) -> Result<(), CartError> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::db::NewAccount;
    use crate::db::memory::MemoryStore;
    use crate::models::product::ProductDraft;
    use crate::services::otp;

    struct Harness {
        cart: CartService,
        store: MemoryStore,
    }

    fn harness() -> Harness {
        let store = MemoryStore::new();
        let cart = CartService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        );
        Harness { cart, store }
    }

    async fn seed_account(store: &MemoryStore, email: &str) -> Email {
        let email = Email::parse(email).unwrap();
        AccountStore::insert(
            store,
            NewAccount {
                email: email.clone(),
                password_hash: "argon2-hash".to_owned(),
                otp_code: "123456".to_owned(),
                otp_expires_at: otp::expiry_from(Utc::now()),
            },
        )
        .await
        .unwrap();
        email
    }

    async fn seed_product(store: &MemoryStore, name: &str, price: &str) -> ProductId {
        store
            .seed_product(ProductDraft {
                name: name.to_owned(),
                description: String::new(),
                price: price.parse().unwrap(),
                stock: 100,
                category: "misc".to_owned(),
                image_url: None,
                rating: None,
            })
            .await
            .id
    }

    #[tokio::test]
    async fn test_add_then_add_merges_quantities() {
        let h = harness();
        let email = seed_account(&h.store, "a@x.com").await;
        let product = seed_product(&h.store, "Mug", "10.00").await;

        h.cart.add(&email, product, 2).await.unwrap();
        let view = h.cart.add(&email, product, 3).await.unwrap();
        assert_eq!(view.quantity, 5);

        let lines = h.cart.list(&email).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().unwrap().quantity, 5);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_adds_merge_into_one_line() {
        let h = harness();
        let email = seed_account(&h.store, "a@x.com").await;
        let product = seed_product(&h.store, "Mug", "10.00").await;

        let (c1, c2) = (h.cart.clone(), h.cart.clone());
        let (e1, e2) = (email.clone(), email.clone());
        let t1 = tokio::spawn(async move { c1.add(&e1, product, 1).await });
        let t2 = tokio::spawn(async move { c2.add(&e2, product, 1).await });
        t1.await.unwrap().unwrap();
        t2.await.unwrap().unwrap();

        let lines = h.cart.list(&email).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_adds_for_different_products_create_separate_lines() {
        let h = harness();
        let email = seed_account(&h.store, "a@x.com").await;
        let mug = seed_product(&h.store, "Mug", "10.00").await;
        let bowl = seed_product(&h.store, "Bowl", "15.00").await;

        h.cart.add(&email, mug, 1).await.unwrap();
        h.cart.add(&email, bowl, 2).await.unwrap();

        let lines = h.cart.list(&email).await.unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[tokio::test]
    async fn test_add_unknown_product_fails() {
        let h = harness();
        let email = seed_account(&h.store, "a@x.com").await;
        let err = h
            .cart
            .add(&email, ProductId::new(999), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::ProductNotFound));
    }

    #[tokio::test]
    async fn test_add_non_positive_quantity_fails() {
        let h = harness();
        let email = seed_account(&h.store, "a@x.com").await;
        let product = seed_product(&h.store, "Mug", "10.00").await;

        for quantity in [0, -1] {
            let err = h.cart.add(&email, product, quantity).await.unwrap_err();
            assert!(matches!(err, CartError::InvalidQuantity));
        }
    }

    #[tokio::test]
    async fn test_list_computes_line_total_from_current_price() {
        let h = harness();
        let email = seed_account(&h.store, "a@x.com").await;
        let product = seed_product(&h.store, "Mug", "19.99").await;

        h.cart.add(&email, product, 3).await.unwrap();
        let lines = h.cart.list(&email).await.unwrap();
        let line = lines.first().unwrap();
        assert_eq!(line.line_total, "59.97".parse::<Decimal>().unwrap());
    }

    #[tokio::test]
    async fn test_update_replaces_quantity() {
        let h = harness();
        let email = seed_account(&h.store, "a@x.com").await;
        let product = seed_product(&h.store, "Mug", "10.00").await;

        let view = h.cart.add(&email, product, 2).await.unwrap();
        let updated = h.cart.update(&email, view.id, 7).await.unwrap();
        // Replacement, not merge
        assert_eq!(updated.quantity, 7);
    }

    #[tokio::test]
    async fn test_update_to_zero_is_a_validation_error() {
        let h = harness();
        let email = seed_account(&h.store, "a@x.com").await;
        let product = seed_product(&h.store, "Mug", "10.00").await;

        let view = h.cart.add(&email, product, 2).await.unwrap();
        let err = h.cart.update(&email, view.id, 0).await.unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));

        // Line untouched, not implicitly removed
        let lines = h.cart.list(&email).await.unwrap();
        assert_eq!(lines.first().unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_update_by_non_owner_fails_and_changes_nothing() {
        let h = harness();
        let owner = seed_account(&h.store, "a@x.com").await;
        let other = seed_account(&h.store, "b@x.com").await;
        let product = seed_product(&h.store, "Mug", "10.00").await;

        let view = h.cart.add(&owner, product, 2).await.unwrap();
        let err = h.cart.update(&other, view.id, 9).await.unwrap_err();
        assert!(matches!(err, CartError::Unauthorized));

        let lines = h.cart.list(&owner).await.unwrap();
        assert_eq!(lines.first().unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_remove_by_non_owner_fails() {
        let h = harness();
        let owner = seed_account(&h.store, "a@x.com").await;
        let other = seed_account(&h.store, "b@x.com").await;
        let product = seed_product(&h.store, "Mug", "10.00").await;

        let view = h.cart.add(&owner, product, 1).await.unwrap();
        let err = h.cart.remove(&other, view.id).await.unwrap_err();
        assert!(matches!(err, CartError::Unauthorized));
        assert_eq!(h.cart.list(&owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_deletes_line() {
        let h = harness();
        let email = seed_account(&h.store, "a@x.com").await;
        let product = seed_product(&h.store, "Mug", "10.00").await;

        let view = h.cart.add(&email, product, 1).await.unwrap();
        h.cart.remove(&email, view.id).await.unwrap();
        assert!(h.cart.list(&email).await.unwrap().is_empty());

        let err = h.cart.remove(&email, view.id).await.unwrap_err();
        assert!(matches!(err, CartError::LineNotFound));
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let h = harness();
        let email = seed_account(&h.store, "a@x.com").await;
        let product = seed_product(&h.store, "Mug", "10.00").await;

        // Clearing an empty cart succeeds
        h.cart.clear(&email).await.unwrap();

        h.cart.add(&email, product, 2).await.unwrap();
        h.cart.clear(&email).await.unwrap();
        assert!(h.cart.list(&email).await.unwrap().is_empty());

        h.cart.clear(&email).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_subject_fails() {
        let h = harness();
        let email = Email::parse("ghost@x.com").unwrap();
        let err = h.cart.list(&email).await.unwrap_err();
        assert!(matches!(err, CartError::AccountNotFound));
    }
}
