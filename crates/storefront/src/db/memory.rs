//! In-memory implementation of the storage contracts.
//!
//! Backs the service and router tests; no persistence. All state lives
//! behind a single async mutex, so the check-then-act sequence inside
//! [`CartStore::upsert_add`] runs as one critical section and satisfies
//! the same no-lost-update guarantee as the `PostgreSQL` upsert.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use gildedcart_core::{AccountId, CartLineId, Email, ProductId};

use super::{AccountStore, CartStore, NewAccount, ProductStore, StoreError};
use crate::models::product::ProductDraft;
use crate::models::{Account, CartLine, Product};

#[derive(Default)]
struct State {
    accounts: BTreeMap<i64, Account>,
    products: BTreeMap<i64, Product>,
    lines: BTreeMap<i64, CartLine>,
    next_account_id: i64,
    next_product_id: i64,
    next_line_id: i64,
}

/// In-memory store implementing all three storage contracts.
///
/// Cheaply cloneable; clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a product directly, bypassing the draft path. Test helper.
    pub async fn seed_product(&self, draft: ProductDraft) -> Product {
        let mut state = self.state.lock().await;
        state.insert_product(draft)
    }
}

impl State {
    fn insert_product(&mut self, draft: ProductDraft) -> Product {
        self.next_product_id += 1;
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(self.next_product_id),
            name: draft.name,
            description: draft.description,
            price: draft.price,
            stock: draft.stock,
            category: draft.category,
            image_url: draft.image_url,
            rating: draft.rating,
            created_at: now,
            updated_at: now,
        };
        self.products.insert(product.id.as_i64(), product.clone());
        product
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.email == *email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> Result<bool, StoreError> {
        let state = self.state.lock().await;
        Ok(state.accounts.values().any(|a| a.email == *email))
    }

    async fn insert(&self, new: NewAccount) -> Result<Account, StoreError> {
        let mut state = self.state.lock().await;
        if state.accounts.values().any(|a| a.email == new.email) {
            return Err(StoreError::Conflict("email already exists".to_owned()));
        }

        state.next_account_id += 1;
        let now = Utc::now();
        let account = Account {
            id: AccountId::new(state.next_account_id),
            email: new.email,
            password_hash: new.password_hash,
            verified: false,
            otp_code: Some(new.otp_code),
            otp_expires_at: Some(new.otp_expires_at),
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(account.id.as_i64(), account.clone());
        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let Some(slot) = state.accounts.get_mut(&account.id.as_i64()) else {
            return Err(StoreError::NotFound);
        };
        let mut updated = account.clone();
        updated.updated_at = Utc::now();
        *slot = updated;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.products.get(&id.as_i64()).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.products.values().cloned().collect())
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .values()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }

    async fn search_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError> {
        let needle = name.to_lowercase();
        let state = self.state.lock().await;
        Ok(state
            .products
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.insert_product(draft))
    }

    async fn update(&self, id: ProductId, draft: ProductDraft) -> Result<Product, StoreError> {
        let mut state = self.state.lock().await;
        let Some(product) = state.products.get_mut(&id.as_i64()) else {
            return Err(StoreError::NotFound);
        };
        product.name = draft.name;
        product.description = draft.description;
        product.price = draft.price;
        product.stock = draft.stock;
        product.category = draft.category;
        product.image_url = draft.image_url;
        product.rating = draft.rating;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .products
            .remove(&id.as_i64())
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn find_by_account(&self, account_id: AccountId) -> Result<Vec<CartLine>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .lines
            .values()
            .filter(|l| l.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn find_by_account_and_product(
        &self,
        account_id: AccountId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .lines
            .values()
            .find(|l| l.account_id == account_id && l.product_id == product_id)
            .cloned())
    }

    async fn find_by_id(&self, id: CartLineId) -> Result<Option<CartLine>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.lines.get(&id.as_i64()).cloned())
    }

    async fn upsert_add(
        &self,
        account_id: AccountId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, StoreError> {
        // Entire check-then-act sequence under one lock: no lost update.
        let mut state = self.state.lock().await;

        if let Some(line) = state
            .lines
            .values_mut()
            .find(|l| l.account_id == account_id && l.product_id == product_id)
        {
            line.quantity += quantity;
            line.updated_at = Utc::now();
            return Ok(line.clone());
        }

        state.next_line_id += 1;
        let now = Utc::now();
        let line = CartLine {
            id: CartLineId::new(state.next_line_id),
            account_id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        };
        state.lines.insert(line.id.as_i64(), line.clone());
        Ok(line)
    }

    async fn update_quantity(&self, id: CartLineId, quantity: i32) -> Result<CartLine, StoreError> {
        let mut state = self.state.lock().await;
        let Some(line) = state.lines.get_mut(&id.as_i64()) else {
            return Err(StoreError::NotFound);
        };
        line.quantity = quantity;
        line.updated_at = Utc::now();
        Ok(line.clone())
    }

    async fn delete(&self, id: CartLineId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .lines
            .remove(&id.as_i64())
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn delete_all_by_account(&self, account_id: AccountId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.lines.retain(|_, l| l.account_id != account_id);
        Ok(())
    }
}
