//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::postgres::{PgAccountStore, PgCartStore, PgProductStore};
use crate::db::{AccountStore, CartStore, ProductStore};
use crate::services::auth::AuthService;
use crate::services::cart::CartService;
use crate::services::email::{Mailer, SmtpMailer};
use crate::services::otp::{CodeGenerator, RandomCodes};
use crate::services::token::TokenIssuer;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the services and the database pool.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    auth: AuthService,
    cart: CartService,
    products: Arc<dyn ProductStore>,
    tokens: TokenIssuer,
    /// Absent when the state is assembled over in-memory stores.
    pool: Option<PgPool>,
}

impl AppState {
    /// Create application state wired to `PostgreSQL` stores and SMTP mail.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay parameters are invalid.
    pub fn new(
        config: &StorefrontConfig,
        pool: PgPool,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let accounts: Arc<dyn AccountStore> = Arc::new(PgAccountStore::new(pool.clone()));
        let products: Arc<dyn ProductStore> = Arc::new(PgProductStore::new(pool.clone()));
        let carts: Arc<dyn CartStore> = Arc::new(PgCartStore::new(pool.clone()));
        let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(&config.email)?);
        let tokens = TokenIssuer::new(&config.token_secret);

        Ok(Self::assemble(
            accounts,
            products,
            carts,
            mailer,
            Arc::new(RandomCodes),
            tokens,
            Some(pool),
        ))
    }

    /// Assemble state from explicit components. Lets tests substitute
    /// in-memory stores and recording mailers.
    #[must_use]
    pub fn assemble(
        accounts: Arc<dyn AccountStore>,
        products: Arc<dyn ProductStore>,
        carts: Arc<dyn CartStore>,
        mailer: Arc<dyn Mailer>,
        codes: Arc<dyn CodeGenerator>,
        tokens: TokenIssuer,
        pool: Option<PgPool>,
    ) -> Self {
        let auth = AuthService::new(Arc::clone(&accounts), mailer, codes, tokens.clone());
        let cart = CartService::new(accounts, Arc::clone(&products), carts);

        Self {
            inner: Arc::new(AppStateInner {
                auth,
                cart,
                products,
                tokens,
                pool,
            }),
        }
    }

    /// Get a reference to the identity lifecycle service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    /// Get a reference to the product store.
    #[must_use]
    pub fn products(&self) -> &Arc<dyn ProductStore> {
        &self.inner.products
    }

    /// Get a reference to the token issuer.
    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }

    /// Get the database connection pool, if this state is database-backed.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
