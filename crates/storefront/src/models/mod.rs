//! Domain types for the storefront.
//!
//! These types represent validated domain objects separate from database
//! row types and request/response DTOs.

pub mod account;
pub mod cart;
pub mod product;

pub use account::Account;
pub use cart::{CartLine, CartLineView};
pub use product::Product;
