//! Core domain types.
//!
//! - [`email`] - Validated email address newtype
//! - [`id`] - Type-safe entity ID newtypes

pub mod email;
pub mod id;

pub use email::{Email, EmailError};
pub use id::{AccountId, CartLineId, ProductId};
