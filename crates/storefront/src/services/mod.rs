//! Business logic services.

pub mod auth;
pub mod cart;
pub mod email;
pub mod otp;
pub mod token;
