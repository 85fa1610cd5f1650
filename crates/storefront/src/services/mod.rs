//! Business logic services for the storefront API.
//!
//! # Services
//!
//! - `auth` - Accounts, password login, bearer token issue and verification
//! - `orders` - Order validation, payment authorization and persistence
//! - `payments` - Payment processor client (Stripe)
//! - `seller` - Seller dashboard statistics and product listings

pub mod auth;
pub mod orders;
pub mod payments;
pub mod seller;
