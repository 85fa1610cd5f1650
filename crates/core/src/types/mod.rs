//! Core types for CC Automotive.
//!
//! This module provides type-safe wrappers and records for the storefront domain.

pub mod email;
pub mod id;
pub mod money;
pub mod order;
pub mod product;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{AmountError, MAX_STORED_AMOUNT, parse_amount, to_minor_units, to_stored_amount};
pub use order::{Order, OrderItem, SellerStats};
pub use product::{
    CompatibilityFilter, PriceRange, Product, ProductFilter, SortKey, UnknownSortKey,
};
pub use status::*;
