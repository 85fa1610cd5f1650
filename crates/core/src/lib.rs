//! CC Automotive Core - Shared domain types.
//!
//! This crate provides the types exchanged across the CC Automotive workspace:
//! - `storefront` - REST API for the catalog, orders and seller back office
//! - `cli` - Command-line tools for migrations and catalog inspection
//!
//! # Architecture
//!
//! The core crate contains only types and small pure helpers - no I/O, no
//! database access, no HTTP clients. Database encodings are available behind
//! the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, money helpers, statuses, products, orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
