//! Domain models local to the storefront API.

pub mod session;
pub mod user;

pub use session::Session;
pub use user::{CurrentUser, User};
