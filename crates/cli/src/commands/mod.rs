//! CLI subcommand implementations.

pub mod catalog;
pub mod migrate;
pub mod seller;

/// Read the storefront database URL, preferring `CC_DATABASE_URL`.
pub(crate) fn database_url() -> Option<String> {
    std::env::var("CC_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}
