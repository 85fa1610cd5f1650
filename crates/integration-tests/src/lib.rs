//! Integration tests for the CC Automotive storefront API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! cargo run -p cc-automotive-cli -- migrate
//!
//! # Start the server
//! cargo run -p cc-automotive-storefront
//!
//! # Run the ignored end-to-end tests
//! cargo test -p cc-automotive-integration-tests -- --ignored
//! ```
//!
//! The server under test is addressed through `STOREFRONT_BASE_URL`
//! (default `http://localhost:5000`).

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// A signed-in test account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub token: String,
    pub user: AccountUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountUser {
    pub id: i32,
    pub username: String,
}

/// HTTP client pointed at a running storefront.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Build a context from `STOREFRONT_BASE_URL`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new() -> Self {
        let base_url = std::env::var("STOREFRONT_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string());
        let client = Client::builder()
            .build()
            .expect("Failed to create HTTP client");
        Self { client, base_url }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Register a fresh account with a unique username.
    ///
    /// # Panics
    ///
    /// Panics if registration does not return 201.
    pub async fn register(&self) -> Account {
        let username = format!("it-{}", Uuid::new_v4().simple());
        let resp = self
            .client
            .post(self.url("/api/register"))
            .header("x-forwarded-for", unique_ip())
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "correct horse battery",
            }))
            .send()
            .await
            .expect("Failed to register");

        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.expect("Invalid register response")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A documentation-range address that varies per call so auth rate limits
/// do not bleed between tests.
#[must_use]
pub fn unique_ip() -> String {
    let [a, b, ..] = Uuid::new_v4().into_bytes();
    format!("198.51.{a}.{b}")
}
