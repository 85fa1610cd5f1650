//! CC Automotive CLI - Database migrations and operational tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! cc-cli migrate
//!
//! # Fetch the product feed once and summarize it
//! cc-cli catalog summary
//! cc-cli catalog summary --url https://feeds.example.com/parts.json
//!
//! # Print a seller's dashboard statistics as JSON
//! cc-cli seller stats 42
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `catalog summary` - Inspect the product feed
//! - `seller stats` - Seller dashboard figures

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cc-cli")]
#[command(author, version, about = "CC Automotive CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Inspect the product feed
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Seller reporting
    Seller {
        #[command(subcommand)]
        action: SellerAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Fetch the feed and log product count, facets and price range
    Summary {
        /// Feed URL (defaults to `CATALOG_FEED_URL`)
        #[arg(short, long)]
        url: Option<String>,
    },
}

#[derive(Subcommand)]
enum SellerAction {
    /// Print dashboard statistics for a seller
    Stats {
        /// Seller user ID
        user_id: i32,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Catalog { action } => match action {
            CatalogAction::Summary { url } => commands::catalog::summary(url).await?,
        },
        Commands::Seller { action } => match action {
            SellerAction::Stats { user_id } => commands::seller::stats(user_id).await?,
        },
    }
    Ok(())
}
