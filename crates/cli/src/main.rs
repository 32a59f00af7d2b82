//! Eyewear CLI - Operator tools for the storefront.
//!
//! # Usage
//!
//! ```bash
//! # Check the backend answers with the storefront's configuration
//! eyewear-cli check
//!
//! # Search the catalog the way the storefront does
//! eyewear-cli search --query aviator --shape round --max-price 150
//!
//! # Compute PD from a landmarks JSON file
//! eyewear-cli pd landmarks.json
//! ```
//!
//! # Commands
//!
//! - `check` - Backend connectivity and catalog summary
//! - `search` - In-memory catalog search
//! - `pd` - Pupillary distance from iris landmarks

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "eyewear-cli")]
#[command(author, version, about = "Eyewear storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is reachable and summarise the catalog
    Check,
    /// Search the catalog
    Search {
        /// Free-text query (name, brand, description, colour)
        #[arg(short, long, default_value = "")]
        query: String,

        /// Category name
        #[arg(short, long)]
        category: Option<String>,

        /// Frame shape
        #[arg(short, long)]
        shape: Option<String>,

        /// Upper price bound in the catalog currency
        #[arg(long)]
        max_price: Option<Decimal>,

        /// Sort order (relevance, price-asc, price-desc, newest, rating)
        #[arg(long, default_value = "relevance")]
        sort: String,
    },
    /// Compute pupillary distance from a landmarks JSON file
    Pd {
        /// Path to a JSON file with `left_iris` and `right_iris`
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Check => commands::check::run().await?,
        Commands::Search {
            query,
            category,
            shape,
            max_price,
            sort,
        } => {
            let criteria = commands::search::criteria(query, category, shape, max_price, &sort);
            commands::search::run(&criteria).await?;
        }
        Commands::Pd { file } => commands::pd::run(&file).await?,
    }
    Ok(())
}
