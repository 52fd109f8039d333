//! Reviews CLI - Database migrations and seed data.
//!
//! # Usage
//!
//! ```bash
//! # Create the reviews and session tables
//! reviews-cli migrate
//!
//! # Insert demo users, a product and three reviews
//! reviews-cli seed
//!
//! # Same, with other ratings
//! reviews-cli seed --ratings 5,5,2,4
//! ```
//!
//! Both commands read `REVIEWS_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "reviews-cli")]
#[command(author, version, about = "Product reviews CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (reviews schema and session store)
    Migrate,
    /// Seed the database with demo data
    Seed {
        /// Ratings of the demo product's reviews
        #[arg(long, value_delimiter = ',', default_values_t = [4, 5, 3])]
        ratings: Vec<i64>,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { ratings } => {
            commands::seed::demo(&ratings).await?;
        }
    }
    Ok(())
}
