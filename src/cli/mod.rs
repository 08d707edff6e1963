//! CLI module for the Catalog Data API
//!
//! Subcommands:
//! - `serve`: HTTP server (default)
//! - `migrate`: apply or revert PostgreSQL schema migrations
//! - `seed` / `truncate`: bulk dataset operations without the server

pub mod dataset;
pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Catalog Data API - cached, paginated catalog reads
#[derive(Parser)]
#[command(name = "catalog-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Apply pending schema migrations
    Migrate(migrate::MigrateArgs),

    /// Populate the catalog with synthetic data
    Seed(dataset::SeedArgs),

    /// Delete every order, user and product
    Truncate,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}
