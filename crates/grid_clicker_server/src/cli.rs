//! Command-line interface for grid-clicker.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Grid Clicker - save storage, statistics, and leaderboards
#[derive(Parser, Debug)]
#[command(name = "grid-clicker")]
#[command(about = "Backend for the Grid Clicker game", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "grid_clicker.toml")]
    pub config: PathBuf,

    /// Path to the database file (overrides config and environment)
    #[arg(long)]
    pub db_path: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to bind to (overrides config and environment)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Create the database and apply pending migrations
    Migrate,

    /// Recompute ranks in every category
    Rerank,

    /// Print a leaderboard as JSON
    Top {
        /// Category to show
        #[arg(long, default_value = "total_resources")]
        category: String,

        /// Number of rows
        #[arg(short, long)]
        limit: Option<usize>,
    },
}
