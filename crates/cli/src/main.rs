//! Nonogram Relay CLI - Database migrations and inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! nonogram-cli migrate
//!
//! # Show the review state of a puzzle
//! nonogram-cli show puzzle_42
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `show` - Print the pending and approved records of a puzzle

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "nonogram-cli")]
#[command(author, version, about = "Nonogram Relay CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Show the review state of a puzzle
    Show {
        /// Puzzle id, e.g. `puzzle_42`
        puzzle_id: String,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Show { puzzle_id } => commands::show::run(&puzzle_id).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_show() {
        let cli = Cli::try_parse_from(["nonogram-cli", "show", "puzzle_42"]).expect("valid args");
        assert!(matches!(cli.command, Commands::Show { puzzle_id } if puzzle_id == "puzzle_42"));
    }

    #[test]
    fn test_show_requires_id() {
        assert!(Cli::try_parse_from(["nonogram-cli", "show"]).is_err());
    }
}
