//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! nonogram-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Migrations live in `crates/bot/migrations/`.

use nonogram_relay_bot::db;

use super::{CommandError, database_url};

/// Run the bot's database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../bot/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
