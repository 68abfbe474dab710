//! CLI subcommands.

pub mod migrate;
pub mod show;

use secrecy::SecretString;

/// Read `DATABASE_URL`, loading `.env` first if present.
pub fn database_url() -> Result<SecretString, CommandError> {
    let _ = dotenvy::dotenv();

    std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| !url.is_empty())
        .map(SecretString::from)
        .ok_or(CommandError::MissingEnvVar("DATABASE_URL"))
}

/// Errors shared by the subcommands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store error: {0}")]
    Repository(#[from] nonogram_relay_bot::db::RepositoryError),
}
