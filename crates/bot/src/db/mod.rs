//! Document store for Nonogram submissions.
//!
//! # Tables
//!
//! - `pending_nonograms` - Every submission with its review status (JSONB data)
//! - `approved_nonograms` - Published copies of approved submissions
//!
//! # Migrations
//!
//! Migrations are stored in `crates/bot/migrations/` and run via:
//! ```bash
//! cargo run -p nonogram-relay-cli -- migrate
//! ```

pub mod nonograms;

use std::time::Duration;

use async_trait::async_trait;
use nonogram_relay_core::{
    ApprovedNonogram, NewApprovedNonogram, NonogramStatus, PendingNonogram, PuzzleId,
};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use nonograms::PgNonogramRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., an approved copy already exists).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The record left the pending state before the write landed.
    #[error("nonogram is no longer pending (status: {0})")]
    NotPending(NonogramStatus),
}

/// Storage for pending and approved Nonograms.
#[async_trait]
pub trait NonogramRepository: Send + Sync {
    /// Load a pending record by id, whatever its status.
    async fn get_pending(&self, id: &PuzzleId) -> Result<Option<PendingNonogram>, RepositoryError>;

    /// Load the approved copy of a puzzle.
    async fn get_approved(&self, id: &PuzzleId)
    -> Result<Option<ApprovedNonogram>, RepositoryError>;

    /// Mark the pending record approved and create its approved copy, both
    /// or neither. Only succeeds while the record is still pending.
    async fn approve(
        &self,
        approved: NewApprovedNonogram,
    ) -> Result<ApprovedNonogram, RepositoryError>;

    /// Mark the pending record rejected. Only succeeds while it is pending.
    async fn reject(&self, id: &PuzzleId) -> Result<(), RepositoryError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
