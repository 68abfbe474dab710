//! Show the review state of one puzzle.
//!
//! ```bash
//! nonogram-cli show puzzle_42
//! ```

use nonogram_relay_bot::db::{self, NonogramRepository, PgNonogramRepository};
use nonogram_relay_core::PuzzleId;

use super::{CommandError, database_url};

/// Print the pending record and approved copy of `puzzle_id`.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a record is corrupt.
#[allow(clippy::print_stdout)]
pub async fn run(puzzle_id: &str) -> Result<(), CommandError> {
    let id = PuzzleId::from(puzzle_id);
    if !id.is_canonical() {
        tracing::warn!("{id} does not look like puzzle_<digits>");
    }

    let pool = db::create_pool(&database_url()?).await?;
    let repository = PgNonogramRepository::new(pool);

    match repository.get_pending(&id).await? {
        Some(record) => {
            println!("{id}");
            println!("  title:    {}", record.display_title());
            println!("  status:   {}", record.status);
        }
        None => println!("{id}: no pending record"),
    }

    if let Some(approved) = repository.get_approved(&id).await? {
        println!("  approved: {}", approved.approved_at.to_rfc3339());
        println!("  image:    {}", approved.fields.image_url);
    }

    Ok(())
}
