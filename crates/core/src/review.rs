//! Approve/reject state machine for pending Nonograms.
//!
//! ```text
//! pending ──approve──▶ approved   (+ approved copy)
//!    │
//!    └─────reject────▶ rejected
//! ```
//!
//! Both targets are terminal. Deciding on a terminal record is reported as
//! [`ReviewError::AlreadyProcessed`] and produces no writes.

use thiserror::Error;

use crate::types::{NewApprovedNonogram, NonogramStatus, PendingNonogram, PuzzleId};

/// Reaction emoji that approves a submission.
pub const APPROVE_EMOJI: &str = "✅";

/// Reaction emoji that rejects a submission.
pub const REJECT_EMOJI: &str = "❌";

/// An admin's decision on a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    /// Both decisions, in the order their markers are attached.
    pub const ALL: [Self; 2] = [Self::Approve, Self::Reject];

    /// Map a reaction emoji to a decision. Only the exact markers count.
    #[must_use]
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        match emoji {
            APPROVE_EMOJI => Some(Self::Approve),
            REJECT_EMOJI => Some(Self::Reject),
            _ => None,
        }
    }

    /// The marker emoji for this decision.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Approve => APPROVE_EMOJI,
            Self::Reject => REJECT_EMOJI,
        }
    }

    /// Status the record ends up in.
    #[must_use]
    pub const fn target_status(self) -> NonogramStatus {
        match self {
            Self::Approve => NonogramStatus::Approved,
            Self::Reject => NonogramStatus::Rejected,
        }
    }
}

/// Why a decision could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    /// No pending record exists for the id.
    #[error("no pending nonogram found")]
    NotFound,

    /// The record already left the pending state.
    #[error("nonogram already processed (status: {0})")]
    AlreadyProcessed(NonogramStatus),
}

/// The writes a decision requires.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub puzzle_id: PuzzleId,
    pub decision: ReviewDecision,
    /// New status of the pending record.
    pub status: NonogramStatus,
    /// Approved copy to create, present only when approving.
    pub approved: Option<NewApprovedNonogram>,
}

/// Decide what happens to `record` under `decision`.
///
/// # Errors
///
/// Returns [`ReviewError::NotFound`] when there is no record and
/// [`ReviewError::AlreadyProcessed`] when it is not pending.
pub fn apply(
    record: Option<&PendingNonogram>,
    decision: ReviewDecision,
) -> Result<Transition, ReviewError> {
    let record = record.ok_or(ReviewError::NotFound)?;

    if record.status.is_terminal() {
        return Err(ReviewError::AlreadyProcessed(record.status));
    }

    let approved = match decision {
        ReviewDecision::Approve => Some(NewApprovedNonogram::from_pending(record)),
        ReviewDecision::Reject => None,
    };

    Ok(Transition {
        puzzle_id: record.id.clone(),
        decision,
        status: decision.target_status(),
        approved,
    })
}
