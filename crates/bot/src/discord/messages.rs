//! Notice builders for the review flow.
//!
//! Every notice is plain text posted to the review channel.

use nonogram_relay_core::ReviewDecision;

/// Posted when someone without review rights reacts with a marker.
#[must_use]
pub fn build_denied_message(user_tag: &str) -> String {
    format!("{user_tag}, you need the Admin role to approve or reject Nonograms.")
}

/// Posted when a reacted message carries no recognizable puzzle id.
#[must_use]
pub const fn build_missing_id_message() -> &'static str {
    "Could not find a Nonogram ID in this message."
}

/// Posted when the id has no pending record.
#[must_use]
pub const fn build_not_found_message() -> &'static str {
    "No pending Nonogram found to review."
}

/// Posted when the record was already approved or rejected.
#[must_use]
pub const fn build_already_processed_message() -> &'static str {
    "This Nonogram has already been processed."
}

/// Posted after a successful decision.
#[must_use]
pub fn build_decision_message(decision: ReviewDecision, title: &str, user_tag: &str) -> String {
    match decision {
        ReviewDecision::Approve => format!("Nonogram \"{title}\" was approved by {user_tag}!"),
        ReviewDecision::Reject => format!("Nonogram \"{title}\" was rejected by {user_tag}."),
    }
}

/// Posted when the store failed mid-review.
#[must_use]
pub const fn build_error_message() -> &'static str {
    "An error occurred while processing the Nonogram."
}
