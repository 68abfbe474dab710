//! Nonogram Relay Core - Shared types and review decisions.
//!
//! Everything about a Nonogram review that can be decided without talking to
//! Discord or the database: which puzzle a message refers to, whether a member
//! may review it, and what approving or rejecting does to its record. The
//! `bot` and `cli` crates supply the I/O around these decisions.
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, statuses and submission records
//! - [`extract`] - Puzzle id extraction from message content and embeds
//! - [`permission`] - Admin eligibility of a reacting member
//! - [`review`] - Approve/reject state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod extract;
pub mod permission;
pub mod review;
pub mod types;

pub use extract::{EmbedView, extract_puzzle_id, has_identifier_signal};
pub use permission::MemberPermissions;
pub use review::{ReviewDecision, ReviewError, Transition};
pub use types::*;
