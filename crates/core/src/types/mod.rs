//! Core types for the Nonogram relay.
//!
//! This module provides type-safe wrappers for Discord ids, puzzle ids,
//! review statuses and submission records.

pub mod id;
pub mod nonogram;
pub mod status;

pub use id::*;
pub use nonogram::{
    ApprovedFields, ApprovedNonogram, NewApprovedNonogram, NonogramFields, PendingNonogram,
};
pub use status::NonogramStatus;
