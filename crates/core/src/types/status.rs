//! Review status of a submitted Nonogram.

use serde::{Deserialize, Serialize};

/// Status stored on a pending Nonogram record.
///
/// Only `Pending` may transition, and only to one of the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NonogramStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl NonogramStatus {
    /// Whether no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The lowercase name used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for NonogramStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NonogramStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid nonogram status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            NonogramStatus::Pending,
            NonogramStatus::Approved,
            NonogramStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<NonogramStatus>(), Ok(status));
        }
        assert!("archived".parse::<NonogramStatus>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!NonogramStatus::Pending.is_terminal());
        assert!(NonogramStatus::Approved.is_terminal());
        assert!(NonogramStatus::Rejected.is_terminal());
    }
}
