//! Newtype IDs for type-safe entity references.
//!
//! Discord snowflakes travel as decimal strings on the wire, so the
//! `define_snowflake!` wrappers are string-backed. Mixing a `ChannelId` with a
//! `MessageId` is a compile error.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe Discord snowflake wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<u64>` (gateway models use numeric ids) and `Display`
///
/// # Example
///
/// ```rust
/// # use nonogram_relay_core::define_snowflake;
/// define_snowflake!(ThreadId);
///
/// let thread = ThreadId::from(42_u64);
/// assert_eq!(thread.as_str(), "42");
/// ```
#[macro_export]
macro_rules! define_snowflake {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from its string form.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id.to_string())
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

define_snowflake!(ChannelId);
define_snowflake!(MessageId);
define_snowflake!(GuildId);
define_snowflake!(UserId);
define_snowflake!(RoleId);
define_snowflake!(WebhookId);

/// Identifier of a submitted Nonogram puzzle.
///
/// Canonical ids look like `puzzle_<digits>`, but an id taken from an embed
/// field is kept verbatim, so construction does not validate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PuzzleId(String);

impl PuzzleId {
    /// Prefix shared by all canonical puzzle ids.
    pub const PREFIX: &'static str = "puzzle_";

    /// Wrap a raw id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id has the canonical `puzzle_<digits>` shape.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.0
            .strip_prefix(Self::PREFIX)
            .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
    }
}

impl fmt::Display for PuzzleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PuzzleId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_from_u64() {
        let channel = ChannelId::from(1_236_906_035_932_041_286_u64);
        assert_eq!(channel.as_str(), "1236906035932041286");
        assert_eq!(channel.to_string(), "1236906035932041286");
    }

    #[test]
    fn test_snowflake_serde_is_transparent() {
        let id: MessageId = serde_json::from_str("\"123\"").expect("valid json");
        assert_eq!(id, MessageId::new("123"));
        assert_eq!(serde_json::to_string(&id).expect("serializable"), "\"123\"");
    }

    #[test]
    fn test_puzzle_id_canonical() {
        assert!(PuzzleId::from("puzzle_7").is_canonical());
        assert!(PuzzleId::from("puzzle_1700000000000").is_canonical());
        assert!(!PuzzleId::from("puzzle_").is_canonical());
        assert!(!PuzzleId::from("puzzle_7a").is_canonical());
        assert!(!PuzzleId::from("custom-id").is_canonical());
    }
}
