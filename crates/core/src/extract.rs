//! Puzzle id extraction from submission messages.
//!
//! Submissions carry their id in one of three places, checked in order:
//!
//! 1. an embed field named `ID` (any case), value taken verbatim
//! 2. an embed description containing `ID: puzzle_<digits>`
//! 3. the message content, where the `ID` label may be wrapped in `**`
//!
//! Embeds are authoritative: content is only consulted when no embed matched.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::PuzzleId;

/// `ID`, optional ASCII or full-width colon, whitespace, then the id.
static DESCRIPTION_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ID[:：]?\s*(puzzle_[0-9]+)").expect("Invalid regex")
});

/// Same as [`DESCRIPTION_ID_RE`] but tolerates `**ID:**` markdown bold.
static CONTENT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*{0,2}ID[:：]?\*{0,2}\s*(puzzle_[0-9]+)").expect("Invalid regex")
});

/// Read access to the parts of an embed the extractor looks at.
pub trait EmbedView {
    /// `(name, value)` pairs of the embed's fields, in display order.
    fn fields(&self) -> impl Iterator<Item = (&str, &str)>;

    /// Free-text description, if any.
    fn description(&self) -> Option<&str>;
}

/// Extract the puzzle id from a message.
///
/// Returns `None` when neither the embeds nor the content carry an id.
#[must_use]
pub fn extract_puzzle_id<E: EmbedView>(content: &str, embeds: &[E]) -> Option<PuzzleId> {
    embeds
        .iter()
        .find_map(|embed| {
            id_field(embed)
                .map(PuzzleId::from)
                .or_else(|| embed.description().and_then(|d| capture(&DESCRIPTION_ID_RE, d)))
        })
        .or_else(|| capture(&CONTENT_ID_RE, content))
}

/// Whether a message looks like a submission at all.
///
/// Looser than [`extract_puzzle_id`] for embeds (an `id` field with any value
/// counts) and stricter for content (no bold markup allowed around `ID`).
#[must_use]
pub fn has_identifier_signal<E: EmbedView>(content: &str, embeds: &[E]) -> bool {
    embeds.iter().any(|embed| {
        id_field(embed).is_some()
            || embed
                .description()
                .is_some_and(|d| DESCRIPTION_ID_RE.is_match(d))
    }) || DESCRIPTION_ID_RE.is_match(content)
}

fn id_field<E: EmbedView>(embed: &E) -> Option<&str> {
    embed
        .fields()
        .find(|(name, _)| name.eq_ignore_ascii_case("id"))
        .map(|(_, value)| value)
}

fn capture(re: &Regex, haystack: &str) -> Option<PuzzleId> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| PuzzleId::from(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TestEmbed {
        fields: Vec<(String, String)>,
        description: Option<String>,
    }

    impl TestEmbed {
        fn field(name: &str, value: &str) -> Self {
            Self {
                fields: vec![(name.to_string(), value.to_string())],
                description: None,
            }
        }

        fn with_description(text: &str) -> Self {
            Self {
                fields: Vec::new(),
                description: Some(text.to_string()),
            }
        }
    }

    impl EmbedView for TestEmbed {
        fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
            self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
        }

        fn description(&self) -> Option<&str> {
            self.description.as_deref()
        }
    }

    const NO_EMBEDS: &[TestEmbed] = &[];

    #[test]
    fn test_extract_from_content() {
        assert_eq!(
            extract_puzzle_id("New puzzle ID: puzzle_42 submitted", NO_EMBEDS),
            Some(PuzzleId::from("puzzle_42"))
        );
        assert_eq!(extract_puzzle_id("no id here", NO_EMBEDS), None);
    }

    #[test]
    fn test_extract_content_variants() {
        let cases = [
            ("ID:puzzle_1", "puzzle_1"),
            ("ID：puzzle_2", "puzzle_2"),
            ("id puzzle_3", "puzzle_3"),
            ("**ID:** puzzle_4", "puzzle_4"),
            ("**ID** puzzle_5", "puzzle_5"),
            ("ID\n  puzzle_6", "puzzle_6"),
        ];
        for (content, expected) in cases {
            assert_eq!(
                extract_puzzle_id(content, NO_EMBEDS),
                Some(PuzzleId::from(expected)),
                "content: {content:?}"
            );
        }
    }

    #[test]
    fn test_field_takes_precedence_over_everything() {
        let embed = TestEmbed {
            fields: vec![
                ("Title".to_string(), "Cat".to_string()),
                ("iD".to_string(), "custom-value".to_string()),
            ],
            description: Some("ID: puzzle_99".to_string()),
        };

        assert_eq!(
            extract_puzzle_id("ID: puzzle_1", &[embed]),
            Some(PuzzleId::from("custom-value"))
        );
    }

    #[test]
    fn test_description_beats_content() {
        let embeds = [TestEmbed::with_description("Submitted. ID: puzzle_12")];
        assert_eq!(
            extract_puzzle_id("ID: puzzle_1", &embeds),
            Some(PuzzleId::from("puzzle_12"))
        );
    }

    #[test]
    fn test_embeds_scanned_in_order() {
        let embeds = [
            TestEmbed::with_description("ID: puzzle_10"),
            TestEmbed::field("ID", "puzzle_20"),
        ];
        assert_eq!(
            extract_puzzle_id("", &embeds),
            Some(PuzzleId::from("puzzle_10"))
        );
    }

    #[test]
    fn test_falls_back_to_content_when_embeds_lack_id() {
        let embeds = [TestEmbed::field("Title", "Cat"), TestEmbed::default()];
        assert_eq!(
            extract_puzzle_id("**ID:** puzzle_8", &embeds),
            Some(PuzzleId::from("puzzle_8"))
        );
    }

    #[test]
    fn test_signal_accepts_any_id_field() {
        let embeds = [TestEmbed::field("Id", "")];
        assert!(has_identifier_signal("", &embeds));
    }

    #[test]
    fn test_signal_rejects_bold_content() {
        assert!(!has_identifier_signal("**ID:** puzzle_9", NO_EMBEDS));
        assert!(has_identifier_signal("ID: puzzle_9", NO_EMBEDS));
        assert_eq!(
            extract_puzzle_id("**ID:** puzzle_9", NO_EMBEDS),
            Some(PuzzleId::from("puzzle_9"))
        );
    }

    #[test]
    fn test_signal_absent() {
        let embeds = [TestEmbed::with_description("A lovely cat picture")];
        assert!(!has_identifier_signal("hello", &embeds));
    }
}
