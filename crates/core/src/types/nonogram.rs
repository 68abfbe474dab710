//! Nonogram submission records.
//!
//! A submission lives in the pending collection until an admin decides on
//! it. Approval copies it into the approved collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::{NonogramStatus, PuzzleId};

/// Keys the store manages itself; never copied from submission payloads.
const RESERVED_KEYS: &[&str] = &["status", "approvedAt"];

/// Submission fields as stored in a pending record.
///
/// Everything besides the display title and the two image URLs is opaque and
/// kept in `extra` so it can be copied verbatim on approval.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonogramFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NonogramFields {
    /// Parse fields from a stored JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a JSON object or a known
    /// field has the wrong type.
    pub fn from_document(document: Value) -> Result<Self, serde_json::Error> {
        let mut fields: Self = serde_json::from_value(document)?;
        for key in RESERVED_KEYS {
            fields.extra.remove(*key);
        }
        Ok(fields)
    }
}

/// A submission awaiting (or past) review.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingNonogram {
    pub id: PuzzleId,
    pub status: NonogramStatus,
    pub fields: NonogramFields,
}

impl PendingNonogram {
    /// Title to show in chat notices, falling back to the puzzle id.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.fields
            .title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| self.id.as_str())
    }
}

/// Fields of an approved copy.
///
/// Same shape as [`NonogramFields`] but with both URLs defaulted to `""`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cover_url: String,
    #[serde(default = "approved_status")]
    pub status: NonogramStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApprovedFields {
    /// Serialize into the stored JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if an opaque field cannot be represented as JSON.
    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// An approved copy that has not been written yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApprovedNonogram {
    pub id: PuzzleId,
    pub fields: ApprovedFields,
}

impl NewApprovedNonogram {
    /// Build the approved copy of a pending record.
    #[must_use]
    pub fn from_pending(record: &PendingNonogram) -> Self {
        let mut extra = record.fields.extra.clone();
        for key in RESERVED_KEYS {
            extra.remove(*key);
        }

        Self {
            id: record.id.clone(),
            fields: ApprovedFields {
                title: record.fields.title.clone(),
                image_url: record.fields.image_url.clone().unwrap_or_default(),
                cover_url: record.fields.cover_url.clone().unwrap_or_default(),
                status: NonogramStatus::Approved,
                extra,
            },
        }
    }
}

/// An approved copy as stored, stamped by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovedNonogram {
    pub id: PuzzleId,
    pub fields: ApprovedFields,
    pub approved_at: DateTime<Utc>,
}

const fn approved_status() -> NonogramStatus {
    NonogramStatus::Approved
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
