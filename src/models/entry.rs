//! Entry model and status enumeration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reading status of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Unread,
    Read,
    Removed,
}

impl EntryStatus {
    /// Wire representation used both on the tool surface and toward Miniflux.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Unread => "unread",
            EntryStatus::Read => "read",
            EntryStatus::Removed => "removed",
        }
    }

    /// Parse a status string, returning `None` for anything outside the enum.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unread" => Some(EntryStatus::Unread),
            "read" => Some(EntryStatus::Read),
            "removed" => Some(EntryStatus::Removed),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A feed entry as reported to tool callers.
///
/// `content` holds the normalized plain-text body, never raw HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub content: String,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
}
