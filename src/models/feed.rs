//! Feed and category models.

use serde::{Deserialize, Serialize};

/// A subscribed feed as reported to tool callers.
///
/// `url` is the feed's site URL, not the XML feed URL. Snapshots are fetched
/// fresh from the backend on every call and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub title: String,
    pub url: String,
}

/// A feed category on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub title: String,
}
