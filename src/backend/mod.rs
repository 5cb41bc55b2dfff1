//! Read-only backend contract for the Miniflux API.
//!
//! The server consumes the feed reader through the narrow [`Backend`] trait;
//! everything Miniflux does beyond listing feeds, categories and entries is
//! out of scope. Clients are produced per tool call by a [`BackendProvider`]
//! from that call's credential and dropped when the call completes.

mod miniflux;
pub mod mock;

pub use miniflux::{MinifluxClient, MinifluxProvider};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::filter::ResolvedFilter;
use crate::models::{Category, EntryStatus};

/// A feed as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendFeed {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub site_url: String,
}

/// An entry as the backend reports it. `content` is raw HTML at this layer;
/// normalization happens in the tool handlers before anything leaves the
/// server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendEntry {
    pub id: i64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
}

/// Errors from the backend collaborator. Any of these fails the single tool
/// call it occurred in; there is no retry and no partial result.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The configured base URL is not a valid URL
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success response from the backend
    #[error("API error: {0}")]
    Api(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Read operations the server needs from the feed reader.
#[async_trait]
pub trait Backend: Send + Sync {
    /// List all subscribed feeds.
    async fn feeds(&self) -> Result<Vec<BackendFeed>, BackendError>;

    /// List all categories.
    async fn categories(&self) -> Result<Vec<Category>, BackendError>;

    /// Fetch a single entry by id.
    async fn entry(&self, id: i64) -> Result<BackendEntry, BackendError>;

    /// List entries matching a resolved filter.
    async fn entries(&self, filter: &ResolvedFilter) -> Result<Vec<BackendEntry>, BackendError>;
}

/// Produces a [`Backend`] scoped to a single call's credential.
///
/// The credential lives for exactly one tool call: it is never stored,
/// cached or logged, and the client built from it is discarded with the
/// call.
pub trait BackendProvider: Send + Sync + std::fmt::Debug {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn Backend>, BackendError>;
}
