//! Tool handlers for the feed-reading tools.
//!
//! Each handler validates the raw call arguments against its declared
//! schema (unknown fields are ignored, missing required fields and
//! out-of-range values fail before any backend work), connects a backend
//! client scoped to this call's credential, and assembles the typed result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::tools::{CallContext, ToolError, ToolHandler};
use crate::backend::{BackendEntry, BackendProvider};
use crate::content::normalize_html;
use crate::filter::{resolve, EntryFilter, DEFAULT_LIMIT};
use crate::models::{Entry, EntryStatus, Feed};

/// Handler for listing subscribed feeds.
#[derive(Debug)]
pub struct GetFeedsHandler {
    pub provider: Arc<dyn BackendProvider>,
}

#[async_trait::async_trait]
impl ToolHandler for GetFeedsHandler {
    async fn execute(&self, ctx: &CallContext, _args: Value) -> Result<Value, ToolError> {
        let backend = self.provider.connect(ctx.credential())?;

        let feeds: Vec<Feed> = backend
            .feeds()
            .await?
            .into_iter()
            .map(|feed| Feed {
                id: feed.id,
                title: feed.title,
                url: feed.site_url,
            })
            .collect();

        Ok(serde_json::to_value(feeds)?)
    }
}

/// Handler for fetching a single entry by id.
#[derive(Debug)]
pub struct GetEntryHandler {
    pub provider: Arc<dyn BackendProvider>,
}

#[async_trait::async_trait]
impl ToolHandler for GetEntryHandler {
    async fn execute(&self, ctx: &CallContext, args: Value) -> Result<Value, ToolError> {
        let entry_id = require_i64(&args, "entryId")?;
        let backend = self.provider.connect(ctx.credential())?;

        let entry = backend.entry(entry_id).await?;
        let entry = to_public_entry(entry)?;

        Ok(serde_json::to_value(entry)?)
    }
}

/// Handler for listing entries with optional filters.
#[derive(Debug)]
pub struct GetEntriesHandler {
    pub provider: Arc<dyn BackendProvider>,
}

#[async_trait::async_trait]
impl ToolHandler for GetEntriesHandler {
    async fn execute(&self, ctx: &CallContext, args: Value) -> Result<Value, ToolError> {
        let filter = parse_entry_filter(&args)?;
        let backend = self.provider.connect(ctx.credential())?;

        let resolved = resolve(&filter, backend.as_ref()).await?;
        let entries = backend
            .entries(&resolved)
            .await?
            .into_iter()
            .map(to_public_entry)
            .collect::<Result<Vec<Entry>, ToolError>>()?;

        Ok(serde_json::to_value(entries)?)
    }
}

/// Normalize the backend entry's HTML body and map to the public shape.
fn to_public_entry(entry: BackendEntry) -> Result<Entry, ToolError> {
    let content = normalize_html(&entry.content)?;
    Ok(Entry {
        id: entry.id,
        title: entry.title,
        url: entry.url,
        content,
        status: entry.status,
        created_at: entry.created_at,
    })
}

/// Validate the `get_entries` arguments into filter criteria.
fn parse_entry_filter(args: &Value) -> Result<EntryFilter, ToolError> {
    let status = match optional_str(args, "status")? {
        Some(value) => Some(EntryStatus::parse(value).ok_or_else(|| {
            ToolError::InvalidParams(format!(
                "'status' must be one of unread, read, removed (got '{}')",
                value
            ))
        })?),
        None => None,
    };

    let limit = match optional_i64(args, "limit")? {
        Some(value) if value > 0 => value as usize,
        Some(value) => {
            return Err(ToolError::InvalidParams(format!(
                "'limit' must be a positive integer (got {})",
                value
            )))
        }
        None => DEFAULT_LIMIT,
    };

    Ok(EntryFilter {
        status,
        search: optional_str(args, "search")?.map(str::to_string),
        limit,
        category: optional_str(args, "category")?.map(str::to_string),
        feed: optional_str(args, "feed")?.map(str::to_string),
        published_after: optional_datetime(args, "publishedAfter")?,
        published_before: optional_datetime(args, "publishedBefore")?,
    })
}

fn require_i64(args: &Value, field: &str) -> Result<i64, ToolError> {
    args.get(field)
        .ok_or_else(|| ToolError::InvalidParams(format!("missing required field '{}'", field)))?
        .as_i64()
        .ok_or_else(|| ToolError::InvalidParams(format!("'{}' must be an integer", field)))
}

fn optional_i64(args: &Value, field: &str) -> Result<Option<i64>, ToolError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| ToolError::InvalidParams(format!("'{}' must be an integer", field))),
    }
}

fn optional_str<'a>(args: &'a Value, field: &str) -> Result<Option<&'a str>, ToolError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| ToolError::InvalidParams(format!("'{}' must be a string", field))),
    }
}

fn optional_datetime(args: &Value, field: &str) -> Result<Option<DateTime<Utc>>, ToolError> {
    match optional_str(args, field)? {
        None => Ok(None),
        Some(raw) => raw
            .parse::<DateTime<Utc>>()
            .map(Some)
            .map_err(|e| {
                ToolError::InvalidParams(format!(
                    "'{}' must be an RFC 3339 date-time: {}",
                    field, e
                ))
            }),
    }
}
