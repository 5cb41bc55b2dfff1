//! Entry filter criteria and resolution.
//!
//! Callers select entries by human-readable names (category title, feed
//! title) and RFC 3339 timestamps; Miniflux wants numeric ids and epoch
//! seconds. [`resolve`] bridges the two with catalog lookups against the
//! backend. A name that matches nothing resolves to 0, which the backend
//! treats as "no constraint". A miss is never an error.

use chrono::{DateTime, Utc};

use crate::backend::{Backend, BackendError};
use crate::models::EntryStatus;

/// Default result-count limit when the caller does not supply one.
pub const DEFAULT_LIMIT: usize = 100;

/// Entry ordering is not caller-configurable: always ascending by
/// publication time.
pub const ORDER: &str = "published_at";
pub const DIRECTION: &str = "asc";

/// Filter criteria as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFilter {
    pub status: Option<EntryStatus>,
    pub search: Option<String>,
    pub limit: usize,
    pub category: Option<String>,
    pub feed: Option<String>,
    pub published_after: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            limit: DEFAULT_LIMIT,
            category: None,
            feed: None,
            published_after: None,
            published_before: None,
        }
    }
}

/// Criteria translated into the backend's native representation.
///
/// An id of 0 for `category_id`/`feed_id` and a value of 0 for the time
/// bounds mean "unconstrained"; that encoding is shared with the backend
/// and deliberately indistinguishable from "not requested".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilter {
    pub status: Option<EntryStatus>,
    pub search: Option<String>,
    pub limit: usize,
    pub category_id: i64,
    pub feed_id: i64,
    pub published_after: i64,
    pub published_before: i64,
    pub order: &'static str,
    pub direction: &'static str,
}

/// Resolve filter criteria against the backend catalogs.
///
/// Issues one catalog fetch per named selector actually supplied. A failed
/// catalog fetch fails the whole call; an unmatched name degrades to no
/// constraint. Under duplicate titles, category resolution keeps the first
/// case-insensitive match and feed resolution the last.
pub async fn resolve(
    filter: &EntryFilter,
    backend: &dyn Backend,
) -> Result<ResolvedFilter, BackendError> {
    let mut category_id = 0;
    if let Some(name) = &filter.category {
        let wanted = name.to_lowercase();
        for category in backend.categories().await? {
            if category.title.to_lowercase() == wanted {
                category_id = category.id;
                break;
            }
        }
    }

    let mut feed_id = 0;
    if let Some(name) = &filter.feed {
        let wanted = name.to_lowercase();
        for feed in backend.feeds().await? {
            if feed.title.to_lowercase() == wanted {
                feed_id = feed.id;
            }
        }
    }

    Ok(ResolvedFilter {
        status: filter.status,
        search: filter.search.clone(),
        limit: filter.limit,
        category_id,
        feed_id,
        published_after: filter.published_after.map_or(0, |t| t.timestamp()),
        published_before: filter.published_before.map_or(0, |t| t.timestamp()),
        order: ORDER,
        direction: DIRECTION,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::backend::BackendFeed;
    use crate::models::Category;
    use chrono::TimeZone;

    fn backend_with_catalogs() -> MockBackend {
        MockBackend::new()
            .with_categories(vec![
                Category {
                    id: 3,
                    title: "Tech".to_string(),
                },
                Category {
                    id: 7,
                    title: "tech".to_string(),
                },
            ])
            .with_feeds(vec![
                BackendFeed {
                    id: 11,
                    title: "Daily News".to_string(),
                    site_url: "http://news.example".to_string(),
                },
                BackendFeed {
                    id: 12,
                    title: "daily news".to_string(),
                    site_url: "http://other.example".to_string(),
                },
            ])
    }

    #[tokio::test]
    async fn test_empty_filter_resolves_unconstrained() {
        let backend = MockBackend::new();
        let resolved = resolve(&EntryFilter::default(), &backend).await.unwrap();

        assert_eq!(resolved.category_id, 0);
        assert_eq!(resolved.feed_id, 0);
        assert_eq!(resolved.published_after, 0);
        assert_eq!(resolved.published_before, 0);
        assert_eq!(resolved.limit, DEFAULT_LIMIT);
        assert_eq!(resolved.order, "published_at");
        assert_eq!(resolved.direction, "asc");
        // No catalog fetches when no names were supplied
        assert_eq!(backend.catalog_fetches(), 0);
    }

    #[tokio::test]
    async fn test_category_name_matches_case_insensitively() {
        let backend = backend_with_catalogs();
        let filter = EntryFilter {
            category: Some("TECH".to_string()),
            ..Default::default()
        };

        let resolved = resolve(&filter, &backend).await.unwrap();
        // First match wins for categories
        assert_eq!(resolved.category_id, 3);
    }

    #[tokio::test]
    async fn test_feed_name_keeps_last_match() {
        let backend = backend_with_catalogs();
        let filter = EntryFilter {
            feed: Some("Daily News".to_string()),
            ..Default::default()
        };

        let resolved = resolve(&filter, &backend).await.unwrap();
        assert_eq!(resolved.feed_id, 12);
    }

    #[tokio::test]
    async fn test_unmatched_names_resolve_to_zero_without_error() {
        let backend = backend_with_catalogs();
        let filter = EntryFilter {
            category: Some("sports".to_string()),
            feed: Some("no such feed".to_string()),
            ..Default::default()
        };

        let resolved = resolve(&filter, &backend).await.unwrap();
        assert_eq!(resolved.category_id, 0);
        assert_eq!(resolved.feed_id, 0);
    }

    #[tokio::test]
    async fn test_time_bounds_become_epoch_seconds() {
        let backend = MockBackend::new();
        let after = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let filter = EntryFilter {
            published_after: Some(after),
            published_before: Some(before),
            ..Default::default()
        };

        let resolved = resolve(&filter, &backend).await.unwrap();
        assert_eq!(resolved.published_after, after.timestamp());
        assert_eq!(resolved.published_before, before.timestamp());
    }

    #[tokio::test]
    async fn test_catalog_failure_propagates() {
        let backend = backend_with_catalogs().failing_catalogs();
        let filter = EntryFilter {
            category: Some("tech".to_string()),
            ..Default::default()
        };

        let result = resolve(&filter, &backend).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_one_catalog_fetch_per_named_selector() {
        let backend = backend_with_catalogs();
        let filter = EntryFilter {
            category: Some("tech".to_string()),
            feed: Some("daily news".to_string()),
            ..Default::default()
        };

        resolve(&filter, &backend).await.unwrap();
        assert_eq!(backend.catalog_fetches(), 2);
    }
}
