//! Mock backend for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{Backend, BackendEntry, BackendError, BackendFeed, BackendProvider};
use crate::filter::ResolvedFilter;
use crate::models::Category;

/// A mock backend that serves canned catalogs and entries, recording what
/// was asked of it.
#[derive(Debug, Default)]
pub struct MockBackend {
    feeds: Vec<BackendFeed>,
    categories: Vec<Category>,
    entries: Vec<BackendEntry>,
    fail_catalogs: bool,
    catalog_fetches: AtomicUsize,
    seen_filters: Mutex<Vec<ResolvedFilter>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feeds(mut self, feeds: Vec<BackendFeed>) -> Self {
        self.feeds = feeds;
        self
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_entries(mut self, entries: Vec<BackendEntry>) -> Self {
        self.entries = entries;
        self
    }

    /// Make every catalog fetch fail with a network error.
    pub fn failing_catalogs(mut self) -> Self {
        self.fail_catalogs = true;
        self
    }

    /// Number of catalog (feed or category) fetches issued so far.
    pub fn catalog_fetches(&self) -> usize {
        self.catalog_fetches.load(Ordering::SeqCst)
    }

    /// Filters passed to `entries` so far, in call order.
    pub fn seen_filters(&self) -> Vec<ResolvedFilter> {
        self.seen_filters.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn feeds(&self) -> Result<Vec<BackendFeed>, BackendError> {
        self.catalog_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_catalogs {
            return Err(BackendError::Network("mock catalog failure".to_string()));
        }
        Ok(self.feeds.clone())
    }

    async fn categories(&self) -> Result<Vec<Category>, BackendError> {
        self.catalog_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_catalogs {
            return Err(BackendError::Network("mock catalog failure".to_string()));
        }
        Ok(self.categories.clone())
    }

    async fn entry(&self, id: i64) -> Result<BackendEntry, BackendError> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
            .ok_or_else(|| BackendError::Api(format!("Miniflux returned status 404: entry {}", id)))
    }

    async fn entries(&self, filter: &ResolvedFilter) -> Result<Vec<BackendEntry>, BackendError> {
        self.seen_filters.lock().unwrap().push(filter.clone());
        Ok(self.entries.iter().take(filter.limit).cloned().collect())
    }
}

/// Provider handing out a shared [`MockBackend`] while recording the
/// credential each call connected with.
#[derive(Debug)]
pub struct MockProvider {
    backend: Arc<MockBackend>,
    connections: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(backend: MockBackend) -> Self {
        Self {
            backend: Arc::new(backend),
            connections: Mutex::new(Vec::new()),
        }
    }

    pub fn backend(&self) -> Arc<MockBackend> {
        Arc::clone(&self.backend)
    }

    /// Credentials seen so far, one per `connect` call.
    pub fn connections(&self) -> Vec<String> {
        self.connections.lock().unwrap().clone()
    }
}

impl BackendProvider for MockProvider {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn Backend>, BackendError> {
        self.connections.lock().unwrap().push(api_key.to_string());
        Ok(self.backend())
    }
}
