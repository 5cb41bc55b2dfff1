//! Miniflux REST API client.
//!
//! Talks to the Miniflux v1 API (`/v1/feeds`, `/v1/categories`,
//! `/v1/entries`). One client is constructed per tool call with that call's
//! API key and forwards it verbatim as the `X-Auth-Token` header.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::{Backend, BackendEntry, BackendError, BackendFeed, BackendProvider};
use crate::filter::ResolvedFilter;
use crate::models::Category;

/// Wire shape of the Miniflux entry listing response.
#[derive(Debug, Deserialize)]
struct EntriesResponse {
    #[serde(default)]
    total: u64,
    entries: Vec<BackendEntry>,
}

/// Client for a single Miniflux instance, scoped to one call's credential.
#[derive(Debug, Clone)]
pub struct MinifluxClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MinifluxClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, BackendError> {
        Url::parse(base_url).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| BackendError::InvalidUrl(e.to_string()))
    }

    /// Build the `/v1/entries` URL for a resolved filter. Unconstrained
    /// fields (id 0, bound 0, absent strings) are omitted from the query.
    fn entries_url(&self, filter: &ResolvedFilter) -> Result<Url, BackendError> {
        let mut url = self.endpoint("/v1/entries")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("order", filter.order);
            query.append_pair("direction", filter.direction);
            query.append_pair("limit", &filter.limit.to_string());
            if let Some(status) = filter.status {
                query.append_pair("status", status.as_str());
            }
            if let Some(search) = &filter.search {
                query.append_pair("search", search);
            }
            if filter.category_id != 0 {
                query.append_pair("category_id", &filter.category_id.to_string());
            }
            if filter.feed_id != 0 {
                query.append_pair("feed_id", &filter.feed_id.to_string());
            }
            if filter.published_after != 0 {
                query.append_pair("published_after", &filter.published_after.to_string());
            }
            if filter.published_before != 0 {
                query.append_pair("published_before", &filter.published_before.to_string());
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        let response = self
            .http
            .get(url)
            .header("X-Auth-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api(format!(
                "Miniflux returned status {}: {}",
                status,
                body.trim()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Backend for MinifluxClient {
    async fn feeds(&self) -> Result<Vec<BackendFeed>, BackendError> {
        let url = self.endpoint("/v1/feeds")?;
        self.get_json(url).await
    }

    async fn categories(&self) -> Result<Vec<Category>, BackendError> {
        let url = self.endpoint("/v1/categories")?;
        self.get_json(url).await
    }

    async fn entry(&self, id: i64) -> Result<BackendEntry, BackendError> {
        let url = self.endpoint(&format!("/v1/entries/{}", id))?;
        self.get_json(url).await
    }

    async fn entries(&self, filter: &ResolvedFilter) -> Result<Vec<BackendEntry>, BackendError> {
        let url = self.entries_url(filter)?;
        let response: EntriesResponse = self.get_json(url).await?;
        tracing::debug!(
            total = response.total,
            returned = response.entries.len(),
            "listed entries"
        );
        Ok(response.entries)
    }
}

/// Builds a fresh [`MinifluxClient`] for every call.
#[derive(Debug, Clone)]
pub struct MinifluxProvider {
    base_url: String,
}

impl MinifluxProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

impl BackendProvider for MinifluxProvider {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn Backend>, BackendError> {
        Ok(Arc::new(MinifluxClient::new(&self.base_url, api_key)?))
    }
}
