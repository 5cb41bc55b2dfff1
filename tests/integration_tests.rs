//! Integration tests for the Miniflux MCP server.
//!
//! These tests drive the tool registry end to end against a mock backend,
//! covering dispatch, argument validation, filter resolution and content
//! normalization.

use chrono::{TimeZone, Utc};
use miniflux_mcp::backend::mock::{MockBackend, MockProvider};
use miniflux_mcp::backend::{BackendEntry, BackendFeed};
use miniflux_mcp::mcp::server::McpServer;
use miniflux_mcp::mcp::tools::{CallContext, ToolError, ToolRegistry};
use miniflux_mcp::models::{Category, EntryStatus};
use pmcp::server::streamable_http_server::StreamableHttpServerConfig;
use serde_json::{json, Value};
use std::sync::Arc;

fn make_entry(id: i64, title: &str, content: &str) -> BackendEntry {
    BackendEntry {
        id,
        title: title.to_string(),
        url: format!("http://example.com/{}", id),
        content: content.to_string(),
        status: EntryStatus::Unread,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(id),
    }
}

fn catalog_backend() -> MockBackend {
    MockBackend::new()
        .with_categories(vec![
            Category {
                id: 3,
                title: "Tech".to_string(),
            },
            Category {
                id: 9,
                title: "Politics".to_string(),
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

fn registry_with(backend: MockBackend) -> (Arc<ToolRegistry>, Arc<MockProvider>) {
    let provider = Arc::new(MockProvider::new(backend));
    let registry = Arc::new(ToolRegistry::with_provider(provider.clone()));
    (registry, provider)
}

/// Test that the server can be created successfully
#[tokio::test]
async fn test_server_initialization() {
    let provider = Arc::new(MockProvider::new(MockBackend::new()));
    let server = McpServer::new(provider);
    assert!(server.is_ok());
}

#[tokio::test]
async fn test_get_feeds_round_trip() {
    let backend = MockBackend::new().with_feeds(vec![BackendFeed {
        id: 1,
        title: "A".to_string(),
        site_url: "http://a".to_string(),
    }]);
    let (registry, _) = registry_with(backend);

    let result = registry
        .execute("get_feeds", &CallContext::default(), json!({}))
        .await
        .unwrap();

    assert_eq!(result, json!([{"id": 1, "title": "A", "url": "http://a"}]));
}

#[tokio::test]
async fn test_get_entries_defaults() {
    let entries = (1..=20)
        .map(|i| make_entry(i, &format!("entry {}", i), "<p>body</p>"))
        .collect();
    let (registry, provider) = registry_with(MockBackend::new().with_entries(entries));

    let result = registry
        .execute("get_entries", &CallContext::default(), json!({}))
        .await
        .unwrap();

    assert_eq!(result.as_array().unwrap().len(), 20);

    let filters = provider.backend().seen_filters();
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].limit, 100);
    assert_eq!(filters[0].order, "published_at");
    assert_eq!(filters[0].direction, "asc");
    assert_eq!(filters[0].category_id, 0);
    assert_eq!(filters[0].feed_id, 0);
}

#[tokio::test]
async fn test_get_entries_respects_limit() {
    let entries = (1..=20)
        .map(|i| make_entry(i, &format!("entry {}", i), "<p>body</p>"))
        .collect();
    let (registry, _) = registry_with(MockBackend::new().with_entries(entries));

    let result = registry
        .execute("get_entries", &CallContext::default(), json!({"limit": 5}))
        .await
        .unwrap();

    assert_eq!(result.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_get_entries_resolves_category_case_insensitively() {
    let (registry, provider) = registry_with(catalog_backend());

    registry
        .execute(
            "get_entries",
            &CallContext::default(),
            json!({"category": "tech"}),
        )
        .await
        .unwrap();

    let filters = provider.backend().seen_filters();
    assert_eq!(filters[0].category_id, 3);
}

#[tokio::test]
async fn test_get_entries_feed_name_keeps_last_match() {
    let (registry, provider) = registry_with(catalog_backend());

    registry
        .execute(
            "get_entries",
            &CallContext::default(),
            json!({"feed": "DAILY NEWS"}),
        )
        .await
        .unwrap();

    let filters = provider.backend().seen_filters();
    assert_eq!(filters[0].feed_id, 12);
}

#[tokio::test]
async fn test_get_entries_unknown_names_apply_no_constraint() {
    let (registry, provider) = registry_with(catalog_backend());

    let result = registry
        .execute(
            "get_entries",
            &CallContext::default(),
            json!({"category": "sports", "feed": "no such feed"}),
        )
        .await;

    assert!(result.is_ok());
    let filters = provider.backend().seen_filters();
    assert_eq!(filters[0].category_id, 0);
    assert_eq!(filters[0].feed_id, 0);
}

#[tokio::test]
async fn test_get_entries_catalog_failure_fails_whole_call() {
    let (registry, provider) = registry_with(catalog_backend().failing_catalogs());

    let result = registry
        .execute(
            "get_entries",
            &CallContext::default(),
            json!({"category": "tech"}),
        )
        .await;

    assert!(matches!(result, Err(ToolError::Backend(_))));
    // The listing was never issued: no partial results
    assert!(provider.backend().seen_filters().is_empty());
}

#[tokio::test]
async fn test_get_entry_normalizes_content() {
    let backend = MockBackend::new().with_entries(vec![make_entry(
        42,
        "story",
        "<h1>Big News</h1><p>It <b>happened</b>, see <a href=\"http://x\">details</a>.</p>",
    )]);
    let (registry, _) = registry_with(backend);

    let result = registry
        .execute("get_entry", &CallContext::default(), json!({"entryId": 42}))
        .await
        .unwrap();

    let content = result["content"].as_str().unwrap();
    assert!(!content.contains('<'));
    assert_eq!(
        content,
        "# Big News\n\nIt **happened**, see [details](http://x)."
    );
    assert_eq!(result["id"], 42);
    assert_eq!(result["status"], "unread");
}

#[tokio::test]
async fn test_get_entry_missing_id_fails_validation() {
    let (registry, provider) = registry_with(MockBackend::new());

    let result = registry
        .execute("get_entry", &CallContext::default(), json!({}))
        .await;

    assert!(matches!(result, Err(ToolError::InvalidParams(_))));
    // Validation happens before any backend client is constructed
    assert!(provider.connections().is_empty());
}

#[tokio::test]
async fn test_get_entry_unknown_id_is_backend_error() {
    let (registry, _) = registry_with(MockBackend::new());

    let result = registry
        .execute("get_entry", &CallContext::default(), json!({"entryId": 7}))
        .await;

    assert!(matches!(result, Err(ToolError::Backend(_))));
}

#[tokio::test]
async fn test_concurrent_calls_use_their_own_credentials() {
    let backend = MockBackend::new().with_feeds(vec![BackendFeed {
        id: 1,
        title: "A".to_string(),
        site_url: "http://a".to_string(),
    }]);
    let (registry, provider) = registry_with(backend);

    let first = {
        let registry = registry.clone();
        tokio::spawn(async move {
            registry
                .execute("get_feeds", &CallContext::with_api_key("key-a"), json!({}))
                .await
        })
    };
    let second = {
        let registry = registry.clone();
        tokio::spawn(async move {
            registry
                .execute("get_feeds", &CallContext::with_api_key("key-b"), json!({}))
                .await
        })
    };

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let mut connections = provider.connections();
    connections.sort();
    assert_eq!(connections, vec!["key-a".to_string(), "key-b".to_string()]);
}

#[tokio::test]
async fn test_normalization_failure_is_per_call() {
    let nested = format!("{}x{}", "<span>".repeat(400), "</span>".repeat(400));
    let backend = MockBackend::new().with_entries(vec![
        make_entry(1, "bad", &nested),
        make_entry(2, "good", "<p>fine</p>"),
    ]);
    let (registry, _) = registry_with(backend);

    let bad = registry
        .execute("get_entry", &CallContext::default(), json!({"entryId": 1}))
        .await;
    assert!(matches!(bad, Err(ToolError::Normalize(_))));

    // The next call on the same registry still succeeds
    let good = registry
        .execute("get_entry", &CallContext::default(), json!({"entryId": 2}))
        .await
        .unwrap();
    assert_eq!(good["content"], "fine");
}

#[tokio::test]
async fn test_http_transport_forwards_credential_and_structured_result() {
    let backend = MockBackend::new().with_feeds(vec![BackendFeed {
        id: 1,
        title: "A".to_string(),
        site_url: "http://a".to_string(),
    }]);
    let provider = Arc::new(MockProvider::new(backend));
    let server = McpServer::new(provider.clone()).unwrap();

    // Stateless JSON mode: no session handshake, plain JSON responses
    let config = StreamableHttpServerConfig {
        session_id_generator: None,
        enable_json_response: true,
        event_store: None,
        on_session_initialized: None,
        on_session_closed: None,
        http_middleware: None,
    };
    let (addr, handle) = server
        .run_http_with_config("127.0.0.1:0", config)
        .await
        .unwrap();

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{}/", addr))
        .header("Authorization", "Bearer secret-key")
        .header("Accept", "application/json, text/event-stream")
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "get_feeds", "arguments": {}}
        }))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    let result = &body["result"];

    // The wire result carries the structured payload plus a text block
    // serializing the same data
    let expected = json!([{"id": 1, "title": "A", "url": "http://a"}]);
    assert_eq!(result["structuredContent"], expected);
    let text = result["content"][0]["text"].as_str().unwrap();
    let reparsed: Value = serde_json::from_str(text).unwrap();
    assert_eq!(reparsed, expected);

    // The bearer token reached the backend as this call's credential
    assert_eq!(provider.connections(), vec!["secret-key".to_string()]);

    handle.abort();
}
