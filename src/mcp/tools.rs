//! Tool registry for MCP tools.
//!
//! Each exposed tool is a static `{name, description, input schema, output
//! schema, handler}` entry. The registry is built once at startup and
//! immutable afterwards; the schemas are passive data consulted when
//! validating calls and advertising tool metadata.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::backend::{BackendError, BackendProvider};
use crate::content::NormalizeError;
use crate::mcp::handlers::{GetEntriesHandler, GetEntryHandler, GetFeedsHandler};

/// Per-call context carried from the transport to the handler.
///
/// The API key is extracted from the inbound request's metadata and lives
/// for exactly this call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub api_key: Option<String>,
}

impl CallContext {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
        }
    }

    /// Credential to forward to the backend; empty when the caller sent none.
    pub fn credential(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }
}

/// Errors surfaced to the tool caller. Every variant fails the single call
/// it occurred in, with no effect on concurrent calls.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// No tool registered under the requested name
    #[error("Tool '{0}' not found")]
    UnknownTool(String),

    /// Arguments did not match the tool's declared schema
    #[error("Invalid arguments: {0}")]
    InvalidParams(String),

    /// The backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Entry content could not be normalized
    #[error("Content conversion failed: {0}")]
    Normalize(#[from] NormalizeError),

    /// Result payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Handler for executing a tool.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool, returning the structured result payload.
    async fn execute(&self, ctx: &CallContext, args: Value) -> Result<Value, ToolError>;
}

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g. "get_entries")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: Value,

    /// JSON Schema for the success result
    pub output_schema: Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("output_schema", &self.output_schema)
            .finish()
    }
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry with the three feed-reading tools bound to the
    /// given backend provider.
    pub fn with_provider(provider: Arc<dyn BackendProvider>) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };
        registry.register_builtin_tools(provider);
        registry
    }

    fn register_builtin_tools(&mut self, provider: Arc<dyn BackendProvider>) {
        let entry_schema = json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "integer",
                    "description": "id of the entry"
                },
                "title": {
                    "type": "string",
                    "description": "title of the entry"
                },
                "url": {
                    "type": "string",
                    "description": "url of the entry"
                },
                "content": {
                    "type": "string",
                    "description": "content of the entry as plain text"
                },
                "status": {
                    "type": "string",
                    "description": "status of the entry",
                    "enum": ["unread", "read", "removed"]
                },
                "createdAt": {
                    "type": "string",
                    "format": "date-time",
                    "description": "time the entry was created at"
                }
            }
        });

        self.register(Tool {
            name: "get_feeds".to_string(),
            description: "Get list of subscribed feeds on the Miniflux instance".to_string(),
            input_schema: json!({
                "type": "object"
            }),
            output_schema: json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {
                            "type": "integer",
                            "description": "id of the feed"
                        },
                        "title": {
                            "type": "string",
                            "description": "title of the feed"
                        },
                        "url": {
                            "type": "string",
                            "description": "site url of the feed"
                        }
                    }
                }
            }),
            handler: Arc::new(GetFeedsHandler {
                provider: provider.clone(),
            }),
        });

        self.register(Tool {
            name: "get_entry".to_string(),
            description: "Get an entry of subscribed feeds on the Miniflux instance by its id"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "entryId": {
                        "type": "integer",
                        "description": "id of the entry"
                    }
                },
                "required": ["entryId"]
            }),
            output_schema: entry_schema.clone(),
            handler: Arc::new(GetEntryHandler {
                provider: provider.clone(),
            }),
        });

        self.register(Tool {
            name: "get_entries".to_string(),
            description: "Get entries of subscribed feeds on the Miniflux instance".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "status": {
                        "type": "string",
                        "enum": ["unread", "read", "removed"],
                        "description": "status of the entry"
                    },
                    "search": {
                        "type": "string",
                        "description": "search term query"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "number of entries",
                        "default": 100
                    },
                    "category": {
                        "type": "string",
                        "description": "category of the entries"
                    },
                    "feed": {
                        "type": "string",
                        "description": "feed of the entries"
                    },
                    "publishedAfter": {
                        "type": "string",
                        "format": "date-time",
                        "description": "filter entries published after this date in ISO 8601 format"
                    },
                    "publishedBefore": {
                        "type": "string",
                        "format": "date-time",
                        "description": "filter entries published before this date in ISO 8601 format"
                    }
                }
            }),
            output_schema: json!({
                "type": "array",
                "items": entry_schema
            }),
            handler: Arc::new(GetEntriesHandler { provider }),
        });
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Execute a tool by name, returning the structured result payload.
    ///
    /// The transport layer turns the payload into the protocol call result
    /// (a serialized text block plus `structuredContent`, carrying
    /// identical data).
    pub async fn execute(
        &self,
        name: &str,
        ctx: &CallContext,
        args: Value,
    ) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        tool.handler.execute(ctx, args).await
    }
}
