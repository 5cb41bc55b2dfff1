//! MCP server implementation using pmcp (Pragmatic AI's rust-mcp-sdk).
//!
//! This module provides the MCP server implementation using the pmcp crate
//! for proper JSON-RPC handling over stdio and HTTP.

use crate::backend::BackendProvider;
use crate::mcp::tools::{CallContext, ToolRegistry};
use async_trait::async_trait;
use pmcp::{
    server::auth::{AuthContext, AuthProvider},
    server::streamable_http_server::{StreamableHttpServer, StreamableHttpServerConfig},
    Error, RequestHandlerExtra, Server, ServerCapabilities, ToolHandler, ToolInfo,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// The MCP server for the Miniflux bridge
///
/// Exposes the feed-reading tools over stdio or streamable HTTP. All state
/// shared between calls is the immutable tool registry; each call builds its
/// own backend client from its own credential.
#[derive(Debug, Clone)]
pub struct McpServer {
    server: Arc<Mutex<Server>>,
}

impl McpServer {
    /// Create a new MCP server backed by the given provider
    pub fn new(provider: Arc<dyn BackendProvider>) -> Result<Self, pmcp::Error> {
        let tools = ToolRegistry::with_provider(provider);
        let server = Self::build_server_impl(tools)?;
        Ok(Self {
            server: Arc::new(Mutex::new(server)),
        })
    }

    /// Build the MCP server with tool handlers (internal implementation)
    fn build_server_impl(tools: ToolRegistry) -> Result<Server, pmcp::Error> {
        let mut builder = Server::builder()
            .name("miniflux")
            .version(env!("CARGO_PKG_VERSION"))
            .capabilities(ServerCapabilities::default())
            .auth_provider(BearerPassthrough);

        let registry = Arc::new(tools);

        // Add all tools from the registry
        for tool in registry.all() {
            let tool_handler = ToolWrapper {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                input_schema: tool.input_schema.clone(),
                output_schema: tool.output_schema.clone(),
                registry: Arc::clone(&registry),
            };
            builder = builder.tool(tool_handler.name.clone(), tool_handler);
        }

        builder.build()
    }

    /// Run the server in stdio mode (for Claude Desktop and other MCP clients)
    ///
    /// Consumes the server: `run_stdio` takes ownership, so this must hold
    /// the only reference.
    pub async fn run(self) -> Result<(), pmcp::Error> {
        tracing::info!("Starting MCP server in stdio mode");

        let server = Arc::try_unwrap(self.server)
            .map_err(|_| Error::internal("Cannot unwrap Arc - multiple references exist"))?
            .into_inner();

        tracing::info!("MCP server initialized");

        server.run_stdio().await
    }

    /// Run the server in streamable HTTP mode
    pub async fn run_http(&self, addr: &str) -> Result<(SocketAddr, JoinHandle<()>), pmcp::Error> {
        tracing::info!("Starting MCP server in HTTP mode on {}", addr);

        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::invalid_params(format!("Invalid address: {}", e)))?;

        let http_server = StreamableHttpServer::new(socket_addr, self.server.clone());

        http_server.start().await
    }

    /// Run the server in streamable HTTP mode with custom configuration
    pub async fn run_http_with_config(
        &self,
        addr: &str,
        config: StreamableHttpServerConfig,
    ) -> Result<(SocketAddr, JoinHandle<()>), pmcp::Error> {
        tracing::info!(
            "Starting MCP server in HTTP mode on {} (with custom config)",
            addr
        );

        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::invalid_params(format!("Invalid address: {}", e)))?;

        let http_server =
            StreamableHttpServer::with_config(socket_addr, self.server.clone(), config);

        http_server.start().await
    }
}

/// Wrapper adapting the tool registry to pmcp's ToolHandler
#[derive(Clone)]
struct ToolWrapper {
    name: String,
    description: Option<String>,
    input_schema: Value,
    output_schema: Value,
    registry: Arc<ToolRegistry>,
}

#[async_trait]
impl ToolHandler for ToolWrapper {
    async fn handle(&self, args: Value, extra: RequestHandlerExtra) -> Result<Value, Error> {
        let started = Instant::now();
        let ctx = CallContext {
            api_key: call_credential(&extra),
        };

        let result = self.registry.execute(&self.name, &ctx, args).await;
        let elapsed = started.elapsed();

        match result {
            Ok(value) => {
                tracing::info!(tool = %self.name, duration = ?elapsed, "tool call ok");
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(tool = %self.name, duration = ?elapsed, error = %e, "tool call failed");
                Err(Error::internal(e.to_string()))
            }
        }
    }

    fn metadata(&self) -> Option<ToolInfo> {
        // pmcp copies the handler's returned payload into the call result's
        // structuredContent only for tools whose metadata carries a UI
        // resource key; the marker entry opts every tool in, so the wire
        // result is the text block plus the structured payload.
        Some(
            ToolInfo::new(
                self.name.clone(),
                self.description.clone(),
                self.input_schema.clone(),
            )
            .with_output_schema(self.output_schema.clone())
            .with_meta_entry("ui/resourceUri", json!(format!("ui://miniflux/{}", self.name))),
        )
    }
}

/// Extract the per-call backend credential from the validated request
/// context. It is forwarded to the backend verbatim and never stored or
/// logged.
fn call_credential(extra: &RequestHandlerExtra) -> Option<String> {
    extra
        .auth_context
        .as_ref()
        .and_then(|auth| auth.token.clone())
}

/// Accepts every request and passes the caller's bearer token through as
/// the per-call backend credential. The server itself does not authenticate
/// callers; the backend rejects bad credentials on its own.
struct BearerPassthrough;

#[async_trait]
impl AuthProvider for BearerPassthrough {
    async fn validate_request(
        &self,
        authorization_header: Option<&str>,
    ) -> pmcp::Result<Option<AuthContext>> {
        Ok(authorization_header.map(|header| {
            let token = header.strip_prefix("Bearer ").unwrap_or(header);
            AuthContext {
                token: Some(token.to_string()),
                ..AuthContext::new("caller")
            }
        }))
    }

    fn is_required(&self) -> bool {
        false
    }
}

/// Create a new MCP server instance
pub fn create_mcp_server(provider: Arc<dyn BackendProvider>) -> Result<McpServer, pmcp::Error> {
    McpServer::new(provider)
}
