use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use miniflux_mcp::backend::MinifluxProvider;
use miniflux_mcp::config::load_config;
use miniflux_mcp::mcp::server::McpServer;
use miniflux_mcp::mcp::tools::ToolRegistry;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Miniflux MCP - expose a Miniflux instance's feeds and entries as MCP tools
#[derive(Parser, Debug)]
#[command(name = "miniflux-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server for read-only access to a Miniflux feed reader", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server (default when no command is given)
    Serve {
        /// Run in stdio mode instead of HTTP (for MCP clients like Claude Desktop)
        #[arg(long)]
        stdio: bool,

        /// Host to bind to (overrides the HOST environment variable)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides the PORT environment variable)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// List the registered tools
    Tools {
        /// Show input schemas as well
        #[arg(long, short)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("miniflux_mcp={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config().context("MINIFLUX_URL environment variable must be set")?;
    let provider = Arc::new(MinifluxProvider::new(&config.miniflux_url));

    match cli.command.unwrap_or(Commands::Serve {
        stdio: false,
        host: None,
        port: None,
    }) {
        Commands::Serve { stdio, host, port } => {
            let server = McpServer::new(provider)?;

            if stdio {
                tracing::info!("Running MCP server in stdio mode");
                server.run().await?;
            } else {
                let addr = format!(
                    "{}:{}",
                    host.unwrap_or(config.host),
                    port.unwrap_or(config.port)
                );
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            }
        }

        Commands::Tools { detailed } => {
            let registry = ToolRegistry::with_provider(provider);
            let mut tools = registry.all();
            tools.sort_by(|a, b| a.name.cmp(&b.name));

            for tool in tools {
                println!("{} - {}", tool.name, tool.description);
                if detailed {
                    println!("{}", serde_json::to_string_pretty(&tool.input_schema)?);
                }
            }
        }
    }

    Ok(())
}
