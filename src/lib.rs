//! # Miniflux MCP
//!
//! A Model Context Protocol (MCP) server exposing read-only access to a
//! Miniflux feed reader instance.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Feed, Entry, Category)
//! - [`backend`]: The Miniflux client and the read-only backend contract
//! - [`filter`]: Entry filter criteria and name-to-id resolution
//! - [`content`]: HTML-to-plain-text normalization for entry bodies
//! - [`mcp`]: MCP protocol implementation and server
//! - [`config`]: Configuration management

pub mod backend;
pub mod config;
pub mod content;
pub mod filter;
pub mod mcp;
pub mod models;

// Re-export commonly used types
pub use backend::{Backend, BackendProvider};
pub use models::{Category, Entry, EntryStatus, Feed};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
