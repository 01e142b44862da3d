//! # gms2-server
//!
//! MCP server over GameMaker Studio 2 projects.
//!
//! This crate provides:
//! - `ProjectEnvironment` trait the tool handlers run against
//! - MCP JSON-RPC protocol handling
//! - Tool implementations (scan_gms2_project, get_room_info, etc.)
//! - Project summary and export resources

pub mod environment;
pub mod mcp;
pub mod tools;
pub mod transport;

pub use environment::{ProjectEnvironment, ProjectSession};

use gms2_core::Result;
use mcp::ServerInfo;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Name reported to clients during `initialize`
pub const SERVER_NAME: &str = "gms2-mcp-server";

/// GMS2 MCP server
pub struct Gms2Server<E: ProjectEnvironment> {
    /// Project environment implementation
    environment: Arc<RwLock<E>>,
    info: ServerInfo,
}

impl<E: ProjectEnvironment> Gms2Server<E> {
    /// Create a new server with the given environment
    pub fn new(environment: E) -> Self {
        Self {
            environment: Arc::new(RwLock::new(environment)),
            info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Run the server on stdio transport
    pub async fn run_stdio(self) -> Result<()> {
        transport::stdio::run(self).await
    }

    /// Shared handle to the environment
    pub fn environment(&self) -> Arc<RwLock<E>> {
        Arc::clone(&self.environment)
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }
}
