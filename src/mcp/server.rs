//! Gadget search MCP server implementation

use anyhow::Result;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use gadget_search::{EngineConfig, SearchEngine, SearchError};

/// Upper bound on `k` per request
const MAX_K: usize = 50;

/// Parameters for gadget_search tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// What the gadget should do (e.g., "I want to fly in the sky")
    #[schemars(description = "Description of the function you are looking for")]
    pub query: String,
    /// Number of unique gadgets to return (default: 5)
    #[schemars(description = "Number of unique gadgets to return (default: 5, max: 50)")]
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    SearchEngine::DEFAULT_K
}

/// Gadget search MCP service.
///
/// Holds one engine loaded at startup; every request reads it concurrently.
#[derive(Clone)]
pub struct GadgetService {
    engine: Arc<SearchEngine>,
    tool_router: ToolRouter<Self>,
}

impl GadgetService {
    pub fn new(engine: Arc<SearchEngine>) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl GadgetService {
    /// Search gadgets by function description
    #[tool(description = "Find gadgets by describing what they should do. Returns unique gadget names with their best-matching function and similarity score.")]
    async fn gadget_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let SearchParams { query, k } = params.0;
        let k = k.min(MAX_K);

        let engine = Arc::clone(&self.engine);
        let results = tokio::task::spawn_blocking(move || engine.search(&query, k))
            .await
            .map_err(|e| McpError::internal_error(format!("Search task failed: {}", e), None))?
            .map_err(|e| match e {
                SearchError::InvalidArgument(msg) => McpError::invalid_params(msg, None),
                other => McpError::internal_error(format!("Search failed: {}", other), None),
            })?;

        if results.is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                "No gadgets found matching your description. Try phrasing it differently.",
            )]));
        }

        let output = serde_json::to_string_pretty(&results).map_err(|e| {
            McpError::internal_error(format!("JSON serialization failed: {}", e), None)
        })?;

        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    /// Report loaded index and catalog sizes
    #[tool(description = "Get gadget search status: embedding model, index rows, catalog rows and unique gadget count.")]
    async fn gadget_status(&self) -> Result<CallToolResult, McpError> {
        let output = serde_json::to_string_pretty(&self.engine.stats()).map_err(|e| {
            McpError::internal_error(format!("JSON serialization failed: {}", e), None)
        })?;

        Ok(CallToolResult::success(vec![Content::text(output)]))
    }
}

#[tool_handler]
impl ServerHandler for GadgetService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Gadget search MCP server. Describe what a gadget should do to find matching gadgets.".to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Run the MCP server.
///
/// The engine is loaded before the transport starts, so a missing index
/// aborts startup instead of failing every request.
pub async fn run_mcp_server(config: EngineConfig) -> Result<()> {
    use tokio::io::{stdin, stdout};

    let engine = Arc::new(SearchEngine::open(&config)?);

    let service = GadgetService::new(Arc::clone(&engine));
    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    info!("MCP transport closed");
    if let Ok(engine) = Arc::try_unwrap(engine) {
        engine.close();
    }

    Ok(())
}
