/// MCP server setup using `rmcp` with stdio transport.
///
/// `AppContext` is the transport-agnostic core: it owns the store, the
/// pipeline components, and the provider. `McpServer` is one adapter
/// holding a reference to that context; other transports could wrap the
/// same context without touching core logic.
use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::{ServiceExt, handler::server::router::Router, transport::io::stdio};
use tokio::sync::Mutex as TokioMutex;

use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::indexer::Indexer;
use crate::mcp::tools::AppTools;
use crate::projects::ProjectRegistry;
use crate::query::QueryEngine;
use crate::store::VectorStore;

/// Shared application context available to all tool handlers.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub provider: Arc<dyn EmbeddingProvider>,
    pub indexer: Arc<Indexer>,
    pub query: Arc<QueryEngine>,
    pub projects: Arc<ProjectRegistry>,
}

impl AppContext {
    /// Wire the pipeline components around one shared store.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        store: Arc<TokioMutex<VectorStore>>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        let indexer = Arc::new(Indexer::new(
            store.clone(),
            Arc::new(crate::project::ProjectLocks::new()),
            config.max_chunk_size,
            config.batch_size,
            config.exclude_patterns.clone(),
        ));
        let query = Arc::new(QueryEngine::new(
            store.clone(),
            config.search_limit,
            config.project_scan_cap,
        ));
        let projects = Arc::new(ProjectRegistry::new(store, config.project_scan_cap));

        Self {
            config,
            provider,
            indexer,
            query,
            projects,
        }
    }
}

/// MCP server wrapping the context and serving via stdio.
#[derive(Clone)]
pub struct McpServer {
    pub ctx: AppContext,
}

impl McpServer {
    #[must_use]
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Start the MCP server on stdio transport (blocks until the client
    /// disconnects).
    pub async fn start(self) -> Result<()> {
        tracing::info!("Starting MCP server on stdio...");
        let (stdin, stdout) = stdio();

        let app_tools = AppTools::new(self.ctx.clone());
        let router = Router::new(app_tools.clone()).with_tools(app_tools.tool_router.clone());

        router
            .serve((stdin, stdout))
            .await
            .context("MCP server encountered an error during stdio transport")?;

        Ok(())
    }
}
