/// MCP tool handlers.
///
/// Seven tools over the core pipeline:
/// 1. index_local_project        – discover, chunk, and ingest a directory
/// 2. search_code                – semantic search over all indexed code
/// 3. search_codebase            – alias of search_code
/// 4. search_by_file_type        – search limited to one file type
/// 5. get_file_content           – reconstruct a file from its chunks
/// 6. list_indexed_projects      – aggregate view of the collection
/// 7. get_embedding_provider_info – provider status and connectivity
///
/// Operation-level failures are rendered as error text in the normal
/// response channel; the transport never sees them as protocol faults.
use rmcp::handler::server::ServerHandler;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{ErrorData as McpError, handler::server::tool::ToolRouter, model::*, tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::mcp::server::AppContext;

// ── Parameter structs ────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
struct IndexProjectParams {
    /// Absolute path to the project directory
    project_path: String,
    /// Human-readable project name (the project id is derived from it)
    project_name: String,
    /// Include patterns, e.g. ["*.py", "src/**"]; empty means all files
    include_patterns: Option<Vec<String>>,
    /// Extra exclude patterns on top of the configured defaults
    exclude_patterns: Option<Vec<String>>,
}

#[derive(Deserialize, JsonSchema)]
struct SearchParams {
    /// Natural-language search query
    query: String,
    /// Max results (default: 10)
    limit: Option<usize>,
    /// Limit search to one project id (e.g. 'my_app')
    project_filter: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
struct FileTypeParams {
    /// File extension without the dot (e.g. 'py', 'rs')
    file_type: String,
    /// Optional search query; without it, chunks are listed unranked
    query: Option<String>,
    /// Max results (default: 10)
    limit: Option<usize>,
}

#[derive(Deserialize, JsonSchema)]
struct FilePathParam {
    /// Project-relative path of the file to reconstruct
    file_path: String,
}

// ── Response helpers ─────────────────────────────────────────────────

fn text_result(text: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn error_result(msg: &str) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.to_string())]))
}

// ── Tool implementations ─────────────────────────────────────────────

#[derive(Clone)]
pub struct AppTools {
    pub ctx: AppContext,
    pub tool_router: ToolRouter<Self>,
}

impl ServerHandler for AppTools {}

#[tool_router]
impl AppTools {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            tool_router: Self::tool_router(),
        }
    }

    // ── Tool 1: index_local_project ─────────────────────────────────

    #[tool(
        description = "Index a local project directory into the vector store. Recursively discovers files (respecting include/exclude patterns), chunks them, and ingests them for semantic search."
    )]
    async fn index_local_project(
        &self,
        params: Parameters<IndexProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.project_path.is_empty() {
            return error_result("project_path is required");
        }
        if p.project_name.is_empty() {
            return error_result("project_name is required");
        }

        let include = p.include_patterns.unwrap_or_default();
        let exclude = p.exclude_patterns.unwrap_or_default();

        match self
            .ctx
            .indexer
            .index_project(&p.project_path, &p.project_name, &include, &exclude)
            .await
        {
            Ok(summary) => text_result(format!(
                "Indexed project '{}' (id: {})\nFiles processed: {} ({} failed)\nChunks created: {}\nEmbedding provider: {}",
                summary.project_name,
                summary.project_id,
                summary.files_processed,
                summary.files_failed,
                summary.chunks_created,
                summary.provider,
            )),
            Err(e) => error_result(&format!("indexing failed: {e:#}")),
        }
    }

    // ── Tool 2: search_code ─────────────────────────────────────────

    #[tool(
        description = "Semantic search over all indexed code. Returns ranked matches with similarity scores, optionally filtered to one project."
    )]
    async fn search_code(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        self.run_search(params.0).await
    }

    #[tool(description = "Alias of search_code: semantic search over all indexed code.")]
    async fn search_codebase(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        self.run_search(params.0).await
    }

    // ── Tool 3: search_by_file_type ─────────────────────────────────

    #[tool(
        description = "Search indexed chunks of one file type (extension without the dot). With a query, results are ranked; without one, matching chunks are listed."
    )]
    async fn search_by_file_type(
        &self,
        params: Parameters<FileTypeParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.file_type.is_empty() {
            return error_result("file_type is required");
        }

        match self
            .ctx
            .query
            .search_by_file_type(&p.file_type, p.query.as_deref(), p.limit)
            .await
        {
            Ok(text) => text_result(text),
            Err(e) => error_result(&format!("search failed: {e}")),
        }
    }

    // ── Tool 4: get_file_content ────────────────────────────────────

    #[tool(
        description = "Reconstruct a file's full content from its indexed chunks, ordered by chunk index."
    )]
    async fn get_file_content(
        &self,
        params: Parameters<FilePathParam>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.file_path.is_empty() {
            return error_result("file_path is required");
        }

        match self.ctx.query.get_file_content(&p.file_path).await {
            Ok(text) => text_result(text),
            Err(e) => error_result(&format!("file content lookup failed: {e}")),
        }
    }

    // ── Tool 5: list_indexed_projects ───────────────────────────────

    #[tool(description = "List all indexed projects with chunk counts and metadata.")]
    async fn list_indexed_projects(&self) -> Result<CallToolResult, McpError> {
        match self.ctx.projects.list_projects().await {
            Ok(text) => text_result(text),
            Err(e) => error_result(&format!("project listing failed: {e}")),
        }
    }

    // ── Tool 6: get_embedding_provider_info ─────────────────────────

    #[tool(
        description = "Report the active embedding provider, its configured model, and (for the local provider) whether the endpoint is reachable."
    )]
    async fn get_embedding_provider_info(&self) -> Result<CallToolResult, McpError> {
        let provider = &self.ctx.provider;
        let mut info = format!(
            "Provider: {}\nModel: {}\nDimensions: {}",
            provider.name(),
            provider.model(),
            provider.dimensions(),
        );
        if provider.name() == "local" {
            let reachable = provider.probe().await;
            info.push_str(&format!(
                "\nEndpoint reachable: {}",
                if reachable { "yes" } else { "no" }
            ));
        }
        text_result(info)
    }
}

impl AppTools {
    async fn run_search(&self, p: SearchParams) -> Result<CallToolResult, McpError> {
        if p.query.is_empty() {
            return error_result("query is required");
        }

        match self
            .ctx
            .query
            .search(&p.query, p.limit, p.project_filter.as_deref())
            .await
        {
            Ok(text) => text_result(text),
            Err(e) => error_result(&format!("search failed: {e}")),
        }
    }
}
