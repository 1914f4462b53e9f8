use std::sync::Arc;

use anyhow::{Context, Result};
use codevault::config::Config;
use codevault::embedding::EmbeddingProvider;
use codevault::embedding::hosted::HostedProvider;
use codevault::embedding::local::LocalProvider;
use codevault::mcp::server::{AppContext, McpServer};
use codevault::store::VectorStore;
use tokio::sync::Mutex as TokioMutex;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the MCP transport; all logging goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting codevault MCP server...");

    // 1. Load and validate config
    let config_path = std::env::args().nth(1).unwrap_or_default();
    let config = Config::load(&config_path)?;
    config.validate()?;
    let config = Arc::new(config);

    // 2. Init embedding provider
    let provider: Arc<dyn EmbeddingProvider> = match config.embedding.provider.as_str() {
        "hosted" => {
            let api_key = std::env::var("OPENAI_API_KEY")
                .context("hosted embedding provider selected but OPENAI_API_KEY is not set")?;
            anyhow::ensure!(!api_key.is_empty(), "OPENAI_API_KEY is empty");
            Arc::new(HostedProvider::new(
                api_key,
                config.embedding.hosted_model.clone(),
                config.embedding.hosted_dimensions,
            ))
        }
        _ => Arc::new(LocalProvider::new(
            config.embedding.local_host.clone(),
            config.embedding.local_model.clone(),
        )),
    };
    tracing::info!(
        "Embedding provider: {} (model: {})",
        provider.name(),
        provider.model()
    );

    // 3. Open the shared collection
    let store = VectorStore::open(&config.db_path, &config.collection, provider.clone())
        .context("failed to open vector store")?;
    let store = Arc::new(TokioMutex::new(store));

    // 4. Wire context and start the stdio server
    let ctx = AppContext::new(config, store, provider);
    McpServer::new(ctx).start().await?;

    Ok(())
}
