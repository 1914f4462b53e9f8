/// Embedding provider abstraction.
///
/// Two real variants exist: a hosted OpenAI-compatible API provider and
/// a local Ollama-style HTTP provider. Both compute fixed-dimension
/// vectors for text; the vector store calls them on add and query.
pub mod hosted;
pub mod local;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("embedding request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from embedding service: {0}")]
    InvalidResponse(String),
}

/// Trait for embedding providers.
///
/// Implementations must be `Send + Sync` for use behind `Arc` across
/// async tool handlers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed each text into a vector, one per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Dimensionality of the vectors this provider produces.
    fn dimensions(&self) -> usize;

    /// Configured model identifier.
    fn model(&self) -> &str;

    /// Short provider name for status reporting ("local", "hosted", "mock").
    fn name(&self) -> &'static str;

    /// Live connectivity check. Providers without a meaningful probe
    /// report `true`.
    async fn probe(&self) -> bool {
        true
    }
}
