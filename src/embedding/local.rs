/// Local HTTP embedding provider (Ollama-compatible).
///
/// Issues one request per text, sequentially. A failed request is
/// substituted with a zero vector rather than failing the batch, so an
/// unreachable endpoint degrades search quality for the affected chunks
/// instead of aborting an indexing run.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{EmbedError, EmbeddingProvider};

/// Fixed dimensionality of the local provider's vectors.
pub const LOCAL_DIMENSIONS: usize = 384;

pub struct LocalProvider {
    client: Client,
    host: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl LocalProvider {
    /// Create a provider targeting `{host}/api/embeddings`.
    #[must_use]
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        let mut host = host.into();
        while host.ends_with('/') {
            host.pop();
        }
        Self {
            client: Client::new(),
            host,
            model: model.into(),
        }
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.host))
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| EmbedError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbedError::RequestFailed(format!(
                "endpoint returned status {status}"
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::InvalidResponse(e.to_string()))?;

        if body.embedding.is_empty() {
            return Err(EmbedError::InvalidResponse(
                "empty embedding array".to_string(),
            ));
        }

        Ok(body.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalProvider {
    /// One sequential request per text. Per-text failures are logged and
    /// replaced with a zero vector; this method never fails as a whole.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            match self.embed_one(text).await {
                Ok(v) => vectors.push(v),
                Err(e) => {
                    warn!("local embedding failed, substituting zero vector: {e}");
                    vectors.push(vec![0.0; LOCAL_DIMENSIONS]);
                }
            }
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        LOCAL_DIMENSIONS
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &'static str {
        "local"
    }

    async fn probe(&self) -> bool {
        match self.client.get(&self.host).send().await {
            Ok(r) => r.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back_to_zero_vectors() {
        // Nothing listens on port 1; every request fails fast.
        let provider = LocalProvider::new("http://127.0.0.1:1", "nomic-embed-text");
        let vectors = provider.embed(&["x".to_string()]).await.unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].len(), LOCAL_DIMENSIONS);
        assert!(vectors[0].iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_fallback_preserves_input_order_and_count() {
        let provider = LocalProvider::new("http://127.0.0.1:1", "nomic-embed-text");
        let texts: Vec<String> = (0..3).map(|i| format!("text {i}")).collect();
        let vectors = provider.embed(&texts).await.unwrap();
        assert_eq!(vectors.len(), 3);
    }

    #[tokio::test]
    async fn test_probe_unreachable() {
        let provider = LocalProvider::new("http://127.0.0.1:1", "nomic-embed-text");
        assert!(!provider.probe().await);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = LocalProvider::new("http://localhost:11434/", "m");
        assert_eq!(provider.host, "http://localhost:11434");
    }
}
