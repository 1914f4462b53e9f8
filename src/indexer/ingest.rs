/// Batched ingestion of chunks into the vector store.
///
/// Batches are written strictly sequentially, in offset order. A failed
/// batch aborts the remainder of the run; batches already written stay
/// persisted — there is no rollback or compensating delete.
use std::sync::Arc;

use tokio::sync::Mutex as TokioMutex;
use tracing::debug;

use crate::store::models::ChunkMetadata;
use crate::store::{StoreError, VectorStore};

/// A chunk ready for ingestion: document text plus its full metadata.
#[derive(Debug, Clone)]
pub struct PendingChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

pub struct BatchIngestor {
    batch_size: usize,
}

impl BatchIngestor {
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }

    /// Write all chunks in contiguous batches.
    ///
    /// Record ids are `{project_id}_chunk_{n}` where `n` is the chunk's
    /// position in the whole run, a separate counter from the per-file
    /// `chunk_index` kept in metadata. Re-indexing the same project id
    /// reuses the id space from zero: colliding ids are overwritten, and
    /// a run shorter than the previous one leaves stale records behind.
    pub async fn ingest(
        &self,
        store: &Arc<TokioMutex<VectorStore>>,
        chunks: &[PendingChunk],
        project_id: &str,
    ) -> Result<(), StoreError> {
        // Embedding happens outside the store lock; the connection is
        // never held across an await.
        let provider = store.lock().await.provider().clone();

        for (batch_no, batch) in chunks.chunks(self.batch_size).enumerate() {
            let start = batch_no * self.batch_size;

            let ids: Vec<String> = (0..batch.len())
                .map(|j| format!("{project_id}_chunk_{}", start + j))
                .collect();
            let documents: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let metadatas: Vec<ChunkMetadata> =
                batch.iter().map(|c| c.metadata.clone()).collect();

            debug!(
                "writing batch {batch_no} ({} chunks) for project {project_id}",
                batch.len()
            );

            let embeddings = provider.embed(&texts).await?;
            let mut store = store.lock().await;
            store.add(&ids, &documents, &embeddings, &metadatas)?;
        }
        Ok(())
    }
}
