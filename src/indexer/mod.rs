//! The indexing pipeline: discovery → chunking → batched ingestion.
//!
//! One call to [`Indexer::index_project`] runs the whole pipeline
//! sequentially for a single project, holding that project's lock for
//! the duration so overlapping runs for the same project id cannot
//! interleave their batch writes.
pub mod chunker;
pub mod discovery;
pub mod ingest;
pub mod patterns;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::Mutex as TokioMutex;
use tracing::{info, warn};

use crate::project::{ProjectLocks, SOURCE_TYPE_LOCAL, project_id_from_name};
use crate::store::VectorStore;
use crate::store::models::ChunkMetadata;
use ingest::{BatchIngestor, PendingChunk};

/// Sentinel file type for files without an extension.
const FILE_TYPE_NONE: &str = "none";

/// Outcome summary of one indexing run.
#[derive(Debug)]
pub struct IndexSummary {
    pub project_id: String,
    pub project_name: String,
    pub files_processed: usize,
    pub files_failed: usize,
    pub chunks_created: usize,
    pub provider: String,
}

pub struct Indexer {
    store: Arc<TokioMutex<VectorStore>>,
    locks: Arc<ProjectLocks>,
    max_chunk_size: usize,
    batch_size: usize,
    default_excludes: Vec<String>,
}

impl Indexer {
    #[must_use]
    pub fn new(
        store: Arc<TokioMutex<VectorStore>>,
        locks: Arc<ProjectLocks>,
        max_chunk_size: usize,
        batch_size: usize,
        default_excludes: Vec<String>,
    ) -> Self {
        Self {
            store,
            locks,
            max_chunk_size,
            batch_size,
            default_excludes,
        }
    }

    /// Index a local project directory into the shared collection.
    ///
    /// Fails up front if the path is missing or not a directory (nothing
    /// is written in that case). Per-file read errors are logged and
    /// skipped; a batch write error aborts the run with earlier batches
    /// already persisted.
    pub async fn index_project(
        &self,
        project_path: &str,
        project_name: &str,
        include: &[String],
        exclude: &[String],
    ) -> Result<IndexSummary> {
        let root = Path::new(project_path);
        anyhow::ensure!(
            root.is_dir(),
            "project path is not an existing directory: {project_path}"
        );

        let project_id = project_id_from_name(project_name);

        let lock = self.locks.acquire(&project_id).await;
        let _guard = lock.lock().await;

        let mut all_excludes = self.default_excludes.clone();
        all_excludes.extend_from_slice(exclude);

        let files = discovery::discover(root, include, &all_excludes);
        info!(
            "indexing project '{project_name}' ({project_id}): {} files discovered",
            files.len()
        );

        let indexed_at = Utc::now().to_rfc3339();
        let mut pending: Vec<PendingChunk> = Vec::new();
        let mut files_processed = 0usize;
        let mut files_failed = 0usize;

        for file in &files {
            let rel = discovery::relative_key(root, file);
            let file_type = file
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or(FILE_TYPE_NONE)
                .to_string();

            match chunker::chunk_file(file, self.max_chunk_size) {
                Ok(chunks) => {
                    files_processed += 1;
                    for c in chunks {
                        pending.push(PendingChunk {
                            content: c.content,
                            metadata: ChunkMetadata {
                                file_path: rel.clone(),
                                file_type: file_type.clone(),
                                chunk_index: c.chunk_index,
                                project_id: project_id.clone(),
                                project_name: project_name.to_string(),
                                project_path: project_path.to_string(),
                                source_type: SOURCE_TYPE_LOCAL.to_string(),
                                indexed_at: indexed_at.clone(),
                            },
                        });
                    }
                }
                Err(e) => {
                    warn!("skipping unreadable file {}: {e}", file.display());
                    files_failed += 1;
                }
            }
        }

        let chunks_created = pending.len();
        BatchIngestor::new(self.batch_size)
            .ingest(&self.store, &pending, &project_id)
            .await
            .with_context(|| format!("batch write failed for project {project_id}"))?;

        let provider = {
            let store = self.store.lock().await;
            store.provider().name().to_string()
        };

        info!(
            "indexed project '{project_name}': {files_processed} files, {chunks_created} chunks"
        );

        Ok(IndexSummary {
            project_id,
            project_name: project_name.to_string(),
            files_processed,
            files_failed,
            chunks_created,
            provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::mock::MockProvider;
    use crate::store::models::RecordFilter;
    use std::fs;
    use tempfile::tempdir;

    fn test_indexer() -> (Indexer, Arc<TokioMutex<VectorStore>>) {
        let store =
            VectorStore::open_in_memory("codebase", Arc::new(MockProvider::default())).unwrap();
        let store = Arc::new(TokioMutex::new(store));
        let indexer = Indexer::new(
            store.clone(),
            Arc::new(ProjectLocks::new()),
            1500,
            100,
            vec![".git/**".to_string()],
        );
        (indexer, store)
    }

    #[tokio::test]
    async fn test_index_simple_project() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.py"),
            "def authenticate(user):\n    return user.check()\n",
        )
        .unwrap();
        fs::write(dir.path().join("b.md"), "# Notes\n\nSome notes here.\n").unwrap();

        let (indexer, store) = test_indexer();
        let summary = indexer
            .index_project(dir.path().to_str().unwrap(), "Test App", &[], &[])
            .await
            .unwrap();

        assert_eq!(summary.project_id, "test_app");
        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.files_failed, 0);
        assert!(summary.chunks_created >= 2);
        assert_eq!(summary.provider, "mock");

        let guard = store.lock().await;
        assert_eq!(guard.count().unwrap(), summary.chunks_created);
    }

    #[tokio::test]
    async fn test_missing_path_fails_before_writing() {
        let (indexer, store) = test_indexer();
        let result = indexer
            .index_project("/no/such/dir", "ghost", &[], &[])
            .await;
        assert!(result.is_err());
        assert_eq!(store.lock().await.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_path_fails_before_writing() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, "x").unwrap();

        let (indexer, _) = test_indexer();
        let result = indexer
            .index_project(file.to_str().unwrap(), "notadir", &[], &[])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_default_excludes_applied() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config"), "[core]").unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();

        let (indexer, store) = test_indexer();
        let summary = indexer
            .index_project(dir.path().to_str().unwrap(), "app", &[], &[])
            .await
            .unwrap();

        assert_eq!(summary.files_processed, 1);
        let guard = store.lock().await;
        let records = guard.get(&RecordFilter::default(), 100).unwrap();
        assert!(records.iter().all(|r| !r.metadata.file_path.starts_with(".git")));
    }

    #[tokio::test]
    async fn test_metadata_constant_across_run() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("b.txt"), "beta").unwrap();

        let (indexer, store) = test_indexer();
        indexer
            .index_project(dir.path().to_str().unwrap(), "Same Run", &[], &[])
            .await
            .unwrap();

        let guard = store.lock().await;
        let records = guard.get(&RecordFilter::default(), 100).unwrap();
        assert!(records.len() >= 2);
        let first = &records[0].metadata;
        for r in &records {
            assert_eq!(r.metadata.indexed_at, first.indexed_at);
            assert_eq!(r.metadata.project_id, "same_run");
            assert_eq!(r.metadata.project_name, "Same Run");
            assert_eq!(r.metadata.source_type, "local");
        }
    }

    #[tokio::test]
    async fn test_extensionless_file_type_sentinel() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Makefile"), "all:\n\techo hi").unwrap();

        let (indexer, store) = test_indexer();
        indexer
            .index_project(dir.path().to_str().unwrap(), "make", &[], &[])
            .await
            .unwrap();

        let guard = store.lock().await;
        let records = guard.get(&RecordFilter::default(), 100).unwrap();
        assert_eq!(records[0].metadata.file_type, "none");
    }
}
