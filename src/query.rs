//! Query engine: filters, similarity display, and result formatting.
//!
//! Ranking is the store's job; this layer only builds equality filters,
//! converts distances to display similarities (`1 − distance`, unclamped,
//! three decimals) and renders markdown. A distance above 1 therefore
//! shows as a negative similarity; that is defined behavior, not an
//! error.
use std::sync::Arc;

use tokio::sync::Mutex as TokioMutex;

use crate::embedding::EmbedError;
use crate::store::models::{QueryMatch, RecordFilter, StoredRecord};
use crate::store::{StoreError, VectorStore};

pub struct QueryEngine {
    store: Arc<TokioMutex<VectorStore>>,
    default_limit: usize,
    scan_cap: usize,
}

impl QueryEngine {
    #[must_use]
    pub fn new(store: Arc<TokioMutex<VectorStore>>, default_limit: usize, scan_cap: usize) -> Self {
        Self {
            store,
            default_limit,
            scan_cap,
        }
    }

    /// Embed the query text through the store's provider. The store lock
    /// is released before the embedding request runs.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, StoreError> {
        let provider = self.store.lock().await.provider().clone();
        let mut vectors = provider.embed(&[text.to_string()]).await?;
        if vectors.is_empty() {
            return Err(EmbedError::InvalidResponse("no query embedding".to_string()).into());
        }
        Ok(vectors.remove(0))
    }

    /// Semantic search over the whole collection, optionally scoped to
    /// one project id.
    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
        project_filter: Option<&str>,
    ) -> Result<String, StoreError> {
        let limit = limit.unwrap_or(self.default_limit);
        let filter = RecordFilter {
            project_id: project_filter,
            ..Default::default()
        };
        let query_vector = self.embed_query(query).await?;
        let matches = {
            let store = self.store.lock().await;
            store.query(&query_vector, limit, &filter)?
        };
        Ok(format_matches(query, &matches))
    }

    /// Search scoped to one file type. Without a query there is nothing
    /// to rank, so matching records are listed in store order instead.
    pub async fn search_by_file_type(
        &self,
        file_type: &str,
        query: Option<&str>,
        limit: Option<usize>,
    ) -> Result<String, StoreError> {
        let limit = limit.unwrap_or(self.default_limit);
        let filter = RecordFilter {
            file_type: Some(file_type),
            ..Default::default()
        };

        match query {
            Some(q) => {
                let query_vector = self.embed_query(q).await?;
                let store = self.store.lock().await;
                let matches = store.query(&query_vector, limit, &filter)?;
                Ok(format_matches(q, &matches))
            }
            None => {
                let store = self.store.lock().await;
                let records = store.get(&filter, limit)?;
                Ok(format_listing(file_type, &records))
            }
        }
    }

    /// Reconstruct a file from its stored chunks, ordered by chunk index.
    ///
    /// Insertion order in the store is irrelevant; the sort here is what
    /// restores file order.
    pub async fn get_file_content(&self, file_path: &str) -> Result<String, StoreError> {
        let filter = RecordFilter {
            file_path: Some(file_path),
            ..Default::default()
        };
        let mut records = {
            let store = self.store.lock().await;
            store.get(&filter, self.scan_cap)?
        };

        if records.is_empty() {
            return Ok(format!("No indexed content found for '{file_path}'."));
        }

        records.sort_by_key(|r| r.metadata.chunk_index);
        let meta = records[0].metadata.clone();
        let content: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();

        Ok(format!(
            "# {file_path}\n\n**Project:** {} | **Chunks:** {} | **Type:** {}\n\n```{}\n{}\n```",
            meta.project_name,
            records.len(),
            meta.file_type,
            fence_language(&meta.file_type),
            content.join("\n"),
        ))
    }
}

/// Display similarity for a raw store distance: `1 − distance`, no
/// clamping.
#[must_use]
pub fn similarity(distance: f64) -> f64 {
    1.0 - distance
}

fn fence_language(file_type: &str) -> &str {
    if file_type == "none" { "" } else { file_type }
}

fn format_matches(query: &str, matches: &[QueryMatch]) -> String {
    if matches.is_empty() {
        return "No results found.".to_string();
    }

    let mut out = format!("## Search results for '{query}'\n");
    for (i, m) in matches.iter().enumerate() {
        let meta = &m.record.metadata;
        out.push_str(&format!(
            "\n### {}. {} (similarity: {:.3})\n**Project:** {} | **Type:** {}\n\n```{}\n{}\n```\n",
            i + 1,
            meta.file_path,
            similarity(m.distance),
            meta.project_name,
            meta.file_type,
            fence_language(&meta.file_type),
            m.record.content,
        ));
    }
    out
}

fn format_listing(file_type: &str, records: &[StoredRecord]) -> String {
    if records.is_empty() {
        return "No results found.".to_string();
    }

    let mut out = format!("## Indexed chunks of type '{file_type}'\n");
    for (i, r) in records.iter().enumerate() {
        let meta = &r.metadata;
        out.push_str(&format!(
            "\n### {}. {} (chunk {})\n**Project:** {}\n\n```{}\n{}\n```\n",
            i + 1,
            meta.file_path,
            meta.chunk_index,
            meta.project_name,
            fence_language(&meta.file_type),
            r.content,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::mock::MockProvider;
    use crate::store::models::ChunkMetadata;

    fn meta(file_path: &str, file_type: &str, chunk_index: usize) -> ChunkMetadata {
        ChunkMetadata {
            file_path: file_path.to_string(),
            file_type: file_type.to_string(),
            chunk_index,
            project_id: "demo".to_string(),
            project_name: "Demo".to_string(),
            project_path: "/tmp/demo".to_string(),
            source_type: "local".to_string(),
            indexed_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    async fn engine_with_chunks(
        chunks: &[(&str, &str, ChunkMetadata)],
    ) -> QueryEngine {
        let mut store =
            VectorStore::open_in_memory("codebase", Arc::new(MockProvider::default())).unwrap();
        let ids: Vec<String> = chunks.iter().map(|(id, _, _)| (*id).to_string()).collect();
        let docs: Vec<&str> = chunks.iter().map(|(_, d, _)| *d).collect();
        let metas: Vec<ChunkMetadata> = chunks.iter().map(|(_, _, m)| m.clone()).collect();
        if !ids.is_empty() {
            let texts: Vec<String> = docs.iter().map(|d| (*d).to_string()).collect();
            let embeddings = store.provider().embed(&texts).await.unwrap();
            store.add(&ids, &docs, &embeddings, &metas).unwrap();
        }
        QueryEngine::new(Arc::new(TokioMutex::new(store)), 10, 100_000)
    }

    #[test]
    fn test_similarity_is_one_minus_distance() {
        assert_eq!(similarity(0.0), 1.0);
        assert!((similarity(0.25) - 0.75).abs() < 1e-12);
        // No clamping: distance above 1 shows negative
        assert!(similarity(1.5) < 0.0);
    }

    #[tokio::test]
    async fn test_search_formats_three_decimals() {
        let engine = engine_with_chunks(&[(
            "demo_chunk_0",
            "authenticate user credentials",
            meta("src/auth.py", "py", 0),
        )])
        .await;

        let out = engine
            .search("authenticate user credentials", Some(5), None)
            .await
            .unwrap();
        assert!(out.contains("src/auth.py"));
        // Identical text -> distance 0 -> similarity 1.000
        assert!(out.contains("similarity: 1.000"), "got: {out}");
        assert!(out.contains("```py"));
    }

    #[tokio::test]
    async fn test_search_no_results() {
        let engine = engine_with_chunks(&[]).await;
        let out = engine.search("anything", None, None).await.unwrap();
        assert_eq!(out, "No results found.");
    }

    #[tokio::test]
    async fn test_search_project_filter_excludes_other_projects() {
        let mut other = meta("x.py", "py", 0);
        other.project_id = "other".to_string();
        let engine = engine_with_chunks(&[
            ("demo_chunk_0", "shared text", meta("a.py", "py", 0)),
            ("other_chunk_0", "shared text", other),
        ])
        .await;

        let out = engine
            .search("shared text", None, Some("demo"))
            .await
            .unwrap();
        assert!(out.contains("a.py"));
        assert!(!out.contains("x.py"));
    }

    #[tokio::test]
    async fn test_search_by_file_type_without_query_lists() {
        let engine = engine_with_chunks(&[
            ("demo_chunk_0", "python code", meta("a.py", "py", 0)),
            ("demo_chunk_1", "rust code", meta("b.rs", "rs", 0)),
        ])
        .await;

        let out = engine.search_by_file_type("py", None, None).await.unwrap();
        assert!(out.contains("a.py"));
        assert!(!out.contains("b.rs"));
    }

    #[tokio::test]
    async fn test_get_file_content_sorts_by_chunk_index() {
        // Inserted in reverse order; the sort must restore file order.
        let engine = engine_with_chunks(&[
            ("demo_chunk_2", "part three", meta("src/a.py", "py", 2)),
            ("demo_chunk_1", "part two", meta("src/a.py", "py", 1)),
            ("demo_chunk_0", "part one", meta("src/a.py", "py", 0)),
        ])
        .await;

        let out = engine.get_file_content("src/a.py").await.unwrap();
        assert!(out.contains("**Chunks:** 3"));
        let body = out.split("```").nth(1).unwrap();
        assert!(body.contains("part one\npart two\npart three"), "got: {body}");
    }

    #[tokio::test]
    async fn test_get_file_content_unknown_path() {
        let engine = engine_with_chunks(&[]).await;
        let out = engine.get_file_content("src/ghost.py").await.unwrap();
        assert_eq!(out, "No indexed content found for 'src/ghost.py'.");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_search_future_runs_on_spawned_task() {
        // tokio::spawn requires a Send future, like the stdio server's
        // tool handlers. The store lock must not be held across the
        // embedding await.
        let engine = engine_with_chunks(&[(
            "demo_chunk_0",
            "spawned search target",
            meta("src/spawn.py", "py", 0),
        )])
        .await;

        let out = tokio::spawn(async move {
            engine.search("spawned search target", None, None).await
        })
        .await
        .unwrap()
        .unwrap();
        assert!(out.contains("src/spawn.py"));
    }
}
