//! Derived project registry.
//!
//! Projects are not stored as first-class rows; the registry is computed
//! on demand by scanning stored metadata (up to a configurable cap) and
//! grouping by project id. Display fields come from whichever record the
//! scan encounters first for each project, which is store order and thus
//! unspecified.
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex as TokioMutex;

use crate::store::models::RecordFilter;
use crate::store::{StoreError, VectorStore};

/// Aggregate view of one indexed project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectAggregate {
    pub project_id: String,
    pub project_name: String,
    pub project_path: String,
    pub source_type: String,
    pub indexed_at: String,
    pub chunk_count: usize,
}

pub struct ProjectRegistry {
    store: Arc<TokioMutex<VectorStore>>,
    scan_cap: usize,
}

impl ProjectRegistry {
    #[must_use]
    pub fn new(store: Arc<TokioMutex<VectorStore>>, scan_cap: usize) -> Self {
        Self { store, scan_cap }
    }

    /// Scan and group stored metadata into project aggregates, in
    /// first-seen order. Records with an empty project id are skipped.
    pub async fn aggregates(&self) -> Result<Vec<ProjectAggregate>, StoreError> {
        let records = {
            let store = self.store.lock().await;
            store.get(&RecordFilter::default(), self.scan_cap)?
        };

        let mut order: Vec<String> = Vec::new();
        let mut by_id: HashMap<String, ProjectAggregate> = HashMap::new();

        for record in &records {
            let meta = &record.metadata;
            if meta.project_id.is_empty() {
                continue;
            }
            match by_id.get_mut(&meta.project_id) {
                Some(agg) => agg.chunk_count += 1,
                None => {
                    order.push(meta.project_id.clone());
                    by_id.insert(
                        meta.project_id.clone(),
                        ProjectAggregate {
                            project_id: meta.project_id.clone(),
                            project_name: meta.project_name.clone(),
                            project_path: meta.project_path.clone(),
                            source_type: meta.source_type.clone(),
                            indexed_at: meta.indexed_at.clone(),
                            chunk_count: 1,
                        },
                    );
                }
            }
        }

        Ok(order
            .into_iter()
            .filter_map(|id| by_id.remove(&id))
            .collect())
    }

    /// Markdown listing of all indexed projects.
    pub async fn list_projects(&self) -> Result<String, StoreError> {
        let aggregates = self.aggregates().await?;
        if aggregates.is_empty() {
            return Ok("No projects indexed yet.".to_string());
        }

        let mut out = "# Indexed projects\n".to_string();
        for agg in &aggregates {
            out.push_str(&format!(
                "\n- **{}** (`{}`) — {} chunks\n  path: {} | source: {} | indexed at {}\n",
                agg.project_name,
                agg.project_id,
                agg.chunk_count,
                agg.project_path,
                agg.source_type,
                agg.indexed_at,
            ));
        }
        Ok(out)
    }
}
