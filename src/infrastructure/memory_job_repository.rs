//! In-process job repository
//!
//! Keeps records in insertion order keyed by `job_id`. Used when no database
//! is configured and as the sink in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{JobRepository, RepositoryError, StandardizedRecord};

#[derive(Debug, Default)]
struct Store {
    records: Vec<StandardizedRecord>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct InMemoryJobRepository {
    store: RwLock<Store>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn upsert_batch(&self, records: &[StandardizedRecord]) -> Result<u64, RepositoryError> {
        let mut guard = self.store.write().await;
        let store = &mut *guard;
        for record in records {
            if let Some(&slot) = store.index.get(&record.job_id) {
                store.records[slot] = record.clone();
            } else {
                let slot = store.records.len();
                store.index.insert(record.job_id.clone(), slot);
                store.records.push(record.clone());
            }
        }
        Ok(records.len() as u64)
    }

    async fn find_all(&self) -> Result<Vec<StandardizedRecord>, RepositoryError> {
        Ok(self.store.read().await.records.clone())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.store.read().await.records.len() as u64)
    }
}
