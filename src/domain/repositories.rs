//! Repository interfaces for harvested job listings
//!
//! The harvester only produces batches; persisting them is up to whichever
//! `JobRepository` the caller wires in.

use async_trait::async_trait;
use thiserror::Error;

use super::listing::StandardizedRecord;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database operation failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode skill tags: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Stored value out of range for column '{column}'")]
    OutOfRange { column: &'static str },
}

/// Sink for standardized listing batches.
///
/// Implementations upsert by `job_id`: a record whose identifier already
/// exists replaces the stored values instead of creating a duplicate row.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert-or-update a batch; returns the number of records written.
    async fn upsert_batch(&self, records: &[StandardizedRecord]) -> Result<u64, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<StandardizedRecord>, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;
}
