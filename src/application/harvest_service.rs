//! Harvest use case: one keyword, one browser session, batches into the sink
//!
//! Runs are serialized behind a single lock because every run drives the
//! same attached browser.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::{Stream, StreamExt, pin_mut};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::domain::{HarvestState, JobRepository, StandardizedRecord};
use crate::infrastructure::browser::{BrowserPage, BrowserSession, ResponseSource};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::detail_extractor::DetailExtractor;
use crate::infrastructure::harvester::Harvester;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidRequest {
    #[error("keyword must not be empty")]
    EmptyKeyword,

    #[error("pages must be at least 1")]
    NoPages,
}

/// A validated harvest request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestRequest {
    pub keyword: String,
    pub pages: u32,
    pub city_code: Option<String>,
}

impl HarvestRequest {
    pub fn new(
        keyword: &str,
        pages: u32,
        city_code: Option<String>,
    ) -> Result<Self, InvalidRequest> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(InvalidRequest::EmptyKeyword);
        }
        if pages == 0 {
            return Err(InvalidRequest::NoPages);
        }
        Ok(Self {
            keyword: keyword.to_string(),
            pages,
            city_code: city_code
                .map(|code| code.trim().to_string())
                .filter(|code| !code.is_empty()),
        })
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarvestReport {
    pub keyword: String,
    pub outcome: HarvestState,
    pub cycles: u32,
    pub batches: u32,
    pub records_saved: u64,
    pub failed_batches: u32,
    pub exhausted: bool,
    #[serde(skip)]
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistTotals {
    pub batches: u32,
    pub records_saved: u64,
    pub failed_batches: u32,
}

/// Drain a batch stream into the repository. A batch that fails to persist is
/// logged and skipped; the harvest keeps going.
pub async fn persist_batches<St>(batches: St, repository: &dyn JobRepository) -> PersistTotals
where
    St: Stream<Item = Vec<StandardizedRecord>>,
{
    pin_mut!(batches);
    let mut totals = PersistTotals::default();

    while let Some(batch) = batches.next().await {
        if batch.is_empty() {
            debug!("Empty chunk yielded");
            continue;
        }
        totals.batches += 1;
        match repository.upsert_batch(&batch).await {
            Ok(saved) => {
                totals.records_saved += saved;
                info!(
                    "Saved chunk of {} jobs. Total so far: {}",
                    batch.len(),
                    totals.records_saved
                );
            }
            Err(e) => {
                totals.failed_batches += 1;
                error!("Error inserting {} jobs: {}", batch.len(), e);
            }
        }
    }

    totals
}

/// Run a harvest to completion and persist what it yields
pub async fn harvest_into<P, S>(
    harvester: Harvester<P, S>,
    request: &HarvestRequest,
    repository: &dyn JobRepository,
) -> HarvestReport
where
    P: BrowserPage + 'static,
    S: ResponseSource + 'static,
{
    let started = Instant::now();
    let outcome = harvester.outcome();
    let batches = harvester.scrape_keyword(
        request.keyword.clone(),
        request.pages,
        request.city_code.clone(),
    );
    let totals = persist_batches(batches, repository).await;
    let progress = outcome.progress();

    HarvestReport {
        keyword: request.keyword.clone(),
        outcome: progress.state,
        cycles: progress.cycles,
        batches: totals.batches,
        records_saved: totals.records_saved,
        failed_batches: totals.failed_batches,
        exhausted: progress.exhausted,
        elapsed: started.elapsed(),
    }
}

#[derive(Clone)]
pub struct HarvestService {
    config: Arc<AppConfig>,
    repository: Arc<dyn JobRepository>,
    run_lock: Arc<Mutex<()>>,
}

impl HarvestService {
    pub fn new(config: Arc<AppConfig>, repository: Arc<dyn JobRepository>) -> Self {
        Self {
            config,
            repository,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn default_pages(&self) -> u32 {
        self.config.harvest.default_pages
    }

    pub fn repository(&self) -> Arc<dyn JobRepository> {
        Arc::clone(&self.repository)
    }

    /// Start a run in the background and return its id immediately.
    pub fn spawn(&self, request: HarvestRequest) -> Uuid {
        let run_id = Uuid::new_v4();
        let service = self.clone();
        let span = info_span!("harvest", %run_id, keyword = %request.keyword);

        tokio::spawn(
            async move {
                info!(
                    "Starting background scrape task for '{}' with {} pages",
                    request.keyword, request.pages
                );
                match service.run(&request).await {
                    Ok(report) if report.outcome == HarvestState::Aborted => warn!(
                        "Task stalled after {} cycles. Total saved: {}",
                        report.cycles, report.records_saved
                    ),
                    Ok(report) => info!(
                        "Task completed in {:?}. Total saved: {}",
                        report.elapsed, report.records_saved
                    ),
                    Err(e) => error!("Background task failed: {:#}", e),
                }
            }
            .instrument(span),
        );

        run_id
    }

    /// Attach to the browser, harvest and persist. Waits for any run already
    /// in progress.
    pub async fn run(&self, request: &HarvestRequest) -> Result<HarvestReport> {
        let _run = self.run_lock.lock().await;

        let session = BrowserSession::acquire(&self.config.browser)
            .await
            .context("Failed to attach to browser")?;
        let interception = match session
            .scoped_interception(&self.config.harvest.endpoint_substring)
            .await
        {
            Ok(interception) => interception,
            Err(e) => {
                session.release().await;
                return Err(e).context("Failed to start response interception");
            }
        };

        let harvester = Harvester::new(
            session.page(),
            interception,
            DetailExtractor::from_config(&self.config.extractor),
            self.config.harvest.clone(),
        );
        let report = harvest_into(harvester, request, self.repository.as_ref()).await;

        session.release().await;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DetailAugmentation, RawListing, RepositoryError};
    use crate::infrastructure::memory_job_repository::InMemoryJobRepository;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn batch(ids: &[&str]) -> Vec<StandardizedRecord> {
        ids.iter()
            .map(|id| {
                StandardizedRecord::standardize(
                    RawListing {
                        job_id: (*id).to_string(),
                        ..RawListing::default()
                    },
                    DetailAugmentation::absent(),
                )
            })
            .collect()
    }

    /// Fails every other batch
    #[derive(Default)]
    struct FlakyRepository {
        calls: AtomicU32,
        inner: InMemoryJobRepository,
    }

    #[async_trait]
    impl JobRepository for FlakyRepository {
        async fn upsert_batch(&self, records: &[StandardizedRecord]) -> Result<u64, RepositoryError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 1 {
                return Err(RepositoryError::OutOfRange { column: "salary_min" });
            }
            self.inner.upsert_batch(records).await
        }

        async fn find_all(&self) -> Result<Vec<StandardizedRecord>, RepositoryError> {
            self.inner.find_all().await
        }

        async fn count(&self) -> Result<u64, RepositoryError> {
            self.inner.count().await
        }
    }

    #[rstest]
    #[case("", 3, InvalidRequest::EmptyKeyword)]
    #[case("   ", 3, InvalidRequest::EmptyKeyword)]
    #[case("rust", 0, InvalidRequest::NoPages)]
    fn invalid_requests_are_rejected(
        #[case] keyword: &str,
        #[case] pages: u32,
        #[case] expected: InvalidRequest,
    ) {
        assert_eq!(HarvestRequest::new(keyword, pages, None), Err(expected));
    }

    #[test]
    fn request_is_trimmed() {
        let request = HarvestRequest::new("  rust ", 2, Some(" ".to_string())).unwrap();
        assert_eq!(request.keyword, "rust");
        assert_eq!(request.city_code, None);
    }

    #[tokio::test]
    async fn persist_batches_counts_saved_records() {
        let repo = InMemoryJobRepository::new();
        let stream = futures::stream::iter(vec![batch(&["a", "b"]), vec![], batch(&["c"])]);

        let totals = persist_batches(stream, &repo).await;
        assert_eq!(
            totals,
            PersistTotals {
                batches: 2,
                records_saved: 3,
                failed_batches: 0
            }
        );
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn failed_batch_does_not_stop_the_run() {
        let repo = FlakyRepository::default();
        let stream = futures::stream::iter(vec![batch(&["a"]), batch(&["b"]), batch(&["c"])]);

        let totals = persist_batches(stream, &repo).await;
        assert_eq!(totals.batches, 3);
        assert_eq!(totals.failed_batches, 1);
        assert_eq!(totals.records_saved, 2);
        let ids: Vec<_> = repo.find_all().await.unwrap().into_iter().map(|r| r.job_id).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
