//! Pagination driver
//!
//! Runs the scroll → wait → decode → extract → normalize cycle against one
//! page and one response feed, yielding each non-empty batch of standardized
//! records as soon as it is complete. Stop decisions come from
//! [`PaginationState`]; this module only performs the I/O around it.

use std::time::Duration;

use async_stream::stream;
use futures::Stream;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::domain::constants::site::SEARCH_PAGE_URL;
use crate::domain::{HarvestEvent, HarvestState, PaginationState, RawListing, StandardizedRecord};
use crate::infrastructure::browser::{BrowserPage, ResponseSource};
use crate::infrastructure::config::HarvestConfig;
use crate::infrastructure::detail_extractor::DetailExtractor;
use crate::infrastructure::harvest_error::{HarvestError, HarvestResult};
use crate::infrastructure::response_decoder::{DecodeOutcome, decode_response};

/// Build the search page URL; the keyword is percent-encoded
pub fn search_url(keyword: &str, city_code: &str) -> HarvestResult<String> {
    Url::parse_with_params(SEARCH_PAGE_URL, &[("query", keyword), ("city", city_code)])
        .map(String::from)
        .map_err(|e| HarvestError::navigation(SEARCH_PAGE_URL, e))
}

/// Snapshot of a run, published after every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestProgress {
    pub state: HarvestState,
    /// Awaits performed, including timed-out and bad-status ones
    pub cycles: u32,
    pub batches: u32,
    pub records: usize,
    /// The source reported that no more listings exist
    pub exhausted: bool,
}

impl Default for HarvestProgress {
    fn default() -> Self {
        Self {
            state: HarvestState::Init,
            cycles: 0,
            batches: 0,
            records: 0,
            exhausted: false,
        }
    }
}

/// Read side of a run's progress. Stays valid after the stream is gone, so
/// callers can tell a completed run from a stalled one.
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    receiver: watch::Receiver<HarvestProgress>,
}

impl HarvestOutcome {
    pub fn progress(&self) -> HarvestProgress {
        *self.receiver.borrow()
    }

    pub fn state(&self) -> HarvestState {
        self.receiver.borrow().state
    }

    pub fn is_complete(&self) -> bool {
        self.state() == HarvestState::Done
    }

    pub fn is_stalled(&self) -> bool {
        self.state() == HarvestState::Aborted
    }
}

pub struct Harvester<P, S> {
    page: P,
    responses: S,
    extractor: DetailExtractor,
    config: HarvestConfig,
    progress: watch::Sender<HarvestProgress>,
}

impl<P, S> Harvester<P, S>
where
    P: BrowserPage + 'static,
    S: ResponseSource + 'static,
{
    /// `responses` must already be listening before the harvest navigates,
    /// otherwise the first batch is missed.
    pub fn new(page: P, responses: S, extractor: DetailExtractor, config: HarvestConfig) -> Self {
        let (progress, _) = watch::channel(HarvestProgress::default());
        Self {
            page,
            responses,
            extractor,
            config,
            progress,
        }
    }

    pub fn outcome(&self) -> HarvestOutcome {
        HarvestOutcome {
            receiver: self.progress.subscribe(),
        }
    }

    /// Harvest up to `cycles` batches for `keyword`.
    ///
    /// The stream is lazy and one-shot: nothing happens until it is polled,
    /// and dropping it releases the page and the response feed. It never
    /// yields an empty batch. A navigation failure or a stall ends it early;
    /// inspect [`HarvestOutcome`] to tell those apart from normal completion.
    pub fn scrape_keyword(
        self,
        keyword: impl Into<String>,
        cycles: u32,
        city_code: Option<String>,
    ) -> impl Stream<Item = Vec<StandardizedRecord>> + Send {
        let keyword = keyword.into();
        let city_code = city_code.unwrap_or_else(|| self.config.default_city_code.clone());
        let Self {
            page,
            mut responses,
            extractor,
            config,
            progress,
        } = self;

        stream! {
            let mut cursor = PaginationState::new(cycles, config.stall_tolerance);
            let mut snapshot = HarvestProgress::default();

            let navigated = match search_url(&keyword, &city_code) {
                Ok(url) => {
                    info!("Navigating to {}", url);
                    page.navigate(&url).await
                }
                Err(e) => Err(e),
            };
            if let Err(e) = navigated {
                error!("Harvest for '{}' could not start: {}", keyword, e);
                snapshot.state = HarvestState::Aborted;
                progress.send_replace(snapshot);
                return;
            }
            cursor.apply(HarvestEvent::Navigated);
            publish(&progress, &mut snapshot, &cursor);

            loop {
                match cursor.state() {
                    HarvestState::Scrolling => {
                        debug!("Scrolling to bottom to trigger load");
                        if let Err(e) = page.scroll_to_bottom().await {
                            warn!("Scroll failed: {}", e);
                        }
                        sleep(config.scroll_settle()).await;
                        cursor.apply(HarvestEvent::Scrolled);
                    }
                    HarvestState::AwaitingFirstBatch | HarvestState::AwaitingBatch => {
                        let cycle = cursor.begin_cycle();
                        info!("Processing batch {}/{}", cycle, cursor.max_cycles());

                        let (event, batch) =
                            await_cycle(&page, &mut responses, &extractor, config.response_timeout(), cycle).await;
                        cursor.apply(event);
                        if let Some(batch) = &batch {
                            snapshot.batches += 1;
                            snapshot.records += batch.len();
                        }
                        publish(&progress, &mut snapshot, &cursor);

                        if let Some(batch) = batch {
                            yield batch;
                        }
                    }
                    HarvestState::Init | HarvestState::Done | HarvestState::Aborted => break,
                }
            }

            match cursor.state() {
                HarvestState::Aborted => warn!(
                    "Harvest for '{}' stalled after {} cycles ({} batches, {} records)",
                    keyword, snapshot.cycles, snapshot.batches, snapshot.records
                ),
                _ if cursor.is_exhausted() => info!(
                    "Source exhausted for '{}' ({} batches, {} records)",
                    keyword, snapshot.batches, snapshot.records
                ),
                _ => info!(
                    "Harvest for '{}' finished ({} batches, {} records)",
                    keyword, snapshot.batches, snapshot.records
                ),
            }
        }
    }
}

fn publish(
    progress: &watch::Sender<HarvestProgress>,
    snapshot: &mut HarvestProgress,
    cursor: &PaginationState,
) {
    snapshot.state = cursor.state();
    snapshot.cycles = cursor.cycle();
    snapshot.exhausted = cursor.is_exhausted();
    progress.send_replace(*snapshot);
}

/// One await: wait for a response, decode it and enrich any listings.
/// Returns the event for the state machine and the batch to yield, if any.
async fn await_cycle<P, S>(
    page: &P,
    responses: &mut S,
    extractor: &DetailExtractor,
    timeout: Duration,
    cycle: u32,
) -> (HarvestEvent, Option<Vec<StandardizedRecord>>)
where
    P: BrowserPage,
    S: ResponseSource,
{
    let Some(response) = responses.next_response(timeout).await else {
        warn!("Timeout waiting for response packet on batch {}", cycle);
        return (HarvestEvent::TimedOut, None);
    };

    match decode_response(&response) {
        DecodeOutcome::BadStatus(status) => {
            warn!("Response status {} on batch {}", status, cycle);
            (HarvestEvent::BadStatus(status), None)
        }
        DecodeOutcome::Malformed(_) => (
            HarvestEvent::Decoded {
                listings: 0,
                has_more: true,
            },
            None,
        ),
        DecodeOutcome::Page(decoded) => {
            let listings = decoded.listings.len();
            info!("Found {} jobs in batch {}", listings, cycle);
            let event = HarvestEvent::Decoded {
                listings,
                has_more: decoded.has_more,
            };
            if listings == 0 {
                if !decoded.has_more {
                    info!("Server indicates no more jobs (hasMore=false)");
                }
                return (event, None);
            }
            let batch = enrich(page, extractor, decoded.listings).await;
            (event, Some(batch))
        }
    }
}

async fn enrich<P: BrowserPage>(
    page: &P,
    extractor: &DetailExtractor,
    listings: Vec<RawListing>,
) -> Vec<StandardizedRecord> {
    let mut batch = Vec::with_capacity(listings.len());
    for raw in listings {
        debug!("Extracting details for {}", raw.job_id);
        let augmentation = extractor.extract(page, &raw.job_id).await;
        batch.push(StandardizedRecord::standardize(raw, augmentation));
    }
    batch
}
