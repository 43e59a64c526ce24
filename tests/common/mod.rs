//! In-memory stand-ins for the browser seams used by the pipeline tests
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use job_harvester::infrastructure::browser::{
    BrowserPage, DomElement, InterceptedResponse, ResponseSource,
};
use job_harvester::infrastructure::config::{ExtractorConfig, HarvestConfig};
use job_harvester::infrastructure::detail_extractor::DetailExtractor;
use job_harvester::infrastructure::harvest_error::{HarvestError, HarvestResult};

pub const DESCRIPTION_SELECTOR: &str = ".job-detail-box .desc";
const ENDPOINT_URL: &str = "https://www.zhipin.com/wapi/zpgeek/search/joblist.json";

pub fn job(id: &str, salary: &str, experience: &str) -> Value {
    json!({
        "encryptJobId": id,
        "jobName": format!("Job {id}"),
        "brandName": "某科技",
        "cityName": "杭州",
        "areaDistrict": "滨江区",
        "salaryDesc": salary,
        "jobExperience": experience,
        "jobDegree": "本科",
        "skills": ["Rust", "Tokio"]
    })
}

pub fn page_response(jobs: Vec<Value>, has_more: bool) -> InterceptedResponse {
    InterceptedResponse {
        url: format!("{ENDPOINT_URL}?page=1"),
        status: 200,
        body: Some(json!({"code": 0, "zpData": {"hasMore": has_more, "jobList": jobs}})),
    }
}

pub fn status_response(status: u16) -> InterceptedResponse {
    InterceptedResponse {
        url: ENDPOINT_URL.to_string(),
        status,
        body: None,
    }
}

/// Zero waits everywhere so tests never sleep
pub fn harvest_config() -> HarvestConfig {
    HarvestConfig {
        response_timeout_secs: 1,
        scroll_settle_ms: 0,
        ..HarvestConfig::default()
    }
}

pub fn extractor() -> DetailExtractor {
    DetailExtractor::from_config(&ExtractorConfig {
        selector_wait_ms: 0,
        poll_interval_ms: 0,
        click_settle_ms: 0,
        ..ExtractorConfig::default()
    })
}

/// Responses queued in arrival order; an empty queue behaves like a timeout.
#[derive(Default)]
pub struct ScriptedResponses {
    queue: VecDeque<Option<InterceptedResponse>>,
    released: Arc<AtomicBool>,
}

impl ScriptedResponses {
    pub fn new(responses: impl IntoIterator<Item = Option<InterceptedResponse>>) -> Self {
        Self {
            queue: responses.into_iter().collect(),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn released_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

#[async_trait]
impl ResponseSource for ScriptedResponses {
    async fn next_response(&mut self, _timeout: Duration) -> Option<InterceptedResponse> {
        self.queue.pop_front().flatten()
    }
}

impl Drop for ScriptedResponses {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct PageState {
    navigations: Vec<String>,
    opened_card: Option<String>,
}

/// A results page holding job cards. Clicking a card shows its description
/// under [`DESCRIPTION_SELECTOR`].
#[derive(Clone, Default)]
pub struct FakeResultsPage {
    cards: Arc<HashMap<String, Option<String>>>,
    state: Arc<Mutex<PageState>>,
    scrolls: Arc<AtomicU32>,
    fail_navigation: bool,
}

impl FakeResultsPage {
    /// `(job_id, description)` pairs; `None` means the card shows no text
    pub fn with_cards<'a>(cards: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) -> Self {
        Self {
            cards: Arc::new(
                cards
                    .into_iter()
                    .map(|(id, text)| (id.to_string(), text.map(str::to_string)))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn failing_navigation() -> Self {
        Self {
            fail_navigation: true,
            ..Self::default()
        }
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn scrolls(&self) -> u32 {
        self.scrolls.load(Ordering::SeqCst)
    }
}

pub enum FakeElement {
    Card { job_id: String, page: FakeResultsPage },
    Description(Option<String>),
}

#[async_trait]
impl DomElement for FakeElement {
    async fn scroll_into_view(&self) -> HarvestResult<()> {
        Ok(())
    }

    async fn click(&self) -> HarvestResult<()> {
        match self {
            Self::Card { job_id, page } => {
                page.state.lock().unwrap().opened_card = Some(job_id.clone());
                Ok(())
            }
            Self::Description(_) => Err(HarvestError::element(DESCRIPTION_SELECTOR, "not clickable")),
        }
    }

    async fn inner_text(&self) -> HarvestResult<Option<String>> {
        match self {
            Self::Card { job_id, .. } => Ok(Some(job_id.clone())),
            Self::Description(text) => Ok(text.clone()),
        }
    }
}

#[async_trait]
impl BrowserPage for FakeResultsPage {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> HarvestResult<()> {
        if self.fail_navigation {
            return Err(HarvestError::navigation(url, "net::ERR_CONNECTION_RESET"));
        }
        self.state.lock().unwrap().navigations.push(url.to_string());
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> HarvestResult<()> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query_selector(&self, selector: &str) -> HarvestResult<Option<FakeElement>> {
        if selector == DESCRIPTION_SELECTOR {
            let opened = self.state.lock().unwrap().opened_card.clone();
            return Ok(opened
                .and_then(|id| self.cards.get(&id).cloned())
                .map(FakeElement::Description));
        }

        // primary card selectors look like `li.job-card-box a[href*='<id>']`
        if selector.starts_with("li.job-card-box") {
            let found = self
                .cards
                .keys()
                .find(|id| selector.contains(&format!("'{id}'")))
                .cloned();
            return Ok(found.map(|job_id| FakeElement::Card {
                job_id,
                page: self.clone(),
            }));
        }

        Ok(None)
    }
}
