//! DOM detail extractor
//!
//! Best-effort lookup of a listing's description on the live results page:
//! locate the listing's card, click it open, then read the first description
//! candidate that yields text. Every failure degrades to an empty description
//! for that one listing.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::domain::DetailAugmentation;
use crate::domain::constants::extraction::JOB_ID_PLACEHOLDER;
use crate::infrastructure::browser::{BrowserPage, DomElement};
use crate::infrastructure::config::ExtractorConfig;
use crate::infrastructure::harvest_error::HarvestResult;

/// A selector with its own bounded wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionStrategy {
    pub selector: String,
    pub wait: Duration,
}

impl ResolutionStrategy {
    pub fn new(selector: impl Into<String>, wait: Duration) -> Self {
        Self {
            selector: selector.into(),
            wait,
        }
    }

    /// Poll the page until the selector matches or the wait runs out.
    /// Query errors count as "not yet" so a transient failure does not end
    /// the attempt early.
    pub async fn resolve<P: BrowserPage>(&self, page: &P, poll: Duration) -> Option<P::Element> {
        let deadline = Instant::now() + self.wait;
        loop {
            match page.query_selector(&self.selector).await {
                Ok(Some(element)) => return Some(element),
                Ok(None) => {}
                Err(e) => debug!("Selector '{}' query failed: {}", self.selector, e),
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            sleep(poll.min(deadline - now)).await;
        }
    }
}

/// Try strategies in order, stopping at the first one that resolves
pub async fn resolve_first<P: BrowserPage>(
    strategies: &[ResolutionStrategy],
    page: &P,
    poll: Duration,
) -> Option<(usize, P::Element)> {
    for (index, strategy) in strategies.iter().enumerate() {
        if let Some(element) = strategy.resolve(page, poll).await {
            return Some((index, element));
        }
    }
    None
}

/// Embed a listing id into a quoted CSS attribute value
pub fn escape_css_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '\'' | '"') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[derive(Debug, Clone)]
pub struct DetailExtractor {
    card_templates: Vec<String>,
    description_selectors: Vec<String>,
    wait: Duration,
    poll_interval: Duration,
    click_settle: Duration,
}

impl DetailExtractor {
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            card_templates: vec![
                config.primary_card_selector.clone(),
                config.fallback_card_selector.clone(),
            ],
            description_selectors: config.description_selectors.clone(),
            wait: config.selector_wait(),
            poll_interval: config.poll_interval(),
            click_settle: config.click_settle(),
        }
    }

    /// Card-resolution strategies for one listing, primary first
    pub fn card_strategies(&self, job_id: &str) -> Vec<ResolutionStrategy> {
        let escaped = escape_css_value(job_id);
        self.card_templates
            .iter()
            .map(|template| {
                ResolutionStrategy::new(template.replace(JOB_ID_PLACEHOLDER, &escaped), self.wait)
            })
            .collect()
    }

    fn description_strategies(&self) -> Vec<ResolutionStrategy> {
        self.description_selectors
            .iter()
            .map(|selector| ResolutionStrategy::new(selector.as_str(), self.wait))
            .collect()
    }

    /// Resolve the description for `job_id`. Never fails.
    pub async fn extract<P: BrowserPage>(&self, page: &P, job_id: &str) -> DetailAugmentation {
        let Some((strategy, card)) =
            resolve_first(&self.card_strategies(job_id), page, self.poll_interval).await
        else {
            warn!("No job card found for {}", job_id);
            return DetailAugmentation::absent();
        };
        debug!("Located card for {} with strategy {}", job_id, strategy);

        match self.read_description(page, &card).await {
            Ok(Some(text)) => DetailAugmentation::found(text),
            Ok(None) => {
                debug!("No description text for {}", job_id);
                DetailAugmentation::absent()
            }
            Err(e) => {
                warn!("Detail extraction failed for {}: {}", job_id, e);
                DetailAugmentation::absent()
            }
        }
    }

    async fn read_description<P: BrowserPage>(
        &self,
        page: &P,
        card: &P::Element,
    ) -> HarvestResult<Option<String>> {
        card.scroll_into_view().await?;
        card.click().await?;
        sleep(self.click_settle).await;

        for strategy in self.description_strategies() {
            let Some(element) = strategy.resolve(page, self.poll_interval).await else {
                continue;
            };
            if let Some(text) = element.inner_text().await? {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Ok(Some(trimmed.to_string()));
                }
            }
        }
        Ok(None)
    }
}
