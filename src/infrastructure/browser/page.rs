//! Page-level seams used by the harvester.
//!
//! The pagination driver and the detail extractor only talk to these traits;
//! `CdpPage`/`CdpElement` are the Chrome DevTools implementations, tests use
//! in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Page, element::Element};
use serde_json::Value;

use crate::infrastructure::harvest_error::{HarvestError, HarvestResult};

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// A network response captured in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct InterceptedResponse {
    pub url: String,
    pub status: u16,
    /// `None` when the body could not be fetched or was not JSON
    pub body: Option<Value>,
}

/// Element handle resolved from a selector.
#[async_trait]
pub trait DomElement: Send + Sync {
    async fn scroll_into_view(&self) -> HarvestResult<()>;
    async fn click(&self) -> HarvestResult<()>;
    async fn inner_text(&self) -> HarvestResult<Option<String>>;
}

/// The single page a harvest run drives.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    type Element: DomElement;

    async fn navigate(&self, url: &str) -> HarvestResult<()>;

    /// Trigger the infinite-scroll loader
    async fn scroll_to_bottom(&self) -> HarvestResult<()>;

    /// Resolve a selector once; `Ok(None)` when nothing matches yet
    async fn query_selector(&self, selector: &str) -> HarvestResult<Option<Self::Element>>;
}

/// Ordered feed of intercepted responses matching the registered filter.
#[async_trait]
pub trait ResponseSource: Send {
    /// Wait up to `timeout` for the next response; `None` on timeout
    async fn next_response(&mut self, timeout: Duration) -> Option<InterceptedResponse>;
}

#[derive(Debug, Clone)]
pub struct CdpPage {
    page: Page,
}

impl CdpPage {
    pub const fn new(page: Page) -> Self {
        Self { page }
    }
}

#[async_trait]
impl BrowserPage for CdpPage {
    type Element = CdpElement;

    async fn navigate(&self, url: &str) -> HarvestResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| HarvestError::navigation(url, e))?;
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> HarvestResult<()> {
        self.page.evaluate(SCROLL_TO_BOTTOM_JS).await?;
        Ok(())
    }

    async fn query_selector(&self, selector: &str) -> HarvestResult<Option<CdpElement>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| HarvestError::element(selector, e))?;
        Ok(elements.into_iter().next().map(|element| CdpElement {
            element,
            selector: selector.to_string(),
        }))
    }
}

#[derive(Debug)]
pub struct CdpElement {
    element: Element,
    selector: String,
}

#[async_trait]
impl DomElement for CdpElement {
    async fn scroll_into_view(&self) -> HarvestResult<()> {
        self.element
            .scroll_into_view()
            .await
            .map_err(|e| HarvestError::element(&self.selector, e))?;
        Ok(())
    }

    async fn click(&self) -> HarvestResult<()> {
        self.element
            .click()
            .await
            .map_err(|e| HarvestError::element(&self.selector, e))?;
        Ok(())
    }

    async fn inner_text(&self) -> HarvestResult<Option<String>> {
        self.element
            .inner_text()
            .await
            .map_err(|e| HarvestError::element(&self.selector, e))
    }
}
