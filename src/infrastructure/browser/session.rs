//! Attachment to an already-running Chromium instance.
//!
//! The browser is expected to have been started with
//! `--remote-debugging-port=<port>`. Attachment is a single attempt: a
//! failure here ends the harvest run before any cycle starts.

use chromiumoxide::{Browser, Handler, Page};
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::interception::Interception;
use super::page::CdpPage;
use crate::infrastructure::config::BrowserConfig;
use crate::infrastructure::harvest_error::{HarvestError, HarvestResult};

/// Extract the websocket endpoint from a `/json/version` document
pub fn websocket_url_from_version(version: &Value) -> Option<String> {
    version
        .get("webSocketDebuggerUrl")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// One browser attachment owning one dedicated page.
pub struct BrowserSession {
    // kept so the CDP connection stays open for the session's lifetime
    _browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    endpoint: String,
}

impl BrowserSession {
    /// Attach to the browser's debugging endpoint and open a working page.
    pub async fn acquire(config: &BrowserConfig) -> HarvestResult<Self> {
        let endpoint = config.endpoint();
        let ws_url = discover_websocket_url(config).await?;
        info!("Discovered CDP endpoint: {}", ws_url);

        let (browser, handler) = Browser::connect(ws_url)
            .await
            .map_err(|e| HarvestError::connection(&endpoint, e))?;
        let handler_task = spawn_handler_task(handler);

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(HarvestError::connection(&endpoint, e));
            }
        };

        info!("Successfully attached to browser at {}", endpoint);
        Ok(Self {
            _browser: browser,
            page,
            handler_task,
            endpoint,
        })
    }

    pub fn page(&self) -> CdpPage {
        CdpPage::new(self.page.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Register a response filter for URLs containing `url_substring`.
    /// The filter lives exactly as long as the returned guard.
    pub async fn scoped_interception(&self, url_substring: &str) -> HarvestResult<Interception> {
        Interception::register(&self.page, url_substring).await
    }

    /// Close the working page; the user's browser itself stays up.
    pub async fn release(self) {
        if let Err(e) = self.page.clone().close().await {
            warn!("Failed to close harvest page: {}", e);
        }
        info!("Released browser session at {}", self.endpoint);
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

async fn discover_websocket_url(config: &BrowserConfig) -> HarvestResult<String> {
    let endpoint = config.endpoint();
    let client = reqwest::Client::builder()
        .timeout(config.connect_timeout())
        .build()
        .map_err(|e| HarvestError::connection(&endpoint, e))?;

    let version: Value = client
        .get(config.version_url())
        .send()
        .await
        .map_err(|e| HarvestError::connection(&endpoint, e))?
        .json()
        .await
        .map_err(|e| HarvestError::connection(&endpoint, format!("invalid /json/version: {e}")))?;

    websocket_url_from_version(&version).ok_or_else(|| {
        HarvestError::connection(&endpoint, "no webSocketDebuggerUrl in /json/version")
    })
}

fn spawn_handler_task(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!("chromiumoxide handler event error: {}", e);
            }
        }
    })
}
