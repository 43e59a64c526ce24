//! Scoped network-response interception.
//!
//! `Interception` is an RAII guard: while it lives, responses whose URL
//! contains the registered substring are captured (status + JSON body) and
//! queued in arrival order. Dropping the guard aborts the listener task,
//! which drops the CDP event subscriptions with it.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventResponseReceived,
    GetResponseBodyParams, RequestId,
};
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::page::{InterceptedResponse, ResponseSource};
use crate::infrastructure::harvest_error::{HarvestError, HarvestResult};

const QUEUE_CAPACITY: usize = 32;

/// Whether a response URL is covered by the interception filter
pub fn matches_filter(url: &str, url_substring: &str) -> bool {
    !url_substring.is_empty() && url.contains(url_substring)
}

/// Parse a response body captured through `Network.getResponseBody`
pub fn parse_body(body: &str, base64_encoded: bool) -> Option<Value> {
    if base64_encoded {
        // JSON endpoints are delivered as text; binary bodies are not listings
        return None;
    }
    serde_json::from_str(body).ok()
}

#[derive(Debug)]
pub struct Interception {
    url_substring: String,
    receiver: mpsc::Receiver<InterceptedResponse>,
    listener: JoinHandle<()>,
}

impl Interception {
    /// Register the filter on `page`. Network events are enabled first so the
    /// subscription sees every response from here on.
    pub async fn register(page: &Page, url_substring: &str) -> HarvestResult<Self> {
        page.execute(EnableParams::default())
            .await
            .map_err(|e| HarvestError::Interception(format!("Network.enable failed: {e}")))?;

        let responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| HarvestError::Interception(e.to_string()))?;
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(|e| HarvestError::Interception(e.to_string()))?;
        let failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(|e| HarvestError::Interception(e.to_string()))?;

        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let filter = url_substring.to_string();
        let listener_page = page.clone();

        let listener = tokio::spawn(async move {
            let mut responses = responses;
            let mut finished = finished;
            let mut failed = failed;
            // matched responses waiting for their body to finish loading
            let mut pending: HashMap<String, (RequestId, String, u16)> = HashMap::new();

            loop {
                tokio::select! {
                    Some(event) = responses.next() => {
                        if matches_filter(&event.response.url, &filter) {
                            let status = u16::try_from(event.response.status).unwrap_or(0);
                            debug!("Intercepted {} ({})", event.response.url, status);
                            pending.insert(
                                event.request_id.as_ref().to_string(),
                                (event.request_id.clone(), event.response.url.clone(), status),
                            );
                        }
                    }
                    Some(event) = finished.next() => {
                        let Some((request_id, url, status)) = pending.remove(event.request_id.as_ref()) else {
                            continue;
                        };
                        let body = fetch_body(&listener_page, request_id).await;
                        if sender.send(InterceptedResponse { url, status, body }).await.is_err() {
                            break;
                        }
                    }
                    Some(event) = failed.next() => {
                        let Some((_, url, status)) = pending.remove(event.request_id.as_ref()) else {
                            continue;
                        };
                        warn!("Intercepted request failed to load: {} ({})", url, event.error_text);
                        if sender.send(InterceptedResponse { url, status, body: None }).await.is_err() {
                            break;
                        }
                    }
                    else => break,
                }
            }
        });

        info!("Started listening for {}", url_substring);
        Ok(Self {
            url_substring: url_substring.to_string(),
            receiver,
            listener,
        })
    }

    pub fn url_substring(&self) -> &str {
        &self.url_substring
    }
}

async fn fetch_body(page: &Page, request_id: RequestId) -> Option<Value> {
    match page.execute(GetResponseBodyParams::new(request_id)).await {
        Ok(response) => parse_body(&response.result.body, response.result.base64_encoded),
        Err(e) => {
            warn!("Failed to read intercepted response body: {}", e);
            None
        }
    }
}

#[async_trait]
impl ResponseSource for Interception {
    async fn next_response(&mut self, timeout: Duration) -> Option<InterceptedResponse> {
        tokio::time::timeout(timeout, self.receiver.recv())
            .await
            .ok()
            .flatten()
    }
}

impl Drop for Interception {
    fn drop(&mut self) {
        self.listener.abort();
        info!("Stopped listening for {}", self.url_substring);
    }
}
