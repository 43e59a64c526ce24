//! Harvest error types
//!
//! Only setup failures (browser attachment, navigation) ever reach the caller
//! of a harvest. The other variants are produced by page operations and are
//! downgraded to warnings by the pagination driver or the detail extractor.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum HarvestError {
    #[error("Failed to attach to browser at {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("Browser command failed: {0}")]
    Browser(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Network interception failed: {0}")]
    Interception(String),

    #[error("Element interaction failed for '{selector}': {reason}")]
    Element { selector: String, reason: String },
}

impl HarvestError {
    pub fn connection(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    pub fn navigation(url: &str, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn element(selector: &str, reason: impl ToString) -> Self {
        Self::Element {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the harvest run can continue past this error
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Connection { .. } | Self::Navigation { .. } => false,
            Self::Browser(_) | Self::Interception(_) | Self::Element { .. } => true,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for HarvestError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Self::Browser(err.to_string())
    }
}

pub type HarvestResult<T> = Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_failures_are_fatal() {
        assert!(!HarvestError::connection("127.0.0.1:9222", "refused").is_recoverable());
        assert!(!HarvestError::navigation("https://example.com", "net::ERR").is_recoverable());
    }

    #[test]
    fn page_failures_are_recoverable() {
        assert!(HarvestError::element(".job-card", "detached").is_recoverable());
        assert!(HarvestError::Browser("timeout".to_string()).is_recoverable());
    }

    #[test]
    fn connection_message_names_endpoint() {
        let err = HarvestError::connection("127.0.0.1:9222", "connection refused");
        assert_eq!(
            err.to_string(),
            "Failed to attach to browser at 127.0.0.1:9222: connection refused"
        );
    }
}
