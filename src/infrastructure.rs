//! Infrastructure layer for the browser, persistence and process plumbing
//!
//! This module holds everything that talks to the outside world: the CDP
//! browser session, response decoding, DOM extraction, the pagination
//! driver, MySQL persistence, configuration and logging.

pub mod browser;
pub mod config;  // Layered application configuration
pub mod detail_extractor;
pub mod harvest_error;
pub mod harvester;  // Pagination driver
pub mod logging;  // Logging infrastructure
pub mod memory_job_repository;
pub mod mysql_job_repository;
pub mod response_decoder;

// Re-export commonly used items
pub use browser::{BrowserPage, BrowserSession, DomElement, InterceptedResponse, Interception, ResponseSource};
pub use config::{AppConfig, ConfigError};
pub use detail_extractor::{DetailExtractor, ResolutionStrategy};
pub use harvest_error::{HarvestError, HarvestResult};
pub use harvester::{HarvestOutcome, HarvestProgress, Harvester, search_url};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use memory_job_repository::InMemoryJobRepository;
pub use mysql_job_repository::MySqlJobRepository;
pub use response_decoder::{DecodeOutcome, DecodedPage, decode_response};
