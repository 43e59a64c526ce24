//! job-harvester - network-interception job listing harvester
//!
//! Attaches to a running Chromium over CDP, captures the listing site's
//! search responses while scrolling, enriches each listing with its
//! description from the DOM and normalizes salary/experience text into
//! numeric ranges before handing batches to a repository.

// Module declarations
pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{HarvestReport, HarvestRequest, HarvestService};
pub use domain::{JobRepository, StandardizedRecord};
pub use infrastructure::{AppConfig, Harvester, HarvestError};
