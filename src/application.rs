//! Application layer module
//!
//! Orchestrates a harvest run: browser session, pagination driver and
//! persistence sink.

pub mod harvest_service;

pub use harvest_service::{HarvestReport, HarvestRequest, HarvestService, InvalidRequest};
