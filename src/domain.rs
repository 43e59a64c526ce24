//! Domain module - listing data model, normalization and pagination rules
//!
//! Everything here is free of browser and database I/O:
//! - `listing`: raw and standardized job records
//! - `normalizer`: salary / experience text parsing
//! - `pagination`: the harvest state machine
//! - `repositories`: the persistence seam

pub mod constants;
pub mod listing;
pub mod normalizer;
pub mod pagination;
pub mod repositories;

pub use listing::{DetailAugmentation, RawListing, StandardizedRecord, detail_url};
pub use normalizer::{ExperienceRange, SalaryRange, parse_experience, parse_salary};
pub use pagination::{HarvestEvent, HarvestState, PaginationState};
pub use repositories::{JobRepository, RepositoryError};
