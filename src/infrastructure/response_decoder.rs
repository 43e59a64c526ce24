//! Response decoder
//!
//! Turns one intercepted search response into raw listings. Decoding fails
//! closed: anything unexpected becomes "no listings this cycle" plus a
//! warning, never an error.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::RawListing;
use crate::infrastructure::browser::InterceptedResponse;

/// Listings carried by one well-formed payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedPage {
    pub listings: Vec<RawListing>,
    /// The payload's `hasMore` flag; assumed `true` when absent
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Non-2xx HTTP status
    BadStatus(u16),
    /// Body did not have the expected shape
    Malformed(&'static str),
    Page(DecodedPage),
}

impl DecodeOutcome {
    /// Listings contributed to the cycle; zero for every failure shape
    pub fn listing_count(&self) -> usize {
        match self {
            Self::Page(page) => page.listings.len(),
            Self::BadStatus(_) | Self::Malformed(_) => 0,
        }
    }
}

pub const fn is_success_status(status: u16) -> bool {
    matches!(status, 200..=299)
}

/// Decode one intercepted response.
pub fn decode_response(response: &InterceptedResponse) -> DecodeOutcome {
    if !is_success_status(response.status) {
        warn!("Bad status {} from {}", response.status, response.url);
        return DecodeOutcome::BadStatus(response.status);
    }

    let outcome = response
        .body
        .as_ref()
        .map_or(DecodeOutcome::Malformed("missing or non-JSON body"), decode_payload);

    if let DecodeOutcome::Malformed(reason) = &outcome {
        warn!("Malformed payload from {}: {}", response.url, reason);
    }
    outcome
}

/// Decode the JSON body of a search response
pub fn decode_payload(body: &Value) -> DecodeOutcome {
    let Some(root) = body.as_object() else {
        return DecodeOutcome::Malformed("body is not an object");
    };
    let Some(data) = root.get("zpData").and_then(Value::as_object) else {
        return DecodeOutcome::Malformed("missing zpData");
    };
    let Some(entries) = data.get("jobList").and_then(Value::as_array) else {
        return DecodeOutcome::Malformed("missing jobList");
    };

    let has_more = data.get("hasMore").and_then(Value::as_bool).unwrap_or(true);

    let mut listings = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match entry.as_object().and_then(project_listing) {
            Some(listing) => listings.push(listing),
            None => warn!("Skipping job entry {} without encryptJobId", index),
        }
    }

    debug!("Decoded {} listings (hasMore={})", listings.len(), has_more);
    DecodeOutcome::Page(DecodedPage { listings, has_more })
}

fn project_listing(entry: &Map<String, Value>) -> Option<RawListing> {
    let job_id = text_field(entry, "encryptJobId").filter(|id| !id.is_empty())?;

    let skills = entry
        .get("skills")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(RawListing {
        job_id,
        job_name: text_field(entry, "jobName"),
        company_name: text_field(entry, "brandName"),
        city: text_field(entry, "cityName"),
        district: text_field(entry, "areaDistrict"),
        salary_text: text_field(entry, "salaryDesc"),
        experience_text: text_field(entry, "jobExperience"),
        education: text_field(entry, "jobDegree"),
        skills,
    })
}

// Strings pass through; numbers are rendered since the site is not consistent
fn text_field(entry: &Map<String, Value>, key: &str) -> Option<String> {
    match entry.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
