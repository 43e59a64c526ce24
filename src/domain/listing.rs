use serde::{Deserialize, Serialize};

use super::constants::site::{DETAIL_URL_PREFIX, DETAIL_URL_SUFFIX};
use super::normalizer::{parse_experience, parse_salary};

/// One job entry as delivered by the intercepted search payload.
///
/// Lives for a single pagination cycle; only the fields the harvester
/// understands are projected out of the raw JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawListing {
    pub job_id: String,
    pub job_name: Option<String>,
    pub company_name: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub salary_text: Option<String>,
    pub experience_text: Option<String>,
    pub education: Option<String>,
    pub skills: Vec<String>,
}

/// Description text resolved from the DOM for one listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailAugmentation {
    pub description: Option<String>,
}

impl DetailAugmentation {
    pub fn found(description: String) -> Self {
        Self {
            description: Some(description),
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_present(&self) -> bool {
        self.description.is_some()
    }
}

/// The persisted shape of a job listing, keyed by `job_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardizedRecord {
    pub job_id: String,
    pub job_name: Option<String>,
    pub company_name: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub salary_raw: Option<String>,
    pub salary_min: u32,
    pub salary_max: u32,
    pub salary_avg: u32,
    pub salary_months: u32,
    pub experience_raw: Option<String>,
    pub exp_min: u32,
    pub exp_max: u32,
    pub education: Option<String>,
    pub skills_tags: Vec<String>,
    /// Empty when the DOM lookup found nothing
    pub job_desc: String,
    pub detail_url: String,
}

impl StandardizedRecord {
    /// Combine a raw listing with its (possibly absent) DOM augmentation,
    /// normalizing salary and experience along the way.
    pub fn standardize(raw: RawListing, augmentation: DetailAugmentation) -> Self {
        let salary = parse_salary(raw.salary_text.as_deref());
        let experience = parse_experience(raw.experience_text.as_deref());
        let detail_url = detail_url(&raw.job_id);

        Self {
            job_id: raw.job_id,
            job_name: raw.job_name,
            company_name: raw.company_name,
            city: raw.city,
            district: raw.district,
            salary_raw: raw.salary_text,
            salary_min: salary.min,
            salary_max: salary.max,
            salary_avg: salary.avg,
            salary_months: salary.months,
            experience_raw: raw.experience_text,
            exp_min: experience.min_years,
            exp_max: experience.max_years,
            education: raw.education,
            skills_tags: raw.skills,
            job_desc: augmentation.description.unwrap_or_default(),
            detail_url,
        }
    }
}

/// Public detail page for a listing identifier.
pub fn detail_url(job_id: &str) -> String {
    format!("{DETAIL_URL_PREFIX}{job_id}{DETAIL_URL_SUFFIX}")
}
