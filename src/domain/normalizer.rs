//! Free-text field normalization
//!
//! Turns the salary and experience strings delivered by the listing payload
//! into structured numeric ranges. Both parsers are total: text they do not
//! recognize resolves to a documented default instead of an error.
//!
//! Recognized salary forms:
//! - `15-25K` monthly range in thousands (unit is case-insensitive)
//! - `15-25K·14薪` the same, with 14 salary payments per year
//! - `100-200元/天` daily range, taken as-is
//!
//! Recognized experience forms, in priority order:
//! - `3-5年` range in years
//! - `10年以上` open-ended, upper bound 99
//! - `1年以内` capped, lower bound 0
//! - anything else (`经验不限`, `应届生`, empty) is `(0, 0)`

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::constants::normalization::{
    DEFAULT_SALARY_MONTHS, OPEN_ENDED_EXPERIENCE_YEARS, THOUSANDS,
};

static BONUS_MONTHS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"·([0-9]+)薪").expect("bonus months pattern"));
static MONTHLY_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([0-9]+)-([0-9]+)K").expect("monthly range pattern"));
static DAILY_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)-([0-9]+)元/天").expect("daily range pattern"));

static EXPERIENCE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)-([0-9]+)年").expect("experience range pattern"));
static EXPERIENCE_AT_LEAST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)年以上").expect("experience lower bound pattern"));
static EXPERIENCE_AT_MOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)年以内").expect("experience upper bound pattern"));

/// Parsed salary: monthly bounds in yuan (or daily bounds for 元/天 postings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: u32,
    pub max: u32,
    pub avg: u32,
    pub months: u32,
}

impl SalaryRange {
    fn from_bounds(min: u32, max: u32, months: u32) -> Self {
        let avg = (u64::from(min) + u64::from(max)) / 2;
        Self {
            min,
            max,
            // the mean of two u32 values always fits in u32
            avg: u32::try_from(avg).unwrap_or(u32::MAX),
            months,
        }
    }
}

impl Default for SalaryRange {
    fn default() -> Self {
        Self::from_bounds(0, 0, DEFAULT_SALARY_MONTHS)
    }
}

/// Parsed experience requirement in years; `max_years` is always >= `min_years`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ExperienceRange {
    pub min_years: u32,
    pub max_years: u32,
}

impl ExperienceRange {
    fn ordered(a: u32, b: u32) -> Self {
        Self {
            min_years: a.min(b),
            max_years: a.max(b),
        }
    }
}

/// Parse a free-text salary description.
///
/// Empty or absent input yields `(0, 0, 0, 12)`.
pub fn parse_salary(raw: Option<&str>) -> SalaryRange {
    let Some(text) = raw.filter(|s| !s.is_empty()) else {
        return SalaryRange::default();
    };

    let months = BONUS_MONTHS
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .unwrap_or(DEFAULT_SALARY_MONTHS);

    let (min, max) = monthly_bounds(text)
        .or_else(|| capture_pair(&DAILY_RANGE, text))
        .unwrap_or((0, 0));

    SalaryRange::from_bounds(min, max, months)
}

/// Parse a free-text experience requirement.
///
/// Phrasings with no number ("经验不限", "应届生") and empty input are `(0, 0)`.
pub fn parse_experience(raw: Option<&str>) -> ExperienceRange {
    let Some(text) = raw.filter(|s| !s.is_empty()) else {
        return ExperienceRange::default();
    };

    if let Some((a, b)) = capture_pair(&EXPERIENCE_RANGE, text) {
        return ExperienceRange::ordered(a, b);
    }
    if let Some(years) = capture_single(&EXPERIENCE_AT_LEAST, text) {
        return ExperienceRange::ordered(years, OPEN_ENDED_EXPERIENCE_YEARS);
    }
    if let Some(years) = capture_single(&EXPERIENCE_AT_MOST, text) {
        return ExperienceRange::ordered(0, years);
    }
    ExperienceRange::default()
}

fn monthly_bounds(text: &str) -> Option<(u32, u32)> {
    let (low, high) = capture_pair(&MONTHLY_RANGE, text)?;
    Some((low.checked_mul(THOUSANDS)?, high.checked_mul(THOUSANDS)?))
}

// Digits too large for u32 count as "no match" so the next pattern is tried.
fn capture_pair(pattern: &Regex, text: &str) -> Option<(u32, u32)> {
    let caps = pattern.captures(text)?;
    let low = caps[1].parse::<u32>().ok()?;
    let high = caps[2].parse::<u32>().ok()?;
    Some((low, high))
}

fn capture_single(pattern: &Regex, text: &str) -> Option<u32> {
    pattern.captures(text)?[1].parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("15-25K", (15_000, 25_000, 20_000, 12))]
    #[case("15-25K·14薪", (15_000, 25_000, 20_000, 14))]
    #[case("15-25k", (15_000, 25_000, 20_000, 12))]
    #[case("9-13K·13薪", (9_000, 13_000, 11_000, 13))]
    #[case("100-200元/天", (100, 200, 150, 12))]
    #[case("150-201元/天", (150, 201, 175, 12))]
    #[case("面议", (0, 0, 0, 12))]
    #[case("面议·15薪", (0, 0, 0, 15))]
    fn salary_cases(#[case] raw: &str, #[case] expected: (u32, u32, u32, u32)) {
        let parsed = parse_salary(Some(raw));
        assert_eq!((parsed.min, parsed.max, parsed.avg, parsed.months), expected);
    }

    #[test]
    fn empty_salary_defaults() {
        let expected = SalaryRange { min: 0, max: 0, avg: 0, months: 12 };
        assert_eq!(parse_salary(None), expected);
        assert_eq!(parse_salary(Some("")), expected);
    }

    #[test]
    fn monthly_range_wins_over_daily_range() {
        let parsed = parse_salary(Some("10-20K 或 100-200元/天"));
        assert_eq!((parsed.min, parsed.max), (10_000, 20_000));
    }

    #[test]
    fn oversized_digits_fall_back_to_zero() {
        let parsed = parse_salary(Some("99999999999-99999999999K"));
        assert_eq!((parsed.min, parsed.max, parsed.avg), (0, 0, 0));
    }

    #[rstest]
    #[case("3-5年", (3, 5))]
    #[case("5-10年", (5, 10))]
    #[case("10年以上", (10, 99))]
    #[case("1年以内", (0, 1))]
    #[case("经验不限", (0, 0))]
    #[case("应届生", (0, 0))]
    #[case("在校/应届", (0, 0))]
    #[case("", (0, 0))]
    fn experience_cases(#[case] raw: &str, #[case] expected: (u32, u32)) {
        let parsed = parse_experience(Some(raw));
        assert_eq!((parsed.min_years, parsed.max_years), expected);
    }

    #[test]
    fn experience_absent_is_zero() {
        assert_eq!(parse_experience(None), ExperienceRange::default());
    }

    #[test]
    fn backwards_experience_range_is_reordered() {
        let parsed = parse_experience(Some("5-3年"));
        assert_eq!((parsed.min_years, parsed.max_years), (3, 5));
    }

    proptest! {
        #[test]
        fn thousands_range_scales(a in 0u32..1000, b in 0u32..1000, upper in any::<bool>()) {
            let unit = if upper { "K" } else { "k" };
            let parsed = parse_salary(Some(&format!("{a}-{b}{unit}")));
            prop_assert_eq!(parsed.min, a * 1000);
            prop_assert_eq!(parsed.max, b * 1000);
            prop_assert_eq!(parsed.avg, (a * 1000 + b * 1000) / 2);
            prop_assert_eq!(parsed.months, 12);
        }

        #[test]
        fn parsing_is_idempotent(text in "\\PC{0,24}") {
            prop_assert_eq!(parse_salary(Some(&text)), parse_salary(Some(&text)));
            prop_assert_eq!(parse_experience(Some(&text)), parse_experience(Some(&text)));
        }

        #[test]
        fn experience_bounds_are_ordered(text in "[0-9]{1,3}(-[0-9]{1,3})?年(以上|以内)?") {
            let parsed = parse_experience(Some(&text));
            prop_assert!(parsed.max_years >= parsed.min_years);
        }
    }
}
