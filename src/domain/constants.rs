//! Site characteristics and harvest defaults
//!
//! Fixed facts about the zhipin.com listing site and the default limits used
//! when no configuration overrides them.

/// zhipin.com site constants
pub mod site {
    /// Site base URL
    pub const BASE_URL: &str = "https://www.zhipin.com";

    /// Geek-side job search page; query and city are appended as parameters
    pub const SEARCH_PAGE_URL: &str = "https://www.zhipin.com/web/geek/job";

    /// Detail URL prefix; the listing identifier follows directly
    pub const DETAIL_URL_PREFIX: &str = "https://www.zhipin.com/job_detail/";

    /// Detail URL suffix
    pub const DETAIL_URL_SUFFIX: &str = ".html";

    /// Substring identifying the listing-search data endpoint
    pub const JOB_LIST_ENDPOINT: &str = "wapi/zpgeek/search/joblist.json";

    /// Default city code (Hangzhou area)
    pub const DEFAULT_CITY_CODE: &str = "101210700";
}

/// Harvest loop defaults
pub mod harvest {
    /// Default number of cycles per harvest run
    pub const DEFAULT_PAGES: u32 = 3;

    /// Bounded wait for the next intercepted response (seconds)
    pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 15;

    /// Settle delay after each infinite-scroll trigger (milliseconds)
    pub const DEFAULT_SCROLL_SETTLE_MS: u64 = 2000;

    /// Consecutive timeouts tolerated before the run is aborted
    pub const DEFAULT_STALL_TOLERANCE: u32 = 1;
}

/// DOM detail extraction defaults
pub mod extraction {
    /// Bounded wait per selector attempt (milliseconds)
    pub const DEFAULT_SELECTOR_WAIT_MS: u64 = 5000;

    /// Polling interval while a selector is being resolved (milliseconds)
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

    /// Settle delay after clicking a job card (milliseconds)
    pub const DEFAULT_CLICK_SETTLE_MS: u64 = 1000;

    /// Placeholder substituted with the listing identifier in card selectors
    pub const JOB_ID_PLACEHOLDER: &str = "{job_id}";
}

/// Normalization sentinels
pub mod normalization {
    /// Bonus months assumed when the salary text carries none
    pub const DEFAULT_SALARY_MONTHS: u32 = 12;

    /// Upper bound used for open-ended experience ("N年以上")
    pub const OPEN_ENDED_EXPERIENCE_YEARS: u32 = 99;

    /// Multiplier applied to "K" salary bounds
    pub const THOUSANDS: u32 = 1000;
}

/// Browser attachment defaults
pub mod browser {
    /// Host of the already-running browser's debugging endpoint
    pub const DEFAULT_DEBUG_HOST: &str = "127.0.0.1";

    /// Remote debugging port
    pub const DEFAULT_DEBUG_PORT: u16 = 9222;

    /// Timeout for websocket endpoint discovery (seconds)
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_constants() {
        assert!(site::BASE_URL.starts_with("https://"));
        assert!(site::DETAIL_URL_PREFIX.starts_with(site::BASE_URL));
        assert!(site::SEARCH_PAGE_URL.starts_with(site::BASE_URL));
        assert!(site::JOB_LIST_ENDPOINT.ends_with(".json"));
    }

    #[test]
    fn test_harvest_defaults() {
        assert!(harvest::DEFAULT_PAGES >= 1);
        assert!(harvest::DEFAULT_STALL_TOLERANCE >= 1);
        assert!(extraction::DEFAULT_POLL_INTERVAL_MS < extraction::DEFAULT_SELECTOR_WAIT_MS);
    }
}
