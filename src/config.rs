use std::time::Duration;

use crate::abion::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::endpoint::DomainFilter;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_url: String, // "https://api.abion.com"
    pub api_timeout: Duration,
    pub dry_run: bool,
    pub domain_filter: Vec<String>, // "abion.test", ...
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            api_timeout: DEFAULT_TIMEOUT,
            dry_run: false,
            domain_filter: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Domain filter as reported to external-dns, without trailing dots.
    pub fn domain_filter(&self) -> DomainFilter {
        DomainFilter::new(
            self.domain_filter
                .iter()
                .map(|d| d.trim().trim_end_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        )
    }
}
