//! Per-request resource blocking for scraper pages.
//!
//! The price text arrives with the document and its scripts/XHR; images,
//! stylesheets, fonts, media, and tracking beacons only slow the page
//! down. [`ResourceFilter::should_block`] makes the abort/continue
//! decision for each intercepted request.

use serde::Deserialize;
use url::Url;

use crate::config::FilterConfig;

/// Browser-agnostic resource type of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    Xhr,
    Fetch,
    Other,
}

/// Block-list evaluated per outgoing request.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    blocked_kinds: Vec<ResourceKind>,
    blocked_domains: Vec<String>,
}

impl ResourceFilter {
    pub fn new(blocked_kinds: Vec<ResourceKind>, blocked_domains: Vec<String>) -> Self {
        Self {
            blocked_kinds,
            blocked_domains: blocked_domains
                .into_iter()
                .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.blocked_types.clone(), config.blocked_domains.clone())
    }

    /// `true` when the request should be aborted.
    pub fn should_block(&self, kind: ResourceKind, url: &str) -> bool {
        self.blocked_kinds.contains(&kind) || self.is_blocked_url(url)
    }

    fn is_blocked_url(&self, url: &str) -> bool {
        if self.blocked_domains.is_empty() {
            return false;
        }
        match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_ascii_lowercase)) {
            Some(host) => self.blocked_domains.iter().any(|domain| {
                host == *domain
                    || host
                        .strip_suffix(domain.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }),
            // Unparsable URL: fall back to a plain substring match.
            None => self.blocked_domains.iter().any(|d| url.contains(d.as_str())),
        }
    }
}
