//! Anchor extraction for crawled pages.
//!
//! Links are pulled out of raw markup with a tolerant pattern rather than a
//! full HTML parse, so broken markup only ever yields fewer links.

use crate::error::{Result, ScanError};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*href=["'](.*?)["']"#).expect("anchor pattern is valid")
});

/// The network location a crawl is confined to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    netloc: String,
}

impl Scope {
    /// Parses the seed URL and returns it in normalized form alongside the
    /// scope derived from it.
    pub fn from_seed(seed: &str) -> Result<(String, Scope)> {
        let trimmed = seed.trim();
        if trimmed.is_empty() {
            return Err(ScanError::InvalidUrl("seed URL is empty".to_string()));
        }

        let mut parsed = Url::parse(trimmed)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
        parsed.set_fragment(None);

        let netloc =
            network_location(&parsed).ok_or_else(|| ScanError::MissingHost(trimmed.to_string()))?;

        Ok((parsed.to_string(), Scope { netloc }))
    }

    pub fn netloc(&self) -> &str {
        &self.netloc
    }

    pub fn contains(&self, url: &Url) -> bool {
        network_location(url).as_deref() == Some(self.netloc.as_str())
    }
}

/// `[user[:password]@]host[:port]` of a URL. Default ports are already dropped
/// by the parser, so `http://a:80/` and `http://a/` share a location. URLs
/// without a host have none.
pub fn network_location(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;

    let mut netloc = String::new();
    if !url.username().is_empty() || url.password().is_some() {
        netloc.push_str(url.username());
        if let Some(password) = url.password() {
            netloc.push(':');
            netloc.push_str(password);
        }
        netloc.push('@');
    }
    netloc.push_str(host);
    if let Some(port) = url.port() {
        netloc.push_str(&format!(":{}", port));
    }
    Some(netloc)
}

/// Resolves an href against the page it was found on. The fragment is cut off
/// before resolution.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let without_fragment = href.trim().split('#').next().unwrap_or_default();
    let mut resolved = base.join(without_fragment).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}

/// Every in-scope URL referenced by an anchor in `html`.
pub fn extract_links(html: &str, base_url: &str, scope: &Scope) -> HashSet<String> {
    let mut links = HashSet::new();

    let Ok(base) = Url::parse(base_url) else {
        debug!("Cannot resolve links against invalid base {}", base_url);
        return links;
    };

    for capture in ANCHOR_HREF.captures_iter(html) {
        let href = &capture[1];
        if let Some(resolved) = resolve_href(&base, href)
            && scope.contains(&resolved)
        {
            links.insert(resolved.to_string());
        }
    }

    debug!("Found {} internal links on {}", links.len(), base_url);
    links
}
