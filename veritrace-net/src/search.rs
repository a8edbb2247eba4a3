//! Search executors
//!
//! Turns one dork query into a bounded list of result URLs.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use crate::Transport;
use veritrace_core::{SearchError, SearchExecutor, SharedSearch};

const DUCKDUCKGO_HTML: &str = "https://html.duckduckgo.com/html/";
const BRAVE_API: &str = "https://api.search.brave.com/res/v1/web/search";

/// Brave caps `count` at 20
const BRAVE_MAX_COUNT: usize = 20;

fn request_error(e: reqwest::Error, timeout: Duration) -> SearchError {
    if e.is_timeout() {
        SearchError::Timeout(timeout)
    } else {
        SearchError::Request(e.to_string())
    }
}

/// DuckDuckGo's JavaScript-free results page
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    transport: Transport,
    timeout: Duration,
}

impl DuckDuckGoSearch {
    pub fn new(transport: Transport, timeout: Duration) -> Self {
        Self { transport, timeout }
    }
}

#[async_trait]
impl SearchExecutor for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        let url = format!("{}?q={}", DUCKDUCKGO_HTML, urlencoding::encode(query));
        debug!(query = %query, "DuckDuckGo search");

        let response = self
            .transport
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| request_error(e, self.timeout))?;

        let mut urls = parse_duckduckgo_results(&html);
        urls.truncate(limit);
        debug!("DuckDuckGo returned {} results", urls.len());
        Ok(urls)
    }
}

/// Pull result links out of a DuckDuckGo HTML results page
fn parse_duckduckgo_results(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a.result__a").unwrap();

    let mut seen = HashSet::new();
    let mut results = Vec::new();

    for element in document.select(&link_selector) {
        let href = match element.value().attr("href") {
            Some(h) => h,
            None => continue,
        };

        let url = match resolve_redirect(href) {
            Some(u) => u,
            None => continue,
        };

        // Sponsored results point back at duckduckgo.com
        if url.contains("duckduckgo.com/y.js") {
            continue;
        }

        if seen.insert(normalize_url(&url)) {
            results.push(url);
        }
    }

    results
}

/// Result links are wrapped as `//duckduckgo.com/l/?uddg=<encoded>&rut=...`
fn resolve_redirect(href: &str) -> Option<String> {
    if let Some(start) = href.find("uddg=") {
        let encoded = &href[start + 5..];
        let encoded = encoded.split('&').next().unwrap_or(encoded);
        let decoded = urlencoding::decode(encoded).ok()?;
        return Some(decoded.into_owned()).filter(|u| u.starts_with("http"));
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }

    None
}

/// Comparison form of a URL: scheme and host lower-cased, path kept as is,
/// no trailing slash
pub fn normalize_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let host_end = rest.find(&['/', '?', '#'][..]).unwrap_or(rest.len());
    let (host, tail) = rest.split_at(host_end);
    format!(
        "{}://{}{}",
        scheme.to_ascii_lowercase(),
        host.to_ascii_lowercase(),
        tail
    )
}

/// Brave Search API; requires a subscription token
#[derive(Debug, Clone)]
pub struct BraveSearch {
    transport: Transport,
    api_key: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    url: String,
}

impl BraveSearch {
    pub fn new(transport: Transport, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            timeout,
        }
    }

    /// Build from `BRAVE_API_KEY`, if set
    pub fn from_env(transport: Transport, timeout: Duration) -> Option<Self> {
        std::env::var("BRAVE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(|key| Self::new(transport, key, timeout))
    }
}

#[async_trait]
impl SearchExecutor for BraveSearch {
    fn name(&self) -> &str {
        "brave"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::NotConfigured("BRAVE_API_KEY".into()));
        }

        let count = limit.clamp(1, BRAVE_MAX_COUNT);
        let url = format!(
            "{}?q={}&count={}",
            BRAVE_API,
            urlencoding::encode(query),
            count
        );
        debug!(query = %query, "Brave search");

        let response = self
            .transport
            .get(&url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| request_error(e, self.timeout))?;

        let mut urls = parse_brave_results(&body)?;
        urls.truncate(limit);
        Ok(urls)
    }
}

fn parse_brave_results(body: &str) -> Result<Vec<String>, SearchError> {
    let parsed: BraveResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))?;

    Ok(parsed
        .web
        .map(|w| w.results.into_iter().map(|r| r.url).collect())
        .unwrap_or_default())
}

/// Fans one query out to several engines.
///
/// Results keep engine order, are deduplicated by normalized URL and cut to
/// the limit. Fails only when every engine fails.
#[derive(Clone)]
pub struct CombinedSearch {
    engines: Vec<SharedSearch>,
}

impl CombinedSearch {
    pub fn new(engines: Vec<SharedSearch>) -> Self {
        Self { engines }
    }
}

#[async_trait]
impl SearchExecutor for CombinedSearch {
    fn name(&self) -> &str {
        "combined"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        if self.engines.is_empty() {
            return Err(SearchError::NotConfigured("no search engines".into()));
        }

        let outcomes =
            futures::future::join_all(self.engines.iter().map(|e| e.search(query, limit))).await;

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        let mut first_error = None;
        let mut any_ok = false;

        for (engine, outcome) in self.engines.iter().zip(outcomes) {
            match outcome {
                Ok(results) => {
                    any_ok = true;
                    for url in results {
                        if seen.insert(normalize_url(&url)) {
                            urls.push(url);
                        }
                    }
                }
                Err(e) => {
                    warn!("Engine {} failed: {}", engine.name(), e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match (any_ok, first_error) {
            (false, Some(e)) => Err(e),
            _ => {
                urls.truncate(limit);
                Ok(urls)
            }
        }
    }
}
