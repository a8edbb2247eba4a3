//! Typed evidence found while investigating a target
//!
//! A [`Lead`] is one normalized fact (email, handle, URL or wallet-like token).
//! A [`ScamMention`] is a reputational keyword hit with its surrounding text.
//! A [`CrawledPage`] records what a single page visit produced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of leads the extractor and source adapters produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadKind {
    /// Email address
    Email,
    /// Platform handle / username
    Handle,
    /// Absolute URL
    Url,
    /// Wallet-like token (EVM hex or base58 family)
    Wallet,
}

/// Platforms a handle can be attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    GitHub,
    Telegram,
    Twitter,
    Instagram,
    Reddit,
    TikTok,
    YouTube,
    /// Bare `@handle` mention with no platform context
    Mention,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::GitHub => "GitHub",
            Platform::Telegram => "Telegram",
            Platform::Twitter => "Twitter",
            Platform::Instagram => "Instagram",
            Platform::Reddit => "Reddit",
            Platform::TikTok => "TikTok",
            Platform::YouTube => "YouTube",
            Platform::Mention => "Mention",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handle attributed to a platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    pub platform: Platform,
    pub value: String,
}

impl Handle {
    /// Strips `@` markers and lower-cases the handle
    pub fn new(platform: Platform, value: &str) -> Self {
        Self {
            platform,
            value: normalize_handle(value),
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform, self.value)
    }
}

/// Normalize a handle: trim, strip marker prefixes, lower-case
pub fn normalize_handle(value: &str) -> String {
    value.trim().trim_start_matches('@').trim_start_matches('+').to_lowercase()
}

/// A typed, normalized fact extracted from text.
///
/// Leads are immutable once built; `(kind, platform, value)` is the
/// deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    kind: LeadKind,
    value: String,
    platform: Option<Platform>,
    source_url: Option<String>,
    depth: u32,
}

impl Lead {
    pub fn email(value: &str) -> Self {
        Self::build(LeadKind::Email, value.trim().to_lowercase(), None)
    }

    pub fn handle(platform: Platform, value: &str) -> Self {
        Self::build(LeadKind::Handle, normalize_handle(value), Some(platform))
    }

    pub fn url(value: &str) -> Self {
        Self::build(LeadKind::Url, value.trim().to_string(), None)
    }

    pub fn wallet(value: &str) -> Self {
        Self::build(LeadKind::Wallet, value.trim().to_string(), None)
    }

    fn build(kind: LeadKind, value: String, platform: Option<Platform>) -> Self {
        Self {
            kind,
            value,
            platform,
            source_url: None,
            depth: 0,
        }
    }

    /// Attach discovery provenance (page URL and frontier depth)
    pub fn found_at(mut self, source_url: &str, depth: u32) -> Self {
        self.source_url = Some(source_url.to_string());
        self.depth = depth;
        self
    }

    pub fn kind(&self) -> LeadKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Deduplication key, independent of provenance
    pub fn key(&self) -> (LeadKind, Option<Platform>, &str) {
        (self.kind, self.platform, &self.value)
    }

    /// The handle carried by this lead, if it is one
    pub fn as_handle(&self) -> Option<Handle> {
        match (self.kind, self.platform) {
            (LeadKind::Handle, Some(platform)) => Some(Handle {
                platform,
                value: self.value.clone(),
            }),
            _ => None,
        }
    }
}

/// A scam-keyword hit with a bounded window of surrounding text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScamMention {
    pub keyword: String,
    pub context: String,
    pub source_url: Option<String>,
}

impl ScamMention {
    pub fn new(keyword: &str, context: &str, source_url: Option<&str>) -> Self {
        Self {
            keyword: keyword.to_string(),
            context: context.to_string(),
            source_url: source_url.map(str::to_string),
        }
    }

    /// Mentions are deduplicated per keyword per page, never by context
    pub fn dedup_key(&self) -> (&str, Option<&str>) {
        (&self.keyword, self.source_url.as_deref())
    }
}

/// Result of visiting one URL during a crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawledPage {
    pub url: String,
    pub title: Option<String>,
    /// Frontier depth the page was visited at
    pub depth: u32,
    /// Search query that surfaced the page, if any
    pub query: Option<String>,
    pub leads: Vec<Lead>,
    pub mentions: Vec<ScamMention>,
    /// Per-page failure; a failed page carries no evidence
    pub error: Option<String>,
}

impl CrawledPage {
    pub fn failed(url: &str, depth: u32, query: Option<&str>, error: impl fmt::Display) -> Self {
        Self {
            url: url.to_string(),
            title: None,
            depth,
            query: query.map(str::to_string),
            leads: Vec::new(),
            mentions: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
