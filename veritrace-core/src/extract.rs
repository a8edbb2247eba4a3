//! Pattern-table lead extraction from unstructured text
//!
//! Recognizes:
//! - Email addresses (lower-cased on output)
//! - Platform handles via per-platform path recognizers (GitHub, Telegram, ...)
//! - Absolute http(s) URLs
//! - Wallet-like tokens (0x-prefixed hex, base58 family)
//! - Scam-keyword mentions with a bounded context window
//!
//! Extraction is pure and deterministic: the same text always yields the same
//! leads in the same order. Wallet patterns are heuristics, not checksums.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::{default_keywords, Handle, Lead, Platform, ScamMention, MENTION_CONTEXT_RADIUS};

/// Per-category output caps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractionLimits {
    pub max_emails: usize,
    pub max_handles: usize,
    pub max_urls: usize,
    pub max_wallets: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_emails: 20,
            max_handles: 20,
            max_urls: 20,
            max_wallets: 10,
        }
    }
}

/// A keyword hit before provenance is attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordHit {
    pub keyword: String,
    pub context: String,
}

/// Everything recognized in one piece of text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub emails: Vec<String>,
    pub handles: Vec<Handle>,
    pub urls: Vec<String>,
    pub wallets: Vec<String>,
    pub scam_mentions: Vec<KeywordHit>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
            && self.handles.is_empty()
            && self.urls.is_empty()
            && self.wallets.is_empty()
            && self.scam_mentions.is_empty()
    }

    /// Attach provenance and turn the extraction into leads and mentions
    pub fn into_evidence(self, source_url: Option<&str>, depth: u32) -> (Vec<Lead>, Vec<ScamMention>) {
        let place = |lead: Lead| match source_url {
            Some(url) => lead.found_at(url, depth),
            None => lead,
        };

        let mut leads = Vec::with_capacity(
            self.emails.len() + self.handles.len() + self.urls.len() + self.wallets.len(),
        );
        leads.extend(self.emails.iter().map(|e| place(Lead::email(e))));
        leads.extend(self.handles.iter().map(|h| place(Lead::handle(h.platform, &h.value))));
        leads.extend(self.urls.iter().map(|u| place(Lead::url(u))));
        leads.extend(self.wallets.iter().map(|w| place(Lead::wallet(w))));

        let mentions = self
            .scam_mentions
            .into_iter()
            .map(|hit| ScamMention::new(&hit.keyword, &hit.context, source_url))
            .collect();

        (leads, mentions)
    }
}

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'()\[\]{}]+"#).unwrap()
});

static EVM_WALLET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b0x[a-fA-F0-9]{40}\b").unwrap()
});

static BASE58_WALLET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[1-9A-HJ-NP-Za-km-z]{32,44}\b").unwrap()
});

static GITHUB_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:www\.)?github\.com/([A-Za-z0-9](?:[A-Za-z0-9-]{0,38}))").unwrap()
});

static TELEGRAM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:t|telegram)\.me/(?:joinchat/)?(\+?[A-Za-z0-9_]{4,32})").unwrap()
});

static TWITTER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:www\.)?(?:twitter|x)\.com/([A-Za-z0-9_]{1,15})\b").unwrap()
});

static INSTAGRAM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:www\.)?instagram\.com/([A-Za-z0-9_](?:[A-Za-z0-9_.]{0,29}))").unwrap()
});

static REDDIT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:www\.|old\.)?reddit\.com/u(?:ser)?/([A-Za-z0-9_-]{3,20})").unwrap()
});

static TIKTOK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:www\.)?tiktok\.com/@([A-Za-z0-9_.]{2,24})").unwrap()
});

static YOUTUBE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:www\.)?youtube\.com/@([A-Za-z0-9_.-]{3,30})").unwrap()
});

static MENTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_.@/])@([A-Za-z0-9_]{3,30})\b").unwrap()
});

/// A per-platform handle recognizer
struct HandleRecognizer {
    platform: Platform,
    pattern: &'static LazyLock<Regex>,
    /// Path segments that are site features, not accounts
    reserved: &'static [&'static str],
}

static HANDLE_RECOGNIZERS: &[HandleRecognizer] = &[
    HandleRecognizer {
        platform: Platform::GitHub,
        pattern: &GITHUB_REGEX,
        reserved: &[
            "about", "apps", "collections", "contact", "customer-stories", "enterprise",
            "events", "explore", "features", "issues", "join", "login", "marketplace",
            "new", "notifications", "orgs", "pricing", "pulls", "readme", "search",
            "security", "settings", "site", "sponsors", "topics", "trending",
        ],
    },
    HandleRecognizer {
        platform: Platform::Telegram,
        pattern: &TELEGRAM_REGEX,
        reserved: &["addstickers", "iv", "joinchat", "proxy", "share", "socks"],
    },
    HandleRecognizer {
        platform: Platform::Twitter,
        pattern: &TWITTER_REGEX,
        reserved: &[
            "explore", "hashtag", "home", "i", "intent", "login", "messages",
            "notifications", "privacy", "search", "settings", "share", "signup", "tos",
        ],
    },
    HandleRecognizer {
        platform: Platform::Instagram,
        pattern: &INSTAGRAM_REGEX,
        reserved: &["about", "accounts", "direct", "explore", "p", "reel", "reels", "stories", "tv"],
    },
    HandleRecognizer {
        platform: Platform::Reddit,
        pattern: &REDDIT_REGEX,
        reserved: &[],
    },
    HandleRecognizer {
        platform: Platform::TikTok,
        pattern: &TIKTOK_REGEX,
        reserved: &[],
    },
    HandleRecognizer {
        platform: Platform::YouTube,
        pattern: &YOUTUBE_REGEX,
        reserved: &[],
    },
    HandleRecognizer {
        platform: Platform::Mention,
        pattern: &MENTION_REGEX,
        reserved: &[],
    },
];

/// File extensions that make an `x@2x.png`-style token not an email
const IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Lead extractor configured with output caps and a scam keyword list
#[derive(Debug, Clone)]
pub struct Extractor {
    limits: ExtractionLimits,
    keywords: Vec<String>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractionLimits::default(), default_keywords())
    }
}

impl Extractor {
    pub fn new<I, S>(limits: ExtractionLimits, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_ascii_lowercase())
            .filter(|k| !k.is_empty() && seen.insert(k.clone()))
            .collect();

        Self { limits, keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Run every recognizer over `text`
    pub fn extract(&self, text: &str) -> Extraction {
        Extraction {
            emails: self.find_emails(text),
            handles: self.find_handles(text),
            urls: self.find_urls(text),
            wallets: self.find_wallets(text),
            scam_mentions: self.find_mentions(text),
        }
    }

    fn find_emails(&self, text: &str) -> Vec<String> {
        let candidates = EMAIL_REGEX
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .filter(|email| !IMAGE_SUFFIXES.iter().any(|s| email.ends_with(s)));
        dedup_capped(candidates, self.limits.max_emails)
    }

    fn find_handles(&self, text: &str) -> Vec<Handle> {
        let mut seen = HashSet::new();
        let mut handles = Vec::new();

        for recognizer in HANDLE_RECOGNIZERS {
            for cap in recognizer.pattern.captures_iter(text) {
                let Some(raw) = cap.get(1) else { continue };
                let value = raw.as_str().trim_end_matches('.');
                if value.is_empty() {
                    continue;
                }

                let handle = Handle::new(recognizer.platform, value);
                if recognizer.reserved.contains(&handle.value.as_str()) {
                    continue;
                }
                if handles.len() < self.limits.max_handles && seen.insert(handle.clone()) {
                    handles.push(handle);
                }
            }
        }

        handles
    }

    fn find_urls(&self, text: &str) -> Vec<String> {
        let candidates = URL_REGEX
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', '\'', '"']))
            .filter(|url| url.len() > "https://".len())
            .map(str::to_string);
        dedup_capped(candidates, self.limits.max_urls)
    }

    fn find_wallets(&self, text: &str) -> Vec<String> {
        let evm = EVM_WALLET_REGEX.find_iter(text).map(|m| m.as_str().to_string());
        let base58 = BASE58_WALLET_REGEX
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|token| looks_like_base58_address(token))
            .map(str::to_string);
        dedup_capped(evm.chain(base58), self.limits.max_wallets)
    }

    /// First occurrence of each keyword; occurrences inside a longer keyword's
    /// match are left to the longer keyword.
    fn find_mentions(&self, text: &str) -> Vec<KeywordHit> {
        let haystack = text.to_ascii_lowercase();

        let mut by_length: Vec<&String> = self.keywords.iter().collect();
        by_length.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut hits: Vec<(usize, KeywordHit)> = Vec::new();

        for keyword in by_length {
            let first_free = haystack.match_indices(keyword.as_str()).map(|(i, _)| i).find(|&start| {
                let end = start + keyword.len();
                !claimed.iter().any(|&(s, e)| start >= s && end <= e)
            });

            if let Some(start) = first_free {
                let end = start + keyword.len();
                claimed.push((start, end));
                hits.push((
                    start,
                    KeywordHit {
                        keyword: keyword.clone(),
                        context: context_window(text, start, end, MENTION_CONTEXT_RADIUS),
                    },
                ));
            }
        }

        hits.sort_by_key(|(start, _)| *start);
        hits.into_iter().map(|(_, hit)| hit).collect()
    }
}

static DEFAULT_EXTRACTOR: LazyLock<Extractor> = LazyLock::new(Extractor::default);

/// Extract leads using the default limits and keyword table
pub fn extract(text: &str) -> Extraction {
    DEFAULT_EXTRACTOR.extract(text)
}

/// Extract leads with custom output caps
pub fn extract_with(text: &str, limits: ExtractionLimits) -> Extraction {
    Extractor::new(limits, DEFAULT_EXTRACTOR.keywords()).extract(text)
}

/// Base58 tokens must mix letters and digits to be worth reporting
fn looks_like_base58_address(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit()) && token.chars().any(|c| c.is_ascii_alphabetic())
}

fn dedup_capped<I: Iterator<Item = String>>(items: I, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).take(cap).collect()
}

/// Up to `radius` characters either side of `[start, end)`, whitespace collapsed
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let from = if radius == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .nth(radius - 1)
            .map(|(i, _)| i)
            .unwrap_or(0)
    };
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    text[from..to].split_whitespace().collect::<Vec<_>>().join(" ")
}
