//! Veritrace source adapters
//!
//! Each adapter looks the target up in one data source and returns a
//! [`PartialProfile`](veritrace_core::PartialProfile). Adapters fail
//! independently; the investigator turns a failure into one error entry.
//!
//! - **GitHub**: user profile, linked accounts, account-age trust signals
//! - **Reddit**: user profile, karma and verified-email trust signals
//! - **Paste**: paste-dump search with deep analysis of the top pastes

pub mod github;
pub mod reddit;
pub mod paste;

pub use github::*;
pub use reddit::*;
pub use paste::*;

use reqwest::StatusCode;
use std::sync::Arc;

use veritrace_core::{AdapterError, Extractor, SharedAdapter};
use veritrace_net::Transport;

/// Which adapters run and how they are tuned
#[derive(Debug, Clone)]
pub struct SourcesConfig {
    /// GitHub personal access token (optional, raises the rate limit)
    pub github_token: Option<String>,
    pub enable_github: bool,
    pub enable_reddit: bool,
    pub enable_paste: bool,
    /// Pastes analyzed in depth per run
    pub max_pastes: usize,
    /// Shorter pastes are ignored
    pub min_paste_length: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            github_token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            enable_github: true,
            enable_reddit: true,
            enable_paste: true,
            max_pastes: 5,
            min_paste_length: 50,
        }
    }
}

/// Build the enabled adapters in registration order
pub fn build_adapters(
    transport: &Transport,
    extractor: &Extractor,
    config: &SourcesConfig,
) -> Vec<SharedAdapter> {
    let mut adapters: Vec<SharedAdapter> = Vec::new();

    if config.enable_github {
        adapters.push(Arc::new(GitHubAdapter::new(
            transport.clone(),
            extractor.clone(),
            config.github_token.clone(),
        )));
    }
    if config.enable_reddit {
        adapters.push(Arc::new(RedditAdapter::new(transport.clone(), extractor.clone())));
    }
    if config.enable_paste {
        adapters.push(Arc::new(PasteAdapter::new(
            transport.clone(),
            extractor.clone(),
            config.max_pastes,
            config.min_paste_length,
        )));
    }

    adapters
}

pub(crate) fn request_error(e: reqwest::Error) -> AdapterError {
    AdapterError::Request(e.to_string())
}

pub(crate) fn status_error(status: StatusCode, what: &str) -> AdapterError {
    match status {
        StatusCode::NOT_FOUND => AdapterError::NotFound(what.to_string()),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN => AdapterError::RateLimited,
        other => AdapterError::Status(other.as_u16()),
    }
}

/// Account names usable in a profile URL path
pub(crate) fn account_name(target: &str, max_len: usize) -> Option<String> {
    let name = target.trim().trim_start_matches('@');
    let valid = !name.is_empty()
        && name.len() <= max_len
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| name.to_string())
}
