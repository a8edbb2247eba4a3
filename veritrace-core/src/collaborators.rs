//! Collaborator traits
//!
//! The crawler and the investigator only talk to the outside world through
//! these traits. Implementations must be safe to call from several tasks at
//! once.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::{AggregatedProfile, CrawlConfig, PartialProfile};

/// Search executor errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(String),

    #[error("Search engine returned status {0}")]
    Status(u16),

    #[error("Failed to parse search results: {0}")]
    Parse(String),

    #[error("Search timed out after {0:?}")]
    Timeout(Duration),

    #[error("Search engine not configured: {0}")]
    NotConfigured(String),
}

/// Page fetcher errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unsupported content: {0}")]
    Unsupported(String),

    #[error("Fetcher setup failed: {0}")]
    Setup(String),
}

/// Source adapter errors
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// One fetched page, reduced to title and visible text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}

/// Turns one query into candidate URLs
#[async_trait]
pub trait SearchExecutor: Send + Sync {
    fn name(&self) -> &str;

    /// At most `limit` result URLs, best first
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError>;
}

/// Turns one URL into title and text
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Called once before a crawl; an error aborts the crawl
    async fn prepare(&self) -> Result<(), FetchError> {
        Ok(())
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError>;
}

/// One independently failing data source
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, target: &str) -> Result<PartialProfile, AdapterError>;

    /// Run under one invocation's effective budgets. Adapters that deep-analyze
    /// pages read their page budget from `config`.
    async fn run_with(
        &self,
        target: &str,
        _config: &CrawlConfig,
    ) -> Result<PartialProfile, AdapterError> {
        self.run(target).await
    }
}

/// Stores finished profiles by normalized target
#[async_trait]
pub trait ProfileCache: Send + Sync {
    async fn get(&self, target: &str) -> Option<AggregatedProfile>;

    async fn set(&self, target: &str, profile: &AggregatedProfile, ttl: Duration);
}

pub type SharedSearch = Arc<dyn SearchExecutor>;
pub type SharedFetcher = Arc<dyn PageFetcher>;
pub type SharedAdapter = Arc<dyn SourceAdapter>;
pub type SharedCache = Arc<dyn ProfileCache>;
