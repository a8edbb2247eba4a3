//! Investigation configuration
//!
//! Defaults live in `Default` impls. Any subset can be overridden from a TOML
//! file with `[crawl]`, `[scoring]` and `[investigation]` tables, and crawl
//! budgets can be overridden again per invocation via [`CrawlOverrides`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::{ExtractionLimits, ScoringPolicy};

/// Largest allowed number of concurrent page fetches in one crawl
pub const MAX_FETCH_CONCURRENCY: usize = 4;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Frontier crawl budgets and behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrawlConfig {
    /// URLs taken from each search query
    pub max_results_per_query: usize,
    /// Page-count ceiling for one crawl
    pub max_total_pages: usize,
    /// Wall-clock budget for one crawl
    pub max_execution_time_ms: u64,
    /// Timeout for each search or page fetch call
    pub per_page_timeout_ms: u64,
    /// Pastes (or pages) a source adapter may analyze in depth
    pub max_pastes_or_pages_to_deep_analyze: usize,
    /// Pages below this depth enqueue the links found in their text
    pub max_depth: u32,
    /// Concurrent page fetches (1..=4)
    pub fetch_concurrency: usize,
    /// Enqueue a follow-up query for each newly discovered email
    pub follow_discovered_emails: bool,
    pub extraction: ExtractionLimits,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_results_per_query: 5,
            max_total_pages: 30,
            max_execution_time_ms: 180_000,
            per_page_timeout_ms: 10_000,
            max_pastes_or_pages_to_deep_analyze: 5,
            max_depth: 1,
            fetch_concurrency: 1,
            follow_discovered_emails: true,
            extraction: ExtractionLimits::default(),
        }
    }
}

impl CrawlConfig {
    pub fn max_execution_time(&self) -> Duration {
        Duration::from_millis(self.max_execution_time_ms)
    }

    pub fn per_page_timeout(&self) -> Duration {
        Duration::from_millis(self.per_page_timeout_ms)
    }

    /// Concurrency clamped to the supported range
    pub fn effective_concurrency(&self) -> usize {
        self.fetch_concurrency.clamp(1, MAX_FETCH_CONCURRENCY)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_execution_time_ms == 0 {
            return Err(ConfigError::Invalid("maxExecutionTimeMs must be positive".into()));
        }
        if self.per_page_timeout_ms == 0 {
            return Err(ConfigError::Invalid("perPageTimeoutMs must be positive".into()));
        }
        if self.max_results_per_query == 0 {
            return Err(ConfigError::Invalid("maxResultsPerQuery must be positive".into()));
        }
        Ok(())
    }
}

/// Per-invocation overrides; `None` keeps the base value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrawlOverrides {
    pub max_results_per_query: Option<usize>,
    pub max_total_pages: Option<usize>,
    pub max_execution_time_ms: Option<u64>,
    pub per_page_timeout_ms: Option<u64>,
    pub max_pastes_or_pages_to_deep_analyze: Option<usize>,
    pub max_depth: Option<u32>,
    pub fetch_concurrency: Option<usize>,
    pub follow_discovered_emails: Option<bool>,
}

impl CrawlOverrides {
    pub fn apply(&self, base: &CrawlConfig) -> CrawlConfig {
        let mut config = base.clone();
        if let Some(v) = self.max_results_per_query {
            config.max_results_per_query = v;
        }
        if let Some(v) = self.max_total_pages {
            config.max_total_pages = v;
        }
        if let Some(v) = self.max_execution_time_ms {
            config.max_execution_time_ms = v;
        }
        if let Some(v) = self.per_page_timeout_ms {
            config.per_page_timeout_ms = v;
        }
        if let Some(v) = self.max_pastes_or_pages_to_deep_analyze {
            config.max_pastes_or_pages_to_deep_analyze = v;
        }
        if let Some(v) = self.max_depth {
            config.max_depth = v;
        }
        if let Some(v) = self.fetch_concurrency {
            config.fetch_concurrency = v;
        }
        if let Some(v) = self.follow_discovered_emails {
            config.follow_discovered_emails = v;
        }
        config
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Settings for the aggregation entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InvestigationSettings {
    /// Upper bound on one source adapter call
    pub adapter_timeout_ms: u64,
    /// How long a cached profile stays valid
    pub cache_ttl_secs: u64,
}

impl Default for InvestigationSettings {
    fn default() -> Self {
        Self {
            adapter_timeout_ms: 30_000,
            cache_ttl_secs: 900,
        }
    }
}

impl InvestigationSettings {
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.adapter_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Complete configuration, loadable from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestigationConfig {
    pub crawl: CrawlConfig,
    pub scoring: ScoringPolicy,
    pub investigation: InvestigationSettings,
}

impl InvestigationConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.crawl.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}
