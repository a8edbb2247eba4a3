//! Investigation coordinator
//!
//! Fans one target out to the frontier crawler and every source adapter:
//! - Each producer runs as its own tokio task
//! - Adapters are bounded by the adapter timeout; a failure, timeout or panic
//!   becomes one error entry and never affects the other producers
//! - Results are merged in registration order (crawler first), so the profile
//!   does not depend on which producer finished first
//! - The merged profile is scored once, then cached

use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use anyhow::Context;
use veritrace_core::{
    merge, normalize_target, AdapterError, AggregatedProfile, CrawlConfig, CrawlOverrides, CrawlStats,
    Extractor, InvestigationConfig, PartialProfile, RiskScorer, SharedAdapter, SharedCache,
    SharedFetcher, SharedSearch,
};
use veritrace_net::{
    BraveSearch, CombinedSearch, DuckDuckGoSearch, HttpPageFetcher, Transport, TransportConfig,
};
use veritrace_sources::{build_adapters, SourcesConfig};

use crate::{FrontierCrawler, MemoryCache, FRONTIER_SOURCE};

/// One investigation request
#[derive(Debug, Clone, Default)]
pub struct InvestigationRequest {
    pub target: String,
    pub known_emails: Vec<String>,
    pub overrides: Option<CrawlOverrides>,
    pub skip_cache: bool,
}

impl InvestigationRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_emails(mut self, emails: Vec<String>) -> Self {
        self.known_emails = emails;
        self
    }

    pub fn with_overrides(mut self, overrides: CrawlOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn skip_cache(mut self) -> Self {
        self.skip_cache = true;
        self
    }
}

pub struct Investigator {
    search: SharedSearch,
    fetcher: SharedFetcher,
    adapters: Vec<SharedAdapter>,
    cache: Option<SharedCache>,
    config: InvestigationConfig,
    extractor: Extractor,
    scorer: RiskScorer,
    crawl_enabled: bool,
}

impl Investigator {
    pub fn new(
        search: SharedSearch,
        fetcher: SharedFetcher,
        adapters: Vec<SharedAdapter>,
        config: InvestigationConfig,
    ) -> Self {
        let extractor = Extractor::new(config.crawl.extraction, config.scoring.keywords());
        let scorer = RiskScorer::new(config.scoring.clone());
        Self {
            search,
            fetcher,
            adapters,
            cache: None,
            config,
            extractor,
            scorer,
            crawl_enabled: true,
        }
    }

    /// Wire the reference collaborators over one shared transport
    pub fn build(
        config: InvestigationConfig,
        transport_config: &TransportConfig,
        sources: &SourcesConfig,
    ) -> anyhow::Result<Self> {
        config
            .crawl
            .validate()
            .context("Invalid crawl configuration")?;
        let transport = Transport::new(transport_config).context("Failed to create HTTP transport")?;

        let per_call = config.crawl.per_page_timeout();
        let mut engines: Vec<SharedSearch> =
            vec![Arc::new(DuckDuckGoSearch::new(transport.clone(), per_call))];
        if let Some(brave) = BraveSearch::from_env(transport.clone(), per_call) {
            info!("Brave Search enabled");
            engines.push(Arc::new(brave));
        }

        let extractor = Extractor::new(config.crawl.extraction, config.scoring.keywords());
        let mut sources = sources.clone();
        sources.max_pastes = config.crawl.max_pastes_or_pages_to_deep_analyze;
        let adapters = build_adapters(&transport, &extractor, &sources);

        info!(
            engines = engines.len(),
            adapters = adapters.len(),
            proxy = transport_config.proxy.is_some(),
            "Investigator ready"
        );

        Ok(Self::new(
            Arc::new(CombinedSearch::new(engines)),
            Arc::new(HttpPageFetcher::new(transport)),
            adapters,
            config,
        )
        .with_cache(Arc::new(MemoryCache::new())))
    }

    pub fn with_cache(mut self, cache: SharedCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Run source adapters only
    pub fn without_crawl(mut self) -> Self {
        self.crawl_enabled = false;
        self
    }

    pub fn adapter_names(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.name().to_string()).collect()
    }

    pub async fn investigate(&self, request: InvestigationRequest) -> AggregatedProfile {
        let started = Instant::now();
        let target = normalize_target(&request.target);

        if target.is_empty() {
            let mut profile = AggregatedProfile::new(&request.target);
            profile.errors.push("target is empty".to_string());
            return profile;
        }

        if !request.skip_cache {
            if let Some(cache) = &self.cache {
                if let Some(hit) = cache.get(&target).await {
                    info!("Cache hit for {}", target);
                    return hit;
                }
            }
        }

        info!(
            target = %target,
            adapters = self.adapters.len(),
            crawl = self.crawl_enabled,
            "Investigation starting"
        );

        let budgets = Arc::new(match &request.overrides {
            Some(overrides) => overrides.apply(&self.config.crawl),
            None => self.config.crawl.clone(),
        });

        let crawl_task = self
            .crawl_enabled
            .then(|| self.spawn_crawl(&target, &request, &budgets));
        let adapter_tasks: Vec<(String, JoinHandle<PartialProfile>)> = self
            .adapters
            .iter()
            .map(|adapter| {
                let task = self.spawn_adapter(adapter.clone(), &target, budgets.clone());
                (adapter.name().to_string(), task)
            })
            .collect();

        let mut partials = Vec::with_capacity(adapter_tasks.len() + 1);
        let mut crawl_stats: Option<CrawlStats> = None;

        if let Some(task) = crawl_task {
            match task.await {
                Ok(outcome) => {
                    crawl_stats = Some(outcome.stats);
                    partials.push(outcome.profile);
                }
                Err(e) => {
                    warn!("Frontier crawl task failed: {}", e);
                    partials.push(PartialProfile::failed(FRONTIER_SOURCE, e));
                }
            }
        }

        for (name, task) in adapter_tasks {
            let partial = match task.await {
                Ok(partial) => partial,
                Err(e) => {
                    warn!("Adapter {} task failed: {}", name, e);
                    PartialProfile::failed(&name, e)
                }
            };
            partials.push(partial);
        }

        let mut profile = merge(&target, partials);
        profile.crawl = crawl_stats;

        let assessment = self.scorer.assess(&profile);
        profile.apply_risk(assessment);
        profile.execution_time_ms = started.elapsed().as_millis() as u64;

        info!(
            target = %target,
            score = profile.scam_score,
            leads = profile.lead_count(),
            pages = profile.pages_analyzed,
            errors = profile.errors.len(),
            "Investigation complete"
        );

        if let Some(cache) = &self.cache {
            cache
                .set(&target, &profile, self.config.investigation.cache_ttl())
                .await;
        }

        profile
    }

    fn spawn_crawl(
        &self,
        target: &str,
        request: &InvestigationRequest,
        budgets: &CrawlConfig,
    ) -> JoinHandle<crate::CrawlOutcome> {
        let crawler = FrontierCrawler::new(
            self.search.clone(),
            self.fetcher.clone(),
            self.extractor.clone(),
            budgets.clone(),
        );
        let target = target.to_string();
        let emails = request.known_emails.clone();

        tokio::spawn(async move { crawler.crawl(&target, &emails).await })
    }

    fn spawn_adapter(
        &self,
        adapter: SharedAdapter,
        target: &str,
        budgets: Arc<CrawlConfig>,
    ) -> JoinHandle<PartialProfile> {
        let limit = self.config.investigation.adapter_timeout();
        let target = target.to_string();

        tokio::spawn(async move {
            let name = adapter.name().to_string();
            match timeout(limit, adapter.run_with(&target, &budgets)).await {
                Ok(Ok(mut partial)) => {
                    debug!("Adapter {} finished with {} leads", name, partial.lead_count());
                    partial.source = name;
                    partial
                }
                Ok(Err(e)) => {
                    warn!("Adapter {} failed: {}", name, e);
                    PartialProfile::failed(&name, e)
                }
                Err(_) => {
                    warn!("Adapter {} timed out", name);
                    PartialProfile::failed(&name, AdapterError::Timeout(limit))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use veritrace_core::{
        FetchError, FetchedPage, Lead, PageFetcher, Platform, RiskLevel, ScamMention,
        SearchError, SearchExecutor, SourceAdapter, Termination,
    };

    struct NoResults;

    #[async_trait]
    impl SearchExecutor for NoResults {
        fn name(&self) -> &str {
            "none"
        }

        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<String>, SearchError> {
            Ok(Vec::new())
        }
    }

    struct OnePage;

    #[async_trait]
    impl SearchExecutor for OnePage {
        fn name(&self) -> &str {
            "one"
        }

        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<String>, SearchError> {
            Ok(vec!["https://forum.test/t/1".to_string()])
        }
    }

    struct TextFetcher(&'static str);

    #[async_trait]
    impl PageFetcher for TextFetcher {
        async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchedPage, FetchError> {
            Ok(FetchedPage {
                url: url.to_string(),
                title: None,
                text: self.0.to_string(),
            })
        }
    }

    enum Behaviour {
        Handle(&'static str),
        Mention(&'static str),
        Fail,
        Panic,
        Sleep(Duration),
        ReportPasteBudget,
    }

    struct StubAdapter {
        name: &'static str,
        behaviour: Behaviour,
    }

    #[async_trait]
    impl SourceAdapter for StubAdapter {
        fn name(&self) -> &str {
            self.name
        }

        async fn run(&self, _target: &str) -> Result<PartialProfile, AdapterError> {
            let mut partial = PartialProfile::new(self.name);
            match &self.behaviour {
                Behaviour::Handle(h) => {
                    partial.add_lead(&Lead::handle(Platform::GitHub, h));
                }
                Behaviour::Mention(k) => {
                    partial.add_mention(ScamMention::new(k, k, Some("https://thread.test")));
                }
                Behaviour::Fail => return Err(AdapterError::Status(500)),
                Behaviour::Panic => panic!("adapter bug"),
                Behaviour::Sleep(d) => {
                    tokio::time::sleep(*d).await;
                    partial.add_lead(&Lead::handle(Platform::Reddit, self.name));
                }
                Behaviour::ReportPasteBudget => {}
            }
            Ok(partial)
        }

        async fn run_with(
            &self,
            target: &str,
            config: &CrawlConfig,
        ) -> Result<PartialProfile, AdapterError> {
            let mut partial = self.run(target).await?;
            if matches!(self.behaviour, Behaviour::ReportPasteBudget) {
                partial.add_trust_indicator(format!(
                    "paste budget {}",
                    config.max_pastes_or_pages_to_deep_analyze
                ));
            }
            Ok(partial)
        }
    }

    fn adapter(name: &'static str, behaviour: Behaviour) -> SharedAdapter {
        Arc::new(StubAdapter { name, behaviour })
    }

    fn investigator(adapters: Vec<SharedAdapter>) -> Investigator {
        Investigator::new(
            Arc::new(NoResults),
            Arc::new(TextFetcher("")),
            adapters,
            InvestigationConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_failing_adapter_is_isolated() {
        let inv = investigator(vec![
            adapter("ok", Behaviour::Handle("coinguy")),
            adapter("broken", Behaviour::Fail),
        ]);

        let profile = inv.investigate(InvestigationRequest::new("coinguy")).await;

        assert_eq!(profile.errors.len(), 1);
        assert!(profile.errors[0].starts_with("broken:"));
        assert!(profile.all_usernames.contains("coinguy"));
        assert_eq!(profile.sources, vec!["frontier".to_string(), "ok".to_string()]);
    }

    #[tokio::test]
    async fn test_panicking_adapter_is_isolated() {
        let inv = investigator(vec![
            adapter("panics", Behaviour::Panic),
            adapter("ok", Behaviour::Handle("coinguy")),
        ]);

        let profile = inv.investigate(InvestigationRequest::new("coinguy")).await;

        assert_eq!(profile.errors.len(), 1);
        assert!(profile.errors[0].starts_with("panics:"));
        assert!(profile.sources.contains(&"ok".to_string()));
    }

    #[tokio::test]
    async fn test_slow_adapter_times_out() {
        let mut config = InvestigationConfig::default();
        config.investigation.adapter_timeout_ms = 30;
        let inv = Investigator::new(
            Arc::new(NoResults),
            Arc::new(TextFetcher("")),
            vec![adapter("slow", Behaviour::Sleep(Duration::from_secs(5)))],
            config,
        );

        let started = Instant::now();
        let profile = inv.investigate(InvestigationRequest::new("coinguy")).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(profile.errors.len(), 1);
        assert!(profile.errors[0].contains("Timed out"));
    }

    #[tokio::test]
    async fn test_merge_order_independent_of_completion() {
        let inv = investigator(vec![
            adapter("first", Behaviour::Sleep(Duration::from_millis(40))),
            adapter("second", Behaviour::Handle("fast")),
        ])
        .without_crawl();

        let profile = inv.investigate(InvestigationRequest::new("coinguy")).await;

        assert_eq!(profile.sources, vec!["first".to_string(), "second".to_string()]);
        assert!(profile.crawl.is_none());
    }

    #[tokio::test]
    async fn test_profile_is_scored() {
        let inv = investigator(vec![adapter("reports", Behaviour::Mention("rug pull"))]);

        let profile = inv.investigate(InvestigationRequest::new("coinguy")).await;

        assert_eq!(profile.scam_score, 30);
        assert_eq!(profile.risk_level, RiskLevel::Medium);
        assert!(!profile.red_flags.is_empty());
    }

    #[tokio::test]
    async fn test_crawl_evidence_merged() {
        let inv = Investigator::new(
            Arc::new(OnePage),
            Arc::new(TextFetcher("coinguy ran a ponzi, mail boss@coin.example")),
            Vec::new(),
            InvestigationConfig::default(),
        );

        let profile = inv.investigate(InvestigationRequest::new("coinguy")).await;

        assert!(profile.all_emails.contains("boss@coin.example"));
        assert_eq!(profile.pages_analyzed, 1);
        assert!(profile.scam_score > 0);
        let stats = profile.crawl.expect("crawl stats");
        assert_eq!(stats.termination, Termination::FrontierExhausted);
    }

    #[tokio::test]
    async fn test_overrides_reach_crawler() {
        let inv = Investigator::new(
            Arc::new(OnePage),
            Arc::new(TextFetcher("")),
            Vec::new(),
            InvestigationConfig::default(),
        );
        let request = InvestigationRequest::new("coinguy").with_overrides(CrawlOverrides {
            max_total_pages: Some(0),
            ..Default::default()
        });

        let profile = inv.investigate(request).await;

        assert_eq!(profile.pages_analyzed, 0);
        assert_eq!(profile.crawl.unwrap().termination, Termination::PageBudget);
    }

    #[tokio::test]
    async fn test_overrides_reach_adapters() {
        let inv = investigator(vec![adapter("budgeted", Behaviour::ReportPasteBudget)])
            .without_crawl();

        let default_run = inv
            .investigate(InvestigationRequest::new("coinguy").skip_cache())
            .await;
        let overridden = inv
            .investigate(
                InvestigationRequest::new("coinguy")
                    .skip_cache()
                    .with_overrides(CrawlOverrides {
                        max_pastes_or_pages_to_deep_analyze: Some(2),
                        ..Default::default()
                    }),
            )
            .await;

        assert_eq!(default_run.trust_indicators, vec!["paste budget 5".to_string()]);
        assert_eq!(overridden.trust_indicators, vec!["paste budget 2".to_string()]);
    }

    #[tokio::test]
    async fn test_cache_hit_and_skip() {
        let inv = investigator(Vec::new()).with_cache(Arc::new(MemoryCache::new()));

        let first = inv.investigate(InvestigationRequest::new("@CoinGuy")).await;
        let cached = inv.investigate(InvestigationRequest::new("coinguy")).await;
        let fresh = inv
            .investigate(InvestigationRequest::new("coinguy").skip_cache())
            .await;

        assert_eq!(first.investigation_id, cached.investigation_id);
        assert_ne!(first.investigation_id, fresh.investigation_id);
    }

    #[tokio::test]
    async fn test_empty_target() {
        let inv = investigator(vec![adapter("ok", Behaviour::Handle("x"))]);
        let profile = inv.investigate(InvestigationRequest::new("  @ ")).await;

        assert_eq!(profile.errors.len(), 1);
        assert!(profile.sources.is_empty());
    }
}
