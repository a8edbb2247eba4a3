//! Bounded frontier crawler
//!
//! Breadth-first over one FIFO frontier of query and URL tasks:
//! - A query task runs a search and enqueues the result URLs at depth 1
//! - A URL task fetches the page, extracts leads and records the page
//!
//! The loop is the only mutator of the visited set and the run-local profile.
//! Before every pop it stops on, in order: the page budget, an empty frontier,
//! or the wall-clock deadline. Stopping is never an error.
//!
//! Only pending URL tasks count against the frontier cap, so queued queries
//! never crowd out the URLs of the queries ahead of them.

use std::collections::{HashSet, VecDeque};
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, warn};

use veritrace_core::{
    derive, derive_for_email, normalize_target, CrawlConfig, CrawlStats, CrawledPage, Extractor,
    FetchError, FetchedPage, LeadKind, PartialProfile, SearchError, SharedFetcher,
    SharedSearch, Termination, MAX_EMAIL_QUERIES,
};
use veritrace_net::normalize_url;

/// Source name of the crawler's contribution
pub const FRONTIER_SOURCE: &str = "frontier";

/// One unit of frontier work
#[derive(Debug, Clone, PartialEq, Eq)]
enum FrontierTask {
    Query(String),
    Url {
        url: String,
        depth: u32,
        query: Option<String>,
    },
}

/// What one crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub profile: PartialProfile,
    pub stats: CrawlStats,
}

pub struct FrontierCrawler {
    search: SharedSearch,
    fetcher: SharedFetcher,
    extractor: Extractor,
    config: CrawlConfig,
}

/// Mutable state of one crawl run
struct CrawlRun {
    frontier: VecDeque<FrontierTask>,
    /// Normalized URLs ever pushed onto the frontier
    queued: HashSet<String>,
    /// URL tasks currently on the frontier
    pending_urls: usize,
    visited: HashSet<String>,
    discovered: HashSet<String>,
    /// Emails already searched for (or the target itself)
    queried_emails: HashSet<String>,
    email_queries: usize,
    profile: PartialProfile,
    stats: CrawlStats,
}

impl CrawlRun {
    fn new(queries: Vec<String>, queried_emails: HashSet<String>, email_queries: usize) -> Self {
        Self {
            frontier: queries.into_iter().map(FrontierTask::Query).collect(),
            queued: HashSet::new(),
            pending_urls: 0,
            visited: HashSet::new(),
            discovered: HashSet::new(),
            queried_emails,
            email_queries,
            profile: PartialProfile::new(FRONTIER_SOURCE),
            stats: CrawlStats::default(),
        }
    }

    /// Push a URL unless seen before, while fewer than `max_len` URL tasks are
    /// pending. Returns false once the cap is reached.
    fn offer_url(&mut self, url: &str, depth: u32, query: Option<&str>, max_len: usize) -> bool {
        let key = normalize_url(url);
        self.discovered.insert(key.clone());

        if self.visited.contains(&key) || self.queued.contains(&key) {
            return true;
        }
        if self.pending_urls >= max_len {
            return false;
        }

        self.queued.insert(key);
        self.pending_urls += 1;
        self.frontier.push_back(FrontierTask::Url {
            url: url.to_string(),
            depth,
            query: query.map(str::to_string),
        });
        true
    }

    fn pop(&mut self) -> Option<FrontierTask> {
        let task = self.frontier.pop_front()?;
        if matches!(task, FrontierTask::Url { .. }) {
            self.pending_urls -= 1;
        }
        Some(task)
    }

    fn finish(mut self, termination: Termination) -> CrawlOutcome {
        self.stats.termination = termination;
        self.stats.queries_skipped = self
            .frontier
            .iter()
            .filter(|t| matches!(t, FrontierTask::Query(_)))
            .count();
        self.stats.urls_discovered = self.discovered.len();
        self.stats.urls_unvisited = self.discovered.len().saturating_sub(self.visited.len());

        CrawlOutcome {
            profile: self.profile,
            stats: self.stats,
        }
    }
}

impl FrontierCrawler {
    pub fn new(
        search: SharedSearch,
        fetcher: SharedFetcher,
        extractor: Extractor,
        config: CrawlConfig,
    ) -> Self {
        Self {
            search,
            fetcher,
            extractor,
            config,
        }
    }

    /// Derive queries for `target` and crawl them
    pub async fn crawl(&self, target: &str, known_emails: &[String]) -> CrawlOutcome {
        let queries = derive(target, known_emails);

        let target = normalize_target(target).to_lowercase();
        let mut queried_emails: HashSet<String> = known_emails
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        let email_queries = queried_emails.iter().filter(|e| **e != target).count();
        queried_emails.insert(target);

        self.run(CrawlRun::new(queries, queried_emails, email_queries.min(MAX_EMAIL_QUERIES)))
            .await
    }

    /// Crawl an explicit, already ordered query list
    pub async fn crawl_queries(&self, queries: Vec<String>) -> CrawlOutcome {
        self.run(CrawlRun::new(queries, HashSet::new(), 0)).await
    }

    async fn run(&self, mut run: CrawlRun) -> CrawlOutcome {
        let started = Instant::now();
        let deadline = started + self.config.max_execution_time();
        let max_pages = self.config.max_total_pages;

        info!(
            queries = run.frontier.len(),
            max_pages,
            budget_ms = self.config.max_execution_time_ms,
            "Frontier crawl starting"
        );

        if let Err(e) = self.fetcher.prepare().await {
            error!("Frontier setup failed: {}", e);
            run.profile
                .errors
                .push(format!("{}: setup failed: {}", FRONTIER_SOURCE, e));
            return run.finish(Termination::SetupFailed);
        }

        let termination = loop {
            if run.profile.pages_analyzed >= max_pages {
                break Termination::PageBudget;
            }
            if run.frontier.is_empty() {
                break Termination::FrontierExhausted;
            }
            if Instant::now() >= deadline {
                break Termination::Deadline;
            }

            let Some(task) = run.pop() else {
                break Termination::FrontierExhausted;
            };

            match task {
                FrontierTask::Query(query) => self.expand_query(&mut run, &query).await,
                FrontierTask::Url { url, depth, query } => {
                    let remaining = max_pages - run.profile.pages_analyzed;
                    let batch = self.take_batch(&mut run, url, depth, query, remaining);
                    self.visit_batch(&mut run, batch).await;
                }
            }
        };

        let elapsed = started.elapsed();
        info!(
            pages = run.profile.pages_analyzed,
            elapsed_ms = elapsed.as_millis() as u64,
            "Frontier crawl stopped: {}",
            termination
        );
        run.finish(termination)
    }

    async fn expand_query(&self, run: &mut CrawlRun, query: &str) {
        let per_call = self.config.per_page_timeout();
        let limit = self.config.max_results_per_query;
        debug!(query = %query, "Expanding query");

        let result = match timeout(per_call, self.search.search(query, limit)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout(per_call)),
        };
        run.stats.queries_processed += 1;

        let urls = match result {
            Ok(urls) => urls,
            Err(e) => {
                warn!(query = %query, "Search failed: {}", e);
                run.profile
                    .errors
                    .push(format!("search failed for {}: {}", query, e));
                return;
            }
        };

        let max_len = self.config.max_total_pages;
        let mut accepting = true;
        for url in urls.iter().take(limit) {
            if accepting {
                accepting = run.offer_url(url, 1, Some(query), max_len);
            } else {
                run.discovered.insert(normalize_url(url));
            }
        }
    }

    /// The popped URL plus the URL tasks directly behind it, up to the
    /// fetch concurrency and the remaining page budget. Visited URLs are dropped.
    fn take_batch(
        &self,
        run: &mut CrawlRun,
        url: String,
        depth: u32,
        query: Option<String>,
        remaining: usize,
    ) -> Vec<(String, u32, Option<String>)> {
        let size = self.config.effective_concurrency().min(remaining);
        let mut batch = Vec::with_capacity(size);
        let mut next = Some((url, depth, query));

        while let Some((url, depth, query)) = next.take() {
            if run.visited.insert(normalize_url(&url)) {
                batch.push((url, depth, query));
            }
            if batch.len() >= size {
                break;
            }
            if matches!(run.frontier.front(), Some(FrontierTask::Url { .. })) {
                if let Some(FrontierTask::Url { url, depth, query }) = run.pop() {
                    next = Some((url, depth, query));
                }
            }
        }

        batch
    }

    async fn visit_batch(&self, run: &mut CrawlRun, batch: Vec<(String, u32, Option<String>)>) {
        if batch.is_empty() {
            return;
        }

        let per_page = self.config.per_page_timeout();
        let fetches = batch.iter().map(|(url, _, _)| async move {
            match timeout(per_page, self.fetcher.fetch(url, per_page)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(per_page)),
            }
        });
        let results = futures::future::join_all(fetches).await;

        for ((url, depth, query), result) in batch.into_iter().zip(results) {
            let page = match result {
                Ok(fetched) => self.analyze(fetched, &url, depth, query.as_deref()),
                Err(e) => {
                    warn!(url = %url, "Fetch failed: {}", e);
                    run.stats.pages_failed += 1;
                    CrawledPage::failed(&url, depth, query.as_deref(), e)
                }
            };

            debug!(
                url = %url,
                depth,
                leads = page.leads.len(),
                mentions = page.mentions.len(),
                "Page visited"
            );

            self.follow_up(run, &page);
            run.profile.add_page(page);
        }
    }

    fn analyze(&self, fetched: FetchedPage, url: &str, depth: u32, query: Option<&str>) -> CrawledPage {
        let text = match &fetched.title {
            Some(title) => format!("{}\n{}", title, fetched.text),
            None => fetched.text,
        };
        let (leads, mentions) = self
            .extractor
            .extract(&text)
            .into_evidence(Some(url), depth);

        CrawledPage {
            url: url.to_string(),
            title: fetched.title,
            depth,
            query: query.map(str::to_string),
            leads,
            mentions,
            error: None,
        }
    }

    /// Derived work from one page: email follow-up queries and incidental links
    fn follow_up(&self, run: &mut CrawlRun, page: &CrawledPage) {
        if self.config.follow_discovered_emails {
            for lead in page.leads.iter().filter(|l| l.kind() == LeadKind::Email) {
                if run.email_queries >= MAX_EMAIL_QUERIES {
                    break;
                }
                if run.queried_emails.insert(lead.value().to_string()) {
                    run.email_queries += 1;
                    let query = derive_for_email(lead.value());
                    debug!(query = %query, "Following discovered email");
                    run.frontier.push_back(FrontierTask::Query(query));
                }
            }
        }

        if page.depth < self.config.max_depth {
            let max_len = self.config.max_total_pages;
            for link in page.leads.iter().filter(|l| l.kind() == LeadKind::Url) {
                if !run.offer_url(link.value(), page.depth + 1, page.query.as_deref(), max_len) {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use veritrace_core::{PageFetcher, SearchExecutor};

    #[derive(Default)]
    struct StubSearch {
        results: HashMap<String, Vec<String>>,
        failing: HashSet<String>,
        log: Mutex<Vec<String>>,
    }

    impl StubSearch {
        fn with(mut self, query: &str, urls: &[&str]) -> Self {
            self.results
                .insert(query.to_string(), urls.iter().map(|u| u.to_string()).collect());
            self
        }

        fn failing(mut self, query: &str) -> Self {
            self.failing.insert(query.to_string());
            self
        }
    }

    #[async_trait]
    impl SearchExecutor for StubSearch {
        fn name(&self) -> &str {
            "stub"
        }

        async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
            self.log.lock().push(query.to_string());
            if self.failing.contains(query) {
                return Err(SearchError::Status(500));
            }
            Ok(self
                .results
                .get(query)
                .map(|urls| urls.iter().take(limit).cloned().collect())
                .unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct StubFetcher {
        pages: HashMap<String, String>,
        failing: HashSet<String>,
        delays: HashMap<String, Duration>,
        default_delay: Duration,
        broken_setup: bool,
        log: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn page(mut self, url: &str, text: &str) -> Self {
            self.pages.insert(url.to_string(), text.to_string());
            self
        }

        fn failing(mut self, url: &str) -> Self {
            self.failing.insert(url.to_string());
            self
        }

        fn delay(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }

        fn fetched(&self) -> Vec<String> {
            self.log.lock().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn prepare(&self) -> Result<(), FetchError> {
            if self.broken_setup {
                return Err(FetchError::Setup("proxy unreachable".into()));
            }
            Ok(())
        }

        async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchedPage, FetchError> {
            self.log.lock().push(url.to_string());
            let delay = self.delays.get(url).copied().unwrap_or(self.default_delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if self.failing.contains(url) {
                return Err(FetchError::Status(404));
            }
            Ok(FetchedPage {
                url: url.to_string(),
                title: None,
                text: self.pages.get(url).cloned().unwrap_or_else(|| "nothing here".into()),
            })
        }
    }

    fn urls(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://{}.test/{}", prefix, i)).collect()
    }

    fn two_by_five() -> StubSearch {
        let a = urls("a", 5);
        let b = urls("b", 5);
        let a: Vec<&str> = a.iter().map(String::as_str).collect();
        let b: Vec<&str> = b.iter().map(String::as_str).collect();
        StubSearch::default().with("q1", &a).with("q2", &b)
    }

    fn crawler(search: StubSearch, fetcher: Arc<StubFetcher>, config: CrawlConfig) -> FrontierCrawler {
        FrontierCrawler::new(Arc::new(search), fetcher, Extractor::default(), config)
    }

    fn queries(qs: &[&str]) -> Vec<String> {
        qs.iter().map(|q| q.to_string()).collect()
    }

    #[tokio::test]
    async fn test_page_budget_two_queries_five_urls() {
        let fetcher = Arc::new(StubFetcher::default());
        let config = CrawlConfig {
            max_total_pages: 3,
            ..CrawlConfig::default()
        };
        let outcome = crawler(two_by_five(), fetcher.clone(), config)
            .crawl_queries(queries(&["q1", "q2"]))
            .await;

        assert_eq!(outcome.profile.pages_analyzed, 3);
        assert_eq!(outcome.profile.crawled_pages.len(), 3);
        assert_eq!(outcome.stats.termination, Termination::PageBudget);
        assert_eq!(outcome.stats.queries_processed, 2);
        assert_eq!(outcome.stats.urls_discovered, 10);
        assert_eq!(outcome.stats.urls_unvisited, 7);
        assert_eq!(
            fetcher.fetched(),
            vec!["https://a.test/0", "https://a.test/1", "https://a.test/2"]
        );
    }

    /// Every query gets its own fresh result URLs
    #[derive(Default)]
    struct FreshSearch;

    #[async_trait]
    impl SearchExecutor for FreshSearch {
        fn name(&self) -> &str {
            "fresh"
        }

        async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
            Ok((0..limit)
                .map(|i| format!("https://r.test/{}/{}", slug(query), i))
                .collect())
        }
    }

    fn slug(query: &str) -> String {
        query
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }

    #[tokio::test]
    async fn test_first_queries_fill_small_page_budget() {
        let fetcher = Arc::new(StubFetcher::default());
        let config = CrawlConfig {
            max_total_pages: 5,
            follow_discovered_emails: false,
            ..CrawlConfig::default()
        };
        let queries = derive("coinguy", &[]);
        assert!(queries.len() > 5);

        let outcome = FrontierCrawler::new(
            Arc::new(FreshSearch),
            fetcher,
            Extractor::default(),
            config,
        )
        .crawl("coinguy", &[])
        .await;

        let first = queries[0].as_str();
        assert_eq!(outcome.profile.pages_analyzed, 5);
        assert!(outcome
            .profile
            .crawled_pages
            .iter()
            .all(|p| p.query.as_deref() == Some(first)));
        assert_eq!(outcome.stats.termination, Termination::PageBudget);
        assert_eq!(outcome.stats.queries_processed, queries.len());
    }

    #[tokio::test]
    async fn test_case_sensitive_paths_stay_distinct() {
        let search = StubSearch::default()
            .with("q", &["https://pastebin.com/AbC", "https://PASTEBIN.com/abc"]);
        let fetcher = Arc::new(StubFetcher::default());

        let outcome = crawler(search, fetcher.clone(), CrawlConfig::default())
            .crawl_queries(queries(&["q"]))
            .await;

        assert_eq!(fetcher.fetched().len(), 2);
        assert_eq!(outcome.stats.urls_discovered, 2);
    }

    #[tokio::test]
    async fn test_pages_never_exceed_budget() {
        for budget in 0..8 {
            let fetcher = Arc::new(StubFetcher::default());
            let config = CrawlConfig {
                max_total_pages: budget,
                fetch_concurrency: 3,
                ..CrawlConfig::default()
            };
            let outcome = crawler(two_by_five(), fetcher.clone(), config)
                .crawl_queries(queries(&["q1", "q2"]))
                .await;
            assert!(outcome.profile.pages_analyzed <= budget, "budget {}", budget);
            assert!(fetcher.fetched().len() <= budget);
        }
    }

    #[tokio::test]
    async fn test_zero_budget_visits_nothing() {
        let fetcher = Arc::new(StubFetcher::default());
        let config = CrawlConfig {
            max_total_pages: 0,
            ..CrawlConfig::default()
        };
        let outcome = crawler(two_by_five(), fetcher.clone(), config)
            .crawl_queries(queries(&["q1", "q2"]))
            .await;
        assert_eq!(outcome.stats.termination, Termination::PageBudget);
        assert_eq!(outcome.stats.queries_skipped, 2);
        assert!(fetcher.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_time_budget_stops_crawl() {
        let many = urls("slow", 20);
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        let search = StubSearch::default().with("q", &refs);
        let fetcher = Arc::new(StubFetcher {
            default_delay: Duration::from_millis(40),
            ..Default::default()
        });
        let config = CrawlConfig {
            max_results_per_query: 20,
            max_execution_time_ms: 120,
            per_page_timeout_ms: 500,
            ..CrawlConfig::default()
        };

        let started = std::time::Instant::now();
        let outcome = crawler(search, fetcher, config).crawl_queries(queries(&["q"])).await;
        let elapsed = started.elapsed();

        assert_eq!(outcome.stats.termination, Termination::Deadline);
        assert!(outcome.profile.pages_analyzed < 20);
        assert!(elapsed <= Duration::from_millis(120 + 500));
    }

    #[tokio::test]
    async fn test_stalled_fetch_times_out() {
        let search = StubSearch::default().with("q", &["https://stall.test", "https://ok.test"]);
        let fetcher = Arc::new(
            StubFetcher::default()
                .delay("https://stall.test", Duration::from_secs(5))
                .page("https://ok.test", "fine"),
        );
        let config = CrawlConfig {
            per_page_timeout_ms: 50,
            ..CrawlConfig::default()
        };

        let outcome = crawler(search, fetcher, config).crawl_queries(queries(&["q"])).await;
        let pages = &outcome.profile.crawled_pages;

        assert_eq!(pages.len(), 2);
        assert!(pages[0].error.as_deref().unwrap_or("").contains("timed out"));
        assert!(pages[1].error.is_none());
        assert_eq!(outcome.stats.pages_failed, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_error_page() {
        let search = StubSearch::default().with("q", &["https://gone.test", "https://ok.test"]);
        let fetcher = Arc::new(
            StubFetcher::default()
                .failing("https://gone.test")
                .page("https://ok.test", "write to someone@mail.example"),
        );

        let outcome = crawler(search, fetcher, CrawlConfig::default())
            .crawl_queries(queries(&["q"]))
            .await;

        let failed = &outcome.profile.crawled_pages[0];
        assert!(failed.is_error());
        assert!(failed.leads.is_empty());
        assert_eq!(outcome.profile.pages_analyzed, 2);
        assert!(outcome.profile.emails.contains("someone@mail.example"));
        assert!(outcome.profile.errors.is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_recorded_and_skipped() {
        let search = StubSearch::default()
            .failing("bad")
            .with("good", &["https://ok.test"]);
        let fetcher = Arc::new(StubFetcher::default());

        let outcome = crawler(search, fetcher, CrawlConfig::default())
            .crawl_queries(queries(&["bad", "good"]))
            .await;

        assert_eq!(outcome.profile.errors.len(), 1);
        assert!(outcome.profile.errors[0].contains("bad"));
        assert_eq!(outcome.profile.pages_analyzed, 1);
        assert_eq!(outcome.stats.termination, Termination::FrontierExhausted);
    }

    #[tokio::test]
    async fn test_url_visited_once() {
        let search = StubSearch::default()
            .with("q1", &["https://same.test/page", "https://other.test"])
            .with("q2", &["https://SAME.test/page/", "https://other.test"]);
        let fetcher = Arc::new(StubFetcher::default());

        let outcome = crawler(search, fetcher.clone(), CrawlConfig::default())
            .crawl_queries(queries(&["q1", "q2"]))
            .await;

        assert_eq!(fetcher.fetched().len(), 2);
        assert_eq!(outcome.stats.urls_discovered, 2);
        assert_eq!(outcome.stats.urls_unvisited, 0);
    }

    #[tokio::test]
    async fn test_setup_failure_recorded() {
        let fetcher = Arc::new(StubFetcher {
            broken_setup: true,
            ..Default::default()
        });
        let outcome = crawler(two_by_five(), fetcher.clone(), CrawlConfig::default())
            .crawl_queries(queries(&["q1"]))
            .await;

        assert_eq!(outcome.stats.termination, Termination::SetupFailed);
        assert_eq!(outcome.profile.errors.len(), 1);
        assert!(outcome.profile.crawled_pages.is_empty());
        assert!(fetcher.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_page_evidence_collected() {
        let text = "Contact me at a@b.com or see github.com/foo — heard this was a RUG PULL, stay away";
        let search = StubSearch::default().with("q", &["https://forum.test/thread"]);
        let fetcher = Arc::new(StubFetcher::default().page("https://forum.test/thread", text));
        let config = CrawlConfig {
            follow_discovered_emails: false,
            ..CrawlConfig::default()
        };

        let outcome = crawler(search, fetcher, config).crawl_queries(queries(&["q"])).await;
        let profile = &outcome.profile;

        assert!(profile.emails.contains("a@b.com"));
        assert!(profile.usernames.contains("foo"));
        assert_eq!(profile.scam_mentions.len(), 1);
        assert_eq!(profile.scam_mentions[0].keyword, "rug pull");
        assert_eq!(
            profile.scam_mentions[0].source_url.as_deref(),
            Some("https://forum.test/thread")
        );
        let page = &profile.crawled_pages[0];
        assert_eq!(page.depth, 1);
        assert_eq!(page.query.as_deref(), Some("q"));
    }

    #[tokio::test]
    async fn test_discovered_email_followed_once() {
        let search = StubSearch::default().with("q", &["https://a.test", "https://b.test"]);
        let fetcher = Arc::new(
            StubFetcher::default()
                .page("https://a.test", "reach new@mail.example")
                .page("https://b.test", "or NEW@mail.example again"),
        );
        let search = Arc::new(search);
        let crawler = FrontierCrawler::new(
            search.clone(),
            fetcher,
            Extractor::default(),
            CrawlConfig::default(),
        );

        crawler.crawl_queries(queries(&["q"])).await;

        let follow = derive_for_email("new@mail.example");
        let log = search.log.lock().clone();
        assert_eq!(log, vec!["q".to_string(), follow]);
    }

    #[tokio::test]
    async fn test_seed_emails_count_against_quota() {
        let seeds: Vec<String> = ["s1@x.test", "s2@x.test", "s3@x.test"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let first = derive("coinguy", &seeds)[0].clone();
        let search = Arc::new(StubSearch::default().with(&first, &["https://a.test"]));
        let fetcher = Arc::new(StubFetcher::default().page("https://a.test", "extra@x.test"));
        let crawler = FrontierCrawler::new(
            search.clone(),
            fetcher,
            Extractor::default(),
            CrawlConfig::default(),
        );

        crawler.crawl("coinguy", &seeds).await;

        let log = search.log.lock().clone();
        assert!(!log.contains(&derive_for_email("extra@x.test")));
        assert_eq!(log.len(), derive("coinguy", &seeds).len());
    }

    #[tokio::test]
    async fn test_incidental_links_below_max_depth() {
        let search = StubSearch::default().with("q", &["https://hub.test"]);
        let fetcher = Arc::new(
            StubFetcher::default().page("https://hub.test", "see https://linked.test/post for more"),
        );
        let config = CrawlConfig {
            max_depth: 2,
            ..CrawlConfig::default()
        };

        let outcome = crawler(search, fetcher.clone(), config)
            .crawl_queries(queries(&["q"]))
            .await;

        assert_eq!(fetcher.fetched(), vec!["https://hub.test", "https://linked.test/post"]);
        assert_eq!(outcome.profile.crawled_pages[1].depth, 2);
    }

    #[tokio::test]
    async fn test_no_incidental_links_at_default_depth() {
        let search = StubSearch::default().with("q", &["https://hub.test"]);
        let fetcher = Arc::new(
            StubFetcher::default().page("https://hub.test", "see https://linked.test/post for more"),
        );

        crawler(search, fetcher.clone(), CrawlConfig::default())
            .crawl_queries(queries(&["q"]))
            .await;

        assert_eq!(fetcher.fetched(), vec!["https://hub.test"]);
    }

    #[tokio::test]
    async fn test_parallel_fetch_keeps_frontier_order() {
        let search = StubSearch::default().with(
            "q",
            &["https://p.test/0", "https://p.test/1", "https://p.test/2", "https://p.test/3"],
        );
        let fetcher = Arc::new(
            StubFetcher::default()
                .delay("https://p.test/0", Duration::from_millis(60))
                .delay("https://p.test/1", Duration::from_millis(10)),
        );
        let config = CrawlConfig {
            fetch_concurrency: 4,
            ..CrawlConfig::default()
        };

        let outcome = crawler(search, fetcher, config).crawl_queries(queries(&["q"])).await;
        let order: Vec<&str> = outcome
            .profile
            .crawled_pages
            .iter()
            .map(|p| p.url.as_str())
            .collect();

        assert_eq!(
            order,
            vec!["https://p.test/0", "https://p.test/1", "https://p.test/2", "https://p.test/3"]
        );
    }
}
