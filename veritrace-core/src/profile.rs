//! Partial and aggregated profiles
//!
//! Every producer (the frontier crawler and each source adapter) returns a
//! [`PartialProfile`]. The merger folds them into one [`AggregatedProfile`],
//! the terminal artifact of an investigation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use uuid::Uuid;

use crate::{CrawledPage, Handle, Lead, LeadKind, Platform, RiskAssessment, RiskLevel, ScamMention};

/// The contribution of one producer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialProfile {
    /// Producer name (`frontier`, `github`, ...)
    pub source: String,
    pub emails: BTreeSet<String>,
    pub usernames: BTreeSet<String>,
    pub handles: BTreeSet<Handle>,
    pub urls: BTreeSet<String>,
    pub wallets: BTreeSet<String>,
    pub scam_mentions: Vec<ScamMention>,
    pub crawled_pages: Vec<CrawledPage>,
    pub pages_analyzed: usize,
    pub trust_indicators: Vec<String>,
    pub errors: Vec<String>,
    /// The producer as a whole failed; it contributes nothing but its error
    #[serde(default)]
    pub failed: bool,
}

impl PartialProfile {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Default::default()
        }
    }

    /// Empty contribution standing in for a producer that failed
    pub fn failed(source: &str, error: impl fmt::Display) -> Self {
        Self {
            source: source.to_string(),
            errors: vec![format!("{}: {}", source, error)],
            failed: true,
            ..Default::default()
        }
    }

    /// Route a lead into the matching set. Returns true if it was new.
    pub fn add_lead(&mut self, lead: &Lead) -> bool {
        match lead.kind() {
            LeadKind::Email => self.emails.insert(lead.value().to_lowercase()),
            LeadKind::Handle => {
                let platform = lead.platform().unwrap_or(Platform::Mention);
                let user_new = self.usernames.insert(lead.value().to_lowercase());
                let handle_new = self.handles.insert(Handle::new(platform, lead.value()));
                user_new || handle_new
            }
            LeadKind::Url => self.urls.insert(lead.value().to_string()),
            LeadKind::Wallet => self.wallets.insert(lead.value().to_string()),
        }
    }

    /// Record a mention unless the same keyword was already seen on the same page
    pub fn add_mention(&mut self, mention: ScamMention) -> bool {
        if self
            .scam_mentions
            .iter()
            .any(|m| m.dedup_key() == mention.dedup_key())
        {
            return false;
        }
        self.scam_mentions.push(mention);
        true
    }

    pub fn add_trust_indicator(&mut self, indicator: impl Into<String>) {
        let indicator = indicator.into();
        if !self.trust_indicators.contains(&indicator) {
            self.trust_indicators.push(indicator);
        }
    }

    /// Record a visited page and fold its evidence in
    pub fn add_page(&mut self, page: CrawledPage) {
        for lead in &page.leads {
            self.add_lead(lead);
        }
        for mention in &page.mentions {
            self.add_mention(mention.clone());
        }
        self.pages_analyzed += 1;
        self.crawled_pages.push(page);
    }

    pub fn lead_count(&self) -> usize {
        self.emails.len() + self.handles.len() + self.urls.len() + self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lead_count() == 0
            && self.usernames.is_empty()
            && self.scam_mentions.is_empty()
            && self.crawled_pages.is_empty()
            && self.trust_indicators.is_empty()
    }
}

/// Why a frontier crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// No queries or URLs left
    #[default]
    FrontierExhausted,
    /// Wall-clock budget reached
    Deadline,
    /// Page-count budget reached
    PageBudget,
    /// The crawl could not be set up
    SetupFailed,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Termination::FrontierExhausted => "frontier exhausted",
            Termination::Deadline => "time budget reached",
            Termination::PageBudget => "page budget reached",
            Termination::SetupFailed => "setup failed",
        };
        f.write_str(s)
    }
}

/// Crawl bookkeeping reported next to the profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStats {
    pub termination: Termination,
    pub queries_processed: usize,
    /// Queries still on the frontier when the crawl stopped
    pub queries_skipped: usize,
    pub urls_discovered: usize,
    pub urls_unvisited: usize,
    pub pages_failed: usize,
}

/// The consolidated result of one investigation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedProfile {
    pub investigation_id: Uuid,
    pub target: String,
    pub generated_at: DateTime<Utc>,
    pub all_emails: BTreeSet<String>,
    pub all_usernames: BTreeSet<String>,
    pub all_urls: BTreeSet<String>,
    pub all_wallets: BTreeSet<String>,
    pub handles: BTreeSet<Handle>,
    /// Ordered, newest-found last
    pub scam_mentions: Vec<ScamMention>,
    pub crawled_pages: Vec<CrawledPage>,
    pub pages_analyzed: usize,
    pub execution_time_ms: u64,
    pub scam_score: u8,
    pub risk_level: RiskLevel,
    pub red_flags: Vec<String>,
    pub trust_indicators: Vec<String>,
    pub errors: Vec<String>,
    /// Producers that contributed without failing
    pub sources: Vec<String>,
    pub crawl: Option<CrawlStats>,
}

impl AggregatedProfile {
    pub fn new(target: &str) -> Self {
        Self {
            investigation_id: Uuid::new_v4(),
            target: target.to_string(),
            generated_at: Utc::now(),
            all_emails: BTreeSet::new(),
            all_usernames: BTreeSet::new(),
            all_urls: BTreeSet::new(),
            all_wallets: BTreeSet::new(),
            handles: BTreeSet::new(),
            scam_mentions: Vec::new(),
            crawled_pages: Vec::new(),
            pages_analyzed: 0,
            execution_time_ms: 0,
            scam_score: 0,
            risk_level: RiskLevel::Low,
            red_flags: Vec::new(),
            trust_indicators: Vec::new(),
            errors: Vec::new(),
            sources: Vec::new(),
            crawl: None,
        }
    }

    /// Store a scorer's verdict on the profile
    pub fn apply_risk(&mut self, assessment: RiskAssessment) {
        self.scam_score = assessment.score;
        self.risk_level = assessment.level;
        self.red_flags = assessment.red_flags;
    }

    /// Distinct pages carrying at least one scam mention
    pub fn pages_with_mentions(&self) -> usize {
        self.scam_mentions
            .iter()
            .filter_map(|m| m.source_url.as_deref())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn lead_count(&self) -> usize {
        self.all_emails.len() + self.handles.len() + self.all_urls.len() + self.all_wallets.len()
    }
}
