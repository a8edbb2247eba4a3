//! Keyword-severity risk scoring
//!
//! The scorer is a transparent heuristic, not a calibrated statistical model:
//! every point in the score can be traced back to one mention or one trust
//! indicator. Consumers should present it as such.
//!
//! - Each scam mention adds its keyword's severity weight
//! - Unknown keywords add a small default weight, never zero
//! - Each trust indicator subtracts a fixed deduction
//! - The raw sum is clamped to `[0, 100]`

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{AggregatedProfile, ScamMention, MAX_SCORE, MIN_SCORE};

/// A keyword and the points each mention of it contributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSeverity {
    pub keyword: String,
    pub weight: u32,
}

impl KeywordSeverity {
    fn new(keyword: &str, weight: u32) -> Self {
        Self {
            keyword: keyword.to_string(),
            weight,
        }
    }
}

/// Default severity table, most severe first
const DEFAULT_SEVERITIES: &[(&str, u32)] = &[
    ("exit scam", 30),
    ("rug pull", 30),
    ("rugpull", 30),
    ("rugged", 25),
    ("wallet drainer", 25),
    ("honeypot", 25),
    ("ponzi", 25),
    ("pyramid scheme", 20),
    ("stolen funds", 20),
    ("scammer", 20),
    ("scam", 15),
    ("fraud", 15),
    ("phishing", 15),
    ("impersonator", 10),
    ("do not trust", 10),
    ("untrustworthy", 10),
    ("blacklisted", 8),
    ("hacked", 8),
    ("fake", 8),
    ("beware", 5),
    ("warning", 5),
];

/// Weight at or above which a mention counts as a serious allegation
const SERIOUS_WEIGHT: u32 = 20;

/// Keywords of the default severity table, in table order
pub fn default_keywords() -> Vec<String> {
    DEFAULT_SEVERITIES.iter().map(|(k, _)| k.to_string()).collect()
}

/// Scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringPolicy {
    /// Keyword severity table; also the extractor's keyword list
    pub severities: Vec<KeywordSeverity>,
    /// Points for a mention whose keyword is not in the table
    pub default_keyword_weight: u32,
    /// Points removed per trust indicator
    pub trust_indicator_deduction: u32,
    /// Flag the profile when more distinct wallets than this are linked
    pub wallet_flag_threshold: usize,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            severities: DEFAULT_SEVERITIES
                .iter()
                .map(|(k, w)| KeywordSeverity::new(k, *w))
                .collect(),
            default_keyword_weight: 3,
            trust_indicator_deduction: 10,
            wallet_flag_threshold: 3,
        }
    }
}

impl ScoringPolicy {
    pub fn keywords(&self) -> Vec<String> {
        self.severities.iter().map(|s| s.keyword.clone()).collect()
    }

    /// Points one mention of `keyword` contributes
    pub fn weight_of(&self, keyword: &str) -> u32 {
        self.severities
            .iter()
            .find(|s| s.keyword.eq_ignore_ascii_case(keyword))
            .map(|s| s.weight)
            .unwrap_or(self.default_keyword_weight)
    }
}

/// Presentation band for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=24 => RiskLevel::Low,
            25..=59 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

/// Output of the scorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub score: u8,
    pub level: RiskLevel,
    pub red_flags: Vec<String>,
}

/// Keyword-severity risk scorer
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    policy: ScoringPolicy,
}

impl RiskScorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    /// Score mentions against trust indicators
    pub fn score(&self, mentions: &[ScamMention], trust_indicators: &[String]) -> RiskAssessment {
        let added: i64 = mentions
            .iter()
            .map(|m| i64::from(self.policy.weight_of(&m.keyword)))
            .sum();
        let deducted =
            i64::from(self.policy.trust_indicator_deduction) * trust_indicators.len() as i64;
        let score = (added - deducted).clamp(i64::from(MIN_SCORE), i64::from(MAX_SCORE)) as u8;

        RiskAssessment {
            score,
            level: RiskLevel::from_score(score),
            red_flags: self.keyword_flags(mentions),
        }
    }

    /// Score a merged profile, adding flags that need the whole profile
    pub fn assess(&self, profile: &AggregatedProfile) -> RiskAssessment {
        let mut assessment = self.score(&profile.scam_mentions, &profile.trust_indicators);

        let wallets = profile.all_wallets.len();
        if wallets > self.policy.wallet_flag_threshold {
            assessment
                .red_flags
                .push(format!("{} distinct wallet addresses linked to the target", wallets));
        }

        assessment
    }

    fn keyword_flags(&self, mentions: &[ScamMention]) -> Vec<String> {
        let mut flags = Vec::new();

        let rug = count_where(mentions, |k| k.contains("rug"));
        if rug > 0 {
            flags.push(format!("Rug-pull allegations found ({} mentions)", rug));
        }

        let exit = count_where(mentions, |k| k == "exit scam");
        if exit > 0 {
            flags.push(format!("Exit-scam allegations found ({} mentions)", exit));
        }

        let honeypot = count_where(mentions, |k| k == "honeypot");
        if honeypot > 0 {
            flags.push(format!("Honeypot allegations found ({} mentions)", honeypot));
        }

        let ponzi = count_where(mentions, |k| k == "ponzi" || k == "pyramid scheme");
        if ponzi > 0 {
            flags.push(format!("Ponzi / pyramid scheme allegations found ({} mentions)", ponzi));
        }

        let serious_sources: HashSet<&str> = mentions
            .iter()
            .filter(|m| self.policy.weight_of(&m.keyword) >= SERIOUS_WEIGHT)
            .filter_map(|m| m.source_url.as_deref())
            .collect();
        if serious_sources.len() > 1 {
            flags.push(format!(
                "Serious allegations corroborated by {} independent pages",
                serious_sources.len()
            ));
        }

        flags
    }
}

fn count_where<F: Fn(&str) -> bool>(mentions: &[ScamMention], pred: F) -> usize {
    mentions
        .iter()
        .filter(|m| pred(&m.keyword.to_ascii_lowercase()))
        .count()
}
