//! GitHub user-profile adapter
//!
//! Looks the target up as a GitHub login and reports the profile's linked
//! accounts, plus trust indicators for long-lived, followed accounts. The bio
//! is run through the lead extractor like any other text.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use veritrace_core::{AdapterError, Extractor, Lead, PartialProfile, Platform, SourceAdapter};
use veritrace_net::Transport;

use crate::{account_name, request_error, status_error};

const GITHUB_API: &str = "https://api.github.com";

/// GitHub logins are at most 39 characters
const MAX_LOGIN_LEN: usize = 39;

const MIN_ACCOUNT_AGE_DAYS: i64 = 730;
const MIN_FOLLOWERS: u64 = 50;
const MIN_PUBLIC_REPOS: u64 = 10;

pub struct GitHubAdapter {
    transport: Transport,
    extractor: Extractor,
    token: Option<String>,
}

impl GitHubAdapter {
    pub fn new(transport: Transport, extractor: Extractor, token: Option<String>) -> Self {
        Self {
            transport,
            extractor,
            token,
        }
    }
}

#[async_trait]
impl SourceAdapter for GitHubAdapter {
    fn name(&self) -> &str {
        "github"
    }

    async fn run(&self, target: &str) -> Result<PartialProfile, AdapterError> {
        let login = match account_name(target, MAX_LOGIN_LEN) {
            Some(l) => l,
            None => {
                debug!("Target {} is not a GitHub login, skipping", target);
                return Ok(PartialProfile::new(self.name()));
            }
        };

        let url = format!("{}/users/{}", GITHUB_API, login);
        let mut request = self
            .transport
            .get(&url)
            .header("Accept", "application/vnd.github+json");

        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(request_error)?;
        if !response.status().is_success() {
            return Err(status_error(response.status(), &login));
        }

        let body = response.text().await.map_err(request_error)?;
        let user: GitHubUser =
            serde_json::from_str(&body).map_err(|e| AdapterError::Parse(e.to_string()))?;

        let partial = profile_from_user(&user, &self.extractor, Utc::now());
        info!(
            "GitHub profile {} yielded {} leads, {} trust indicators",
            user.login,
            partial.lead_count(),
            partial.trust_indicators.len()
        );
        Ok(partial)
    }
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
    html_url: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    blog: Option<String>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    twitter_username: Option<String>,
    #[serde(default)]
    public_repos: u64,
    #[serde(default)]
    followers: u64,
    created_at: DateTime<Utc>,
}

fn profile_from_user(user: &GitHubUser, extractor: &Extractor, now: DateTime<Utc>) -> PartialProfile {
    let mut partial = PartialProfile::new("github");
    let source = user.html_url.as_str();

    partial.add_lead(&Lead::handle(Platform::GitHub, &user.login).found_at(source, 0));
    partial.add_lead(&Lead::url(source));

    if let Some(name) = user.name.as_deref().filter(|n| !n.trim().is_empty()) {
        partial.usernames.insert(name.trim().to_lowercase());
    }
    if let Some(email) = user.email.as_deref().filter(|e| e.contains('@')) {
        partial.add_lead(&Lead::email(email).found_at(source, 0));
    }
    if let Some(blog) = user.blog.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        let blog = if blog.starts_with("http://") || blog.starts_with("https://") {
            blog.to_string()
        } else {
            format!("https://{}", blog)
        };
        partial.add_lead(&Lead::url(&blog).found_at(source, 0));
    }
    if let Some(twitter) = user.twitter_username.as_deref().filter(|t| !t.is_empty()) {
        partial.add_lead(&Lead::handle(Platform::Twitter, twitter).found_at(source, 0));
    }

    if let Some(bio) = &user.bio {
        let (leads, mentions) = extractor.extract(bio).into_evidence(Some(source), 0);
        for lead in &leads {
            partial.add_lead(lead);
        }
        for mention in mentions {
            partial.add_mention(mention);
        }
    }

    if now - user.created_at >= ChronoDuration::days(MIN_ACCOUNT_AGE_DAYS) {
        partial.add_trust_indicator("GitHub account older than 2 years");
    }
    if user.followers >= MIN_FOLLOWERS {
        partial.add_trust_indicator(format!("GitHub account has {} followers", user.followers));
    }
    if user.public_repos >= MIN_PUBLIC_REPOS {
        partial.add_trust_indicator(format!("GitHub account has {} public repositories", user.public_repos));
    }

    partial
}

#[cfg(test)]
mod tests {
    use super::*;
    use veritrace_core::Handle;

    const USER_JSON: &str = r#"{
        "login": "CoinDev",
        "html_url": "https://github.com/CoinDev",
        "name": "Coin Dev",
        "email": "Dev@Coin.example",
        "blog": "coin.example",
        "bio": "Builder. Not a scam, ask t.me/coindevchat",
        "twitter_username": "coindev_x",
        "public_repos": 42,
        "followers": 3,
        "created_at": "2015-03-01T12:00:00Z"
    }"#;

    #[test]
    fn test_profile_from_user() {
        let user: GitHubUser = serde_json::from_str(USER_JSON).unwrap();
        let partial = profile_from_user(&user, &Extractor::default(), Utc::now());

        assert!(partial.handles.contains(&Handle::new(Platform::GitHub, "coindev")));
        assert!(partial.handles.contains(&Handle::new(Platform::Twitter, "coindev_x")));
        assert!(partial.handles.contains(&Handle::new(Platform::Telegram, "coindevchat")));
        assert!(partial.emails.contains("dev@coin.example"));
        assert!(partial.urls.contains("https://coin.example"));
        assert!(partial.usernames.contains("coin dev"));

        assert_eq!(partial.scam_mentions.len(), 1);
        assert_eq!(partial.scam_mentions[0].keyword, "scam");

        assert_eq!(
            partial.trust_indicators,
            vec![
                "GitHub account older than 2 years".to_string(),
                "GitHub account has 42 public repositories".to_string(),
            ]
        );
    }

    #[test]
    fn test_new_account_has_no_trust() {
        let user: GitHubUser = serde_json::from_str(
            r#"{"login":"fresh","html_url":"https://github.com/fresh","created_at":"2026-09-01T00:00:00Z"}"#,
        )
        .unwrap();
        let now = "2026-10-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let partial = profile_from_user(&user, &Extractor::default(), now);
        assert!(partial.trust_indicators.is_empty());
        assert_eq!(partial.handles.len(), 1);
    }

    #[tokio::test]
    async fn test_non_login_target_is_skipped() {
        let transport = Transport::new(&veritrace_net::TransportConfig {
            proxy: None,
            ..Default::default()
        })
        .unwrap();
        let adapter = GitHubAdapter::new(transport, Extractor::default(), None);
        let partial = adapter.run("someone@mail.example").await.unwrap();
        assert!(partial.is_empty());
        assert!(!partial.failed);
    }
}
