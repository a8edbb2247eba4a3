//! Reddit user-profile adapter

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use veritrace_core::{AdapterError, Extractor, Lead, PartialProfile, Platform, SourceAdapter};
use veritrace_net::Transport;

use crate::{account_name, request_error, status_error};

const REDDIT_BASE: &str = "https://www.reddit.com";

const MAX_NAME_LEN: usize = 20;
const MIN_ACCOUNT_AGE_DAYS: i64 = 365;
const MIN_KARMA: i64 = 1000;

pub struct RedditAdapter {
    transport: Transport,
    extractor: Extractor,
}

impl RedditAdapter {
    pub fn new(transport: Transport, extractor: Extractor) -> Self {
        Self { transport, extractor }
    }
}

#[async_trait]
impl SourceAdapter for RedditAdapter {
    fn name(&self) -> &str {
        "reddit"
    }

    async fn run(&self, target: &str) -> Result<PartialProfile, AdapterError> {
        let name = match account_name(target, MAX_NAME_LEN) {
            Some(n) => n,
            None => {
                debug!("Target {} is not a Reddit username, skipping", target);
                return Ok(PartialProfile::new(self.name()));
            }
        };

        let url = format!("{}/user/{}/about.json", REDDIT_BASE, name);
        let response = self
            .transport
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(status_error(response.status(), &name));
        }

        let body = response.text().await.map_err(request_error)?;
        let about: RedditAbout =
            serde_json::from_str(&body).map_err(|e| AdapterError::Parse(e.to_string()))?;

        let partial = profile_from_about(&about.data, &self.extractor, Utc::now());
        info!(
            "Reddit profile {} yielded {} trust indicators",
            about.data.name,
            partial.trust_indicators.len()
        );
        Ok(partial)
    }
}

#[derive(Debug, Deserialize)]
struct RedditAbout {
    data: RedditUser,
}

#[derive(Debug, Deserialize)]
struct RedditUser {
    name: String,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    link_karma: i64,
    #[serde(default)]
    comment_karma: i64,
    #[serde(default)]
    has_verified_email: bool,
    #[serde(default)]
    is_suspended: bool,
    #[serde(default)]
    subreddit: Option<RedditUserSubreddit>,
}

#[derive(Debug, Deserialize)]
struct RedditUserSubreddit {
    #[serde(default)]
    public_description: String,
}

fn profile_from_about(user: &RedditUser, extractor: &Extractor, now: DateTime<Utc>) -> PartialProfile {
    let mut partial = PartialProfile::new("reddit");
    let profile_url = format!("{}/user/{}", REDDIT_BASE, user.name);

    partial.add_lead(&Lead::handle(Platform::Reddit, &user.name).found_at(&profile_url, 0));
    partial.add_lead(&Lead::url(&profile_url));

    // Suspended accounts expose no history worth trusting
    if user.is_suspended {
        return partial;
    }

    if let Some(description) = user.subreddit.as_ref().map(|s| s.public_description.as_str()) {
        let (leads, mentions) = extractor
            .extract(description)
            .into_evidence(Some(&profile_url), 0);
        for lead in &leads {
            partial.add_lead(lead);
        }
        for mention in mentions {
            partial.add_mention(mention);
        }
    }

    let created = DateTime::<Utc>::from_timestamp(user.created_utc as i64, 0);
    if let Some(created) = created {
        if now - created >= ChronoDuration::days(MIN_ACCOUNT_AGE_DAYS) {
            partial.add_trust_indicator("Reddit account older than 1 year");
        }
    }

    let karma = user.link_karma + user.comment_karma;
    if karma >= MIN_KARMA {
        partial.add_trust_indicator(format!("Reddit account has {} karma", karma));
    }
    if user.has_verified_email {
        partial.add_trust_indicator("Reddit account has a verified email");
    }

    partial
}
