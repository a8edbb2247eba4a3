//! Evidence merging
//!
//! Set-valued fields are unioned (emails and usernames compared lower-cased,
//! URLs and wallets as given), so merging is commutative, associative and
//! idempotent for them. Pages and mentions are concatenated in producer
//! order. Merging never fails.

use crate::{AggregatedProfile, PartialProfile};

impl AggregatedProfile {
    /// Fold one producer's contribution into the profile
    pub fn absorb(&mut self, partial: PartialProfile) {
        self.all_emails
            .extend(partial.emails.iter().map(|e| e.trim().to_lowercase()));
        self.all_usernames
            .extend(partial.usernames.iter().map(|u| u.trim().to_lowercase()));
        self.all_urls.extend(partial.urls);
        self.all_wallets.extend(partial.wallets);

        for handle in partial.handles {
            self.all_usernames.insert(handle.value.to_lowercase());
            self.handles.insert(handle);
        }

        for indicator in partial.trust_indicators {
            if !self.trust_indicators.contains(&indicator) {
                self.trust_indicators.push(indicator);
            }
        }

        self.scam_mentions.extend(partial.scam_mentions);
        self.crawled_pages.extend(partial.crawled_pages);
        self.pages_analyzed += partial.pages_analyzed;
        self.errors.extend(partial.errors);

        if !partial.failed && !self.sources.contains(&partial.source) {
            self.sources.push(partial.source);
        }
    }
}

/// Merge producer contributions into one profile for `target`
pub fn merge<I>(target: &str, partials: I) -> AggregatedProfile
where
    I: IntoIterator<Item = PartialProfile>,
{
    let mut profile = AggregatedProfile::new(target);
    for partial in partials {
        profile.absorb(partial);
    }
    profile
}
