//! Dork-style query derivation
//!
//! Builds the ordered query list the frontier crawler consumes. Order matters:
//! the crawler works front to back and a time budget may cut the tail, so the
//! most specific, highest-signal templates come first.

use std::collections::HashSet;

/// Query templates for the target, most specific first
const TARGET_TEMPLATES: &[&str] = &[
    "\"{target}\" scam OR fraud OR \"rug pull\"",
    "\"{target}\" \"exit scam\" OR ponzi OR honeypot",
    "\"{target}\" scammer OR stolen OR \"do not trust\"",
    "\"{target}\" site:reddit.com",
    "\"{target}\" site:twitter.com OR site:x.com",
    "\"{target}\" site:t.me OR site:telegram.me",
    "\"{target}\" site:github.com",
    "\"{target}\" site:pastebin.com OR site:rentry.co",
    "\"{target}\" wallet OR address OR 0x",
    "\"{target}\"",
];

/// Template for follow-up queries on a known email
const EMAIL_TEMPLATE: &str = "\"{email}\" scam OR fraud OR leak";

/// Maximum number of email queries added to one derivation
pub const MAX_EMAIL_QUERIES: usize = 3;

/// Trim whitespace and marker prefixes from a target identifier
pub fn normalize_target(target: &str) -> String {
    target.trim().trim_start_matches('@').trim().to_string()
}

/// Derive the ordered query list for `target` and the emails known so far
pub fn derive(target: &str, known_emails: &[String]) -> Vec<String> {
    let target = normalize_target(target);
    if target.is_empty() {
        return Vec::new();
    }

    let mut queries: Vec<String> = TARGET_TEMPLATES
        .iter()
        .map(|t| t.replace("{target}", &target))
        .collect();

    let target_lower = target.to_lowercase();
    let mut seen = HashSet::new();
    let email_queries = known_emails
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty() && *e != target_lower)
        .filter(|e| seen.insert(e.clone()))
        .take(MAX_EMAIL_QUERIES)
        .map(|e| derive_for_email(&e));
    queries.extend(email_queries);

    queries
}

/// The single follow-up query for a discovered email
pub fn derive_for_email(email: &str) -> String {
    EMAIL_TEMPLATE.replace("{email}", &email.trim().to_lowercase())
}
