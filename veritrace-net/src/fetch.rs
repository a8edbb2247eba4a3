//! HTML page fetcher
//!
//! Fetches a URL and reduces it to title plus visible text.

use async_trait::async_trait;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::debug;

use crate::Transport;
use veritrace_core::{FetchError, FetchedPage, PageFetcher};

/// Maximum characters of text kept per page
pub const MAX_CONTENT_LENGTH: usize = 8000;

/// Page fetcher over the shared transport
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    transport: Transport,
}

impl HttpPageFetcher {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FetchError::Unsupported(format!("scheme of {}", url)));
        }

        debug!("Fetching: {}", url);

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout(timeout)
            } else {
                FetchError::Request(e.to_string())
            }
        };

        let response = self
            .transport
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_err)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();

        let body = response.text().await.map_err(map_err)?;

        let (title, text) = if content_type.contains("html") {
            extract_content(&body)
        } else if content_type.starts_with("text/") || content_type.contains("json") {
            (None, collapse([body.as_str()]))
        } else {
            return Err(FetchError::Unsupported(content_type));
        };

        Ok(FetchedPage {
            url: url.to_string(),
            title,
            text: truncate_chars(text, MAX_CONTENT_LENGTH),
        })
    }
}

/// Cut to at most `max` characters on a char boundary
fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text,
    }
}

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Page title plus visible body text, with absolute link targets appended
pub fn extract_content(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").unwrap();
    let title = document
        .select(&title_selector)
        .next()
        .map(|el| collapse(el.text()))
        .filter(|t| !t.is_empty());

    let body_selector = Selector::parse("body").unwrap();
    let Some(body) = document.select(&body_selector).next() else {
        return (title, String::new());
    };

    let mut parts = Vec::new();
    push_visible(body, &mut parts);

    // Links carry handles and profile URLs that the visible text may not
    let href_selector = Selector::parse("a[href]").unwrap();
    parts.extend(
        body.select(&href_selector)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| href.starts_with("http://") || href.starts_with("https://")),
    );

    (title, collapse(parts))
}

fn push_visible<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push(text),
            Node::Element(el) if SKIPPED_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    push_visible(child, out);
                }
            }
            _ => {}
        }
    }
}

/// Join fragments with single spaces
fn collapse<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_and_links() {
        let html = r#"<html>
            <head><title> Scam
              Report </title></head>
            <body>
                <script>trackVisit();</script>
                <h1>Heads up</h1>
                <p>This user ran a <a href="https://t.me/pumpgroup">group</a>.</p>
                <noscript>enable js</noscript>
                <a href="/relative">local</a>
                <style>h1 { font-weight: bold; }</style>
            </body></html>"#;

        let (title, text) = extract_content(html);

        assert_eq!(title.as_deref(), Some("Scam Report"));
        assert!(text.starts_with("Heads up This user ran a group"));
        assert!(text.ends_with("https://t.me/pumpgroup"));
        assert!(!text.contains("trackVisit"));
        assert!(!text.contains("font-weight"));
        assert!(!text.contains("enable js"));
        assert!(!text.contains("/relative"));
    }

    #[test]
    fn test_missing_body_and_title() {
        let (title, text) = extract_content("<html><head></head></html>");
        assert_eq!(title, None);
        assert!(text.is_empty());
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let text = "héllo wörld".to_string();
        assert_eq!(truncate_chars(text.clone(), 4), "héll");
        assert_eq!(truncate_chars(text.clone(), 100), text);
    }

    #[test]
    fn test_collapse_fragments() {
        assert_eq!(collapse([" a  b", "", "\tc\n"]), "a b c");
    }

    #[tokio::test]
    async fn test_rejects_non_http_scheme() {
        let transport = Transport::new(&crate::TransportConfig {
            proxy: None,
            ..Default::default()
        })
        .unwrap();
        let fetcher = HttpPageFetcher::new(transport);
        let err = fetcher
            .fetch("ftp://files.test/a", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unsupported(_)));
    }
}
