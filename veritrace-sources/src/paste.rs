//! Paste-dump adapter
//!
//! Searches the psbdmp Pastebin dump index for the target and deep-analyzes
//! the first few pastes: each becomes a crawled page whose text goes through
//! the lead extractor.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use veritrace_core::{
    normalize_target, AdapterError, CrawlConfig, CrawledPage, Extractor, PartialProfile,
    SourceAdapter,
};
use veritrace_net::Transport;

use crate::{request_error, status_error};

const PSBDMP_SEARCH: &str = "https://psbdmp.ws/api/v3/search";
const PASTEBIN_BASE: &str = "https://pastebin.com";

pub struct PasteAdapter {
    transport: Transport,
    extractor: Extractor,
    max_pastes: usize,
    min_paste_length: usize,
}

impl PasteAdapter {
    pub fn new(
        transport: Transport,
        extractor: Extractor,
        max_pastes: usize,
        min_paste_length: usize,
    ) -> Self {
        Self {
            transport,
            extractor,
            max_pastes,
            min_paste_length,
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<PsbdmpPaste>, AdapterError> {
        let url = format!("{}/{}", PSBDMP_SEARCH, urlencoding::encode(query));
        let response = self.transport.get(&url).send().await.map_err(request_error)?;

        // An unknown term is a 404, which is just an empty result
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(status_error(response.status(), query));
        }

        let body = response.text().await.map_err(request_error)?;
        parse_search(&body)
    }

    /// Fill in content the search index did not include
    async fn raw_content(&self, id: &str) -> Option<String> {
        let url = format!("{}/raw/{}", PASTEBIN_BASE, id);
        match self.transport.get(&url).send().await {
            Ok(response) if response.status().is_success() => response.text().await.ok(),
            Ok(response) => {
                debug!("Paste {} returned status {}", id, response.status());
                None
            }
            Err(e) => {
                warn!("Failed to fetch paste content from {}: {}", url, e);
                None
            }
        }
    }

    async fn collect(&self, target: &str, max_pastes: usize) -> Result<PartialProfile, AdapterError> {
        let query = normalize_target(target);
        let mut partial = PartialProfile::new(self.name());
        if query.is_empty() || max_pastes == 0 {
            return Ok(partial);
        }

        let pastes = self.search(&query).await?;
        info!("Paste search for {} returned {} hits", query, pastes.len());

        for paste in pastes {
            if partial.pages_analyzed >= max_pastes {
                break;
            }

            let content = if paste.content.len() >= self.min_paste_length {
                Some(paste.content.clone())
            } else {
                self.raw_content(&paste.id).await
            };

            match content {
                Some(content) if content.len() >= self.min_paste_length => {
                    let page = self.analyze(&paste, &content, &query);
                    partial.add_page(page);
                }
                _ => debug!("Skipping short or unavailable paste {}", paste.id),
            }
        }

        Ok(partial)
    }

    fn analyze(&self, paste: &PsbdmpPaste, content: &str, query: &str) -> CrawledPage {
        let url = format!("{}/{}", PASTEBIN_BASE, paste.id);
        let (leads, mentions) = self
            .extractor
            .extract(content)
            .into_evidence(Some(&url), 0);

        CrawledPage {
            url,
            title: paste.title.clone().filter(|t| !t.trim().is_empty()),
            depth: 0,
            query: Some(query.to_string()),
            leads,
            mentions,
            error: None,
        }
    }
}

#[async_trait]
impl SourceAdapter for PasteAdapter {
    fn name(&self) -> &str {
        "paste"
    }

    async fn run(&self, target: &str) -> Result<PartialProfile, AdapterError> {
        self.collect(target, self.max_pastes).await
    }

    async fn run_with(
        &self,
        target: &str,
        config: &CrawlConfig,
    ) -> Result<PartialProfile, AdapterError> {
        self.collect(target, config.max_pastes_or_pages_to_deep_analyze)
            .await
    }
}

#[derive(Debug, Deserialize)]
struct PsbdmpPaste {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: String,
}

/// The index answers with either a bare list or `{ "data": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PsbdmpResponse {
    List(Vec<PsbdmpPaste>),
    Wrapped {
        #[serde(default)]
        data: Vec<PsbdmpPaste>,
    },
}

fn parse_search(body: &str) -> Result<Vec<PsbdmpPaste>, AdapterError> {
    let parsed: PsbdmpResponse =
        serde_json::from_str(body).map_err(|e| AdapterError::Parse(e.to_string()))?;
    Ok(match parsed {
        PsbdmpResponse::List(list) => list,
        PsbdmpResponse::Wrapped { data } => data,
    })
}
