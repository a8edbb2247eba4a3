//! Shared HTTP transport
//!
//! One [`Transport`] is built per investigation and cloned into every
//! collaborator that talks HTTP. Cloning shares the connection pool.

use reqwest::{Client, Proxy, RequestBuilder};
use std::time::Duration;
use thiserror::Error;

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Proxy URL (`socks5h://`, `http://`); from `VERITRACE_PROXY`
    pub proxy: Option<String>,
    /// Client-level request timeout in seconds
    pub timeout_secs: u64,
    /// Fixed user agent; rotated per request when absent
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            proxy: std::env::var("VERITRACE_PROXY").ok().filter(|p| !p.trim().is_empty()),
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

/// Errors from the network layer
#[derive(Debug, Error)]
pub enum NetError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),
}

/// Desktop browser user agents, rotated per request
const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36 Edg/128.0.0.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:130.0) Gecko/20100101 Firefox/130.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
];

pub fn random_user_agent() -> &'static str {
    use rand::seq::SliceRandom;
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Owned HTTP client plus request defaults
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    user_agent: Option<String>,
}

impl Transport {
    pub fn new(config: &TransportConfig) -> Result<Self, NetError> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)));

        if let Some(proxy) = &config.proxy {
            let proxy = Proxy::all(proxy).map_err(|e| NetError::InvalidProxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| NetError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }

    /// GET with the configured (or a rotated) user agent
    pub fn get(&self, url: &str) -> RequestBuilder {
        let ua = self
            .user_agent
            .as_deref()
            .unwrap_or_else(|| random_user_agent());
        self.client.get(url).header(reqwest::header::USER_AGENT, ua)
    }
}
