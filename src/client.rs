//! HTTP client wrapper.
//!
//! All requests go through a single [`HttpClient`] carrying the identifying
//! User-Agent and the configured timeouts, so that page fetches and file
//! transfers behave the same way.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::Result;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = "campdown/1.0";

/// A fetched page: status code plus the decoded body text.
#[derive(Debug)]
pub struct Page {
    /// HTTP status code of the response.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl Page {
    /// Whether the fetch returned a 200 response.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// HTTP client with a fixed User-Agent and connect/read timeouts.
///
/// Created once and reused for every request of a run, taking advantage of
/// connection pooling. The timeouts are per-connect and per-read rather than
/// a total deadline, so long streaming transfers are not cut off.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(3)
    }
}

impl HttpClient {
    /// Create a new client with the given connect/read timeout in seconds.
    pub fn new(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(timeout_secs))
            .read_timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build HTTP client with static configuration");

        Self { client }
    }

    /// Fetch a page and decode its body as text.
    ///
    /// Non-200 responses are returned as data, not errors; callers decide
    /// whether a bad status is fatal for them.
    pub async fn get_page(&self, url: &str) -> Result<Page> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(Page { status, body })
    }

    /// Access the underlying reqwest client for streaming requests.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}
