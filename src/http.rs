//! JSON transport used by the Open-Meteo collaborators

use crate::error::UpstreamFailure;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = concat!("swellcast/", env!("CARGO_PKG_VERSION"));

/// Capability to GET a URL and decode the body as JSON
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn fetch_json(&self, url: &str) -> Result<Value, UpstreamFailure>;
}

/// reqwest-backed fetcher with a per-request timeout
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout: Duration,
}

impl ReqwestFetcher {
    /// Build a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, UpstreamFailure> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UpstreamFailure::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl JsonFetcher for ReqwestFetcher {
    #[instrument(skip(self), level = "debug")]
    async fn fetch_json(&self, url: &str) -> Result<Value, UpstreamFailure> {
        let start_time = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamFailure::Timeout(self.timeout)
            } else {
                UpstreamFailure::Network(e.to_string())
            }
        })?;

        let status = response.status();
        debug!(
            "HTTP response received: {} in {:.3}s",
            status,
            start_time.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            warn!("Upstream returned {}", status);
            return Err(UpstreamFailure::Status(status.as_u16()));
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamFailure::Timeout(self.timeout)
            } else {
                UpstreamFailure::Malformed(e.to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("swellcast/"));
    }

    #[test]
    fn test_fetcher_builds() {
        let fetcher = ReqwestFetcher::new(Duration::from_secs(5));
        assert!(fetcher.is_ok());
    }
}
