// src/discovery/client.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::CertificateLogSource;
use crate::types::CtLogEntry;

pub const DEFAULT_CRT_SH_URL: &str = "https://crt.sh";

/// HTTP client for the crt.sh JSON search API
pub struct CrtShClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl CrtShClient {
    /// Create a new crt.sh client
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .user_agent(concat!("certsweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CertificateLogSource for CrtShClient {
    /// Search certificates mentioning `domain`
    /// Endpoint: GET {base_url}/?q={domain}&output=json
    async fn fetch_entries(&self, domain: &str) -> Result<Vec<CtLogEntry>> {
        let url = format!("{}/", self.base_url);

        debug!("Querying {} for {}", url, domain);

        let response = self
            .http_client
            .get(&url)
            .query(&[("q", domain), ("output", "json")])
            .send()
            .await
            .context("Failed to query crt.sh")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                warn!("Rate limited by crt.sh while querying {}", domain);
                anyhow::bail!("Rate limited (429)");
            }

            anyhow::bail!("crt.sh request failed with status {}: {}", status, body);
        }

        let entries: Vec<CtLogEntry> = response
            .json()
            .await
            .context("Failed to parse crt.sh JSON")?;

        debug!("Received {} CT entries for {}", entries.len(), domain);

        Ok(entries)
    }
}
