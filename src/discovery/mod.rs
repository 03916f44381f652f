// src/discovery/mod.rs
//! Hostname discovery from Certificate Transparency search results.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::types::CtLogEntry;

pub mod client;

pub use client::CrtShClient;

/// A queryable store of CT log entries
#[async_trait]
pub trait CertificateLogSource: Send + Sync {
    /// Fetch every entry whose names mention `domain`
    async fn fetch_entries(&self, domain: &str) -> Result<Vec<CtLogEntry>>;
}

/// Turns CT entries for a domain into a deduplicated hostname list
pub struct HostnameDiscoverer {
    source: Arc<dyn CertificateLogSource>,
}

impl HostnameDiscoverer {
    pub fn new(source: Arc<dyn CertificateLogSource>) -> Self {
        Self { source }
    }

    /// Discover candidate hostnames, in first-seen order.
    ///
    /// The CT source is best effort: a failed fetch yields an empty list.
    pub async fn discover(&self, domain: &str) -> Vec<String> {
        let entries = match self.source.fetch_entries(domain).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Hostname discovery for {} failed: {:#}", domain, e);
                return Vec::new();
            }
        };

        let hostnames = extract_hostnames(&entries, Utc::now());
        info!(
            "Discovered {} unique hostnames for {} from {} CT entries",
            hostnames.len(),
            domain,
            entries.len()
        );
        hostnames
    }
}

/// Collect unexpired hostnames from `entries`, deduplicated in first-seen order
pub fn extract_hostnames(entries: &[CtLogEntry], now: DateTime<Utc>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut hostnames = Vec::new();

    for entry in entries {
        let expires = entry.not_after.as_deref().and_then(parse_not_after);
        if !expires.is_some_and(|t| t > now) {
            continue;
        }

        let Some(names) = entry.name_value.as_deref() else {
            continue;
        };

        for name in names.split_whitespace() {
            if let Some(host) = normalize_hostname(name) {
                if seen.insert(host.clone()) {
                    hostnames.push(host);
                }
            }
        }
    }

    hostnames
}

/// Strip a leading `*.` wildcard marker and surrounding whitespace
pub fn normalize_hostname(raw: &str) -> Option<String> {
    let host = raw.trim().trim_start_matches("*.").trim();
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Parse a crt.sh `not_after` value (naive UTC) or an RFC 3339 timestamp
pub fn parse_not_after(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
