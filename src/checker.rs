// src/checker.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::discovery::HostnameDiscoverer;
use crate::metadata::MetadataStore;
use crate::orchestrator::HostOrchestrator;
use crate::progress::ProgressIndicator;
use crate::report::ReportAggregator;
use crate::types::{CheckRequest, DomainReport};

/// Runs one domain check end to end: discover, probe, aggregate
pub struct DomainChecker {
    discoverer: HostnameDiscoverer,
    orchestrator: HostOrchestrator,
    aggregator: ReportAggregator,
    progress: ProgressIndicator,
}

impl DomainChecker {
    pub fn new(
        discoverer: HostnameDiscoverer,
        orchestrator: HostOrchestrator,
        aggregator: ReportAggregator,
    ) -> Self {
        Self {
            discoverer,
            orchestrator,
            aggregator,
            progress: ProgressIndicator::new(false),
        }
    }

    /// Show a spinner while crt.sh is queried
    pub fn with_progress(mut self, progress: ProgressIndicator) -> Self {
        self.progress = progress;
        self
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        self.aggregator.store()
    }

    pub async fn last_checked(&self, domain: &str) -> Option<DateTime<Utc>> {
        self.store().get(domain).await
    }

    /// Invalid requests fail before any network activity
    pub async fn check(&self, request: &CheckRequest) -> Result<DomainReport> {
        let domain = request.validate()?;
        info!("Checking {}", domain);

        self.progress
            .set_message(format!("Querying crt.sh for {}", domain));
        let hostnames = self.discoverer.discover(&domain).await;

        let records = self.orchestrator.orchestrate(&hostnames).await;

        Ok(self.aggregator.aggregate(&domain, records).await)
    }
}
