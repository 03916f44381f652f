// src/report.rs
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::metadata::{MetadataStore, format_timestamp};
use crate::types::{DomainReport, HostRecord, ReportSummary};

/// Builds the final report and records when the domain was checked
pub struct ReportAggregator {
    store: Arc<dyn MetadataStore>,
}

impl ReportAggregator {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    pub async fn aggregate(&self, domain: &str, records: Vec<HostRecord>) -> DomainReport {
        let total_unique = records.len();
        let reachable = records.iter().filter(|r| r.up).count();

        let retrieved_at = Utc::now();
        if let Err(e) = self.store.put(domain, retrieved_at).await {
            warn!("Failed to persist last-checked time for {}: {:#}", domain, e);
        }

        info!(
            "{}: {} unique hosts, {} reachable, {} unresponsive",
            domain,
            total_unique,
            reachable,
            total_unique - reachable
        );

        DomainReport {
            summary: ReportSummary {
                domain: domain.to_string(),
                total_unique,
                reachable,
                unresponsive: total_unique - reachable,
                retrieved_at: format_timestamp(retrieved_at),
            },
            results: records,
        }
    }
}
