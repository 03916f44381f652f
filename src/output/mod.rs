// src/output/mod.rs
//! Report rendering for certsweep
//!
//! Each handler renders a whole `DomainReport` to stdout or a file.

use crate::types::{DomainReport, ExpiryStatus, HostRecord};
use async_trait::async_trait;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};

pub mod csv;
pub mod human;
pub mod json;

/// Trait for output handlers that render a finished report
#[async_trait]
pub trait OutputHandler: Send + Sync {
    /// Render one report
    async fn emit_report(&self, report: &DomainReport) -> anyhow::Result<()>;

    /// Flush any buffered output
    async fn flush(&self) -> anyhow::Result<()>;
}

pub(crate) type SharedWriter = Mutex<Box<dyn Write + Send>>;

pub(crate) fn lock_writer(writer: &SharedWriter) -> anyhow::Result<MutexGuard<'_, Box<dyn Write + Send>>> {
    writer
        .lock()
        .map_err(|_| anyhow::anyhow!("output writer lock poisoned"))
}

/// Expiry column text: `EXPIRED`, `N days`, `No Cert`, or `-` when a TLS
/// session existed but no expiry is known
pub fn expiry_label(record: &HostRecord) -> String {
    match record.expiry_status() {
        ExpiryStatus::Expired => "EXPIRED".to_string(),
        ExpiryStatus::ExpiringSoon(days) | ExpiryStatus::Valid(days) => format!("{} days", days),
        ExpiryStatus::NoCert if record.tls_valid => "-".to_string(),
        ExpiryStatus::NoCert => "No Cert".to_string(),
    }
}

/// RTT column text in milliseconds, `-` if never measured
pub fn rtt_label(record: &HostRecord) -> String {
    record
        .rtt
        .map(|ms| ms.to_string())
        .unwrap_or_else(|| "-".to_string())
}


#[cfg(test)]
mod tests {
    use super::*;
    use test_support::sample_report;

    #[test]
    fn test_expiry_labels() {
        let report = sample_report();
        assert_eq!(expiry_label(&report.results[0]), "45 days");
        assert_eq!(expiry_label(&report.results[1]), "EXPIRED");
        assert_eq!(expiry_label(&report.results[2]), "No Cert");

        let mut no_expiry = report.results[0].clone();
        no_expiry.days_until_expiration = None;
        assert_eq!(expiry_label(&no_expiry), "-");
    }

    #[test]
    fn test_rtt_label() {
        let report = sample_report();
        assert_eq!(rtt_label(&report.results[0]), "120");
        assert_eq!(rtt_label(&report.results[2]), "-");
    }
}
