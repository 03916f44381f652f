// src/output/csv.rs
//! CSV export: summary block, blank line, host table

use crate::output::{OutputHandler, SharedWriter, expiry_label, lock_writer, rtt_label};
use crate::types::{DomainReport, HostRecord};
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

const TABLE_HEADER: [&str; 6] = [
    "Hostname",
    "Status",
    "TLS Valid",
    "Days Until Expiration",
    "Publisher",
    "RTT (ms)",
];

/// CSV output handler
pub struct CsvOutput {
    writer: SharedWriter,
}

impl CsvOutput {
    /// Create a new CsvOutput that writes to stdout
    pub fn new() -> Self {
        Self::to_writer(Box::new(io::stdout()))
    }

    /// Create a new CsvOutput that writes to a file
    pub fn to_file(file: std::fs::File) -> Self {
        Self::to_writer(Box::new(file))
    }

    pub fn to_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    fn summary_rows(report: &DomainReport) -> Vec<Vec<String>> {
        let s = &report.summary;
        vec![
            vec!["Summary".to_string()],
            vec!["Domain".to_string(), s.domain.clone()],
            vec!["Total Unique Hostnames".to_string(), s.total_unique.to_string()],
            vec!["Reachable".to_string(), s.reachable.to_string()],
            vec!["Unresponsive".to_string(), s.unresponsive.to_string()],
            vec!["Retrieved At".to_string(), s.retrieved_at.clone()],
        ]
    }

    fn host_row(record: &HostRecord) -> [String; 6] {
        [
            record.display_name(),
            record.status.to_string(),
            if record.tls_valid { "Yes" } else { "No" }.to_string(),
            expiry_label(record),
            record.issuer.clone(),
            rtt_label(record),
        ]
    }
}

impl Default for CsvOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for CsvOutput {
    async fn emit_report(&self, report: &DomainReport) -> anyhow::Result<()> {
        let mut writer = lock_writer(&self.writer)?;

        {
            let mut summary = csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(&mut *writer);
            for row in Self::summary_rows(report) {
                summary.write_record(&row)?;
            }
            summary.flush()?;
        }

        writeln!(writer)?;

        {
            let mut table = csv::Writer::from_writer(&mut *writer);
            table.write_record(TABLE_HEADER)?;
            for record in &report.results {
                table.write_record(Self::host_row(record))?;
            }
            table.flush()?;
        }

        writer.flush()?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        lock_writer(&self.writer)?.flush()?;
        Ok(())
    }
}
