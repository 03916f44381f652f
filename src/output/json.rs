// src/output/json.rs
//! Pretty-printed JSON report

use crate::output::{OutputHandler, SharedWriter, lock_writer};
use crate::types::DomainReport;
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

/// Writes the report exactly as the JSON response body: `{summary, results}`
pub struct JsonOutput {
    writer: SharedWriter,
}

impl JsonOutput {
    /// Create a new JsonOutput that writes to stdout
    pub fn new() -> Self {
        Self::to_writer(Box::new(io::stdout()))
    }

    /// Create a new JsonOutput that writes to a file
    pub fn to_file(file: std::fs::File) -> Self {
        Self::to_writer(Box::new(file))
    }

    pub fn to_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for JsonOutput {
    async fn emit_report(&self, report: &DomainReport) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;

        let mut writer = lock_writer(&self.writer)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        lock_writer(&self.writer)?.flush()?;
        Ok(())
    }
}
