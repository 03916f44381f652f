// src/output/human.rs
//! Human-readable colored terminal output

use crate::output::{OutputHandler, SharedWriter, expiry_label, lock_writer, rtt_label};
use crate::types::{DomainReport, ExpiryStatus, HostRecord, HostStatus};
use async_trait::async_trait;
use colored::Colorize;
use std::io::{self, Write};
use std::sync::Mutex;

/// Human-readable output handler with colored terminal output
pub struct HumanOutput {
    writer: SharedWriter,
    use_colors: bool,
}

impl HumanOutput {
    /// Create a new HumanOutput that writes to stdout
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            use_colors: is_terminal::is_terminal(std::io::stdout()),
        }
    }

    /// Create a new HumanOutput that writes to a file
    pub fn to_file(file: std::fs::File) -> Self {
        Self::to_writer(Box::new(file))
    }

    /// Uncolored output to an arbitrary writer
    pub fn to_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            use_colors: false,
        }
    }

    fn host_width(report: &DomainReport) -> usize {
        report
            .results
            .iter()
            .map(|r| r.display_name().len())
            .max()
            .unwrap_or(0)
    }

    fn status_cell(&self, record: &HostRecord) -> String {
        let label = format!("{:<12}", record.status.to_string());
        if !self.use_colors {
            return label;
        }
        match record.status {
            HostStatus::Up => label.green().to_string(),
            HostStatus::Unreachable => label.yellow().to_string(),
            HostStatus::NotResolved => label.red().to_string(),
        }
    }

    fn tls_cell(&self, record: &HostRecord) -> String {
        let label = if record.tls_valid { "TLS yes" } else { "TLS no " };
        match (self.use_colors, record.tls_valid) {
            (false, _) => label.to_string(),
            (true, true) => label.green().to_string(),
            (true, false) => label.red().to_string(),
        }
    }

    fn expiry_cell(&self, record: &HostRecord) -> String {
        let label = format!("{:<9}", expiry_label(record));
        if !self.use_colors {
            return label;
        }
        match record.expiry_status() {
            ExpiryStatus::Valid(_) => label.green().to_string(),
            ExpiryStatus::ExpiringSoon(_) => label.yellow().bold().to_string(),
            ExpiryStatus::Expired => label.red().bold().to_string(),
            ExpiryStatus::NoCert => label.red().to_string(),
        }
    }

    fn write_report(&self, writer: &mut dyn Write, report: &DomainReport) -> io::Result<()> {
        let s = &report.summary;

        if self.use_colors {
            writeln!(
                writer,
                "{} {}: {} unique, {} reachable, {} unresponsive",
                "[+]".green().bold(),
                s.domain.cyan().bold(),
                s.total_unique,
                s.reachable.to_string().green(),
                s.unresponsive.to_string().red()
            )?;
        } else {
            writeln!(
                writer,
                "[+] {}: {} unique, {} reachable, {} unresponsive",
                s.domain, s.total_unique, s.reachable, s.unresponsive
            )?;
        }

        let width = Self::host_width(report);
        for record in &report.results {
            let host = format!("{:<width$}", record.display_name(), width = width);
            let host = if self.use_colors && record.is_cn() {
                host.bold().to_string()
            } else {
                host
            };

            writeln!(
                writer,
                "    {}  {}  {}  {}  {} ms  {}",
                host,
                self.status_cell(record),
                self.tls_cell(record),
                self.expiry_cell(record),
                format!("{:>5}", rtt_label(record)),
                record.issuer
            )?;
        }

        let note = format!("Certificate data retrieved from crt.sh on {}", s.retrieved_at);
        if self.use_colors {
            writeln!(writer, "{}", note.dimmed())?;
        } else {
            writeln!(writer, "{}", note)?;
        }

        Ok(())
    }
}

impl Default for HumanOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for HumanOutput {
    async fn emit_report(&self, report: &DomainReport) -> anyhow::Result<()> {
        let mut writer = lock_writer(&self.writer)?;
        self.write_report(&mut **writer, report)?;
        writer.flush()?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        lock_writer(&self.writer)?.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::{SharedBuf, sample_report};

    #[tokio::test]
    async fn test_human_output() {
        let buf = SharedBuf::default();
        let handler = HumanOutput::to_writer(Box::new(buf.clone()));

        handler.emit_report(&sample_report()).await.unwrap();
        handler.flush().await.unwrap();

        let contents = buf.contents();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines[0], "[+] example.com: 3 unique, 2 reachable, 1 unresponsive");
        assert!(lines[1].contains("www.example.com (CN)"));
        assert!(lines[1].contains("Responding"));
        assert!(lines[1].contains("45 days"));
        assert!(lines[1].contains("Let's Encrypt"));
        assert!(lines[2].contains("api.example.com (SAN)"));
        assert!(lines[2].contains("EXPIRED"));
        assert!(lines[3].contains("Not Resolved"));
        assert!(lines[3].contains("No Cert"));
        assert!(lines[3].contains("-"));
        assert_eq!(
            lines[4],
            "Certificate data retrieved from crt.sh on 2026-10-14T09:30:00.000Z"
        );
        assert!(!contents.contains('\u{1b}'));
    }
}
