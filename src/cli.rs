// src/cli.rs
use clap::Parser;
use std::path::PathBuf;

/// certsweep: find every host on a domain's certificates and check it
///
/// Queries crt.sh for certificates issued to DOMAIN, then resolves, connects
/// to and inspects the TLS certificate of every hostname they name.
#[derive(Parser, Debug, Clone)]
#[command(name = "certsweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Domain to sweep (e.g. example.com)
    #[arg(value_name = "DOMAIN")]
    pub domain: String,

    // ===== Configuration =====
    /// Path to TOML config file (defaults apply if omitted)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    // ===== Output Format =====
    /// Print the report as JSON
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Print the report as CSV
    #[arg(long = "csv")]
    pub csv: bool,

    // ===== Output Destination =====
    /// Write output to file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    // ===== Overrides =====
    /// Maximum hosts probed at once
    #[arg(long = "concurrency")]
    pub concurrency: Option<usize>,

    /// File holding last-checked timestamps
    #[arg(long = "metadata-file")]
    pub metadata_file: Option<PathBuf>,

    /// HTTPS request timeout in milliseconds
    #[arg(long = "http-timeout-ms")]
    pub http_timeout_ms: Option<u64>,

    /// TLS connect and handshake timeout in milliseconds
    #[arg(long = "tls-timeout-ms")]
    pub tls_timeout_ms: Option<u64>,

    // ===== Display =====
    /// Disable progress indicator
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    // ===== Logging =====
    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.json && self.csv {
            anyhow::bail!(
                "Cannot specify multiple output formats. \
                Choose one of: --json or --csv"
            );
        }

        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        if self.concurrency == Some(0) {
            anyhow::bail!("--concurrency must be greater than 0");
        }

        if self.http_timeout_ms == Some(0) {
            anyhow::bail!("--http-timeout-ms must be greater than 0");
        }

        if self.tls_timeout_ms == Some(0) {
            anyhow::bail!("--tls-timeout-ms must be greater than 0");
        }

        Ok(())
    }

    /// Determine the output format based on flags
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.csv {
            OutputFormat::Csv
        } else {
            OutputFormat::Human
        }
    }

    /// Progress is drawn on stderr, only for human output
    pub fn should_show_progress(&self) -> bool {
        !self.no_progress && !self.json && !self.csv
    }

    /// Log level forced by -v/-q, if any
    pub fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable colored text output (default)
    Human,
    /// Pretty-printed JSON document
    Json,
    /// CSV export
    Csv,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_is_required() {
        assert!(Cli::try_parse_from(["certsweep"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["certsweep", "example.com"]);
        assert_eq!(cli.domain, "example.com");
        assert_eq!(cli.config, None);
        assert_eq!(cli.output_format(), OutputFormat::Human);
        assert!(cli.should_show_progress());
        assert_eq!(cli.log_level(), None);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_json_output_format() {
        let cli = Cli::parse_from(["certsweep", "--json", "example.com"]);
        assert_eq!(cli.output_format(), OutputFormat::Json);
        assert!(!cli.should_show_progress());
    }

    #[test]
    fn test_csv_output_format() {
        let cli = Cli::parse_from(["certsweep", "--csv", "example.com"]);
        assert_eq!(cli.output_format(), OutputFormat::Csv);
        assert!(!cli.should_show_progress());
    }

    #[test]
    fn test_multiple_formats_invalid() {
        let cli = Cli::parse_from(["certsweep", "--json", "--csv", "example.com"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_verbose_and_quiet_invalid() {
        let cli = Cli::parse_from(["certsweep", "--verbose", "--quiet", "example.com"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_zero_overrides_invalid() {
        for flag in ["--concurrency", "--http-timeout-ms", "--tls-timeout-ms"] {
            let cli = Cli::parse_from(["certsweep", flag, "0", "example.com"]);
            assert!(cli.validate().is_err(), "{} 0 should be rejected", flag);
        }
    }

    #[test]
    fn test_overrides_parse() {
        let cli = Cli::parse_from([
            "certsweep",
            "--concurrency", "10",
            "--metadata-file", "meta.toml",
            "--http-timeout-ms", "500",
            "--tls-timeout-ms", "750",
            "example.com",
        ]);
        assert_eq!(cli.concurrency, Some(10));
        assert_eq!(cli.metadata_file, Some(PathBuf::from("meta.toml")));
        assert_eq!(cli.http_timeout_ms, Some(500));
        assert_eq!(cli.tls_timeout_ms, Some(750));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_progress_disabled_flag() {
        let cli = Cli::parse_from(["certsweep", "--no-progress", "example.com"]);
        assert!(!cli.should_show_progress());
    }

    #[test]
    fn test_log_level_flags() {
        let cli = Cli::parse_from(["certsweep", "-v", "example.com"]);
        assert_eq!(cli.log_level(), Some("debug"));

        let cli = Cli::parse_from(["certsweep", "-q", "example.com"]);
        assert_eq!(cli.log_level(), Some("warn"));
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from([
            "certsweep",
            "-c", "test.toml",
            "-j",
            "-o", "report.json",
            "example.com",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("test.toml")));
        assert!(cli.json);
        assert_eq!(cli.output, Some(PathBuf::from("report.json")));
    }
}
