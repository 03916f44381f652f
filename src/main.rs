// src/main.rs
use certsweep::checker::DomainChecker;
use certsweep::cli::{Cli, OutputFormat};
use certsweep::config::Config;
use certsweep::discovery::{CrtShClient, HostnameDiscoverer};
use certsweep::inspect::TlsInspector;
use certsweep::metadata::{FileMetadataStore, format_timestamp};
use certsweep::orchestrator::HostOrchestrator;
use certsweep::output::{OutputHandler, csv, human, json};
use certsweep::probe::{DnsHttpsProbe, HttpsCheck, SystemResolver};
use certsweep::progress::ProgressIndicator;
use certsweep::report::ReportAggregator;
use certsweep::types::CheckRequest;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Validate arguments
    cli.validate()?;

    // Load config file
    let mut config = Config::load(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(concurrency) = cli.concurrency {
        config.probe.max_concurrency = concurrency;
    }
    if let Some(ref path) = cli.metadata_file {
        config.metadata.file = path.clone();
    }
    if let Some(ms) = cli.http_timeout_ms {
        config.probe.http_timeout_ms = ms;
    }
    if let Some(ms) = cli.tls_timeout_ms {
        config.probe.tls_timeout_ms = ms;
    }

    // Initialize logging; stdout is reserved for the report
    let log_level = cli.log_level().unwrap_or(config.logging.level.as_str());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Effective configuration: {:?}", config);

    let output: Arc<dyn OutputHandler> = match cli.output_format() {
        OutputFormat::Human => match cli.output {
            Some(ref path) => {
                let file = std::fs::File::create(path)?;
                tracing::info!("Writing human-readable output to: {}", path.display());
                Arc::new(human::HumanOutput::to_file(file))
            }
            None => Arc::new(human::HumanOutput::new()),
        },
        OutputFormat::Json => match cli.output {
            Some(ref path) => {
                let file = std::fs::File::create(path)?;
                tracing::info!("Writing JSON output to: {}", path.display());
                Arc::new(json::JsonOutput::to_file(file))
            }
            None => Arc::new(json::JsonOutput::new()),
        },
        OutputFormat::Csv => match cli.output {
            Some(ref path) => {
                let file = std::fs::File::create(path)?;
                tracing::info!("Writing CSV output to: {}", path.display());
                Arc::new(csv::CsvOutput::to_file(file))
            }
            None => Arc::new(csv::CsvOutput::new()),
        },
    };

    let progress = ProgressIndicator::new(cli.should_show_progress());

    // Discovery
    let crt_sh = CrtShClient::new(&config.discovery.crt_sh_url, config.discovery.timeout())?;
    tracing::debug!("Using crt.sh at {}", crt_sh.base_url());
    let discoverer = HostnameDiscoverer::new(Arc::new(crt_sh));

    // Probing
    let inspector = TlsInspector::new(config.probe.port, config.probe.tls_timeout())?;
    let probe = DnsHttpsProbe::new(
        Arc::new(SystemResolver::new()?),
        Arc::new(HttpsCheck::new(config.probe.port, config.probe.http_timeout())?),
    );
    let orchestrator = HostOrchestrator::new(
        Arc::new(inspector),
        Arc::new(probe),
        config.probe.max_concurrency,
    )
    .with_progress(progress.clone());

    // Metadata
    let store = Arc::new(FileMetadataStore::load(config.metadata.file.clone()).await);
    let aggregator = ReportAggregator::new(store);

    let checker = DomainChecker::new(discoverer, orchestrator, aggregator)
        .with_progress(progress.clone());

    let request = CheckRequest::new(cli.domain.clone());
    match checker.last_checked(cli.domain.trim()).await {
        Some(ts) => tracing::info!("{} was last checked at {}", cli.domain.trim(), format_timestamp(ts)),
        None => tracing::info!("{} has not been checked before", cli.domain.trim()),
    }

    let report = checker.check(&request).await?;
    progress.finish();

    output.emit_report(&report).await?;
    output.flush().await?;

    Ok(())
}
