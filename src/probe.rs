// src/probe.rs
//! DNS resolution followed by an HTTPS liveness request.

use anyhow::{Context, Result};
use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::types::HostStatus;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_millis(3000);

/// Result of probing one host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reachability {
    pub resolved: bool,
    pub status: HostStatus,
    /// Milliseconds from resolution start to HTTP completion
    pub rtt: Option<u64>,
}

impl Reachability {
    pub fn not_resolved() -> Self {
        Self {
            resolved: false,
            status: HostStatus::NotResolved,
            rtt: None,
        }
    }

    pub fn up(&self) -> bool {
        self.status.is_up()
    }
}

#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self, host: &str) -> Reachability;
}

#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>>;
}

#[async_trait]
pub trait HttpCheck: Send + Sync {
    /// Issue a GET to the host's root path and return the HTTP status code
    async fn get_root(&self, host: &str) -> Result<u16>;
}

/// Resolver using the system DNS configuration
pub struct SystemResolver {
    resolver: TokioAsyncResolver,
}

impl SystemResolver {
    pub fn new() -> Result<Self> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()
            .context("Failed to create DNS resolver from system configuration")?;
        Ok(Self { resolver })
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        let lookup = self
            .resolver
            .lookup_ip(host)
            .await
            .with_context(|| format!("DNS lookup failed for {}", host))?;

        let addrs: Vec<IpAddr> = lookup.iter().collect();
        if addrs.is_empty() {
            anyhow::bail!("No addresses for {}", host);
        }
        Ok(addrs)
    }
}

/// HTTPS GET with certificate trust disabled; any status proves liveness
pub struct HttpsCheck {
    http_client: reqwest::Client,
    port: u16,
}

impl HttpsCheck {
    pub fn new(port: u16, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            // The first status line decides liveness
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("certsweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http_client, port })
    }

    pub fn url_for(&self, host: &str) -> String {
        if self.port == 443 {
            format!("https://{}/", host)
        } else {
            format!("https://{}:{}/", host, self.port)
        }
    }
}

#[async_trait]
impl HttpCheck for HttpsCheck {
    async fn get_root(&self, host: &str) -> Result<u16> {
        let response = self
            .http_client
            .get(self.url_for(host))
            .send()
            .await
            .with_context(|| format!("HTTPS request to {} failed", host))?;

        Ok(response.status().as_u16())
    }
}

/// Resolve first, then request over HTTPS only if the name resolved
pub struct DnsHttpsProbe {
    resolver: Arc<dyn HostResolver>,
    http: Arc<dyn HttpCheck>,
}

impl DnsHttpsProbe {
    pub fn new(resolver: Arc<dyn HostResolver>, http: Arc<dyn HttpCheck>) -> Self {
        Self { resolver, http }
    }
}

#[async_trait]
impl ReachabilityProbe for DnsHttpsProbe {
    async fn probe(&self, host: &str) -> Reachability {
        let start = Instant::now();

        if let Err(e) = self.resolver.resolve(host).await {
            debug!("{}: not resolved ({:#})", host, e);
            return Reachability::not_resolved();
        }

        let status = match self.http.get_root(host).await {
            Ok(code) => {
                debug!("{}: HTTP {}", host, code);
                HostStatus::Up
            }
            Err(e) => {
                debug!("{}: unreachable ({:#})", host, e);
                HostStatus::Unreachable
            }
        };

        Reachability {
            resolved: true,
            status,
            rtt: Some(start.elapsed().as_millis() as u64),
        }
    }
}
