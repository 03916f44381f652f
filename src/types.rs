// src/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days below which a live certificate counts as expiring soon
pub const EXPIRING_SOON_DAYS: i64 = 30;

/// Sentinel stored in `days_until_expiration` for an already-expired certificate
pub const EXPIRED_SENTINEL: i64 = -1;

/// One row of the crt.sh JSON response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CtLogEntry {
    pub id: Option<u64>,

    /// One or more hostnames separated by newlines or spaces
    pub name_value: Option<String>,

    pub common_name: Option<String>,

    pub issuer_name: Option<String>,

    /// Expiration timestamp as crt.sh prints it, e.g. `2025-01-21T23:59:59`
    pub not_after: Option<String>,
}

/// Outcome of the reachability probe for a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostStatus {
    NotResolved,
    Unreachable,
    Up,
}

impl HostStatus {
    pub fn is_up(self) -> bool {
        self == HostStatus::Up
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HostStatus::NotResolved => "Not Resolved",
            HostStatus::Unreachable => "Unreachable",
            HostStatus::Up => "Responding",
        };
        f.write_str(label)
    }
}

/// How consumers bucket a host's certificate expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    NoCert,
    Expired,
    ExpiringSoon(i64),
    Valid(i64),
}

/// Final per-host result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRecord {
    pub host: String,

    #[serde(skip)]
    pub resolved: bool,

    pub status: HostStatus,

    pub up: bool,

    pub tls_valid: bool,

    /// `-1` when already expired, `None` when no certificate was obtained
    pub days_until_expiration: Option<i64>,

    pub issuer: String,

    /// The host only appears as a SAN; `false` means it is the certificate's CN
    #[serde(rename = "isSAN")]
    pub is_san: bool,

    /// Round-trip time in milliseconds
    pub rtt: Option<u64>,
}

impl HostRecord {
    pub fn is_cn(&self) -> bool {
        !self.is_san
    }

    pub fn expiry_status(&self) -> ExpiryStatus {
        match (self.tls_valid, self.days_until_expiration) {
            (false, _) | (true, None) => ExpiryStatus::NoCert,
            (true, Some(EXPIRED_SENTINEL)) => ExpiryStatus::Expired,
            (true, Some(days)) if days < EXPIRING_SOON_DAYS => ExpiryStatus::ExpiringSoon(days),
            (true, Some(days)) => ExpiryStatus::Valid(days),
        }
    }

    /// Hostname tagged the way the report renders it, e.g. `www.example.com (SAN)`
    pub fn display_name(&self) -> String {
        if self.is_san {
            format!("{} (SAN)", self.host)
        } else {
            format!("{} (CN)", self.host)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub domain: String,
    pub total_unique: usize,
    pub reachable: usize,
    pub unresponsive: usize,
    /// ISO-8601 timestamp of this run
    pub retrieved_at: String,
}

/// Outbound response for one checked domain
#[derive(Debug, Clone, Serialize)]
pub struct DomainReport {
    pub summary: ReportSummary,
    pub results: Vec<HostRecord>,
}

/// Inbound request: the domain to check
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub domain: Option<String>,
}

impl CheckRequest {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
        }
    }

    /// Return the trimmed domain, rejecting requests that must not start a probe
    pub fn validate(&self) -> anyhow::Result<String> {
        let domain = match self.domain.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d,
            _ => anyhow::bail!("A domain is required"),
        };

        if domain.chars().any(char::is_whitespace) {
            anyhow::bail!("Invalid domain '{}': must not contain whitespace", domain);
        }

        Ok(domain.to_string())
    }
}
