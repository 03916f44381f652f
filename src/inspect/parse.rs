// src/inspect/parse.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use x509_parser::extensions::ParsedExtension;
use x509_parser::prelude::*;

pub const UNKNOWN_ISSUER: &str = "Unknown";

/// Fields read from a server's leaf certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafCertificate {
    pub subject_cn: Option<String>,
    pub issuer: String,
    /// DNS names from the SAN extension, in certificate order
    pub sans: Vec<String>,
    pub not_after: DateTime<Utc>,
}

impl LeafCertificate {
    /// Parse a DER-encoded X.509 certificate
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| anyhow::anyhow!("Failed to parse X.509 certificate: {:?}", e))?;

        let not_after = DateTime::from_timestamp(cert.validity().not_after.timestamp(), 0)
            .ok_or_else(|| anyhow::anyhow!("Certificate notAfter out of range"))?;

        Ok(Self {
            subject_cn: extract_cn(cert.subject()),
            issuer: extract_issuer(&cert),
            sans: extract_dns_sans(&cert),
            not_after,
        })
    }
}

fn extract_cn(name: &X509Name) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

/// Issuer organization, falling back to the issuer CN, then "Unknown"
fn extract_issuer(cert: &X509Certificate) -> String {
    let issuer = cert.issuer();

    issuer
        .iter_organization()
        .next()
        .and_then(|o| o.as_str().ok())
        .map(str::to_string)
        .or_else(|| extract_cn(issuer))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_ISSUER.to_string())
}

fn extract_dns_sans(cert: &X509Certificate) -> Vec<String> {
    let mut sans = Vec::new();

    for ext in cert.extensions() {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            for general_name in &san.general_names {
                if let GeneralName::DNSName(dns_name) = general_name {
                    sans.push(dns_name.to_string());
                }
            }
        }
    }

    sans
}
