// src/inspect/mod.rs
//! TLS leaf-certificate inspection.
//!
//! Connects to `host:443` with the hostname as SNI, accepts whatever
//! certificate the server presents, and reads issuer, expiry, subject CN and
//! DNS SANs from it. Trust is never evaluated.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

pub mod parse;

pub use parse::{LeafCertificate, UNKNOWN_ISSUER};

use crate::types::EXPIRED_SENTINEL;

pub const DEFAULT_TLS_TIMEOUT: Duration = Duration::from_millis(3000);

/// Certificate metadata for one probed host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertInfo {
    pub tls_valid: bool,
    pub days_until_expiration: Option<i64>,
    pub issuer: String,
    pub subject_cn: Option<String>,
    pub sans: Vec<String>,
    /// The certificate's subject CN is exactly the probed hostname
    pub is_cn: bool,
}

impl CertInfo {
    /// Result for a host that presented no certificate. Counts as CN so the
    /// host stays in the report.
    pub fn unavailable() -> Self {
        Self {
            tls_valid: false,
            days_until_expiration: None,
            issuer: UNKNOWN_ISSUER.to_string(),
            subject_cn: None,
            sans: Vec::new(),
            is_cn: true,
        }
    }

    pub fn from_leaf(host: &str, leaf: LeafCertificate, now: DateTime<Utc>) -> Self {
        let is_cn = leaf.subject_cn.as_deref() == Some(host);

        Self {
            tls_valid: true,
            days_until_expiration: Some(days_until_expiration(leaf.not_after, now)),
            issuer: leaf.issuer,
            subject_cn: leaf.subject_cn,
            sans: leaf.sans,
            is_cn,
        }
    }
}

/// Whole days left before `not_after`, or `-1` once it has passed
pub fn days_until_expiration(not_after: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    if not_after <= now {
        EXPIRED_SENTINEL
    } else {
        (not_after - now).num_days()
    }
}

#[async_trait]
pub trait CertificateInspector: Send + Sync {
    /// Inspect `host`'s certificate. Failures are reported inside `CertInfo`.
    async fn inspect(&self, host: &str) -> CertInfo;
}

/// Verifier that accepts any server certificate
#[derive(Debug)]
struct AcceptAnyCertVerifier(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// rustls-backed inspector
pub struct TlsInspector {
    connector: TlsConnector,
    port: u16,
    timeout: Duration,
}

impl TlsInspector {
    pub fn new(port: u16, timeout: Duration) -> Result<Self> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .context("Failed to configure TLS protocol versions")?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertVerifier(provider)))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            port,
            timeout,
        })
    }

    /// Connect, handshake and return the leaf certificate's DER bytes
    async fn fetch_leaf(&self, host: &str) -> Result<Vec<u8>> {
        let server_name =
            ServerName::try_from(host.to_string()).context("Invalid TLS server name")?;

        let tcp = TcpStream::connect((host, self.port))
            .await
            .with_context(|| format!("Failed to connect to {}:{}", host, self.port))?;

        let tls = self
            .connector
            .connect(server_name, tcp)
            .await
            .context("TLS handshake failed")?;

        let leaf = tls
            .get_ref()
            .1
            .peer_certificates()
            .and_then(|certs| certs.first())
            .map(|cert| cert.as_ref().to_vec())
            .ok_or_else(|| anyhow::anyhow!("Server presented no certificate"))?;

        // Connection is not reused
        drop(tls);

        Ok(leaf)
    }
}

#[async_trait]
impl CertificateInspector for TlsInspector {
    async fn inspect(&self, host: &str) -> CertInfo {
        let fetched = match tokio::time::timeout(self.timeout, self.fetch_leaf(host)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("TLS inspection timed out after {:?}", self.timeout)),
        };

        let parsed = fetched.and_then(|der| LeafCertificate::from_der(&der));

        match parsed {
            Ok(leaf) => {
                let info = CertInfo::from_leaf(host, leaf, Utc::now());
                debug!(
                    "{}: issuer={} days={:?} sans={} cn_match={}",
                    host,
                    info.issuer,
                    info.days_until_expiration,
                    info.sans.len(),
                    info.is_cn
                );
                info
            }
            Err(e) => {
                debug!("{}: no certificate ({:#})", host, e);
                CertInfo::unavailable()
            }
        }
    }
}
