// src/orchestrator.rs
use futures_util::future::join_all;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::discovery::normalize_hostname;
use crate::inspect::{CertInfo, CertificateInspector};
use crate::probe::{Reachability, ReachabilityProbe};
use crate::progress::ProgressIndicator;
use crate::types::HostRecord;

pub const DEFAULT_MAX_CONCURRENCY: usize = 100;

/// A primary host after inspection and probing, before SANs are dropped
#[derive(Debug, Clone)]
struct ProbedHost {
    host: String,
    cert: CertInfo,
    reach: Reachability,
}

impl ProbedHost {
    fn failed(host: String) -> Self {
        Self {
            host,
            cert: CertInfo::unavailable(),
            reach: Reachability::not_resolved(),
        }
    }

    fn into_record(self) -> HostRecord {
        let is_san = !self.cert.is_cn;
        build_record(self.host, &self.cert, self.reach, is_san)
    }
}

fn build_record(host: String, cert: &CertInfo, reach: Reachability, is_san: bool) -> HostRecord {
    HostRecord {
        host,
        resolved: reach.resolved,
        status: reach.status,
        up: reach.up(),
        tls_valid: cert.tls_valid,
        days_until_expiration: cert.days_until_expiration,
        issuer: cert.issuer.clone(),
        is_san,
        rtt: reach.rtt,
    }
}

/// Fans discovered hostnames out to concurrent inspect-and-probe pipelines
pub struct HostOrchestrator {
    inspector: Arc<dyn CertificateInspector>,
    probe: Arc<dyn ReachabilityProbe>,
    limiter: Arc<Semaphore>,
    progress: ProgressIndicator,
}

impl HostOrchestrator {
    pub fn new(
        inspector: Arc<dyn CertificateInspector>,
        probe: Arc<dyn ReachabilityProbe>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            inspector,
            probe,
            limiter: Arc::new(Semaphore::new(max_concurrency.max(1))),
            progress: ProgressIndicator::new(false),
        }
    }

    pub fn with_progress(mut self, progress: ProgressIndicator) -> Self {
        self.progress = progress;
        self
    }

    /// Probe every hostname, then every SAN surfaced by their certificates
    /// that discovery did not already produce.
    ///
    /// Returns primary hosts in discovery order followed by SAN-only hosts.
    pub async fn orchestrate(&self, hostnames: &[String]) -> Vec<HostRecord> {
        info!("Probing {} hosts", hostnames.len());
        self.progress.start_phase("Probing hosts", hostnames.len() as u64);

        let primaries = self
            .run_all(hostnames.to_vec(), ProbedHost::failed, |host, inspector, probe| async move {
                let (cert, reach) = tokio::join!(inspector.inspect(&host), probe.probe(&host));
                ProbedHost { host, cert, reach }
            })
            .await;

        let extras = collect_extra_sans(&primaries, hostnames);
        if !extras.is_empty() {
            info!("Probing {} additional SAN hosts", extras.len());
            self.progress.start_phase("Probing SAN hosts", extras.len() as u64);
        }

        let (san_hosts, inherited): (Vec<String>, Vec<CertInfo>) = extras.into_iter().unzip();
        let san_reach = self
            .run_all(
                san_hosts,
                |host| (host, Reachability::not_resolved()),
                |host, _inspector, probe| async move {
                    let reach = probe.probe(&host).await;
                    (host, reach)
                },
            )
            .await;

        self.progress.finish();

        let mut records: Vec<HostRecord> =
            primaries.into_iter().map(ProbedHost::into_record).collect();

        for ((host, reach), cert) in san_reach.into_iter().zip(inherited) {
            records.push(build_record(host, &cert, reach, true));
        }

        records
    }

    /// Spawn one task per host under the concurrency ceiling and wait for all
    /// of them. Results keep input order; a panicked task yields `on_failure`.
    async fn run_all<T, F, Fut>(
        &self,
        hosts: Vec<String>,
        on_failure: fn(String) -> T,
        pipeline: F,
    ) -> Vec<T>
    where
        T: Send + 'static,
        F: Fn(String, Arc<dyn CertificateInspector>, Arc<dyn ReachabilityProbe>) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut handles = Vec::with_capacity(hosts.len());

        for host in &hosts {
            let limiter = Arc::clone(&self.limiter);
            let progress = self.progress.clone();
            let task = pipeline(host.clone(), Arc::clone(&self.inspector), Arc::clone(&self.probe));

            handles.push(tokio::spawn(async move {
                // The semaphore is never closed
                let _permit = limiter.acquire_owned().await.ok();
                let out = task.await;
                progress.inc();
                out
            }));
        }

        join_all(handles)
            .await
            .into_iter()
            .zip(hosts)
            .map(|(joined, host)| match joined {
                Ok(out) => out,
                Err(e) => {
                    error!("Probe task for {} failed: {}", host, e);
                    on_failure(host)
                }
            })
            .collect()
    }
}

/// SAN names not already discovered, deduplicated, each paired with the
/// certificate of the first primary host that listed it
fn collect_extra_sans(primaries: &[ProbedHost], discovered: &[String]) -> Vec<(String, CertInfo)> {
    let mut seen: HashSet<String> = discovered.iter().cloned().collect();
    let mut extras = Vec::new();

    for primary in primaries {
        for san in primary.cert.sans.iter().filter_map(|raw| normalize_hostname(raw)) {
            if !seen.insert(san.clone()) {
                continue;
            }

            debug!("{} lists extra SAN {}", primary.host, san);
            let inherited = CertInfo {
                sans: Vec::new(),
                ..primary.cert.clone()
            };
            extras.push((san, inherited));
        }
    }

    extras
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HostStatus;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeInspector {
        certs: HashMap<String, CertInfo>,
        delay: Duration,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CertificateInspector for FakeInspector {
        async fn inspect(&self, host: &str) -> CertInfo {
            self.calls.lock().unwrap().push(host.to_string());
            tokio::time::sleep(self.delay).await;
            self.certs.get(host).cloned().unwrap_or_else(CertInfo::unavailable)
        }
    }

    #[derive(Default)]
    struct FakeProbe {
        down: HashSet<String>,
        delay: Duration,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReachabilityProbe for FakeProbe {
        async fn probe(&self, host: &str) -> Reachability {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let status = if self.down.contains(host) {
                HostStatus::Unreachable
            } else {
                HostStatus::Up
            };
            Reachability {
                resolved: true,
                status,
                rtt: Some(12),
            }
        }
    }

    fn cert(cn: bool, sans: &[&str], issuer: &str, days: i64) -> CertInfo {
        CertInfo {
            tls_valid: true,
            days_until_expiration: Some(days),
            issuer: issuer.to_string(),
            subject_cn: None,
            sans: sans.iter().map(|s| s.to_string()).collect(),
            is_cn: cn,
        }
    }

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_cn_host_with_extra_san() {
        let mut inspector = FakeInspector::default();
        inspector.certs.insert(
            "example.com".to_string(),
            cert(true, &["example.com", "www.example.com"], "Example Trust", 200),
        );
        let inspector = Arc::new(inspector);
        let probe = Arc::new(FakeProbe::default());

        let orchestrator = HostOrchestrator::new(inspector.clone(), probe.clone(), 8);
        let records = orchestrator.orchestrate(&hosts(&["example.com"])).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].host, "example.com");
        assert!(records[0].is_cn());
        assert_eq!(records[1].host, "www.example.com");
        assert!(records[1].is_san);
        assert_eq!(records[1].issuer, "Example Trust");
        assert_eq!(records[1].days_until_expiration, Some(200));
        assert!(records[1].tls_valid);
        assert!(records.iter().all(|r| r.up));

        // SAN hosts are probed but never inspected
        assert_eq!(*inspector.calls.lock().unwrap(), vec!["example.com"]);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_discovered_sans_are_not_duplicated() {
        let mut inspector = FakeInspector::default();
        let shared = cert(true, &["a.example.com", "b.example.com", "c.example.com"], "CA", 50);
        inspector.certs.insert("a.example.com".to_string(), shared.clone());
        inspector.certs.insert(
            "b.example.com".to_string(),
            CertInfo { is_cn: false, ..shared.clone() },
        );

        let orchestrator =
            HostOrchestrator::new(Arc::new(inspector), Arc::new(FakeProbe::default()), 8);
        let records = orchestrator
            .orchestrate(&hosts(&["a.example.com", "b.example.com"]))
            .await;

        let names: Vec<&str> = records.iter().map(|r| r.host.as_str()).collect();
        assert_eq!(names, vec!["a.example.com", "b.example.com", "c.example.com"]);
        assert!(records[0].is_cn());
        // Classified by certificate content, not by discovery
        assert!(records[1].is_san);
        assert!(records[2].is_san);
    }

    #[tokio::test]
    async fn test_certless_host_stays_cn() {
        let orchestrator = HostOrchestrator::new(
            Arc::new(FakeInspector::default()),
            Arc::new(FakeProbe::default()),
            4,
        );
        let records = orchestrator.orchestrate(&hosts(&["bare.example.com"])).await;

        assert_eq!(records.len(), 1);
        assert!(records[0].is_cn());
        assert!(!records[0].tls_valid);
        assert_eq!(records[0].issuer, "Unknown");
        assert!(records[0].days_until_expiration.is_none());
    }

    #[tokio::test]
    async fn test_wildcard_sans_are_normalized() {
        let mut inspector = FakeInspector::default();
        inspector.certs.insert(
            "example.com".to_string(),
            cert(true, &["*.example.com", "*.api.example.com"], "CA", 10),
        );
        let orchestrator =
            HostOrchestrator::new(Arc::new(inspector), Arc::new(FakeProbe::default()), 4);
        let records = orchestrator.orchestrate(&hosts(&["example.com"])).await;

        let names: Vec<&str> = records.iter().map(|r| r.host.as_str()).collect();
        assert_eq!(names, vec!["example.com", "api.example.com"]);
    }

    #[tokio::test]
    async fn test_inherits_first_listing_certificate() {
        let mut inspector = FakeInspector::default();
        inspector.certs.insert(
            "one.example.com".to_string(),
            cert(true, &["shared.example.com"], "First CA", 10),
        );
        inspector.certs.insert(
            "two.example.com".to_string(),
            cert(true, &["shared.example.com"], "Second CA", 99),
        );
        let orchestrator =
            HostOrchestrator::new(Arc::new(inspector), Arc::new(FakeProbe::default()), 4);
        let records = orchestrator
            .orchestrate(&hosts(&["one.example.com", "two.example.com"]))
            .await;

        assert_eq!(records.len(), 3);
        assert_eq!(records[2].host, "shared.example.com");
        assert_eq!(records[2].issuer, "First CA");
        assert_eq!(records[2].days_until_expiration, Some(10));
    }

    #[tokio::test]
    async fn test_unreachable_host_does_not_abort_batch() {
        let mut probe = FakeProbe::default();
        probe.down.insert("down.example.com".to_string());

        let orchestrator =
            HostOrchestrator::new(Arc::new(FakeInspector::default()), Arc::new(probe), 4);
        let records = orchestrator
            .orchestrate(&hosts(&["up.example.com", "down.example.com", "also-up.example.com"]))
            .await;

        assert_eq!(records.len(), 3);
        assert!(records[0].up);
        assert_eq!(records[1].status, HostStatus::Unreachable);
        assert!(!records[1].up);
        assert!(records[2].up);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let orchestrator = HostOrchestrator::new(
            Arc::new(FakeInspector::default()),
            Arc::new(FakeProbe::default()),
            4,
        );
        assert!(orchestrator.orchestrate(&[]).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifty_hosts_probe_in_parallel() {
        let inspector = FakeInspector {
            delay: Duration::from_millis(3000),
            ..Default::default()
        };
        let probe = FakeProbe {
            delay: Duration::from_millis(3000),
            ..Default::default()
        };
        let orchestrator = HostOrchestrator::new(Arc::new(inspector), Arc::new(probe), 100);
        let names: Vec<String> = (0..50).map(|i| format!("h{}.example.com", i)).collect();

        let started = tokio::time::Instant::now();
        let records = orchestrator.orchestrate(&names).await;
        let elapsed = started.elapsed();

        assert_eq!(records.len(), 50);
        assert!(elapsed >= Duration::from_millis(3000));
        assert!(elapsed < Duration::from_millis(10_000), "took {:?}", elapsed);
        let order: Vec<&str> = records.iter().map(|r| r.host.as_str()).collect();
        assert_eq!(order, names.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_ceiling_is_respected() {
        let probe = FakeProbe {
            delay: Duration::from_millis(1000),
            ..Default::default()
        };
        let orchestrator =
            HostOrchestrator::new(Arc::new(FakeInspector::default()), Arc::new(probe), 2);
        let names = hosts(&["a.test", "b.test", "c.test", "d.test"]);

        let started = tokio::time::Instant::now();
        orchestrator.orchestrate(&names).await;

        // Four one-second pipelines, two at a time
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(2000), "took {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(3000), "took {:?}", elapsed);
    }

    struct PanickingInspector;

    #[async_trait]
    impl CertificateInspector for PanickingInspector {
        async fn inspect(&self, host: &str) -> CertInfo {
            if host == "boom.example.com" {
                panic!("inspector crashed");
            }
            CertInfo::unavailable()
        }
    }

    #[tokio::test]
    async fn test_panicked_task_is_recorded_as_failed() {
        let orchestrator =
            HostOrchestrator::new(Arc::new(PanickingInspector), Arc::new(FakeProbe::default()), 4);
        let records = orchestrator
            .orchestrate(&hosts(&["ok.example.com", "boom.example.com"]))
            .await;

        assert_eq!(records.len(), 2);
        assert!(records[0].up);
        assert_eq!(records[1].host, "boom.example.com");
        assert_eq!(records[1].status, HostStatus::NotResolved);
        assert!(records[1].is_cn());
    }

    #[test]
    fn test_collect_extra_sans_skips_discovered() {
        let primaries = vec![ProbedHost {
            host: "example.com".to_string(),
            cert: cert(true, &["example.com", "www.example.com", "www.example.com"], "CA", 5),
            reach: Reachability::not_resolved(),
        }];

        let extras = collect_extra_sans(&primaries, &hosts(&["example.com"]));
        assert_eq!(extras.len(), 1);
        assert_eq!(extras[0].0, "www.example.com");
        assert!(extras[0].1.sans.is_empty());
        assert_eq!(extras[0].1.issuer, "CA");
    }
}
