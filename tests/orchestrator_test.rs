// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Orchestrator Integration Tests
 * Full discovery loop against fixture data sources
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tutka_recon::config::ReconConfig;
use tutka_recon::context::ScanContext;
use tutka_recon::discovery::{AsnDiscovery, CloudDetection, DomainDiscovery, IpRangeDiscovery};
use tutka_recon::errors::SourceError;
use tutka_recon::orchestrator::Orchestrator;
use tutka_recon::resolver::{DnsResolver, Resolution};
use tutka_recon::sources::{BgpSource, CertTransparencySource, IrrSource, PassiveDnsSource};
use tutka_recon::types::{Asn, SharedResult, SubdomainStatus};

// --- Fixtures -----------------------------------------------------------

struct FixtureCt {
    match_fragment: String,
    fqdns: Vec<String>,
    calls: AtomicUsize,
}

impl FixtureCt {
    fn new(match_fragment: &str, fqdns: &[&str]) -> Self {
        Self {
            match_fragment: match_fragment.to_string(),
            fqdns: fqdns.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CertTransparencySource for FixtureCt {
    async fn search(&self, query: &str) -> Result<HashSet<String>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if query.contains(&self.match_fragment) {
            Ok(self.fqdns.iter().cloned().collect())
        } else {
            Ok(HashSet::new())
        }
    }
}

struct FixturePassiveDns {
    root: String,
    fqdns: Vec<String>,
    calls: AtomicUsize,
    queried: Mutex<Vec<String>>,
}

impl FixturePassiveDns {
    fn new(root: &str, fqdns: &[&str]) -> Self {
        Self {
            root: root.to_string(),
            fqdns: fqdns.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
            queried: Mutex::new(Vec::new()),
        }
    }

    fn empty() -> Self {
        Self::new("", &[])
    }

    fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl PassiveDnsSource for FixturePassiveDns {
    async fn host_search(&self, domain: &str) -> Result<HashSet<String>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queried.lock().unwrap().push(domain.to_string());
        if !self.root.is_empty() && domain == self.root {
            Ok(self.fqdns.iter().cloned().collect())
        } else {
            Ok(HashSet::new())
        }
    }
}

struct QuotaExhaustedPassiveDns {
    calls: AtomicUsize,
}

#[async_trait]
impl PassiveDnsSource for QuotaExhaustedPassiveDns {
    async fn host_search(&self, _domain: &str) -> Result<HashSet<String>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SourceError::QuotaExceeded {
            service: "hackertarget".to_string(),
        })
    }
}

struct FixtureBgp {
    asns: Vec<Asn>,
    prefixes: Result<Vec<String>, ()>,
}

impl FixtureBgp {
    fn new(asns: Vec<Asn>, prefixes: &[&str]) -> Self {
        Self {
            asns,
            prefixes: Ok(prefixes.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn failing_prefixes(asns: Vec<Asn>) -> Self {
        Self {
            asns,
            prefixes: Err(()),
        }
    }
}

#[async_trait]
impl BgpSource for FixtureBgp {
    async fn search_asns(&self, _term: &str) -> Result<Vec<Asn>, SourceError> {
        Ok(self.asns.clone())
    }

    async fn announced_prefixes(&self, _asn: u32) -> Result<Vec<String>, SourceError> {
        match &self.prefixes {
            Ok(prefixes) => Ok(prefixes.clone()),
            Err(()) => Err(SourceError::Http {
                service: "bgp.he.net".to_string(),
                reason: "HTTP 503".to_string(),
            }),
        }
    }

    async fn asn_for_ip(&self, _ip: IpAddr) -> Result<Option<Asn>, SourceError> {
        Ok(None)
    }
}

struct EmptyIrr;

#[async_trait]
impl IrrSource for EmptyIrr {
    async fn routes_for_asn(&self, _asn: u32) -> Result<Vec<String>, SourceError> {
        Ok(Vec::new())
    }
}

/// Resolver fixture: any FQDN under `active_suffix` resolves, everything
/// else is NXDOMAIN. Every query is logged.
struct FixtureResolver {
    active_suffix: String,
    log: Mutex<Vec<String>>,
}

impl FixtureResolver {
    fn new(active_suffix: &str) -> Self {
        Self {
            active_suffix: active_suffix.to_string(),
            log: Mutex::new(Vec::new()),
        }
    }

    fn queried(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsResolver for FixtureResolver {
    async fn resolve(&self, fqdn: &str) -> Resolution {
        self.log.lock().unwrap().push(fqdn.to_string());
        if fqdn.ends_with(&self.active_suffix) {
            Resolution::active(vec!["192.0.2.10".parse().unwrap()])
        } else {
            Resolution::inactive()
        }
    }
}

fn orchestrator_with(
    ct: Arc<dyn CertTransparencySource>,
    passive_dns: Arc<dyn PassiveDnsSource>,
    bgp: Arc<dyn BgpSource>,
    irr: Arc<dyn IrrSource>,
    resolver: Arc<dyn DnsResolver>,
    config: Arc<ReconConfig>,
) -> Orchestrator {
    Orchestrator::with_components(
        DomainDiscovery::new(ct, passive_dns, resolver, Arc::clone(&config)),
        AsnDiscovery::new(Arc::clone(&bgp), Arc::clone(&config)),
        IpRangeDiscovery::new(bgp, irr, Arc::clone(&config)),
        CloudDetection::new(Arc::clone(&config)),
        config,
    )
}

// --- Domain discovery ---------------------------------------------------

#[tokio::test]
async fn domain_discovery_filters_unrelated_candidates_before_resolution() {
    let ct = Arc::new(FixtureCt::new(
        "example.com",
        &["www.example.com", "api.example.com", "unrelated-coffee.net"],
    ));
    let passive_dns = Arc::new(FixturePassiveDns::new(
        "example.com",
        &["mail.example.com"],
    ));
    let resolver = Arc::new(FixtureResolver::new(".example.com"));
    let config = Arc::new(ReconConfig::default());

    let discovery = DomainDiscovery::new(
        Arc::clone(&ct) as Arc<dyn CertTransparencySource>,
        Arc::clone(&passive_dns) as Arc<dyn PassiveDnsSource>,
        Arc::clone(&resolver) as Arc<dyn DnsResolver>,
        config,
    );

    let result = SharedResult::new("Example Corp");
    let ctx = ScanContext::default();
    discovery
        .discover("Example Corp", &["example.com".to_string()], &result, &ctx)
        .await;

    let snapshot = result.snapshot();
    let domain = snapshot.domains.get("example.com").expect("domain recorded");
    let fqdns: HashSet<&str> = domain.subdomains.iter().map(|s| s.fqdn.as_str()).collect();
    assert!(fqdns.contains("www.example.com"));
    assert!(fqdns.contains("api.example.com"));
    assert!(fqdns.contains("mail.example.com"));
    assert!(domain
        .subdomains
        .iter()
        .all(|s| s.status == SubdomainStatus::Active));

    // The unrelated candidate is dropped by the relevance filter and
    // must never reach the resolver
    assert!(!snapshot.domains.contains_key("unrelated-coffee.net"));
    assert!(!resolver
        .queried()
        .iter()
        .any(|f| f.contains("unrelated-coffee")));
}

#[tokio::test]
async fn passive_dns_is_scoped_to_base_domains() {
    // CT substring matches return unrelated 2-label names; none of them
    // may consume passive-DNS quota
    let ct = Arc::new(FixtureCt::new(
        "example.com",
        &["www.example.com", "unrelated-coffee.net"],
    ));
    let passive_dns = Arc::new(FixturePassiveDns::new(
        "example.com",
        &["mail.example.com"],
    ));
    let resolver = Arc::new(FixtureResolver::new(".example.com"));
    let config = Arc::new(ReconConfig::default());

    let discovery = DomainDiscovery::new(
        ct,
        Arc::clone(&passive_dns) as Arc<dyn PassiveDnsSource>,
        resolver,
        config,
    );

    let result = SharedResult::new("Example Corp");
    let ctx = ScanContext::default();
    discovery
        .discover("Example Corp", &["example.com".to_string()], &result, &ctx)
        .await;

    assert_eq!(passive_dns.queried(), vec!["example.com".to_string()]);
}

#[tokio::test]
async fn passive_dns_stops_after_quota_signal() {
    let ct = Arc::new(FixtureCt::new("", &[]));
    let passive_dns = Arc::new(QuotaExhaustedPassiveDns {
        calls: AtomicUsize::new(0),
    });
    let resolver = Arc::new(FixtureResolver::new(".example.com"));
    let config = Arc::new(ReconConfig::default());

    let discovery = DomainDiscovery::new(
        ct,
        Arc::clone(&passive_dns) as Arc<dyn PassiveDnsSource>,
        resolver,
        config,
    );

    let result = SharedResult::new("Example Corp");
    let ctx = ScanContext::default();
    let bases = vec!["example.com".to_string(), "example.net".to_string()];
    discovery.discover("Example Corp", &bases, &result, &ctx).await;

    // One query hit the quota; the second base domain was never asked
    assert_eq!(passive_dns.calls.load(Ordering::SeqCst), 1);
    assert!(ctx.passive_dns_exhausted());
    let snapshot = result.snapshot();
    assert!(snapshot
        .warnings
        .iter()
        .any(|w| w.contains("Passive-DNS quota exhausted")));
}

// --- Full loop ----------------------------------------------------------

#[tokio::test]
async fn loop_converges_before_max_iterations() {
    let ct = Arc::new(FixtureCt::new(
        "contoso.com",
        &["www.contoso.com", "api.contoso.com"],
    ));
    let bgp = Arc::new(FixtureBgp::new(
        vec![Asn::new(64500)
            .with_description("CONTOSO-NET backbone for Consolidated Fabrics")
            .with_source("bgp.he.net")],
        &["198.51.100.0/24"],
    ));
    let config = Arc::new(ReconConfig::default().with_max_iterations(3));

    let orchestrator = orchestrator_with(
        Arc::clone(&ct) as Arc<dyn CertTransparencySource>,
        Arc::new(FixturePassiveDns::empty()),
        bgp,
        Arc::new(EmptyIrr),
        Arc::new(FixtureResolver::new(".contoso.com")),
        config,
    );

    let ctx = ScanContext::default();
    let result = orchestrator
        .run("Contoso Limited", &["contoso.com".to_string()], &ctx)
        .await;

    assert!(result.asns.iter().any(|a| a.number == 64500));
    assert!(result.ip_ranges.iter().any(|r| r.cidr == "198.51.100.0/24"));
    assert!(result.domains.contains_key("contoso.com"));
    assert!(result.scan_completed.is_some());

    // Iteration 2 adds nothing new, so the loop converges there: two CT
    // queries per iteration, two iterations, never the allowed third
    assert_eq!(ct.calls(), 4);
}

#[tokio::test]
async fn failing_prefix_source_keeps_other_assets() {
    let ct = Arc::new(FixtureCt::new("contoso.com", &["www.contoso.com"]));
    let bgp = Arc::new(FixtureBgp::failing_prefixes(vec![Asn::new(64500)
        .with_description("Contoso Limited")
        .with_source("bgp.he.net")]));
    let config = Arc::new(ReconConfig::default().with_max_iterations(1));

    let orchestrator = orchestrator_with(
        ct,
        Arc::new(FixturePassiveDns::empty()),
        bgp,
        Arc::new(EmptyIrr),
        Arc::new(FixtureResolver::new(".contoso.com")),
        config,
    );

    let ctx = ScanContext::default();
    let result = orchestrator
        .run("Contoso Limited", &["contoso.com".to_string()], &ctx)
        .await;

    // ASNs and domains survive the broken prefix source
    assert!(result.asns.iter().any(|a| a.number == 64500));
    assert!(result.domains.contains_key("contoso.com"));
    assert!(result.ip_ranges.is_empty());
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("BGP prefix lookup for AS64500 failed")));
}

#[tokio::test]
async fn cancellation_returns_partial_result() {
    let ct = Arc::new(FixtureCt::new("contoso.com", &["www.contoso.com"]));
    let bgp = Arc::new(FixtureBgp::new(vec![], &[]));
    let config = Arc::new(ReconConfig::default());

    let orchestrator = orchestrator_with(
        ct,
        Arc::new(FixturePassiveDns::empty()),
        bgp,
        Arc::new(EmptyIrr),
        Arc::new(FixtureResolver::new(".contoso.com")),
        config,
    );

    let ctx = ScanContext::default();
    ctx.cancel();
    let result = orchestrator
        .run("Contoso Limited", &["contoso.com".to_string()], &ctx)
        .await;

    assert_eq!(result.total_asset_count(), 0);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("Scan cancelled")));
    assert!(result.scan_completed.is_some());
}

#[tokio::test]
async fn progress_reaches_completion() {
    let progress: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&progress);
    let ctx = ScanContext::new().with_progress_callback(Arc::new(move |pct, _msg| {
        sink.lock().unwrap().push(pct);
    }));

    let orchestrator = orchestrator_with(
        Arc::new(FixtureCt::new("", &[])),
        Arc::new(FixturePassiveDns::empty()),
        Arc::new(FixtureBgp::new(vec![], &[])),
        Arc::new(EmptyIrr),
        Arc::new(FixtureResolver::new(".contoso.com")),
        Arc::new(ReconConfig::default().with_max_iterations(1)),
    );

    orchestrator
        .run("Contoso Limited", &["contoso.com".to_string()], &ctx)
        .await;

    let seen = progress.lock().unwrap();
    assert!(seen.iter().any(|p| (*p - 100.0).abs() < f32::EPSILON));
}
