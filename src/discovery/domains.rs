// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Domain Discovery
 * CT and passive-DNS enumeration with relevance filtering and DNS
 * verification
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ReconConfig;
use crate::context::ScanContext;
use crate::relevance::{domain_relevant, registrable_root};
use crate::resolver::DnsResolver;
use crate::sources::{CertTransparencySource, PassiveDnsSource};
use crate::types::{Domain, SharedResult, Subdomain, SubdomainStatus};

/// Base confidence per source family
const CT_CONFIDENCE: f64 = 0.7;
const PASSIVE_DNS_CONFIDENCE: f64 = 0.6;

/// Confidence boost per corroborating source
const MULTI_SOURCE_BOOST: f64 = 0.1;

#[derive(Debug, Clone)]
struct Candidate {
    base_confidence: f64,
    confidence: f64,
    sources: HashSet<String>,
}

impl Candidate {
    fn new(confidence: f64, source: &str) -> Self {
        let mut sources = HashSet::new();
        sources.insert(source.to_string());
        Self {
            base_confidence: confidence,
            confidence,
            sources,
        }
    }

    fn merge(&mut self, confidence: f64, source: &str) {
        self.sources.insert(source.to_string());
        self.base_confidence = self.base_confidence.max(confidence);
        let boost = MULTI_SOURCE_BOOST * (self.sources.len().saturating_sub(1)) as f64;
        self.confidence = (self.base_confidence + boost).min(1.0);
    }
}

/// Domain discovery subsystem. Collects FQDN candidates from CT logs
/// and passive DNS, filters them through the relevance engine, then
/// verifies survivors with concurrent DNS resolution.
pub struct DomainDiscovery {
    ct: Arc<dyn CertTransparencySource>,
    passive_dns: Arc<dyn PassiveDnsSource>,
    resolver: Arc<dyn DnsResolver>,
    config: Arc<ReconConfig>,
}

impl DomainDiscovery {
    pub fn new(
        ct: Arc<dyn CertTransparencySource>,
        passive_dns: Arc<dyn PassiveDnsSource>,
        resolver: Arc<dyn DnsResolver>,
        config: Arc<ReconConfig>,
    ) -> Self {
        Self {
            ct,
            passive_dns,
            resolver,
            config,
        }
    }

    /// Run the full domain-discovery pass, mutating the shared result.
    pub async fn discover(
        &self,
        org_name: &str,
        base_domains: &[String],
        result: &SharedResult,
        ctx: &ScanContext,
    ) {
        ctx.report_status("[*]", "Starting domain discovery");

        let queries = self.build_queries(org_name, base_domains, result);
        let mut candidates = self.collect_ct_candidates(&queries, result, ctx).await;
        self.collect_passive_dns(base_domains, &mut candidates, result, ctx)
            .await;

        if ctx.is_cancelled() {
            return;
        }

        // Relevance filter, then group by registrable root
        let relevance = &self.config.relevance;
        let mut groups: HashMap<String, Vec<String>> = HashMap::new();
        for (fqdn, meta) in &candidates {
            let relevant = domain_relevant(
                fqdn,
                org_name,
                base_domains,
                meta.confidence,
                meta.sources.len(),
                relevance,
            );
            if !relevant {
                debug!("Dropping irrelevant candidate: {}", fqdn);
                continue;
            }
            if let Some(root) = registrable_root(fqdn) {
                groups.entry(root).or_default().push(fqdn.clone());
            }
        }

        info!(
            "Domain discovery: {} candidates in {} domain groups after filtering",
            groups.values().map(|v| v.len()).sum::<usize>(),
            groups.len()
        );
        ctx.report_progress(
            40.0,
            &format!("Resolving {} domain groups", groups.len()),
        );

        self.resolve_and_record(groups, result, ctx).await;
        ctx.report_status("[OK]", "Domain discovery complete");
    }

    fn build_queries(
        &self,
        org_name: &str,
        base_domains: &[String],
        result: &SharedResult,
    ) -> Vec<String> {
        if base_domains.is_empty() {
            result.add_warning(format!(
                "No base domains provided; certificate-transparency search by organization name '{}' has lower precision",
                org_name
            ));
            return vec![org_name.to_string()];
        }
        let mut queries = Vec::with_capacity(base_domains.len() * 2);
        for domain in base_domains {
            queries.push(format!("%.{}", domain));
            queries.push(domain.clone());
        }
        queries
    }

    async fn collect_ct_candidates(
        &self,
        queries: &[String],
        result: &SharedResult,
        ctx: &ScanContext,
    ) -> HashMap<String, Candidate> {
        let outcomes: Vec<(String, Result<HashSet<String>, _>)> = stream::iter(
            queries.iter().cloned().map(|query| {
                let ct = Arc::clone(&self.ct);
                let ctx = ctx.clone();
                async move {
                    if ctx.is_cancelled() {
                        return (query, Ok(HashSet::new()));
                    }
                    let found = ct.search(&query).await;
                    (query, found)
                }
            }),
        )
        .buffer_unordered(self.config.max_workers)
        .collect()
        .await;

        let mut candidates: HashMap<String, Candidate> = HashMap::new();
        for (query, outcome) in outcomes {
            match outcome {
                Ok(fqdns) => {
                    for fqdn in fqdns {
                        candidates
                            .entry(fqdn)
                            .and_modify(|c| c.merge(CT_CONFIDENCE, "crt.sh"))
                            .or_insert_with(|| Candidate::new(CT_CONFIDENCE, "crt.sh"));
                    }
                }
                Err(e) => {
                    warn!("[WARNING] CT query '{}' failed: {}", query, e);
                    result.add_warning(format!(
                        "Certificate-transparency query '{}' failed: {}",
                        query, e
                    ));
                }
            }
        }
        candidates
    }

    /// Passive-DNS pass over the base domains only. CT output never
    /// widens this list: the free-tier quota is spent exclusively on
    /// domains the operator vouched for. Respects the per-scan quota
    /// flag: after one quota signal, no further passive-DNS queries in
    /// this scan.
    async fn collect_passive_dns(
        &self,
        base_domains: &[String],
        candidates: &mut HashMap<String, Candidate>,
        result: &SharedResult,
        ctx: &ScanContext,
    ) {
        if base_domains.is_empty() {
            debug!("No base domains provided, skipping passive DNS");
            return;
        }
        let mut roots: Vec<String> = Vec::new();
        for base in base_domains {
            let base = base.trim().to_lowercase();
            if !base.is_empty() && !roots.contains(&base) {
                roots.push(base);
            }
        }

        for root in roots {
            if ctx.is_cancelled() {
                return;
            }
            if ctx.passive_dns_exhausted() {
                debug!("Passive-DNS quota exhausted, skipping remaining queries");
                return;
            }
            match self.passive_dns.host_search(&root).await {
                Ok(fqdns) => {
                    for fqdn in fqdns {
                        candidates
                            .entry(fqdn)
                            .and_modify(|c| c.merge(PASSIVE_DNS_CONFIDENCE, "passive_dns"))
                            .or_insert_with(|| {
                                Candidate::new(PASSIVE_DNS_CONFIDENCE, "passive_dns")
                            });
                    }
                }
                Err(e) if e.is_quota_exhausted() => {
                    ctx.mark_passive_dns_exhausted();
                    result.add_warning(
                        "Passive-DNS quota exhausted; remaining passive-DNS queries skipped for this scan",
                    );
                    return;
                }
                Err(e) => {
                    result.add_warning(format!("Passive-DNS query for '{}' failed: {}", root, e));
                }
            }
        }
    }

    async fn resolve_and_record(
        &self,
        groups: HashMap<String, Vec<String>>,
        result: &SharedResult,
        ctx: &ScanContext,
    ) {
        for (root, mut fqdns) in groups {
            if ctx.is_cancelled() {
                return;
            }

            result.add_domain(Domain::new(&root).with_source("domain_discovery"));

            fqdns.sort();
            fqdns.dedup();
            let mut subdomain_fqdns: Vec<String> = fqdns
                .into_iter()
                .filter(|f| *f != root)
                .collect();
            if subdomain_fqdns.len() > self.config.max_subdomains_per_domain {
                result.add_warning(format!(
                    "Domain {} exceeded the {}-subdomain cap; extra candidates dropped",
                    root, self.config.max_subdomains_per_domain
                ));
                subdomain_fqdns.truncate(self.config.max_subdomains_per_domain);
            }

            let resolved: Vec<Subdomain> = stream::iter(subdomain_fqdns.into_iter().map(|fqdn| {
                let resolver = Arc::clone(&self.resolver);
                let ctx = ctx.clone();
                async move {
                    if ctx.is_cancelled() {
                        return Subdomain::new(&fqdn).with_source("domain_discovery");
                    }
                    let resolution = resolver.resolve(&fqdn).await;
                    Subdomain::new(&fqdn)
                        .with_status(resolution.status)
                        .with_ips(resolution.addresses)
                        .with_source("domain_discovery")
                        .checked_now()
                }
            }))
            .buffer_unordered(self.config.dns_workers)
            .collect()
            .await;

            let mut active = 0usize;
            let mut unknown = 0usize;
            for sub in resolved {
                match sub.status {
                    SubdomainStatus::Active => active += 1,
                    SubdomainStatus::Unknown => unknown += 1,
                    SubdomainStatus::Inactive => {}
                }
                result.add_subdomain(&root, sub);
            }
            if unknown > 0 {
                result.add_warning(format!(
                    "{} subdomains of {} could not be resolved (timeout or server failure)",
                    unknown, root
                ));
            }
            info!(
                "[OK] {}: {} active subdomains recorded",
                root, active
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_merge_boosts_confidence() {
        let mut candidate = Candidate::new(CT_CONFIDENCE, "crt.sh");
        assert!((candidate.confidence - 0.7).abs() < f64::EPSILON);

        candidate.merge(PASSIVE_DNS_CONFIDENCE, "passive_dns");
        // max(0.7, 0.6) + 0.1 for the second source
        assert!((candidate.confidence - 0.8).abs() < 1e-9);
        assert_eq!(candidate.sources.len(), 2);

        // Re-merging the same source is not another boost
        candidate.merge(PASSIVE_DNS_CONFIDENCE, "passive_dns");
        assert!((candidate.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_candidate_confidence_capped() {
        let mut candidate = Candidate::new(0.95, "crt.sh");
        candidate.merge(0.95, "a");
        candidate.merge(0.95, "b");
        candidate.merge(0.95, "c");
        assert!(candidate.confidence <= 1.0);
    }
}
