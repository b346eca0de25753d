// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka ASN Discovery
 * BGP keyword search and IP-to-ASN correlation with confidence scoring
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ReconConfig;
use crate::context::ScanContext;
use crate::relevance::{
    asn_relevant, is_quality_search_term, organization_match_score, root_label,
};
use crate::sources::BgpSource;
use crate::types::{Asn, SharedResult};

/// Base confidence per source family
const BGP_SEARCH_CONFIDENCE: f64 = 0.7;
const IP_TO_ASN_CONFIDENCE: f64 = 0.9;

/// Scoring bonuses applied during candidate merge
const MULTI_SOURCE_BONUS: f64 = 0.1;
const NAME_MATCH_BONUS: f64 = 0.2;
const DOMAIN_CORRELATION_BONUS: f64 = 0.15;

/// Name-match bonus applies from this score upward
const NAME_MATCH_FLOOR: f64 = 0.5;

#[derive(Debug, Clone)]
struct AsnCandidate {
    asn: Asn,
    base_confidence: f64,
    sources: HashSet<String>,
}

/// ASN discovery subsystem. Expands the organization name into search
/// terms, fans them out against a BGP looking-glass, augments with a
/// capped IP-to-ASN pass, and keeps only candidates that survive the
/// relevance filter with sufficient confidence.
pub struct AsnDiscovery {
    bgp: Arc<dyn BgpSource>,
    config: Arc<ReconConfig>,
}

impl AsnDiscovery {
    pub fn new(bgp: Arc<dyn BgpSource>, config: Arc<ReconConfig>) -> Self {
        Self { bgp, config }
    }

    /// Final search-term set: caller-provided terms plus base-domain
    /// roots that correlate with the organization, all quality-filtered.
    pub fn effective_terms(
        &self,
        org_name: &str,
        base_domains: &[String],
        terms: &[String],
    ) -> Vec<String> {
        let mut effective: Vec<String> = Vec::new();
        let mut push = |term: String| {
            let term = term.trim().to_lowercase();
            if is_quality_search_term(&term) && !effective.contains(&term) {
                effective.push(term);
            }
        };

        for term in terms {
            push(term.clone());
        }
        for base in base_domains {
            if let Some(root) = root_label(base) {
                if root.len() >= 4
                    && organization_match_score(&root, org_name)
                        >= self.config.relevance.min_domain_score
                {
                    push(root);
                }
            }
        }
        effective
    }

    pub async fn discover(
        &self,
        org_name: &str,
        base_domains: &[String],
        terms: &[String],
        result: &SharedResult,
        ctx: &ScanContext,
    ) {
        ctx.report_status("[*]", "Starting ASN discovery");

        let effective = self.effective_terms(org_name, base_domains, terms);
        if effective.is_empty() {
            result.add_warning(format!(
                "No usable ASN search terms could be derived from '{}'",
                org_name
            ));
            return;
        }
        debug!("ASN discovery using {} search terms", effective.len());

        let mut raw: Vec<Asn> = Vec::new();

        let outcomes: Vec<(String, Result<Vec<Asn>, _>)> =
            stream::iter(effective.iter().cloned().map(|term| {
                let bgp = Arc::clone(&self.bgp);
                let ctx = ctx.clone();
                async move {
                    if ctx.is_cancelled() {
                        return (term, Ok(Vec::new()));
                    }
                    let found = bgp.search_asns(&term).await;
                    (term, found)
                }
            }))
            .buffer_unordered(self.config.max_workers)
            .collect()
            .await;

        for (term, outcome) in outcomes {
            match outcome {
                Ok(asns) => raw.extend(asns),
                Err(e) => {
                    warn!("[WARNING] BGP search '{}' failed: {}", term, e);
                    result.add_warning(format!("BGP search for '{}' failed: {}", term, e));
                }
            }
        }

        if !ctx.is_cancelled() {
            self.augment_from_ips(&mut raw, result, ctx).await;
        }

        let scored = Self::merge_and_score(raw, org_name, base_domains);

        let mut accepted: Vec<(Asn, f64)> = scored
            .into_iter()
            .filter(|(asn, confidence)| {
                let description = asn.description.as_deref().unwrap_or("");
                asn_relevant(description, org_name, base_domains)
                    && *confidence >= self.config.min_asn_confidence
            })
            .collect();

        accepted.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.number.cmp(&b.0.number))
        });

        if accepted.len() > self.config.max_asns_per_org {
            result.add_warning(format!(
                "ASN discovery hit the {}-ASN cap for '{}'; lowest-confidence candidates dropped",
                self.config.max_asns_per_org, org_name
            ));
            accepted.truncate(self.config.max_asns_per_org);
        }

        let count = accepted.len();
        for (asn, confidence) in accepted {
            debug!("Accepted AS{} at confidence {:.2}", asn.number, confidence);
            result.add_asn(asn);
        }
        info!("[OK] ASN discovery accepted {} ASNs", count);
        ctx.report_status("[OK]", &format!("ASN discovery found {} ASNs", count));
    }

    /// Sample a bounded number of already-resolved IPs and look up their
    /// origin ASNs. Capped because looking up every IP of a large estate
    /// is combinatorially wasteful.
    async fn augment_from_ips(&self, raw: &mut Vec<Asn>, result: &SharedResult, ctx: &ScanContext) {
        let mut ips = result.resolved_ips();
        ips.truncate(self.config.max_ip_asn_lookups);
        if ips.is_empty() {
            return;
        }
        debug!("IP-to-ASN augmentation over {} sampled IPs", ips.len());

        let outcomes: Vec<Result<Option<Asn>, _>> = stream::iter(ips.into_iter().map(|ip| {
            let bgp = Arc::clone(&self.bgp);
            let ctx = ctx.clone();
            async move {
                if ctx.is_cancelled() {
                    return Ok(None);
                }
                bgp.asn_for_ip(ip).await
            }
        }))
        .buffer_unordered(self.config.max_workers)
        .collect()
        .await;

        for outcome in outcomes {
            match outcome {
                Ok(Some(mut asn)) => {
                    asn.data_source = Some("ip_to_asn".to_string());
                    raw.push(asn);
                }
                Ok(None) => {}
                Err(e) => {
                    result.add_warning(format!("IP-to-ASN lookup failed: {}", e));
                }
            }
        }
    }

    /// Merge raw candidates by ASN number, keeping the richest
    /// description, then score: source base + multi-source bonus +
    /// name-match bonus + domain-correlation bonus, capped at 1.0.
    fn merge_and_score(
        raw: Vec<Asn>,
        org_name: &str,
        base_domains: &[String],
    ) -> Vec<(Asn, f64)> {
        let mut merged: BTreeMap<u32, AsnCandidate> = BTreeMap::new();

        for asn in raw {
            let source = asn
                .data_source
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            let base = if source == "ip_to_asn" {
                IP_TO_ASN_CONFIDENCE
            } else {
                BGP_SEARCH_CONFIDENCE
            };

            match merged.get_mut(&asn.number) {
                Some(candidate) => {
                    candidate.sources.insert(source);
                    candidate.base_confidence = candidate.base_confidence.max(base);
                    // Keep the richest description
                    let new_len = asn.description.as_deref().map(str::len).unwrap_or(0);
                    let old_len = candidate
                        .asn
                        .description
                        .as_deref()
                        .map(str::len)
                        .unwrap_or(0);
                    if new_len > old_len {
                        candidate.asn.description = asn.description;
                    }
                    if candidate.asn.name.is_none() {
                        candidate.asn.name = asn.name;
                    }
                    if candidate.asn.country.is_none() {
                        candidate.asn.country = asn.country;
                    }
                }
                None => {
                    let mut sources = HashSet::new();
                    sources.insert(source);
                    merged.insert(
                        asn.number,
                        AsnCandidate {
                            asn,
                            base_confidence: base,
                            sources,
                        },
                    );
                }
            }
        }

        merged
            .into_values()
            .map(|candidate| {
                let description = candidate.asn.description.as_deref().unwrap_or("");
                let mut confidence = candidate.base_confidence;
                if candidate.sources.len() > 1 {
                    confidence += MULTI_SOURCE_BONUS;
                }
                if organization_match_score(description, org_name) >= NAME_MATCH_FLOOR {
                    confidence += NAME_MATCH_BONUS;
                }
                let desc_lower = description.to_lowercase();
                let correlated = base_domains.iter().any(|base| {
                    root_label(base)
                        .map(|root| root.len() >= 4 && desc_lower.contains(&root))
                        .unwrap_or(false)
                });
                if correlated {
                    confidence += DOMAIN_CORRELATION_BONUS;
                }
                (candidate.asn, confidence.min(1.0))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(number: u32, description: &str, source: &str) -> Asn {
        Asn::new(number)
            .with_description(description)
            .with_source(source)
    }

    #[test]
    fn test_merge_keeps_richest_description() {
        let scored = AsnDiscovery::merge_and_score(
            vec![
                raw(64500, "ACME", "bgp.he.net"),
                raw(64500, "ACME-NET Acme Corporation", "ip_to_asn"),
            ],
            "Acme Corporation",
            &[],
        );
        assert_eq!(scored.len(), 1);
        let (asn, confidence) = &scored[0];
        assert_eq!(
            asn.description.as_deref(),
            Some("ACME-NET Acme Corporation")
        );
        // 0.9 base (ip_to_asn) + 0.1 multi-source + 0.2 name match, capped
        assert!((confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_single_source_no_match() {
        let scored = AsnDiscovery::merge_and_score(
            vec![raw(64501, "Globex Industrial", "bgp.he.net")],
            "Acme Corporation",
            &[],
        );
        assert_eq!(scored.len(), 1);
        assert!((scored[0].1 - BGP_SEARCH_CONFIDENCE).abs() < 1e-9);
    }

    #[test]
    fn test_domain_correlation_bonus() {
        let bases = vec!["acme.com".to_string()];
        let scored = AsnDiscovery::merge_and_score(
            vec![raw(64502, "acme backbone services", "bgp.he.net")],
            "Unrelated Org Name",
            &bases,
        );
        assert!((scored[0].1 - (BGP_SEARCH_CONFIDENCE + DOMAIN_CORRELATION_BONUS)).abs() < 1e-9);
    }

    #[test]
    fn test_effective_terms_filtering() {
        let discovery = AsnDiscovery::new(
            Arc::new(NullBgp),
            Arc::new(ReconConfig::default()),
        );
        let terms = vec![
            "acme".to_string(),
            "the".to_string(),      // too short / noise
            "networks".to_string(), // noise
            "acme".to_string(),     // duplicate
        ];
        let effective =
            discovery.effective_terms("Acme Corporation", &["acme.com".to_string()], &terms);
        assert_eq!(effective, vec!["acme".to_string()]);
    }

    struct NullBgp;

    #[async_trait::async_trait]
    impl BgpSource for NullBgp {
        async fn search_asns(
            &self,
            _term: &str,
        ) -> Result<Vec<Asn>, crate::errors::SourceError> {
            Ok(Vec::new())
        }

        async fn announced_prefixes(
            &self,
            _asn: u32,
        ) -> Result<Vec<String>, crate::errors::SourceError> {
            Ok(Vec::new())
        }

        async fn asn_for_ip(
            &self,
            _ip: std::net::IpAddr,
        ) -> Result<Option<Asn>, crate::errors::SourceError> {
            Ok(None)
        }
    }
}
