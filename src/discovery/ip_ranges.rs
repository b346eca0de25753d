// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka IP-Range Discovery
 * BGP and IRR prefix collection, size-aware scoring and consolidation
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use futures::stream::{self, StreamExt};
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ReconConfig;
use crate::context::ScanContext;
use crate::sources::{BgpSource, IrrSource};
use crate::types::{Asn, IpRange, SharedResult};

/// Source confidence scores
const BGP_SOURCE_SCORE: f64 = 0.8;
const IRR_SOURCE_SCORE: f64 = 0.6;

/// Candidates below this final score are discarded
const MIN_RANGE_SCORE: f64 = 0.3;

/// Per-ASN prefix fan-out is kept small out of courtesy to the
/// looking-glass
const ASN_FANOUT_WORKERS: usize = 5;

/// Network size classes. Very large announced blocks are usually
/// upstream-provider allocations rather than organization-owned space,
/// so they are down-weighted, not excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
    Huge,
}

impl SizeClass {
    /// Classify by prefix length: small at /24 and longer, medium /20,
    /// large /16, huge anything shorter.
    pub fn of(net: &IpNet) -> Self {
        match net.prefix_len() {
            len if len >= 24 => SizeClass::Small,
            len if len >= 20 => SizeClass::Medium,
            len if len >= 16 => SizeClass::Large,
            _ => SizeClass::Huge,
        }
    }

    fn modifier(self) -> f64 {
        match self {
            SizeClass::Small => 1.0,
            SizeClass::Medium => 0.8,
            SizeClass::Large => 0.6,
            SizeClass::Huge => 0.3,
        }
    }

    fn enhancement(self) -> f64 {
        match self {
            SizeClass::Small => 0.2,
            SizeClass::Medium => 0.1,
            SizeClass::Large => 0.0,
            SizeClass::Huge => -0.3,
        }
    }
}

#[derive(Debug, Clone)]
struct RangeCandidate {
    net: IpNet,
    asn: u32,
    asn_description: Option<String>,
    country: Option<String>,
    source: String,
    score: f64,
}

/// Score one candidate network: source score scaled by size class, plus
/// a size enhancement and a bonus for high-confidence sources.
pub fn score_network(net: &IpNet, source_score: f64) -> f64 {
    let class = SizeClass::of(net);
    let mut score = source_score * class.modifier() + class.enhancement();
    if source_score > 0.7 {
        score += 0.1;
    }
    score.clamp(0.0, 1.0)
}

/// IP-range discovery subsystem. Requires ASNs already discovered.
pub struct IpRangeDiscovery {
    bgp: Arc<dyn BgpSource>,
    irr: Arc<dyn IrrSource>,
    config: Arc<ReconConfig>,
}

impl IpRangeDiscovery {
    pub fn new(
        bgp: Arc<dyn BgpSource>,
        irr: Arc<dyn IrrSource>,
        config: Arc<ReconConfig>,
    ) -> Self {
        Self { bgp, irr, config }
    }

    pub async fn discover(&self, asns: &[Asn], result: &SharedResult, ctx: &ScanContext) {
        if asns.is_empty() {
            debug!("IP-range discovery skipped: no ASNs");
            return;
        }
        ctx.report_status("[*]", &format!("Collecting prefixes for {} ASNs", asns.len()));

        let per_asn: Vec<Vec<RangeCandidate>> = stream::iter(asns.iter().cloned().map(|asn| {
            let bgp = Arc::clone(&self.bgp);
            let irr = Arc::clone(&self.irr);
            let result = result.clone();
            let ctx = ctx.clone();
            let cap = self.config.max_ip_ranges_per_asn;
            async move {
                if ctx.is_cancelled() {
                    return Vec::new();
                }
                Self::collect_for_asn(&*bgp, &*irr, &asn, cap, &result).await
            }
        }))
        .buffer_unordered(self.config.max_workers.min(ASN_FANOUT_WORKERS))
        .collect()
        .await;

        if ctx.is_cancelled() {
            return;
        }

        let candidates: Vec<RangeCandidate> = per_asn.into_iter().flatten().collect();
        info!(
            "IP-range discovery: {} scored candidates before consolidation",
            candidates.len()
        );

        let consolidated = self.consolidate(&candidates);
        let count = consolidated.len();
        for range in consolidated {
            result.add_ip_range(range);
        }
        info!("[OK] IP-range discovery recorded {} consolidated ranges", count);
        ctx.report_status("[OK]", &format!("Recorded {} IP ranges", count));
    }

    /// BGP and IRR queries for one ASN. Source failures become warnings
    /// and an empty set for that source; other ASNs are unaffected.
    async fn collect_for_asn(
        bgp: &dyn BgpSource,
        irr: &dyn IrrSource,
        asn: &Asn,
        cap: usize,
        result: &SharedResult,
    ) -> Vec<RangeCandidate> {
        let (bgp_routes, irr_routes) = tokio::join!(
            bgp.announced_prefixes(asn.number),
            irr.routes_for_asn(asn.number)
        );

        let mut candidates: Vec<RangeCandidate> = Vec::new();
        let mut push = |cidr: &str, source: &str, source_score: f64| {
            let net = match IpNet::from_str(cidr) {
                Ok(net) => net,
                Err(_) => {
                    result.add_warning(format!(
                        "Skipping unparsable CIDR '{}' from {} for AS{}",
                        cidr, source, asn.number
                    ));
                    return;
                }
            };
            if candidates.iter().any(|c| c.net == net) {
                return;
            }
            let score = score_network(&net, source_score);
            if score >= MIN_RANGE_SCORE {
                candidates.push(RangeCandidate {
                    net,
                    asn: asn.number,
                    asn_description: asn.description.clone(),
                    country: asn.country.clone(),
                    source: source.to_string(),
                    score,
                });
            }
        };

        match bgp_routes {
            Ok(routes) => {
                for cidr in &routes {
                    push(cidr, "bgp.he.net", BGP_SOURCE_SCORE);
                }
            }
            Err(e) => {
                warn!("[WARNING] BGP prefix lookup for AS{} failed: {}", asn.number, e);
                result.add_warning(format!("BGP prefix lookup for AS{} failed: {}", asn.number, e));
            }
        }
        match irr_routes {
            Ok(routes) => {
                for cidr in &routes {
                    push(cidr, "radb", IRR_SOURCE_SCORE);
                }
            }
            Err(e) => {
                warn!("[WARNING] IRR lookup for AS{} failed: {}", asn.number, e);
                result.add_warning(format!("IRR lookup for AS{} failed: {}", asn.number, e));
            }
        }

        if candidates.len() > cap {
            result.add_warning(format!(
                "AS{} exceeded the {}-range candidate cap; lowest-scored candidates dropped",
                asn.number, cap
            ));
            candidates.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            candidates.truncate(cap);
        }

        candidates
    }

    /// Collapse adjacent/overlapping networks per IP version, then
    /// re-attach the best-matching candidate's ASN/country metadata.
    fn consolidate(&self, candidates: &[RangeCandidate]) -> Vec<IpRange> {
        let v4: Vec<Ipv4Net> = candidates
            .iter()
            .filter_map(|c| match c.net {
                IpNet::V4(net) => Some(net),
                IpNet::V6(_) => None,
            })
            .collect();
        let v6: Vec<Ipv6Net> = candidates
            .iter()
            .filter_map(|c| match c.net {
                IpNet::V6(net) => Some(net),
                IpNet::V4(_) => None,
            })
            .collect();

        let mut collapsed: Vec<IpNet> = Vec::new();
        collapsed.extend(self.collapse_v4(v4).into_iter().map(IpNet::V4));
        collapsed.extend(self.collapse_v6(v6).into_iter().map(IpNet::V6));

        collapsed
            .into_iter()
            .filter_map(|net| {
                let mut range = IpRange::new(&net.to_string()).ok()?;
                if let Some(best) = Self::best_candidate(&net, candidates) {
                    range = range.with_asn(best.asn).with_source(best.source.clone());
                    if let Some(desc) = &best.asn_description {
                        range = range.with_asn_description(desc.clone());
                    }
                    if let Some(country) = &best.country {
                        range = range.with_country(country.clone());
                    }
                }
                Some(range)
            })
            .collect()
    }

    fn collapse_v4(&self, nets: Vec<Ipv4Net>) -> Vec<Ipv4Net> {
        if nets.is_empty() {
            return nets;
        }
        if nets.len() <= self.config.full_collapse_limit {
            return Ipv4Net::aggregate(&nets);
        }
        // Large batches: bucket by prefix length and sample, trading
        // collapse precision for near-linear cost
        let mut buckets: BTreeMap<u8, Vec<Ipv4Net>> = BTreeMap::new();
        for net in nets {
            buckets.entry(net.prefix_len()).or_default().push(net);
        }
        let mut out = Vec::new();
        for (prefix_len, mut bucket) in buckets {
            if bucket.len() > self.config.bucket_sample_size {
                debug!(
                    "Sampling {} of {} /{}s during consolidation",
                    self.config.bucket_sample_size,
                    bucket.len(),
                    prefix_len
                );
                bucket.sort();
                bucket.truncate(self.config.bucket_sample_size);
            }
            out.extend(Ipv4Net::aggregate(&bucket));
        }
        out
    }

    fn collapse_v6(&self, nets: Vec<Ipv6Net>) -> Vec<Ipv6Net> {
        if nets.is_empty() {
            return nets;
        }
        if nets.len() <= self.config.full_collapse_limit {
            return Ipv6Net::aggregate(&nets);
        }
        let mut buckets: BTreeMap<u8, Vec<Ipv6Net>> = BTreeMap::new();
        for net in nets {
            buckets.entry(net.prefix_len()).or_default().push(net);
        }
        let mut out = Vec::new();
        for (_prefix_len, mut bucket) in buckets {
            if bucket.len() > self.config.bucket_sample_size {
                bucket.sort();
                bucket.truncate(self.config.bucket_sample_size);
            }
            out.extend(Ipv6Net::aggregate(&bucket));
        }
        out
    }

    /// Best original candidate for a collapsed network: a candidate
    /// containing or contained by the block, preferring the largest
    /// overlap. Ties are broken deterministically by the smallest
    /// candidate network, then lexicographic CIDR order.
    fn best_candidate<'a>(
        net: &IpNet,
        candidates: &'a [RangeCandidate],
    ) -> Option<&'a RangeCandidate> {
        let mut best: Option<(&RangeCandidate, u8)> = None;
        for candidate in candidates {
            let related = net.contains(&candidate.net) || candidate.net.contains(net);
            if !related {
                continue;
            }
            // Overlap is the more specific of the two prefixes; a longer
            // overlap prefix means a tighter match
            let overlap = net.prefix_len().max(candidate.net.prefix_len());
            let better = match best {
                None => true,
                Some((current, current_overlap)) => {
                    overlap > current_overlap
                        || (overlap == current_overlap
                            && (candidate.net.prefix_len() > current.net.prefix_len()
                                || (candidate.net.prefix_len() == current.net.prefix_len()
                                    && candidate.net.to_string() < current.net.to_string())))
                }
            };
            if better {
                best = Some((candidate, overlap));
            }
        }
        best.map(|(candidate, _)| candidate)
    }
}
