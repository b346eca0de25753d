// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Cloud Detection
 * Provider signature matching over IP ranges, resolved IPs and FQDNs
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use ipnet::IpNet;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ReconConfig;
use crate::context::ScanContext;
use crate::types::{CloudService, ReconnaissanceResult, SharedResult};

/// Confidence assigned by the keyword fallback scan
const KEYWORD_FALLBACK_CONFIDENCE: f64 = 0.6;

/// Confidence bump when multiple detection methods agree
const METHOD_AGREEMENT_BONUS: f64 = 0.1;

struct Provider {
    name: &'static str,
    confidence: f64,
    cidrs: Vec<IpNet>,
    patterns: Vec<Regex>,
    keywords: &'static [&'static str],
}

fn provider(
    name: &'static str,
    confidence: f64,
    cidrs: &[&str],
    patterns: &[&str],
    keywords: &'static [&'static str],
) -> Provider {
    Provider {
        name,
        confidence,
        cidrs: cidrs.iter().filter_map(|c| IpNet::from_str(c).ok()).collect(),
        patterns: patterns.iter().filter_map(|p| Regex::new(p).ok()).collect(),
        keywords,
    }
}

/// Static provider signature table. Order matters: matching is
/// first-match-wins, so CDNs that front other providers come after the
/// hyperscalers they resell.
static PROVIDERS: Lazy<Vec<Provider>> = Lazy::new(|| {
    vec![
        provider(
            "aws",
            0.95,
            &["52.0.0.0/11", "54.64.0.0/11", "13.32.0.0/15", "18.128.0.0/9", "3.0.0.0/9"],
            &[
                r"\.amazonaws\.com$",
                r"\.cloudfront\.net$",
                r"\.awsdns-\d+\.(com|net|org)$",
                r"\.elasticbeanstalk\.com$",
            ],
            &["amazonaws", "cloudfront", "elasticbeanstalk"],
        ),
        provider(
            "azure",
            0.95,
            &["13.64.0.0/11", "40.64.0.0/10", "52.224.0.0/11", "20.33.0.0/16"],
            &[
                r"\.azurewebsites\.net$",
                r"\.azureedge\.net$",
                r"\.cloudapp\.azure\.com$",
                r"\.blob\.core\.windows\.net$",
                r"\.trafficmanager\.net$",
            ],
            &["azurewebsites", "azureedge", "windows.net"],
        ),
        provider(
            "gcp",
            0.95,
            &["34.64.0.0/10", "35.184.0.0/13", "104.154.0.0/15", "130.211.0.0/16"],
            &[
                r"\.appspot\.com$",
                r"\.googleapis\.com$",
                r"\.run\.app$",
                r"\.cloudfunctions\.net$",
            ],
            &["appspot", "googleapis", "googleusercontent"],
        ),
        provider(
            "cloudflare",
            0.90,
            &[
                "104.16.0.0/13",
                "172.64.0.0/13",
                "173.245.48.0/20",
                "188.114.96.0/20",
                "2606:4700::/32",
            ],
            &[r"\.cloudflare\.com$", r"\.pages\.dev$", r"\.workers\.dev$"],
            &["cloudflare", "workers.dev", "pages.dev"],
        ),
        provider(
            "akamai",
            0.85,
            &["23.32.0.0/11", "104.64.0.0/10", "2.16.0.0/13"],
            &[
                r"\.akamaiedge\.net$",
                r"\.akamaized\.net$",
                r"\.edgekey\.net$",
                r"\.edgesuite\.net$",
            ],
            &["akamai", "edgekey", "edgesuite"],
        ),
        provider(
            "fastly",
            0.85,
            &["151.101.0.0/16", "199.232.0.0/16"],
            &[r"\.fastly\.net$", r"\.fastlylb\.net$"],
            &["fastly"],
        ),
        provider(
            "heroku",
            0.90,
            &[],
            &[r"\.herokuapp\.com$", r"\.herokudns\.com$", r"\.herokussl\.com$"],
            &["heroku"],
        ),
        provider(
            "digitalocean",
            0.85,
            &["104.131.0.0/16", "159.65.0.0/16", "167.99.0.0/16", "138.68.0.0/16"],
            &[r"\.digitaloceanspaces\.com$", r"\.ondigitalocean\.app$"],
            &["digitalocean"],
        ),
        provider(
            "linode",
            0.85,
            &["45.79.0.0/16", "172.104.0.0/15", "139.162.0.0/16"],
            &[r"\.linodeusercontent\.com$", r"\.members\.linode\.com$"],
            &["linode"],
        ),
        provider(
            "netlify",
            0.90,
            &["75.2.60.0/24"],
            &[r"\.netlify\.app$", r"\.netlify\.com$"],
            &["netlify"],
        ),
        provider(
            "vercel",
            0.90,
            &["76.76.21.0/24"],
            &[r"\.vercel\.app$", r"\.vercel-dns\.com$", r"\.now\.sh$"],
            &["vercel", "now.sh"],
        ),
    ]
});

#[derive(Debug, Clone)]
struct Detection {
    provider: String,
    identifier: String,
    resource_type: String,
    confidence: f64,
    methods: Vec<String>,
    note: Option<String>,
}

/// Cloud detection subsystem. Pure signature matching over the assets
/// already in the result; never fails, worst case it finds nothing.
pub struct CloudDetection {
    config: Arc<ReconConfig>,
}

impl CloudDetection {
    pub fn new(config: Arc<ReconConfig>) -> Self {
        Self { config }
    }

    pub async fn discover(&self, result: &SharedResult, ctx: &ScanContext) {
        ctx.report_status("[*]", "Matching cloud provider signatures");
        let snapshot = result.snapshot();
        let services = self.detect(&snapshot);
        let count = services.len();
        for service in services {
            result.add_cloud_service(service);
        }
        info!("[OK] Cloud detection recorded {} services", count);
        ctx.report_status("[OK]", &format!("Detected {} cloud services", count));
    }

    /// Run all detection passes over a result snapshot.
    pub fn detect(&self, snapshot: &ReconnaissanceResult) -> Vec<CloudService> {
        let mut detections: Vec<Detection> = Vec::new();

        self.match_ip_ranges(snapshot, &mut detections);
        self.match_resolved_ips(snapshot, &mut detections);
        self.match_fqdns(snapshot, &mut detections);

        Self::deduplicate(detections)
            .into_iter()
            .map(|d| {
                let mut methods = d.methods.clone();
                methods.sort();
                let mut service = CloudService::new(&d.provider, &d.identifier)
                    .with_resource_type(d.resource_type.clone())
                    .with_source(methods.join("+"))
                    .with_status(format!("confidence {:.2}", d.confidence));
                if let Some(note) = &d.note {
                    service.region = Some(note.clone());
                }
                service
            })
            .collect()
    }

    /// First provider whose CIDR set intersects the range wins; a range
    /// is never attributed to two providers.
    fn match_ip_ranges(&self, snapshot: &ReconnaissanceResult, out: &mut Vec<Detection>) {
        for range in &snapshot.ip_ranges {
            let net = match range.network() {
                Some(net) => net,
                None => continue,
            };
            for provider in PROVIDERS.iter() {
                let hit = provider
                    .cidrs
                    .iter()
                    .any(|c| c.contains(&net) || net.contains(c));
                if hit {
                    out.push(Detection {
                        provider: provider.name.to_string(),
                        identifier: range.cidr.clone(),
                        resource_type: "IP Range".to_string(),
                        confidence: provider.confidence,
                        methods: vec!["ip_range_match".to_string()],
                        note: None,
                    });
                    break;
                }
            }
        }
    }

    fn match_resolved_ips(&self, snapshot: &ReconnaissanceResult, out: &mut Vec<Detection>) {
        for domain in snapshot.domains.values() {
            for sub in &domain.subdomains {
                for raw in &sub.resolved_ips {
                    let ip: IpAddr = match raw.parse() {
                        Ok(ip) => ip,
                        Err(_) => continue,
                    };
                    for provider in PROVIDERS.iter() {
                        if provider.cidrs.iter().any(|c| c.contains(&ip)) {
                            out.push(Detection {
                                provider: provider.name.to_string(),
                                identifier: raw.clone(),
                                resource_type: "Resolved IP".to_string(),
                                confidence: provider.confidence,
                                methods: vec!["resolved_ip_match".to_string()],
                                note: Some(sub.fqdn.clone()),
                            });
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Regex pass per FQDN, first match wins. Above the configured FQDN
    /// count the regex pass is skipped for a cheap keyword scan.
    fn match_fqdns(&self, snapshot: &ReconnaissanceResult, out: &mut Vec<Detection>) {
        let mut fqdns: Vec<(String, &'static str)> = Vec::new();
        for domain in snapshot.domains.values() {
            fqdns.push((domain.name.clone(), "Domain"));
            for sub in &domain.subdomains {
                fqdns.push((sub.fqdn.clone(), "Subdomain"));
            }
        }

        let use_fallback = fqdns.len() > self.config.regex_fqdn_limit;
        if use_fallback {
            debug!(
                "{} FQDNs exceed the regex limit of {}; using keyword fallback",
                fqdns.len(),
                self.config.regex_fqdn_limit
            );
        }

        for (fqdn, resource_type) in fqdns {
            for provider in PROVIDERS.iter() {
                let (hit, confidence, method) = if use_fallback {
                    (
                        provider.keywords.iter().any(|k| fqdn.contains(k)),
                        KEYWORD_FALLBACK_CONFIDENCE,
                        "keyword_fallback",
                    )
                } else {
                    (
                        provider.patterns.iter().any(|p| p.is_match(&fqdn)),
                        provider.confidence,
                        "domain_pattern",
                    )
                };
                if hit {
                    out.push(Detection {
                        provider: provider.name.to_string(),
                        identifier: fqdn.clone(),
                        resource_type: resource_type.to_string(),
                        confidence,
                        methods: vec![method.to_string()],
                        note: None,
                    });
                    break;
                }
            }
        }
    }

    /// Collapse detections by (identifier, provider): keep the highest
    /// confidence, merge method labels, and bump confidence slightly
    /// when methods agree.
    fn deduplicate(detections: Vec<Detection>) -> Vec<Detection> {
        let mut merged: HashMap<(String, String), Detection> = HashMap::new();
        for detection in detections {
            let key = (detection.identifier.clone(), detection.provider.clone());
            match merged.get_mut(&key) {
                Some(existing) => {
                    existing.confidence = existing.confidence.max(detection.confidence);
                    let mut new_method = false;
                    for method in detection.methods {
                        if !existing.methods.contains(&method) {
                            existing.methods.push(method);
                            new_method = true;
                        }
                    }
                    if new_method {
                        existing.confidence =
                            (existing.confidence + METHOD_AGREEMENT_BONUS).min(1.0);
                    }
                    if existing.note.is_none() {
                        existing.note = detection.note;
                    }
                }
                None => {
                    merged.insert(key, detection);
                }
            }
        }
        let mut out: Vec<Detection> = merged.into_values().collect();
        out.sort_by(|a, b| {
            a.provider
                .cmp(&b.provider)
                .then(a.identifier.cmp(&b.identifier))
        });
        out
    }
}
