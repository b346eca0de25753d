// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Configuration
 * Scan configuration with serde defaults and per-service rate limits
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

fn default_max_workers() -> usize {
    10
}
fn default_dns_workers() -> usize {
    20
}
fn default_timeout_seconds() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_dns_timeout_ms() -> u64 {
    2000
}
fn default_max_iterations() -> u32 {
    3
}
fn default_convergence_threshold() -> f64 {
    0.15
}
fn default_min_confidence_threshold() -> f64 {
    0.4
}
fn default_min_asn_confidence() -> f64 {
    0.6
}
fn default_max_asns_per_org() -> usize {
    20
}
fn default_max_subdomains_per_domain() -> usize {
    1000
}
fn default_max_ip_ranges_per_asn() -> usize {
    500
}
fn default_max_ip_asn_lookups() -> usize {
    20
}
fn default_full_collapse_limit() -> usize {
    50
}
fn default_bucket_sample_size() -> usize {
    20
}
fn default_regex_fqdn_limit() -> usize {
    100
}
fn default_domain_phase_timeout() -> u64 {
    180
}
fn default_asn_phase_timeout() -> u64 {
    180
}
fn default_ip_phase_timeout() -> u64 {
    120
}
fn default_cloud_phase_timeout() -> u64 {
    60
}
fn default_rate_limits() -> HashMap<String, u32> {
    let mut limits = HashMap::new();
    limits.insert("crt.sh".to_string(), 60);
    limits.insert("bgp.he.net".to_string(), 30);
    limits.insert("hackertarget".to_string(), 10);
    limits
}
fn default_rpm() -> u32 {
    60
}

/// Tunable relevance thresholds. These are empirically chosen values,
/// exposed as configuration rather than hard-coded constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceConfig {
    /// Minimum organization match score for a domain root to be relevant
    #[serde(default = "RelevanceConfig::default_domain_score")]
    pub min_domain_score: f64,

    /// Substring overlap ratio treated as substantial
    #[serde(default = "RelevanceConfig::default_overlap_ratio")]
    pub substantial_overlap_ratio: f64,

    /// Confidence at which multi-source corroboration overrides scoring
    #[serde(default = "RelevanceConfig::default_high_confidence")]
    pub high_confidence: f64,

    /// Character-overlap similarity above which two terms are duplicates
    #[serde(default = "RelevanceConfig::default_near_duplicate")]
    pub near_duplicate_similarity: f64,

    /// Common-substring floor (fraction of target length) for learned names
    #[serde(default = "RelevanceConfig::default_grounding_ratio")]
    pub learning_grounding_ratio: f64,

    /// Stricter similarity gate for names learned from domain roots
    #[serde(default = "RelevanceConfig::default_domain_grounding")]
    pub domain_root_grounding_ratio: f64,
}

impl RelevanceConfig {
    fn default_domain_score() -> f64 {
        0.3
    }
    fn default_overlap_ratio() -> f64 {
        0.6
    }
    fn default_high_confidence() -> f64 {
        0.8
    }
    fn default_near_duplicate() -> f64 {
        0.85
    }
    fn default_grounding_ratio() -> f64 {
        0.3
    }
    fn default_domain_grounding() -> f64 {
        0.8
    }
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            min_domain_score: Self::default_domain_score(),
            substantial_overlap_ratio: Self::default_overlap_ratio(),
            high_confidence: Self::default_high_confidence(),
            near_duplicate_similarity: Self::default_near_duplicate(),
            learning_grounding_ratio: Self::default_grounding_ratio(),
            domain_root_grounding_ratio: Self::default_domain_grounding(),
        }
    }
}

/// Reconnaissance engine configuration. Every knob has a documented
/// default and can be overridden per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconConfig {
    /// Worker pool size for discovery fan-out
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Worker pool size for DNS resolution fan-out
    #[serde(default = "default_dns_workers")]
    pub dns_workers: usize,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retries for transient HTTP failures (429/5xx)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-lookup DNS timeout in milliseconds
    #[serde(default = "default_dns_timeout_ms")]
    pub dns_timeout_ms: u64,

    /// Maximum orchestrator iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// New-assets ratio below which the loop converges
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,

    /// Minimum confidence for learned organization names
    #[serde(default = "default_min_confidence_threshold")]
    pub min_confidence_threshold: f64,

    /// Minimum confidence for an ASN candidate to be accepted
    #[serde(default = "default_min_asn_confidence")]
    pub min_asn_confidence: f64,

    /// Cap on accepted ASNs per organization
    #[serde(default = "default_max_asns_per_org")]
    pub max_asns_per_org: usize,

    /// Cap on subdomains recorded per domain
    #[serde(default = "default_max_subdomains_per_domain")]
    pub max_subdomains_per_domain: usize,

    /// Cap on candidate IP ranges kept per ASN
    #[serde(default = "default_max_ip_ranges_per_asn")]
    pub max_ip_ranges_per_asn: usize,

    /// Cap on resolved IPs sampled for IP-to-ASN augmentation
    #[serde(default = "default_max_ip_asn_lookups")]
    pub max_ip_asn_lookups: usize,

    /// Full CIDR collapse is only attempted at or below this batch size
    #[serde(default = "default_full_collapse_limit")]
    pub full_collapse_limit: usize,

    /// Most-specific networks kept per prefix bucket above the limit
    #[serde(default = "default_bucket_sample_size")]
    pub bucket_sample_size: usize,

    /// Above this many FQDNs, cloud detection falls back to keyword scan
    #[serde(default = "default_regex_fqdn_limit")]
    pub regex_fqdn_limit: usize,

    /// Per-phase timeouts in seconds
    #[serde(default = "default_domain_phase_timeout")]
    pub domain_phase_timeout_secs: u64,
    #[serde(default = "default_asn_phase_timeout")]
    pub asn_phase_timeout_secs: u64,
    #[serde(default = "default_ip_phase_timeout")]
    pub ip_phase_timeout_secs: u64,
    #[serde(default = "default_cloud_phase_timeout")]
    pub cloud_phase_timeout_secs: u64,

    /// Requests-per-minute budget per external service
    #[serde(default = "default_rate_limits")]
    pub rate_limits_rpm: HashMap<String, u32>,

    /// Requests-per-minute for services without an explicit budget
    #[serde(default = "default_rpm")]
    pub default_rpm: u32,

    /// Relevance engine thresholds
    #[serde(default)]
    pub relevance: RelevanceConfig,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            dns_workers: default_dns_workers(),
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
            dns_timeout_ms: default_dns_timeout_ms(),
            max_iterations: default_max_iterations(),
            convergence_threshold: default_convergence_threshold(),
            min_confidence_threshold: default_min_confidence_threshold(),
            min_asn_confidence: default_min_asn_confidence(),
            max_asns_per_org: default_max_asns_per_org(),
            max_subdomains_per_domain: default_max_subdomains_per_domain(),
            max_ip_ranges_per_asn: default_max_ip_ranges_per_asn(),
            max_ip_asn_lookups: default_max_ip_asn_lookups(),
            full_collapse_limit: default_full_collapse_limit(),
            bucket_sample_size: default_bucket_sample_size(),
            regex_fqdn_limit: default_regex_fqdn_limit(),
            domain_phase_timeout_secs: default_domain_phase_timeout(),
            asn_phase_timeout_secs: default_asn_phase_timeout(),
            ip_phase_timeout_secs: default_ip_phase_timeout(),
            cloud_phase_timeout_secs: default_cloud_phase_timeout(),
            rate_limits_rpm: default_rate_limits(),
            default_rpm: default_rpm(),
            relevance: RelevanceConfig::default(),
        }
    }
}

impl ReconConfig {
    pub fn with_max_iterations(mut self, iterations: u32) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    /// Requests-per-minute budget for a service
    pub fn rpm_for(&self, service: &str) -> u32 {
        self.rate_limits_rpm
            .get(service)
            .copied()
            .unwrap_or(self.default_rpm)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }

    pub fn phase_timeout(&self, phase: &str) -> Duration {
        let secs = match phase {
            "domain_discovery" => self.domain_phase_timeout_secs,
            "asn_discovery" => self.asn_phase_timeout_secs,
            "ip_range_discovery" => self.ip_phase_timeout_secs,
            "cloud_detection" => self.cloud_phase_timeout_secs,
            _ => self.timeout_seconds,
        };
        Duration::from_secs(secs)
    }
}
