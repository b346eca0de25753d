// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Asset Model
 * Identity-keyed asset records and the scan aggregate
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::ReconError;

/// Autonomous system record. Identity key is the ASN number; descriptive
/// fields are first-write-wins when merged into the aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asn {
    pub number: u32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub data_source: Option<String>,
}

impl Asn {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            name: None,
            description: None,
            country: None,
            data_source: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = Some(source.into());
        self
    }
}

impl PartialEq for Asn {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

impl Eq for Asn {}

impl Hash for Asn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.number.hash(state);
    }
}

/// IP version of a network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    V4,
    V6,
}

/// An announced or registered IP network. Identity key is the CIDR string
/// as written; callers normalize before comparing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpRange {
    pub cidr: String,
    pub version: IpVersion,
    pub asn: Option<u32>,
    pub asn_description: Option<String>,
    pub country: Option<String>,
    pub data_source: Option<String>,
}

impl IpRange {
    /// Parse and validate a CIDR string. The version is derived from the
    /// parsed address family, never trusted from the caller.
    pub fn new(cidr: &str) -> Result<Self, ReconError> {
        let net = ipnet::IpNet::from_str(cidr).map_err(|e| ReconError::InvalidCidr {
            cidr: cidr.to_string(),
            reason: e.to_string(),
        })?;
        let version = match net {
            ipnet::IpNet::V4(_) => IpVersion::V4,
            ipnet::IpNet::V6(_) => IpVersion::V6,
        };
        Ok(Self {
            cidr: cidr.to_string(),
            version,
            asn: None,
            asn_description: None,
            country: None,
            data_source: None,
        })
    }

    pub fn with_asn(mut self, asn: u32) -> Self {
        self.asn = Some(asn);
        self
    }

    pub fn with_asn_description(mut self, description: impl Into<String>) -> Self {
        self.asn_description = Some(description.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = Some(source.into());
        self
    }

    /// Parsed network form of the CIDR. Always succeeds because the
    /// constructor validated the string.
    pub fn network(&self) -> Option<ipnet::IpNet> {
        ipnet::IpNet::from_str(&self.cidr).ok()
    }
}

impl PartialEq for IpRange {
    fn eq(&self, other: &Self) -> bool {
        self.cidr == other.cidr
    }
}

impl Eq for IpRange {}

impl Hash for IpRange {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cidr.hash(state);
    }
}

/// DNS resolution status of a subdomain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubdomainStatus {
    Active,
    Inactive,
    Unknown,
}

/// A discovered host name, owned exclusively by its parent Domain.
/// Identity key is the lowercased FQDN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subdomain {
    pub fqdn: String,
    pub status: SubdomainStatus,
    pub resolved_ips: BTreeSet<String>,
    pub data_source: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl Subdomain {
    pub fn new(fqdn: &str) -> Self {
        Self {
            fqdn: fqdn.trim().to_lowercase(),
            status: SubdomainStatus::Unknown,
            resolved_ips: BTreeSet::new(),
            data_source: None,
            last_checked: None,
        }
    }

    pub fn with_status(mut self, status: SubdomainStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_ips(mut self, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        self.resolved_ips = ips.into_iter().map(|ip| ip.to_string()).collect();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = Some(source.into());
        self
    }

    pub fn checked_now(mut self) -> Self {
        self.last_checked = Some(Utc::now());
        self
    }
}

impl PartialEq for Subdomain {
    fn eq(&self, other: &Self) -> bool {
        self.fqdn == other.fqdn
    }
}

impl Eq for Subdomain {}

impl Hash for Subdomain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fqdn.hash(state);
    }
}

/// A registrable domain and the subdomains found under it.
/// Identity key is the domain name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub registrar: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub subdomains: HashSet<Subdomain>,
    pub data_source: Option<String>,
}

impl Domain {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            registrar: None,
            creation_date: None,
            subdomains: HashSet::new(),
            data_source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = Some(source.into());
        self
    }

    pub fn with_subdomains(mut self, subdomains: impl IntoIterator<Item = Subdomain>) -> Self {
        self.subdomains = subdomains.into_iter().collect();
        self
    }

    pub fn active_subdomain_count(&self) -> usize {
        self.subdomains
            .iter()
            .filter(|s| s.status == SubdomainStatus::Active)
            .count()
    }
}

impl PartialEq for Domain {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Domain {}

impl Hash for Domain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// A detected cloud/CDN footprint entry. Identity key is
/// (provider, identifier).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudService {
    pub provider: String,
    pub identifier: String,
    pub resource_type: Option<String>,
    pub region: Option<String>,
    pub status: Option<String>,
    pub data_source: Option<String>,
}

impl CloudService {
    pub fn new(provider: &str, identifier: &str) -> Self {
        Self {
            provider: provider.to_string(),
            identifier: identifier.to_string(),
            resource_type: None,
            region: None,
            status: None,
            data_source: None,
        }
    }

    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = Some(source.into());
        self
    }
}

impl PartialEq for CloudService {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider && self.identifier == other.identifier
    }
}

impl Eq for CloudService {}

impl Hash for CloudService {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.identifier.hash(state);
    }
}

/// Aggregate root for one reconnaissance scan. Every collection is keyed
/// by a stable natural identity so repeated discovery of the same asset
/// from multiple sources collapses to one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnaissanceResult {
    pub target_organization: String,
    pub asns: HashSet<Asn>,
    pub ip_ranges: HashSet<IpRange>,
    pub domains: HashMap<String, Domain>,
    pub cloud_services: HashSet<CloudService>,
    pub warnings: Vec<String>,
    pub scan_started: DateTime<Utc>,
    pub scan_completed: Option<DateTime<Utc>>,
}

impl ReconnaissanceResult {
    pub fn new(target_organization: &str) -> Self {
        Self {
            target_organization: target_organization.to_string(),
            asns: HashSet::new(),
            ip_ranges: HashSet::new(),
            domains: HashMap::new(),
            cloud_services: HashSet::new(),
            warnings: Vec::new(),
            scan_started: Utc::now(),
            scan_completed: None,
        }
    }

    /// Insert an ASN. First-write-wins: re-adding the same number is a
    /// no-op. Returns true when the ASN was new.
    pub fn add_asn(&mut self, asn: Asn) -> bool {
        self.asns.insert(asn)
    }

    /// Insert an IP range, keyed by its CIDR string.
    pub fn add_ip_range(&mut self, range: IpRange) -> bool {
        self.ip_ranges.insert(range)
    }

    /// Insert a domain, merging subdomains into an existing entry of the
    /// same name instead of creating a duplicate.
    pub fn add_domain(&mut self, domain: Domain) {
        match self.domains.get_mut(&domain.name) {
            Some(existing) => {
                for sub in domain.subdomains {
                    existing.subdomains.insert(sub);
                }
            }
            None => {
                self.domains.insert(domain.name.clone(), domain);
            }
        }
    }

    /// Attach a subdomain to its parent domain, creating the parent on
    /// demand if absent.
    pub fn add_subdomain(&mut self, parent_name: &str, subdomain: Subdomain) {
        let parent = parent_name.trim().to_lowercase();
        self.domains
            .entry(parent.clone())
            .or_insert_with(|| Domain::new(&parent))
            .subdomains
            .insert(subdomain);
    }

    pub fn add_cloud_service(&mut self, service: CloudService) -> bool {
        self.cloud_services.insert(service)
    }

    /// Record a warning. Idempotent: duplicate messages are dropped.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.warnings.contains(&message) {
            self.warnings.push(message);
        }
    }

    pub fn total_subdomain_count(&self) -> usize {
        self.domains.values().map(|d| d.subdomains.len()).sum()
    }

    /// Total asset count across all collections, used by the convergence
    /// measurement.
    pub fn total_asset_count(&self) -> usize {
        self.asns.len()
            + self.ip_ranges.len()
            + self.domains.len()
            + self.total_subdomain_count()
            + self.cloud_services.len()
    }

    /// Every resolved IP address recorded across all subdomains.
    pub fn resolved_ips(&self) -> Vec<IpAddr> {
        let mut ips: Vec<IpAddr> = Vec::new();
        for domain in self.domains.values() {
            for sub in &domain.subdomains {
                for raw in &sub.resolved_ips {
                    if let Ok(ip) = raw.parse::<IpAddr>() {
                        if !ips.contains(&ip) {
                            ips.push(ip);
                        }
                    }
                }
            }
        }
        ips
    }

    /// All FQDNs in the result: domain names plus subdomain names.
    pub fn all_fqdns(&self) -> Vec<String> {
        let mut fqdns: Vec<String> = Vec::new();
        for domain in self.domains.values() {
            fqdns.push(domain.name.clone());
            for sub in &domain.subdomains {
                fqdns.push(sub.fqdn.clone());
            }
        }
        fqdns
    }

    pub fn mark_completed(&mut self) {
        self.scan_completed = Some(Utc::now());
    }
}

/// Thread-safe handle to the scan aggregate. Discovery subsystems write
/// concurrently through this handle; a single coarse lock guards the
/// whole aggregate since domain-merge is not atomic set insertion.
#[derive(Clone)]
pub struct SharedResult {
    inner: Arc<Mutex<ReconnaissanceResult>>,
}

impl SharedResult {
    pub fn new(target_organization: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ReconnaissanceResult::new(target_organization))),
        }
    }

    pub fn add_asn(&self, asn: Asn) -> bool {
        self.inner.lock().add_asn(asn)
    }

    pub fn add_ip_range(&self, range: IpRange) -> bool {
        self.inner.lock().add_ip_range(range)
    }

    pub fn add_domain(&self, domain: Domain) {
        self.inner.lock().add_domain(domain)
    }

    pub fn add_subdomain(&self, parent_name: &str, subdomain: Subdomain) {
        self.inner.lock().add_subdomain(parent_name, subdomain)
    }

    pub fn add_cloud_service(&self, service: CloudService) -> bool {
        self.inner.lock().add_cloud_service(service)
    }

    pub fn add_warning(&self, message: impl Into<String>) {
        self.inner.lock().add_warning(message)
    }

    pub fn total_asset_count(&self) -> usize {
        self.inner.lock().total_asset_count()
    }

    pub fn asns(&self) -> Vec<Asn> {
        self.inner.lock().asns.iter().cloned().collect()
    }

    pub fn ip_ranges(&self) -> Vec<IpRange> {
        self.inner.lock().ip_ranges.iter().cloned().collect()
    }

    pub fn all_fqdns(&self) -> Vec<String> {
        self.inner.lock().all_fqdns()
    }

    pub fn resolved_ips(&self) -> Vec<IpAddr> {
        self.inner.lock().resolved_ips()
    }

    /// Point-in-time copy of the aggregate
    pub fn snapshot(&self) -> ReconnaissanceResult {
        self.inner.lock().clone()
    }

    /// Consume the handle, returning the aggregate. Falls back to a clone
    /// when other handles are still alive.
    pub fn into_result(self) -> ReconnaissanceResult {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner(),
            Err(arc) => arc.lock().clone(),
        }
    }
}
