// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Data Sources
 * Pluggable adapters for public reconnaissance data
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::net::IpAddr;

use crate::errors::SourceError;
use crate::types::Asn;

pub mod bgp_he;
pub mod crtsh;
pub mod hackertarget;
pub mod irr;

pub use bgp_he::BgpHeSource;
pub use crtsh::CrtShSource;
pub use hackertarget::HackerTargetSource;
pub use irr::RadbWhoisSource;

/// Structural FQDN shape: dot-separated labels ending in an alphabetic
/// TLD of 2+ chars. Filters parser noise, not a full RFC validation.
static FQDN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9.-]*\.[a-zA-Z]{2,}$").unwrap());

/// True when a candidate string is shaped like an FQDN
pub fn looks_like_fqdn(candidate: &str) -> bool {
    FQDN_RE.is_match(candidate)
}

/// Certificate-transparency search: query -> FQDNs seen in issued
/// certificates.
#[async_trait]
pub trait CertTransparencySource: Send + Sync {
    /// Query may be a bare domain, a wildcard pattern ("%.example.com")
    /// or an organization name.
    async fn search(&self, query: &str) -> Result<HashSet<String>, SourceError>;
}

/// Passive-DNS search: domain -> historically observed host names.
/// Implementations signal `SourceError::QuotaExceeded` when the upstream
/// reports an exhausted query budget so the scan can stop asking.
#[async_trait]
pub trait PassiveDnsSource: Send + Sync {
    async fn host_search(&self, domain: &str) -> Result<HashSet<String>, SourceError>;
}

/// BGP looking-glass: keyword search over AS registrations, announced
/// prefixes per ASN, and IP-to-origin-ASN lookup.
#[async_trait]
pub trait BgpSource: Send + Sync {
    async fn search_asns(&self, term: &str) -> Result<Vec<Asn>, SourceError>;

    /// Announced prefixes for an ASN, as CIDR strings (v4 and v6)
    async fn announced_prefixes(&self, asn: u32) -> Result<Vec<String>, SourceError>;

    /// Origin ASN announcing the most specific route covering an IP
    async fn asn_for_ip(&self, ip: IpAddr) -> Result<Option<Asn>, SourceError>;
}

/// Internet Routing Registry: route objects registered for an origin
/// ASN.
#[async_trait]
pub trait IrrSource: Send + Sync {
    async fn routes_for_asn(&self, asn: u32) -> Result<Vec<String>, SourceError>;
}
