// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka DNS Resolver
 * Cached A/AAAA resolution with status classification
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{ResolveError, TokioResolver};
use moka::future::Cache;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

use crate::errors::SourceError;
use crate::types::SubdomainStatus;

/// Default TTL for cached resolutions (5 minutes)
const DEFAULT_DNS_TTL: u64 = 300;

/// Default maximum cache size
const DEFAULT_MAX_CAPACITY: u64 = 10000;

/// Outcome of resolving one FQDN
#[derive(Debug, Clone)]
pub struct Resolution {
    pub status: SubdomainStatus,
    pub addresses: Vec<IpAddr>,
}

impl Resolution {
    pub fn active(addresses: Vec<IpAddr>) -> Self {
        Self {
            status: SubdomainStatus::Active,
            addresses,
        }
    }

    pub fn inactive() -> Self {
        Self {
            status: SubdomainStatus::Inactive,
            addresses: Vec::new(),
        }
    }

    pub fn unknown() -> Self {
        Self {
            status: SubdomainStatus::Unknown,
            addresses: Vec::new(),
        }
    }
}

/// DNS collaborator seam. Production uses hickory; tests substitute
/// fixture resolvers.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Resolve A/AAAA for an FQDN. Never errors: failures are encoded in
    /// the resolution status (Inactive for NXDOMAIN/no records, Unknown
    /// for timeouts and server failures).
    async fn resolve(&self, fqdn: &str) -> Resolution;
}

/// Hickory-backed resolver with a moka TTL cache in front of it.
pub struct HickoryDnsResolver {
    resolver: TokioResolver,
    cache: Cache<String, Resolution>,
    timeout: Duration,
}

impl HickoryDnsResolver {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let resolver = TokioResolver::builder(TokioConnectionProvider::default())
            .map_err(|e| SourceError::Dns {
                fqdn: String::new(),
                reason: format!("resolver init failed: {}", e),
            })?
            .build();

        let cache = Cache::builder()
            .max_capacity(DEFAULT_MAX_CAPACITY)
            .time_to_live(Duration::from_secs(DEFAULT_DNS_TTL))
            .build();

        Ok(Self {
            resolver,
            cache,
            timeout,
        })
    }

    async fn lookup(&self, fqdn: &str) -> Resolution {
        match tokio::time::timeout(self.timeout, self.resolver.lookup_ip(fqdn)).await {
            Err(_) => {
                debug!("DNS timeout for {}", fqdn);
                Resolution::unknown()
            }
            Ok(Ok(lookup)) => {
                let addresses: Vec<IpAddr> = lookup.iter().collect();
                if addresses.is_empty() {
                    Resolution::inactive()
                } else {
                    Resolution::active(addresses)
                }
            }
            Ok(Err(e)) => {
                let resolution = classify_failure(&e);
                if resolution.status == SubdomainStatus::Unknown {
                    debug!("DNS lookup failed for {}: {}", fqdn, e);
                }
                resolution
            }
        }
    }
}

/// NXDOMAIN and empty answers mean the name does not exist; anything
/// else (SERVFAIL, connection trouble) is unknown. Matches on the typed
/// error kind, not the rendered message.
fn classify_failure(e: &ResolveError) -> Resolution {
    if e.is_nx_domain() || e.is_no_records_found() {
        Resolution::inactive()
    } else {
        Resolution::unknown()
    }
}

#[async_trait]
impl DnsResolver for HickoryDnsResolver {
    async fn resolve(&self, fqdn: &str) -> Resolution {
        let key = fqdn.trim().to_lowercase();
        if let Some(cached) = self.cache.get(&key).await {
            debug!("DNS cache hit for {}", key);
            return cached;
        }

        let resolution = self.lookup(&key).await;
        // Unknowns are transient; only cache definitive answers
        if resolution.status != SubdomainStatus::Unknown {
            self.cache.insert(key, resolution.clone()).await;
        }
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_resolver::proto::op::{Query, ResponseCode};
    use hickory_resolver::proto::rr::{Name, RecordType};
    use hickory_resolver::proto::{ProtoError, ProtoErrorKind};

    fn no_records_error(response_code: ResponseCode) -> ResolveError {
        let query = Query::query(
            Name::from_ascii("gone.example.com.").unwrap(),
            RecordType::A,
        );
        ResolveError::from(ProtoError::from(ProtoErrorKind::NoRecordsFound {
            query: Box::new(query),
            soa: None,
            ns: None,
            negative_ttl: None,
            response_code,
            trusted: false,
            authorities: None,
        }))
    }

    #[test]
    fn test_failure_classification_uses_typed_errors() {
        let nxdomain = no_records_error(ResponseCode::NXDomain);
        assert_eq!(classify_failure(&nxdomain).status, SubdomainStatus::Inactive);

        // NoError with an empty answer section: the name exists but
        // yields nothing for this record type
        let empty = no_records_error(ResponseCode::NoError);
        assert_eq!(classify_failure(&empty).status, SubdomainStatus::Inactive);

        let transient = ResolveError::from("connection refused");
        assert_eq!(classify_failure(&transient).status, SubdomainStatus::Unknown);
    }

    #[test]
    fn test_resolution_constructors() {
        let active = Resolution::active(vec!["192.0.2.1".parse().unwrap()]);
        assert_eq!(active.status, SubdomainStatus::Active);
        assert_eq!(active.addresses.len(), 1);

        assert_eq!(Resolution::inactive().status, SubdomainStatus::Inactive);
        assert!(Resolution::unknown().addresses.is_empty());
    }

    #[tokio::test]
    async fn test_localhost_resolution() {
        let resolver = HickoryDnsResolver::new(Duration::from_secs(2)).unwrap();
        let resolution = resolver.resolve("localhost").await;
        // localhost resolves on any sane system; at worst it is unknown,
        // never a panic
        if resolution.status == SubdomainStatus::Active {
            assert!(!resolution.addresses.is_empty());
        }
    }
}
