// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HackerTarget Source Adapter
 * Passive-DNS host search over the HackerTarget API
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::debug;

use crate::errors::SourceError;
use crate::http_client::HttpClient;
use crate::sources::{looks_like_fqdn, PassiveDnsSource};

const SERVICE: &str = "hackertarget";

/// Sentinel the free tier returns once the daily budget is gone
const QUOTA_SENTINEL: &str = "API count exceeded";

/// HackerTarget hostsearch adapter. Plain-text CSV, one "fqdn,ip" line
/// per record. The free tier has a small daily quota, so quota errors
/// are surfaced as a distinct variant for the per-scan circuit breaker.
pub struct HackerTargetSource {
    client: HttpClient,
    base_url: String,
}

impl HackerTargetSource {
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, "https://api.hackertarget.com")
    }

    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Extract FQDNs from the CSV body. Quota exhaustion is reported by
    /// the API inside a 200 response body.
    pub fn parse_response(body: &str) -> Result<HashSet<String>, SourceError> {
        if body.contains(QUOTA_SENTINEL) {
            return Err(SourceError::QuotaExceeded {
                service: SERVICE.to_string(),
            });
        }
        if body.to_lowercase().starts_with("error") {
            return Err(SourceError::Parse {
                service: SERVICE.to_string(),
                reason: body.lines().next().unwrap_or("error").to_string(),
            });
        }

        let mut fqdns = HashSet::new();
        for line in body.lines() {
            if let Some((fqdn, _ip)) = line.split_once(',') {
                let fqdn = fqdn.trim().to_lowercase();
                if looks_like_fqdn(&fqdn) {
                    fqdns.insert(fqdn);
                }
            }
        }
        Ok(fqdns)
    }
}

#[async_trait]
impl PassiveDnsSource for HackerTargetSource {
    async fn host_search(&self, domain: &str) -> Result<HashSet<String>, SourceError> {
        let url = format!("{}/hostsearch/?q={}", self.base_url, domain.trim());
        let response = self.client.get(&url, SERVICE).await?;

        if !response.is_success() {
            return Err(SourceError::Http {
                service: SERVICE.to_string(),
                reason: format!("HTTP {}", response.status),
            });
        }

        let fqdns = Self::parse_response(&response.body)?;
        debug!(
            "hackertarget hostsearch '{}' yielded {} FQDNs",
            domain,
            fqdns.len()
        );
        Ok(fqdns)
    }
}
