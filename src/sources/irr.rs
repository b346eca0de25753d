// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - IRR Source Adapter
 * Route objects from the RADB whois service
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::errors::SourceError;
use crate::sources::IrrSource;

const WHOIS_HOST: &str = "whois.radb.net";
const WHOIS_TIMEOUT: Duration = Duration::from_secs(30);

/// RADB whois adapter. Shells out to the system `whois` binary with an
/// inverse-origin query; a missing binary or a slow server is a
/// recoverable source failure, never fatal to the scan.
pub struct RadbWhoisSource {
    host: String,
}

impl RadbWhoisSource {
    pub fn new() -> Self {
        Self {
            host: WHOIS_HOST.to_string(),
        }
    }

    /// Extract CIDR strings from `route:` / `route6:` attribute lines.
    pub fn parse_routes(output: &str) -> Vec<String> {
        let mut routes = Vec::new();
        for line in output.lines() {
            let line = line.trim();
            let value = line
                .strip_prefix("route:")
                .or_else(|| line.strip_prefix("route6:"));
            if let Some(value) = value {
                let cidr = value.trim().to_string();
                if cidr.parse::<ipnet::IpNet>().is_ok() && !routes.contains(&cidr) {
                    routes.push(cidr);
                }
            }
        }
        routes
    }
}

impl Default for RadbWhoisSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IrrSource for RadbWhoisSource {
    async fn routes_for_asn(&self, asn: u32) -> Result<Vec<String>, SourceError> {
        let query = format!("-i origin AS{}", asn);
        let child = Command::new("whois")
            .arg("-h")
            .arg(&self.host)
            .arg("--")
            .arg(&query)
            .output();

        let output = tokio::time::timeout(WHOIS_TIMEOUT, child)
            .await
            .map_err(|_| SourceError::Timeout {
                service: "whois.radb.net".to_string(),
                timeout: WHOIS_TIMEOUT,
            })?
            .map_err(|e| SourceError::Subprocess {
                command: "whois".to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() && output.stdout.is_empty() {
            return Err(SourceError::Subprocess {
                command: "whois".to_string(),
                reason: format!("exit status {}", output.status),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let routes = Self::parse_routes(&stdout);
        debug!("RADB lists {} route objects for AS{}", routes.len(), asn);
        Ok(routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes() {
        let output = "\
route:      198.51.100.0/24\n\
descr:      ACME-NET\n\
origin:     AS64500\n\
\n\
route6:     2001:db8::/32\n\
origin:     AS64500\n\
mnt-by:     MAINT-ACME\n";
        let routes = RadbWhoisSource::parse_routes(output);
        assert_eq!(routes, vec!["198.51.100.0/24", "2001:db8::/32"]);
    }

    #[test]
    fn test_parse_routes_skips_invalid() {
        let output = "route:  not-a-cidr\nroute:  198.51.100.0/24\nroute:  198.51.100.0/24\n";
        let routes = RadbWhoisSource::parse_routes(output);
        assert_eq!(routes, vec!["198.51.100.0/24"]);
    }

    #[test]
    fn test_parse_routes_empty() {
        assert!(RadbWhoisSource::parse_routes("").is_empty());
        assert!(RadbWhoisSource::parse_routes("% no entries found").is_empty());
    }
}
