// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - crt.sh Source Adapter
 * Certificate-transparency search over the crt.sh JSON API
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

use crate::errors::SourceError;
use crate::http_client::HttpClient;
use crate::sources::{looks_like_fqdn, CertTransparencySource};

const SERVICE: &str = "crt.sh";

#[derive(Debug, Deserialize)]
struct CrtShEntry {
    #[serde(default)]
    name_value: String,
    #[serde(default)]
    common_name: Option<String>,
}

/// crt.sh adapter. One JSON query returns every certificate whose
/// identity matches; `name_value` packs multiple SAN entries separated
/// by newlines.
pub struct CrtShSource {
    client: HttpClient,
    base_url: String,
}

impl CrtShSource {
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, "https://crt.sh")
    }

    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Extract candidate FQDNs from a crt.sh JSON body.
    pub fn parse_response(body: &str) -> Result<HashSet<String>, SourceError> {
        let entries: Vec<CrtShEntry> =
            serde_json::from_str(body).map_err(|e| SourceError::Parse {
                service: SERVICE.to_string(),
                reason: e.to_string(),
            })?;

        let mut fqdns = HashSet::new();
        for entry in entries {
            let names = entry
                .name_value
                .split('\n')
                .chain(entry.common_name.as_deref());
            for name in names {
                let name = name.trim().trim_start_matches("*.").to_lowercase();
                if looks_like_fqdn(&name) {
                    fqdns.insert(name);
                }
            }
        }
        Ok(fqdns)
    }
}

#[async_trait]
impl CertTransparencySource for CrtShSource {
    async fn search(&self, query: &str) -> Result<HashSet<String>, SourceError> {
        let url = format!(
            "{}/?q={}&output=json",
            self.base_url,
            urlencoding_encode(query)
        );
        let response = self.client.get(&url, SERVICE).await?;

        if !response.is_success() {
            return Err(SourceError::Http {
                service: SERVICE.to_string(),
                reason: format!("HTTP {}", response.status),
            });
        }

        // crt.sh returns an empty body for zero matches
        if response.body.trim().is_empty() {
            return Ok(HashSet::new());
        }

        let fqdns = Self::parse_response(&response.body)?;
        debug!("crt.sh query '{}' yielded {} FQDNs", query, fqdns.len());
        Ok(fqdns)
    }
}

/// Minimal percent-encoding for the query component; crt.sh accepts
/// '%' (wildcard) and '.' literally.
fn urlencoding_encode(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for ch in query.chars() {
        match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' | '%' => out.push(ch),
            ' ' => out.push_str("+"),
            other => {
                let mut buf = [0u8; 4];
                for byte in other.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = r#"[
            {"name_value": "www.example.com\napi.example.com", "common_name": "example.com"},
            {"name_value": "*.cdn.example.com", "common_name": null}
        ]"#;
        let fqdns = CrtShSource::parse_response(body).unwrap();
        assert!(fqdns.contains("www.example.com"));
        assert!(fqdns.contains("api.example.com"));
        assert!(fqdns.contains("example.com"));
        // Wildcard prefix stripped
        assert!(fqdns.contains("cdn.example.com"));
        assert_eq!(fqdns.len(), 4);
    }

    #[test]
    fn test_parse_drops_noise() {
        let body = r#"[{"name_value": "not a domain\nexample.com", "common_name": null}]"#;
        let fqdns = CrtShSource::parse_response(body).unwrap();
        assert_eq!(fqdns.len(), 1);
        assert!(fqdns.contains("example.com"));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(CrtShSource::parse_response("<html>busy</html>").is_err());
    }

    #[test]
    fn test_query_encoding() {
        assert_eq!(urlencoding_encode("%.example.com"), "%.example.com");
        assert_eq!(urlencoding_encode("Acme Corp"), "Acme+Corp");
    }
}
