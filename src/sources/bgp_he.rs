// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - BGP Looking-Glass Source Adapter
 * HTML scraping of bgp.he.net search, prefix and IP pages
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::net::IpAddr;
use tracing::debug;

use crate::errors::SourceError;
use crate::http_client::HttpClient;
use crate::sources::BgpSource;
use crate::types::Asn;

const SERVICE: &str = "bgp.he.net";

static ANCHOR_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static TD_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static PREFIX4_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table#table_prefixes4 a[href]").unwrap());
static PREFIX6_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table#table_prefixes6 a[href]").unwrap());

static AS_HREF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/AS(\d+)$").unwrap());

/// bgp.he.net adapter. No API, only HTML pages: a keyword search over
/// AS registrations, per-ASN prefix tables, and per-IP route pages.
pub struct BgpHeSource {
    client: HttpClient,
    base_url: String,
}

impl BgpHeSource {
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, "https://bgp.he.net")
    }

    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn element_text(element: ElementRef) -> String {
        element.text().collect::<String>().trim().to_string()
    }

    /// Parse AS anchors out of a search-result page. The description is
    /// taken from the longest sibling cell in the anchor's table row.
    pub fn parse_search(html: &str, source: &str) -> Vec<Asn> {
        let doc = Html::parse_document(html);
        let mut asns = Vec::new();

        for anchor in doc.select(&ANCHOR_SEL) {
            let href = anchor.value().attr("href").unwrap_or("");
            let number = match AS_HREF_RE
                .captures(href)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
            {
                Some(n) => n,
                None => continue,
            };

            // Walk up to the enclosing row for the descriptive cells
            let mut description = String::new();
            for ancestor in anchor.ancestors() {
                let is_row = ancestor
                    .value()
                    .as_element()
                    .map(|e| e.name() == "tr")
                    .unwrap_or(false);
                if !is_row {
                    continue;
                }
                if let Some(row) = ElementRef::wrap(ancestor) {
                    for cell in row.select(&TD_SEL) {
                        let text = Self::element_text(cell);
                        // Skip the cell holding the AS link itself
                        if text.len() > 2
                            && text.starts_with("AS")
                            && text[2..].chars().all(|c| c.is_ascii_digit())
                        {
                            continue;
                        }
                        if text.len() > description.len() {
                            description = text;
                        }
                    }
                }
                break;
            }

            let mut asn = Asn::new(number).with_source(source);
            if !description.is_empty() {
                asn = asn.with_description(description);
            }
            if asns.iter().all(|existing: &Asn| existing.number != number) {
                asns.push(asn);
            }
        }

        asns
    }

    /// Parse announced CIDRs from an AS page's v4/v6 prefix tables.
    pub fn parse_prefixes(html: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        let mut prefixes = Vec::new();

        for selector in [&*PREFIX4_SEL, &*PREFIX6_SEL] {
            for anchor in doc.select(selector) {
                let text = Self::element_text(anchor);
                if text.contains('/') && text.parse::<ipnet::IpNet>().is_ok() {
                    if !prefixes.contains(&text) {
                        prefixes.push(text);
                    }
                }
            }
        }

        prefixes
    }

    /// First origin-AS link on an IP route page.
    pub fn parse_ip_page(html: &str, source: &str) -> Option<Asn> {
        let doc = Html::parse_document(html);
        for anchor in doc.select(&ANCHOR_SEL) {
            let href = anchor.value().attr("href").unwrap_or("");
            if let Some(number) = AS_HREF_RE
                .captures(href)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
            {
                let title = anchor
                    .value()
                    .attr("title")
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty());
                let mut asn = Asn::new(number).with_source(source);
                if let Some(title) = title {
                    asn = asn.with_description(title);
                }
                return Some(asn);
            }
        }
        None
    }
}

#[async_trait]
impl BgpSource for BgpHeSource {
    async fn search_asns(&self, term: &str) -> Result<Vec<Asn>, SourceError> {
        let url = format!(
            "{}/search?search%5Bsearch%5D={}&commit=Search",
            self.base_url,
            term.trim().replace(' ', "+")
        );
        let response = self.client.get(&url, SERVICE).await?;
        if !response.is_success() {
            return Err(SourceError::Http {
                service: SERVICE.to_string(),
                reason: format!("HTTP {}", response.status),
            });
        }

        let asns = Self::parse_search(&response.body, SERVICE);
        debug!("bgp.he.net search '{}' yielded {} ASNs", term, asns.len());
        Ok(asns)
    }

    async fn announced_prefixes(&self, asn: u32) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/AS{}", self.base_url, asn);
        let response = self.client.get(&url, SERVICE).await?;
        if !response.is_success() {
            return Err(SourceError::Http {
                service: SERVICE.to_string(),
                reason: format!("HTTP {}", response.status),
            });
        }

        let prefixes = Self::parse_prefixes(&response.body);
        debug!("AS{} announces {} prefixes", asn, prefixes.len());
        Ok(prefixes)
    }

    async fn asn_for_ip(&self, ip: IpAddr) -> Result<Option<Asn>, SourceError> {
        let url = format!("{}/ip/{}", self.base_url, ip);
        let response = self.client.get(&url, SERVICE).await?;
        if !response.is_success() {
            return Err(SourceError::Http {
                service: SERVICE.to_string(),
                reason: format!("HTTP {}", response.status),
            });
        }
        Ok(Self::parse_ip_page(&response.body, SERVICE))
    }
}
