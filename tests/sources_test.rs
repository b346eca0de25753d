// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Source Adapter Integration Tests
 * Source adapters against a local mock HTTP server
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tutka_recon::config::ReconConfig;
use tutka_recon::http_client::HttpClient;
use tutka_recon::sources::{
    BgpHeSource, BgpSource, CertTransparencySource, CrtShSource, HackerTargetSource,
    PassiveDnsSource,
};

fn client() -> HttpClient {
    HttpClient::new(&ReconConfig::default()).expect("http client")
}

#[tokio::test]
async fn crtsh_search_parses_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("output", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[
                {"name_value": "www.example.com\napi.example.com", "common_name": "example.com"},
                {"name_value": "*.cdn.example.com", "common_name": null}
            ]"#,
        ))
        .mount(&server)
        .await;

    let source = CrtShSource::with_base_url(client(), server.uri());
    let fqdns = source.search("%.example.com").await.expect("search");

    assert_eq!(fqdns.len(), 4);
    assert!(fqdns.contains("www.example.com"));
    assert!(fqdns.contains("api.example.com"));
    assert!(fqdns.contains("cdn.example.com"));
    assert!(fqdns.contains("example.com"));
}

#[tokio::test]
async fn crtsh_empty_body_means_no_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let source = CrtShSource::with_base_url(client(), server.uri());
    let fqdns = source.search("%.nomatch.example").await.expect("search");
    assert!(fqdns.is_empty());
}

#[tokio::test]
async fn hackertarget_parses_csv() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hostsearch/"))
        .and(query_param("q", "example.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("www.example.com,93.184.216.34\nmail.example.com,93.184.216.35\n"),
        )
        .mount(&server)
        .await;

    let source = HackerTargetSource::with_base_url(client(), server.uri());
    let fqdns = source.host_search("example.com").await.expect("host search");

    assert_eq!(fqdns.len(), 2);
    assert!(fqdns.contains("www.example.com"));
    assert!(fqdns.contains("mail.example.com"));
}

#[tokio::test]
async fn hackertarget_reports_quota_exhaustion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hostsearch/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("API count exceeded - Increase Quota with Membership"),
        )
        .mount(&server)
        .await;

    let source = HackerTargetSource::with_base_url(client(), server.uri());
    let err = source.host_search("example.com").await.unwrap_err();
    assert!(err.is_quota_exhausted());
}

#[tokio::test]
async fn bgp_he_search_scrapes_as_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><table>
            <tr><td><a href="/AS64500">AS64500</a></td><td>ACME-NET Acme Corporation</td><td>US</td></tr>
            <tr><td><a href="/AS64501">AS64501</a></td><td>Acme Europe BV</td><td>NL</td></tr>
            </table></body></html>"#,
        ))
        .mount(&server)
        .await;

    let source = BgpHeSource::with_base_url(client(), server.uri());
    let asns = source.search_asns("acme").await.expect("search");

    assert_eq!(asns.len(), 2);
    assert_eq!(asns[0].number, 64500);
    assert_eq!(
        asns[0].description.as_deref(),
        Some("ACME-NET Acme Corporation")
    );
}

#[tokio::test]
async fn bgp_he_prefix_tables_yield_cidrs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/AS64500"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<table id="table_prefixes4"><tbody>
            <tr><td><a href="/net/198.51.100.0/24">198.51.100.0/24</a></td><td>block</td></tr>
            </tbody></table>
            <table id="table_prefixes6"><tbody>
            <tr><td><a href="/net/2001:db8::/32">2001:db8::/32</a></td><td>v6</td></tr>
            </tbody></table>"#,
        ))
        .mount(&server)
        .await;

    let source = BgpHeSource::with_base_url(client(), server.uri());
    let prefixes = source.announced_prefixes(64500).await.expect("prefixes");
    assert_eq!(prefixes, vec!["198.51.100.0/24", "2001:db8::/32"]);
}

#[tokio::test]
async fn http_client_retries_transient_failures() {
    let server = MockServer::start().await;
    // First request is throttled, the retry succeeds
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&server)
        .await;

    let response = client()
        .get(&format!("{}/flaky", server.uri()), "test-service")
        .await
        .expect("retried request");
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "recovered");
}

#[tokio::test]
async fn http_client_surfaces_rate_limit_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let mut config = ReconConfig::default();
    config.max_retries = 1;
    let client = HttpClient::new(&config).expect("http client");

    let err = client
        .get(&format!("{}/throttled", server.uri()), "test-service")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        tutka_recon::errors::SourceError::RateLimited { .. }
    ));
}
