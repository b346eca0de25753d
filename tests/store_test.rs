// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Result Store Integration Tests
 * JSON persistence round trips on a temporary directory
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::Duration;

use tutka_recon::store::{JsonFileStore, ResultStore};
use tutka_recon::types::{
    Asn, Domain, IpRange, ReconnaissanceResult, Subdomain, SubdomainStatus,
};

fn sample_result() -> ReconnaissanceResult {
    let mut result = ReconnaissanceResult::new("Acme Corporation");
    result.add_asn(
        Asn::new(64500)
            .with_description("ACME-NET Acme Corporation")
            .with_source("bgp.he.net"),
    );
    result.add_ip_range(IpRange::new("198.51.100.0/24").expect("valid cidr"));
    result.add_domain(Domain::new("acme.com"));
    result.add_subdomain(
        "acme.com",
        Subdomain::new("www.acme.com")
            .with_status(SubdomainStatus::Active)
            .with_source("domain_discovery"),
    );
    result.add_warning("sample warning");
    result.mark_completed();
    result
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path());

    let original = sample_result();
    let path = store.save(&original).expect("save");
    assert!(path.exists());

    let loaded = store.load(&path).expect("load");
    assert_eq!(loaded.target_organization, "Acme Corporation");
    assert_eq!(loaded.asns, original.asns);
    assert_eq!(loaded.ip_ranges, original.ip_ranges);
    assert_eq!(loaded.warnings, original.warnings);
    assert_eq!(loaded.total_subdomain_count(), 1);
    assert!(loaded.scan_completed.is_some());
}

#[test]
fn find_recent_returns_fresh_result() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path());
    store.save(&sample_result()).expect("save");

    let found = store
        .find_recent("Acme Corporation", Duration::hours(1))
        .expect("find");
    assert!(found.is_some());
    assert_eq!(found.unwrap().target_organization, "Acme Corporation");

    // Another organization's slug never matches
    let other = store
        .find_recent("Globex Industrial", Duration::hours(1))
        .expect("find");
    assert!(other.is_none());
}

#[test]
fn find_recent_respects_max_age() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path());
    store.save(&sample_result()).expect("save");

    let stale = store
        .find_recent("Acme Corporation", Duration::seconds(-1))
        .expect("find");
    assert!(stale.is_none());
}

#[test]
fn find_recent_on_missing_directory_is_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path().join("never-created"));
    let found = store
        .find_recent("Acme Corporation", Duration::hours(1))
        .expect("find");
    assert!(found.is_none());
}

#[test]
fn ignores_corrupt_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path());
    std::fs::write(dir.path().join("acme_corporation_garbage.json"), "{not json")
        .expect("write");
    store.save(&sample_result()).expect("save");

    let found = store
        .find_recent("Acme Corporation", Duration::hours(1))
        .expect("find");
    assert!(found.is_some());
}
