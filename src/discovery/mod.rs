// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Discovery Subsystems
 * One module per asset type: domains, ASNs, IP ranges, cloud services
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod asns;
pub mod cloud;
pub mod domains;
pub mod ip_ranges;

pub use asns::AsnDiscovery;
pub use cloud::CloudDetection;
pub use domains::DomainDiscovery;
pub use ip_ranges::IpRangeDiscovery;
