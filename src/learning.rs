// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Learning Module
 * Extracts organization vocabulary from discovered assets between
 * iterations
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::config::ReconConfig;
use crate::relevance::{
    longest_common_substring_len, normalize, organization_match_score, organization_root,
    root_label,
};
use crate::types::ReconnaissanceResult;

/// Single generic words that never identify an organization
const GENERIC_SINGLE_WORDS: &[&str] = &[
    "internet", "network", "networks", "hosting", "datacenter", "telecom",
    "broadband", "communications", "backbone", "transit", "global", "services",
    "solutions", "systems", "technologies", "enterprise", "cloud", "digital",
];

/// Generic two-word combinations that look like names but identify
/// nothing
const GENERIC_COMBINATIONS: &[&str] = &[
    "internet services", "network solutions", "data center", "web hosting",
    "cloud services", "managed services", "internet exchange", "network services",
];

/// Accumulated organization vocabulary, owned by the orchestrator's
/// control loop and only written between iterations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationIntelligence {
    pub organization_names: HashSet<String>,
    pub confidence_scores: HashMap<String, f64>,
    pub asn_descriptions: HashSet<String>,
}

impl OrganizationIntelligence {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Learns candidate organization names from ASN descriptions and domain
/// roots. Every candidate is grounded against the original target
/// organization name, which is what prevents topic drift across
/// iterations.
pub struct LearningModule {
    config: Arc<ReconConfig>,
}

impl LearningModule {
    pub fn new(config: Arc<ReconConfig>) -> Self {
        Self { config }
    }

    /// Inspect the result and fold new names into the intelligence.
    /// Returns the names added this round.
    pub fn learn(
        &self,
        result: &ReconnaissanceResult,
        target_org: &str,
        intelligence: &mut OrganizationIntelligence,
    ) -> Vec<String> {
        let mut added: Vec<String> = Vec::new();

        for asn in &result.asns {
            let description = match &asn.description {
                Some(d) if !d.trim().is_empty() => d.clone(),
                _ => continue,
            };
            intelligence.asn_descriptions.insert(description.clone());

            for fragment in extract_capitalized_sequences(&description) {
                if self.admit(
                    &fragment,
                    target_org,
                    self.config.relevance.learning_grounding_ratio,
                    intelligence,
                ) {
                    added.push(fragment);
                }
            }
        }

        // Domain roots get the stricter gate: a root label is a single
        // token with no context, so weak similarity is mostly noise
        for name in result.domains.keys() {
            if let Some(root) = root_label(name) {
                if self.admit(
                    &root,
                    target_org,
                    self.config.relevance.domain_root_grounding_ratio,
                    intelligence,
                ) {
                    added.push(root);
                }
            }
        }

        if !added.is_empty() {
            debug!("Learned {} new organization names", added.len());
        }
        added
    }

    /// Validate, ground and record one candidate name. Returns true when
    /// the name is new and accepted.
    fn admit(
        &self,
        candidate: &str,
        target_org: &str,
        grounding_ratio: f64,
        intelligence: &mut OrganizationIntelligence,
    ) -> bool {
        let normalized = normalize(candidate);
        if !(2..=50).contains(&normalized.chars().count()) {
            return false;
        }
        if !is_meaningful_organization_name(&normalized) {
            return false;
        }
        if !grounded_to_target(&normalized, target_org, grounding_ratio) {
            return false;
        }
        if intelligence.organization_names.contains(&normalized) {
            return false;
        }

        let score = organization_match_score(&normalized, target_org)
            .max(self.config.min_confidence_threshold);
        intelligence.organization_names.insert(normalized.clone());
        intelligence.confidence_scores.insert(normalized, score);
        true
    }
}

/// Runs of consecutive capitalized words in a description, the usual
/// shape of embedded organization names. All-caps network tags like
/// "ACME-NET" form their own runs, separate from title-case names.
pub fn extract_capitalized_sequences(text: &str) -> Vec<String> {
    #[derive(PartialEq)]
    enum Style {
        AllCaps,
        TitleCase,
    }

    let mut sequences: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_style: Option<Style> = None;

    let mut flush = |run: &mut Vec<&str>| {
        if !run.is_empty() {
            sequences.push(run.join(" "));
            run.clear();
        }
    };

    for word in text.split_whitespace() {
        let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric());
        let capitalized = trimmed
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false);
        if !capitalized {
            flush(&mut current);
            current_style = None;
            continue;
        }
        let style = if trimmed.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase()) {
            Style::AllCaps
        } else {
            Style::TitleCase
        };
        if current_style.as_ref().map(|s| *s != style).unwrap_or(false) {
            flush(&mut current);
        }
        current.push(trimmed);
        current_style = Some(style);
    }
    flush(&mut current);

    sequences.retain(|s| !s.is_empty());
    sequences
}

/// Rejects single generic words and known generic word pairs.
pub fn is_meaningful_organization_name(name: &str) -> bool {
    let normalized = normalize(name);
    if normalized.is_empty() {
        return false;
    }
    let word_count = normalized.split_whitespace().count();
    if word_count == 1 && GENERIC_SINGLE_WORDS.contains(&normalized.as_str()) {
        return false;
    }
    if GENERIC_COMBINATIONS.contains(&normalized.as_str()) {
        return false;
    }
    true
}

/// Ground a learned name against the original target: substring
/// containment in either direction, or a common substring covering at
/// least `ratio` of the target root.
pub fn grounded_to_target(candidate: &str, target_org: &str, ratio: f64) -> bool {
    let cand = normalize(candidate).replace(' ', "");
    let target = organization_root(target_org).replace(' ', "");
    if cand.is_empty() || target.is_empty() {
        return false;
    }
    if cand.contains(&target) || target.contains(&cand) {
        return true;
    }
    let shared = longest_common_substring_len(&cand, &target);
    shared as f64 >= ratio * target.chars().count() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Asn, Domain};

    fn module() -> LearningModule {
        LearningModule::new(Arc::new(ReconConfig::default()))
    }

    #[test]
    fn test_extract_capitalized_sequences() {
        let sequences =
            extract_capitalized_sequences("ACME-NET operated by Acme Corporation for transit");
        assert!(sequences.contains(&"ACME-NET".to_string()));
        assert!(sequences.contains(&"Acme Corporation".to_string()));
        assert!(!sequences.iter().any(|s| s.contains("transit")));
    }

    #[test]
    fn test_meaningful_name_filter() {
        assert!(is_meaningful_organization_name("Acme Holdings"));
        assert!(!is_meaningful_organization_name("internet"));
        assert!(!is_meaningful_organization_name("network solutions"));
        assert!(!is_meaningful_organization_name(""));
        // Generic word inside a longer name is fine
        assert!(is_meaningful_organization_name("Acme Internet Division"));
    }

    #[test]
    fn test_grounding_against_target() {
        assert!(grounded_to_target("Acme Networks", "Acme Corporation", 0.3));
        assert!(grounded_to_target("acme", "Acme Corporation", 0.3));
        assert!(!grounded_to_target("Globex", "Acme Corporation", 0.3));
        // Partial overlap passes the loose gate but not the strict one
        assert!(grounded_to_target("Acm Industrial", "Acme Corporation", 0.3));
        assert!(!grounded_to_target("Acm Industrial", "Acme Corporation", 0.8));
    }

    #[test]
    fn test_learn_from_asn_descriptions() {
        let mut result = ReconnaissanceResult::new("Acme Corporation");
        result.add_asn(
            Asn::new(64500).with_description("ACME-NET Acme Networks backbone"),
        );
        result.add_asn(Asn::new(64501).with_description("Globex Industrial"));

        let mut intelligence = OrganizationIntelligence::new();
        let added = module().learn(&result, "Acme Corporation", &mut intelligence);

        assert!(intelligence
            .organization_names
            .contains("acme networks"));
        // Ungrounded names never make it in
        assert!(!intelligence.organization_names.contains("globex industrial"));
        assert!(!added.is_empty());
        assert_eq!(intelligence.asn_descriptions.len(), 2);
    }

    #[test]
    fn test_learn_is_idempotent() {
        let mut result = ReconnaissanceResult::new("Acme Corporation");
        result.add_asn(Asn::new(64500).with_description("Acme Networks"));

        let mut intelligence = OrganizationIntelligence::new();
        let first = module().learn(&result, "Acme Corporation", &mut intelligence);
        let second = module().learn(&result, "Acme Corporation", &mut intelligence);
        assert!(!first.is_empty());
        assert!(second.is_empty());
    }

    #[test]
    fn test_learn_from_domain_roots() {
        let mut result = ReconnaissanceResult::new("Acme Corporation");
        result.add_domain(Domain::new("acme.com"));
        result.add_domain(Domain::new("somethingelse.com"));

        let mut intelligence = OrganizationIntelligence::new();
        module().learn(&result, "Acme Corporation", &mut intelligence);

        assert!(intelligence.organization_names.contains("acme"));
        assert!(!intelligence.organization_names.contains("somethingelse"));
    }
}
