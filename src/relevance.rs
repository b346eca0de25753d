// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Relevance Engine
 * Pure scoring and filtering of candidate names against the target org
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::config::RelevanceConfig;

/// Generic business/tech words that make worthless search terms on
/// their own. A BGP search for "networks" matches half the internet.
const NOISE_TERMS: &[&str] = &[
    "the", "and", "for", "with", "this", "that", "from", "have", "been", "will",
    "technology", "technologies", "solutions", "services", "systems", "software",
    "internet", "network", "networks", "global", "international", "communications",
    "telecommunications", "hosting", "cloud", "data", "center", "centre", "digital",
    "online", "web", "tech", "group", "holdings", "enterprises", "enterprise",
    "company", "corporation", "incorporated", "limited", "infrastructure",
];

/// Affix fragments that show up when a description gets truncated or a
/// capitalized-sequence extractor slices mid-word
const FRAGMENT_PATTERNS: &[&str] = &[
    "communicat", "technolog", "internation", "corporat", "incorporat",
    "telecommunicat", "infrastructur", "enterpris", "solution", "servic",
];

/// Legitimate short brand names that would otherwise trip the fragment
/// or vowel heuristics
const TERM_ALLOWLIST: &[&str] = &["ibm", "sap", "nvidia", "intel", "cisco", "xerox", "hp inc"];

/// Legal-entity suffixes stripped when deriving an organization root
const LEGAL_SUFFIXES: &[&str] = &[
    "incorporated", "corporation", "limited", "company", "corp", "inc", "llc",
    "ltd", "co",
];

/// Words excluded when collecting significant organization words
const GENERIC_SUFFIX_WORDS: &[&str] = &[
    "inc", "corp", "corporation", "llc", "ltd", "limited", "company", "group",
    "holdings", "international", "global", "technologies", "technology",
    "solutions", "services", "systems", "enterprises",
];

/// Acronyms too generic to search for
const GENERIC_ACRONYMS: &[&str] = &[
    "www", "api", "inc", "llc", "ltd", "the", "and", "for", "com", "net", "org",
    "usa", "ceo", "cto", "isp", "dns", "llp",
];

/// Major brands that surface constantly in BGP/CT keyword searches and
/// are almost never the target
const UNRELATED_BRANDS: &[&str] = &[
    "starbucks", "mcdonald", "walmart", "verizon", "comcast", "vodafone",
    "t-mobile", "telefonica", "china telecom", "china unicom", "level 3",
    "level3", "cogent", "hurricane electric", "telia", "google", "amazon",
    "microsoft", "cloudflare", "akamai", "fastly", "netflix", "facebook",
    "apple", "oracle",
];

/// Non-US legal-entity markers used by the geography-mismatch heuristic
const NON_US_ENTITY_MARKERS: &[&str] = &[
    "gmbh", "s.a.", "s.r.l", "b.v.", "a.g.", " oy", " ab", " pty", " plc",
    "sarl", "s.p.a", "k.k.",
];

const US_ENTITY_MARKERS: &[&str] = &["inc", "llc", "corp", "corporation", "incorporated"];

/// Business-sector keyword sets for the sector-mismatch heuristic
const SECTOR_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "telecom",
        &["telecom", "telekom", "telephone", "mobile", "cellular", "wireless", "broadband"],
    ),
    (
        "food",
        &["coffee", "restaurant", "food", "cafe", "bakery", "brewing", "brewery"],
    ),
    (
        "retail",
        &["retail", "store", "shop", "supermarket", "mall", "grocery"],
    ),
    (
        "finance",
        &["bank", "banking", "insurance", "capital", "financial", "invest"],
    ),
];

/// Lowercase and replace punctuation with spaces, collapsing runs.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_space = true;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            for lc in ch.to_lowercase() {
                out.push(lc);
            }
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim().to_string()
}

/// Normalized form with spaces removed, for substring comparisons
fn compact(input: &str) -> String {
    normalize(input).replace(' ', "")
}

fn words(input: &str) -> Vec<String> {
    normalize(input)
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}

/// Organization words that carry identity: >= 4 chars and not a generic
/// business suffix.
pub fn significant_words(name: &str) -> Vec<String> {
    words(name)
        .into_iter()
        .filter(|w| w.len() >= 4 && !GENERIC_SUFFIX_WORDS.contains(&w.as_str()))
        .collect()
}

/// Strip a trailing legal-entity suffix. Returns None when stripping
/// would leave fewer than 4 characters, so "Co Inc" never collapses to
/// an unusable stub.
pub fn strip_legal_suffixes(name: &str) -> Option<String> {
    let mut current = normalize(name);
    let mut stripped = false;
    loop {
        let mut changed = false;
        for suffix in LEGAL_SUFFIXES {
            let pattern = format!(" {}", suffix);
            if current.ends_with(&pattern) {
                current = current[..current.len() - pattern.len()].trim().to_string();
                changed = true;
                stripped = true;
                break;
            }
        }
        if !changed {
            break;
        }
    }
    if stripped && current.len() >= 4 {
        Some(current)
    } else {
        None
    }
}

/// Organization root: legal suffixes stripped when possible, otherwise
/// the normalized name itself.
pub fn organization_root(name: &str) -> String {
    strip_legal_suffixes(name).unwrap_or_else(|| normalize(name))
}

/// First-letter acronym of the meaningful words of a multi-word name.
/// Returns None unless there are at least two meaningful words, the
/// acronym has at least 3 characters, and it is not a generic acronym.
pub fn generate_acronym(name: &str) -> Option<String> {
    let meaningful: Vec<String> = words(name)
        .into_iter()
        .filter(|w| !GENERIC_SUFFIX_WORDS.contains(&w.as_str()) && w.len() >= 2)
        .collect();
    if meaningful.len() < 2 {
        return None;
    }
    let acronym: String = meaningful
        .iter()
        .filter_map(|w| w.chars().next())
        .collect();
    if acronym.len() < 3 || GENERIC_ACRONYMS.contains(&acronym.as_str()) {
        return None;
    }
    Some(acronym)
}

/// Registrable root of an FQDN: the last two labels ("sub.example.com"
/// -> "example.com"). Public-suffix awareness is out of scope; two
/// labels match the upstream data sources' granularity.
pub fn registrable_root(fqdn: &str) -> Option<String> {
    let trimmed = fqdn.trim().trim_end_matches('.').to_lowercase();
    let labels: Vec<&str> = trimmed.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }
    Some(format!(
        "{}.{}",
        labels[labels.len() - 2],
        labels[labels.len() - 1]
    ))
}

/// The name part of the registrable root ("example" from
/// "sub.example.com")
pub fn root_label(fqdn: &str) -> Option<String> {
    registrable_root(fqdn).and_then(|root| root.split('.').next().map(|l| l.to_string()))
}

/// Length of the longest common substring of two strings
pub fn longest_common_substring_len(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut best = 0;
    for i in 1..=a.len() {
        let mut row = vec![0usize; b.len() + 1];
        for j in 1..=b.len() {
            if a[i - 1] == b[j - 1] {
                row[j] = prev[j - 1] + 1;
                best = best.max(row[j]);
            }
        }
        prev = row;
    }
    best
}

/// Jaccard similarity over character sets. Cheap near-duplicate signal
/// for search terms.
pub fn char_overlap_similarity(a: &str, b: &str) -> f64 {
    use std::collections::HashSet;
    let sa: HashSet<char> = compact(a).chars().collect();
    let sb: HashSet<char> = compact(b).chars().collect();
    if sa.is_empty() || sb.is_empty() {
        return 0.0;
    }
    let intersection = sa.intersection(&sb).count() as f64;
    let union = sa.union(&sb).count() as f64;
    intersection / union
}

/// True when two search terms would query essentially the same thing:
/// one contains the other, or their character overlap exceeds the
/// configured similarity threshold.
pub fn near_duplicate(a: &str, b: &str, config: &RelevanceConfig) -> bool {
    let ca = compact(a);
    let cb = compact(b);
    if ca.is_empty() || cb.is_empty() {
        return false;
    }
    if ca == cb || ca.contains(&cb) || cb.contains(&ca) {
        return true;
    }
    char_overlap_similarity(a, b) > config.near_duplicate_similarity
}

fn vowel_ratio(term: &str) -> f64 {
    let letters: Vec<char> = term.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return 0.0;
    }
    let vowels = letters
        .iter()
        .filter(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y'))
        .count();
    vowels as f64 / letters.len() as f64
}

/// Gate for search terms before they are sent to external keyword
/// searches. Rejects terms too short/long, non-alphanumeric-dominant,
/// generic noise, gibberish (vowel ratio), and truncation fragments.
pub fn is_quality_search_term(term: &str) -> bool {
    let t = term.trim().to_lowercase();
    let len = t.chars().count();
    if !(4..=25).contains(&len) {
        return false;
    }

    if TERM_ALLOWLIST.contains(&t.as_str()) {
        return true;
    }

    let alnum = t.chars().filter(|c| c.is_alphanumeric()).count();
    if (alnum as f64) / (len as f64) < 0.8 {
        return false;
    }

    let separators = t.chars().filter(|c| *c == '-' || *c == '_').count();
    if separators > 1 {
        return false;
    }

    if NOISE_TERMS.contains(&t.as_str()) {
        return false;
    }

    if FRAGMENT_PATTERNS.iter().any(|f| t.contains(f)) {
        return false;
    }

    // Gibberish check: natural names keep their vowels in a narrow band
    if len >= 6 {
        let ratio = vowel_ratio(&t);
        if !(0.2..=0.6).contains(&ratio) {
            return false;
        }
    }

    true
}

/// Score how strongly a candidate name matches the target organization.
/// Layered: exact root match, substantial containment, significant-word
/// overlap, then partial-substring overlap.
pub fn organization_match_score(candidate: &str, org_name: &str) -> f64 {
    let cand_norm = normalize(candidate);
    let org_norm = normalize(org_name);
    if cand_norm.is_empty() || org_norm.is_empty() {
        return 0.0;
    }
    if cand_norm == org_norm {
        return 1.0;
    }

    let cand_root = organization_root(candidate);
    let org_root = organization_root(org_name);
    if !cand_root.is_empty() && cand_root == org_root {
        return 1.0;
    }

    let cand_c = cand_root.replace(' ', "");
    let org_c = org_root.replace(' ', "");
    if cand_c.is_empty() || org_c.is_empty() {
        return 0.0;
    }

    // Substantial containment in either direction
    if cand_c.contains(&org_c) {
        let ratio = org_c.len() as f64 / cand_c.len() as f64;
        if ratio >= 0.6 {
            return (0.8 + 0.2 * ratio).min(1.0);
        }
    }
    if org_c.contains(&cand_c) {
        let ratio = cand_c.len() as f64 / org_c.len() as f64;
        if ratio >= 0.6 {
            return (0.7 + 0.25 * ratio).min(0.95);
        }
    }

    // Significant-word overlap
    for word in significant_words(org_name) {
        if cand_c.contains(&word) {
            let ratio = word.len() as f64 / cand_c.len() as f64;
            if ratio >= 0.5 {
                return (0.4 + 0.3 * ratio).min(0.7);
            }
        }
    }

    // Partial substring: at least 4 shared chars covering >= 30% of the
    // shorter string
    let shared = longest_common_substring_len(&cand_c, &org_c);
    if shared >= 4 {
        let ratio = shared as f64 / cand_c.len().min(org_c.len()) as f64;
        if ratio >= 0.3 {
            return (ratio * 0.6).min(0.6);
        }
    }

    0.0
}

/// Linguistic variants of an organization name used as search terms:
/// the raw name, the punctuation-stripped form, the legal-suffix-
/// stripped root, and a first-letter acronym. Callers still filter
/// through `is_quality_search_term`.
pub fn generate_term_variants(org_name: &str) -> Vec<String> {
    let mut variants: Vec<String> = Vec::new();
    let mut push = |term: String| {
        let term = term.trim().to_lowercase();
        if !term.is_empty() && !variants.contains(&term) {
            variants.push(term);
        }
    };

    push(org_name.to_string());
    push(normalize(org_name));
    if let Some(root) = strip_legal_suffixes(org_name) {
        push(root);
    }
    if let Some(acronym) = generate_acronym(org_name) {
        push(acronym);
    }
    variants
}

fn sector_of(text: &str) -> Option<&'static str> {
    let normalized = normalize(text);
    for (sector, keywords) in SECTOR_KEYWORDS {
        if keywords.iter().any(|k| normalized.contains(k)) {
            return Some(sector);
        }
    }
    None
}

fn has_name_overlap(candidate: &str, org_name: &str) -> bool {
    let cand = compact(candidate);
    for word in significant_words(org_name) {
        if cand.contains(&word) {
            return true;
        }
    }
    false
}

/// Flag candidates that are obviously a different entity despite the
/// keyword match: famous unrelated brands, geography mismatches, and
/// business-sector mismatches.
pub fn is_obvious_false_positive(candidate_desc: &str, org_name: &str) -> bool {
    let cand = normalize(candidate_desc);
    let org = normalize(org_name);
    if cand.is_empty() {
        return false;
    }

    // Known unrelated brands, unless the brand is part of the target name
    for brand in UNRELATED_BRANDS {
        if cand.contains(brand) && !org.contains(brand) {
            return true;
        }
    }

    let overlap = has_name_overlap(candidate_desc, org_name);

    // US-style target vs foreign legal entity with no shared name
    if !overlap {
        let org_is_us_style = US_ENTITY_MARKERS
            .iter()
            .any(|m| org.split_whitespace().any(|w| w == *m));
        let cand_lower = candidate_desc.to_lowercase();
        let cand_foreign = NON_US_ENTITY_MARKERS.iter().any(|m| cand_lower.contains(m));
        if org_is_us_style && cand_foreign {
            return true;
        }
    }

    // Different business sector with no shared name
    if !overlap {
        if let (Some(cand_sector), Some(org_sector)) = (sector_of(candidate_desc), sector_of(org_name)) {
            if cand_sector != org_sector {
                return true;
            }
        }
        // Candidate clearly in a sector the org name does not hint at all
        if sector_of(candidate_desc).is_some() && sector_of(org_name).is_none() {
            return true;
        }
    }

    false
}

/// Decide whether an FQDN belongs to the target: base-domain membership,
/// organization-name correlation of the root label, or high-confidence
/// multi-source corroboration.
pub fn domain_relevant(
    fqdn: &str,
    org_name: &str,
    base_domains: &[String],
    confidence: f64,
    source_count: usize,
    config: &RelevanceConfig,
) -> bool {
    let f = fqdn.trim().trim_end_matches('.').to_lowercase();
    if f.is_empty() {
        return false;
    }

    for base in base_domains {
        let base = base.trim().to_lowercase();
        if f == base || f.ends_with(&format!(".{}", base)) {
            return true;
        }
    }

    if let Some(root) = root_label(&f) {
        if organization_match_score(&root, org_name) >= config.min_domain_score {
            return true;
        }
    }

    confidence >= config.high_confidence && source_count >= 2
}

/// Decide whether an ASN description plausibly belongs to the target.
/// Defaults to rejection absent a positive signal.
pub fn asn_relevant(asn_description: &str, org_name: &str, base_domains: &[String]) -> bool {
    let desc = normalize(asn_description);
    if desc.is_empty() {
        return false;
    }

    // Direct organization-name match
    let org_root = organization_root(org_name).replace(' ', "");
    if org_root.len() >= 4 && desc.replace(' ', "").contains(&org_root) {
        return true;
    }

    // Correlation with a base-domain root
    for base in base_domains {
        if let Some(root) = root_label(base) {
            if root.len() >= 4 && desc.contains(&root) {
                return true;
            }
        }
    }

    if is_obvious_false_positive(asn_description, org_name) {
        return false;
    }

    // Subsidiary-style partial match: a shared non-generic word of 5+
    // characters
    let org_words = words(org_name);
    for word in words(&desc) {
        if word.len() >= 5
            && !GENERIC_SUFFIX_WORDS.contains(&word.as_str())
            && org_words.contains(&word)
        {
            return true;
        }
    }

    false
}
