// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Discovery Orchestrator
 * Iterative discovery loop with convergence detection and inter-iteration
 * learning
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ReconConfig;
use crate::context::ScanContext;
use crate::discovery::{AsnDiscovery, CloudDetection, DomainDiscovery, IpRangeDiscovery};
use crate::errors::ReconResult;
use crate::http_client::HttpClient;
use crate::learning::{LearningModule, OrganizationIntelligence};
use crate::relevance::{generate_term_variants, is_quality_search_term, near_duplicate};
use crate::resolver::HickoryDnsResolver;
use crate::sources::{BgpHeSource, CrtShSource, HackerTargetSource, RadbWhoisSource};
use crate::types::{Asn, ReconnaissanceResult, SharedResult};

/// Lifecycle of the discovery loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    Initializing,
    Iterating(u32),
    Converged,
    MaxIterationsReached,
    Cancelled,
}

/// Per-iteration accounting, logged at the end of the run
#[derive(Debug, Clone)]
pub struct IterationStats {
    pub iteration: u32,
    pub new_assets: usize,
    pub total_assets: usize,
    pub convergence_score: f64,
    pub terms_used: Vec<String>,
}

/// Drives the four discovery subsystems through up to `max_iterations`
/// rounds. Each round runs domain discovery, ASN discovery, IP-range
/// discovery and cloud detection in sequence, then measures how much the
/// result grew. A round that adds less than the convergence threshold
/// (relative to the assets already known) ends the loop early, as does
/// running out of fresh search terms to feed the next round.
pub struct Orchestrator {
    domains: DomainDiscovery,
    asns: AsnDiscovery,
    ip_ranges: IpRangeDiscovery,
    cloud: CloudDetection,
    learning: LearningModule,
    config: Arc<ReconConfig>,
}

impl Orchestrator {
    /// Wire up the production sources behind the subsystems.
    pub fn new(config: Arc<ReconConfig>) -> ReconResult<Self> {
        let client = HttpClient::new(&config)?;
        let ct: Arc<dyn crate::sources::CertTransparencySource> =
            Arc::new(CrtShSource::new(client.clone()));
        let passive_dns: Arc<dyn crate::sources::PassiveDnsSource> =
            Arc::new(HackerTargetSource::new(client.clone()));
        let bgp: Arc<dyn crate::sources::BgpSource> = Arc::new(BgpHeSource::new(client));
        let irr: Arc<dyn crate::sources::IrrSource> = Arc::new(RadbWhoisSource::new());
        let resolver: Arc<dyn crate::resolver::DnsResolver> =
            Arc::new(HickoryDnsResolver::new(config.dns_timeout())?);

        Ok(Self::with_components(
            DomainDiscovery::new(ct, passive_dns, resolver, Arc::clone(&config)),
            AsnDiscovery::new(Arc::clone(&bgp), Arc::clone(&config)),
            IpRangeDiscovery::new(bgp, irr, Arc::clone(&config)),
            CloudDetection::new(Arc::clone(&config)),
            config,
        ))
    }

    /// Assemble from pre-built subsystems. Used by tests to substitute
    /// fixture sources.
    pub fn with_components(
        domains: DomainDiscovery,
        asns: AsnDiscovery,
        ip_ranges: IpRangeDiscovery,
        cloud: CloudDetection,
        config: Arc<ReconConfig>,
    ) -> Self {
        Self {
            domains,
            asns,
            ip_ranges,
            cloud,
            learning: LearningModule::new(Arc::clone(&config)),
            config,
        }
    }

    pub async fn run(
        &self,
        org_name: &str,
        base_domains: &[String],
        ctx: &ScanContext,
    ) -> ReconnaissanceResult {
        info!(
            "Starting intelligent discovery for '{}' ({} base domains, max {} iterations)",
            org_name,
            base_domains.len(),
            self.config.max_iterations
        );
        ctx.report_status("[*]", &format!("Discovery started for {}", org_name));

        let result = SharedResult::new(org_name);
        let mut intelligence = OrganizationIntelligence::new();
        let mut stats: Vec<IterationStats> = Vec::new();
        let mut state = DiscoveryState::Initializing;

        // Iteration 1 is seeded from the organization name itself
        let mut terms: Vec<String> = generate_term_variants(org_name)
            .into_iter()
            .filter(|t| is_quality_search_term(t))
            .collect();
        let mut processed_terms: Vec<String> = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            if ctx.is_cancelled() {
                state = DiscoveryState::Cancelled;
                break;
            }
            state = DiscoveryState::Iterating(iteration);
            let progress =
                ((iteration - 1) as f32 / self.config.max_iterations as f32) * 100.0;
            ctx.report_progress(progress, &format!("Iteration {}", iteration));
            info!(
                "--- Iteration {}/{} with {} search terms ---",
                iteration,
                self.config.max_iterations,
                terms.len()
            );

            let before = result.snapshot().total_asset_count();
            self.run_iteration(org_name, base_domains, &terms, &result, ctx)
                .await;
            let snapshot = result.snapshot();
            let after = snapshot.total_asset_count();

            let new_assets = after.saturating_sub(before);
            let convergence_score = new_assets as f64 / before.max(1) as f64;
            info!(
                "Iteration {} added {} assets ({} total, convergence score {:.3})",
                iteration, new_assets, after, convergence_score
            );
            stats.push(IterationStats {
                iteration,
                new_assets,
                total_assets: after,
                convergence_score,
                terms_used: terms.clone(),
            });

            if ctx.is_cancelled() {
                state = DiscoveryState::Cancelled;
                break;
            }
            if iteration > 1 && convergence_score < self.config.convergence_threshold {
                info!(
                    "[OK] Converged at iteration {} (score {:.3} < threshold {:.3})",
                    iteration, convergence_score, self.config.convergence_threshold
                );
                state = DiscoveryState::Converged;
                break;
            }
            processed_terms.append(&mut terms);
            if iteration == self.config.max_iterations {
                state = DiscoveryState::MaxIterationsReached;
                break;
            }

            // Learning feeds the next iteration, so it is pointless on
            // the last one
            let learned = self
                .learning
                .learn(&snapshot, org_name, &mut intelligence);
            terms = Self::fresh_terms(learned, &processed_terms, &self.config);
            if terms.is_empty() {
                info!("[OK] No new search terms learned; discovery is complete");
                state = DiscoveryState::Converged;
                break;
            }
            debug!("Next iteration will use {} learned terms", terms.len());
        }

        let mut final_result = result.into_result();
        if state == DiscoveryState::Cancelled {
            final_result.add_warning("Scan cancelled; results are partial".to_string());
            warn!("[WARNING] Discovery cancelled for '{}'", org_name);
        }
        final_result.mark_completed();
        ctx.report_progress(100.0, "Discovery complete");

        Self::log_summary(&final_result, &stats, state);
        final_result
    }

    /// One full pass over the four phases, each under its own timeout.
    async fn run_iteration(
        &self,
        org_name: &str,
        base_domains: &[String],
        terms: &[String],
        result: &SharedResult,
        ctx: &ScanContext,
    ) {
        self.run_phase(
            "domain_discovery",
            result,
            self.domains.discover(org_name, base_domains, result, ctx),
        )
        .await;
        if ctx.is_cancelled() {
            return;
        }

        self.run_phase(
            "asn_discovery",
            result,
            self.asns
                .discover(org_name, base_domains, terms, result, ctx),
        )
        .await;
        if ctx.is_cancelled() {
            return;
        }

        let asns: Vec<Asn> = result.snapshot().asns.into_iter().collect();
        self.run_phase(
            "ip_range_discovery",
            result,
            self.ip_ranges.discover(&asns, result, ctx),
        )
        .await;
        if ctx.is_cancelled() {
            return;
        }

        self.run_phase("cloud_detection", result, self.cloud.discover(result, ctx))
            .await;
    }

    /// A phase that overruns its budget is abandoned; whatever it already
    /// wrote into the shared result is kept.
    async fn run_phase<F>(&self, phase: &str, result: &SharedResult, fut: F)
    where
        F: Future<Output = ()>,
    {
        let budget = self.config.phase_timeout(phase);
        if tokio::time::timeout(budget, fut).await.is_err() {
            warn!(
                "[WARNING] Phase {} timed out after {}s",
                phase,
                budget.as_secs()
            );
            result.add_warning(format!(
                "Phase {} timed out after {}s; partial results kept",
                phase,
                budget.as_secs()
            ));
        }
    }

    /// Quality-filter learned names and drop near-duplicates of terms
    /// already searched.
    fn fresh_terms(
        learned: Vec<String>,
        processed: &[String],
        config: &ReconConfig,
    ) -> Vec<String> {
        let mut fresh: Vec<String> = Vec::new();
        for term in learned {
            if !is_quality_search_term(&term) {
                continue;
            }
            let duplicate = processed
                .iter()
                .chain(fresh.iter())
                .any(|seen| near_duplicate(&term, seen, &config.relevance));
            if !duplicate {
                fresh.push(term);
            }
        }
        fresh
    }

    fn log_summary(
        result: &ReconnaissanceResult,
        stats: &[IterationStats],
        state: DiscoveryState,
    ) {
        info!("=== Discovery summary for '{}' ===", result.target_organization);
        info!("Final state: {:?} after {} iterations", state, stats.len());
        info!("ASNs: {}", result.asns.len());
        info!("IP ranges: {}", result.ip_ranges.len());
        info!(
            "Domains: {} ({} subdomains)",
            result.domains.len(),
            result.total_subdomain_count()
        );
        info!("Cloud services: {}", result.cloud_services.len());
        if !result.warnings.is_empty() {
            warn!("[WARNING] {} warnings recorded", result.warnings.len());
        }
    }
}

/// Convenience entry point with production wiring and default
/// configuration.
pub async fn run_intelligent_discovery(
    org_name: &str,
    base_domains: &[String],
    config: Arc<ReconConfig>,
    ctx: &ScanContext,
) -> ReconResult<ReconnaissanceResult> {
    let orchestrator = Orchestrator::new(config)?;
    Ok(orchestrator.run(org_name, base_domains, ctx).await)
}
