// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka CLI
 * Command-line entry point for organization asset discovery
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use tutka_recon::config::ReconConfig;
use tutka_recon::context::ScanContext;
use tutka_recon::orchestrator::Orchestrator;
use tutka_recon::store::{JsonFileStore, ResultStore};
use tutka_recon::types::ReconnaissanceResult;

#[derive(Parser, Debug)]
#[command(
    name = "tutka",
    about = "Organization asset reconnaissance: ASNs, IP ranges, domains and cloud services",
    version
)]
struct Cli {
    /// Target organization name, e.g. "Acme Corporation"
    #[arg(short, long)]
    org: String,

    /// Known base domain (repeatable)
    #[arg(short, long = "domain")]
    domains: Vec<String>,

    /// Maximum discovery iterations
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Write the full result as JSON to this file
    #[arg(short = 'f', long)]
    output: Option<PathBuf>,

    /// Directory for the timestamped result store
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .init();

    print!("\x1b[92m");
    println!("   __        __  __");
    println!("  / /___  __/ /_/ /______ _");
    println!(" / __/ / / / __/ //_/ __ `/");
    println!("/ /_/ /_/ / /_/ ,< / /_/ /");
    println!("\\__/\\__,_/\\__/_/|_|\\__,_/");
    print!("\x1b[0m");
    println!();
    print!("\x1b[1m\x1b[97m");
    println!("   Organization Asset Reconnaissance");
    print!("\x1b[0m");
    println!();

    info!("Tutka starting for organization '{}'", cli.org);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("tutka-worker")
        .enable_all()
        .build()?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ReconConfig::default();
    if let Some(iterations) = cli.max_iterations {
        config = config.with_max_iterations(iterations);
    }
    let config = Arc::new(config);

    let ctx = ScanContext::default();
    let orchestrator =
        Orchestrator::new(Arc::clone(&config)).context("initializing discovery engine")?;
    let result = orchestrator.run(&cli.org, &cli.domains, &ctx).await;

    print_summary(&result);

    if let Some(path) = &cli.output {
        let json = serde_json::to_string_pretty(&result).context("serializing result")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("[OK] Result written to {}", path.display());
    }
    if let Some(dir) = &cli.save_dir {
        let store = JsonFileStore::new(dir.clone());
        let path = store.save(&result).context("saving result")?;
        info!("[OK] Result stored at {}", path.display());
    }

    Ok(())
}

fn print_summary(result: &ReconnaissanceResult) {
    println!();
    println!("=== {} ===", result.target_organization);
    println!("ASNs:           {}", result.asns.len());
    println!("IP ranges:      {}", result.ip_ranges.len());
    println!(
        "Domains:        {} ({} subdomains)",
        result.domains.len(),
        result.total_subdomain_count()
    );
    println!("Cloud services: {}", result.cloud_services.len());

    let mut asns: Vec<_> = result.asns.iter().collect();
    asns.sort_by_key(|a| a.number);
    for asn in asns {
        println!(
            "  AS{:<8} {}",
            asn.number,
            asn.description.as_deref().unwrap_or("-")
        );
    }

    let mut ranges: Vec<_> = result.ip_ranges.iter().map(|r| r.cidr.clone()).collect();
    ranges.sort();
    for cidr in ranges {
        println!("  {}", cidr);
    }

    let mut domains: Vec<_> = result.domains.keys().collect();
    domains.sort();
    for domain in domains {
        println!("  {}", domain);
    }

    if !result.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &result.warnings {
            println!("  [WARNING] {}", warning);
        }
    }
}
