// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Reconnaissance Library
 * Exposes reconnaissance modules for testing
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod config;
pub mod context;
pub mod errors;
pub mod http_client;
pub mod rate_limiter;
pub mod relevance;
pub mod resolver;
pub mod types;

// External data sources
pub mod sources;

// Discovery subsystems
pub mod discovery;

// Iterative orchestration and inter-iteration learning
pub mod learning;
pub mod orchestrator;

// Result persistence
pub mod store;

pub use orchestrator::{run_intelligent_discovery, Orchestrator};
pub use types::ReconnaissanceResult;
