// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Error Types
 * Production-ready error handling with thiserror
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use std::time::Duration;
use thiserror::Error;

/// Main reconnaissance error type
#[derive(Error, Debug)]
pub enum ReconError {
    /// External data source errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// A whole discovery phase failed or timed out
    #[error("Discovery phase '{phase}' failed: {reason}")]
    Phase { phase: String, reason: String },

    /// Invalid CIDR string supplied to the model
    #[error("Invalid CIDR '{cidr}': {reason}")]
    InvalidCidr { cidr: String, reason: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Scan was cancelled by the caller
    #[error("Scan cancelled")]
    Cancelled,

    /// Persistence errors
    #[error("Store error: {0}")]
    Store(String),

    /// General errors
    #[error("Recon error: {0}")]
    General(String),
}

/// Errors raised by a single external data source. These are always
/// recovered locally: the subsystem logs a warning on the result and
/// continues with partial data.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request to {service} failed: {reason}")]
    Http { service: String, reason: String },

    #[error("Rate limit exceeded for {service} after {retries} retries")]
    RateLimited { service: String, retries: u32 },

    #[error("Query quota exhausted for {service}")]
    QuotaExceeded { service: String },

    #[error("Failed to parse {service} response: {reason}")]
    Parse { service: String, reason: String },

    #[error("{service} query timed out after {timeout:?}")]
    Timeout { service: String, timeout: Duration },

    #[error("Subprocess '{command}' failed: {reason}")]
    Subprocess { command: String, reason: String },

    #[error("DNS resolution failed for {fqdn}: {reason}")]
    Dns { fqdn: String, reason: String },
}

impl SourceError {
    /// Service name the error originated from, for warning messages.
    pub fn service(&self) -> &str {
        match self {
            SourceError::Http { service, .. }
            | SourceError::RateLimited { service, .. }
            | SourceError::QuotaExceeded { service }
            | SourceError::Parse { service, .. }
            | SourceError::Timeout { service, .. } => service,
            SourceError::Subprocess { command, .. } => command,
            SourceError::Dns { .. } => "dns",
        }
    }

    /// True when the upstream signalled a hard per-scan quota, meaning
    /// further queries against this service should be skipped entirely.
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, SourceError::QuotaExceeded { .. })
    }
}

/// Convenience alias used throughout the crate
pub type ReconResult<T> = Result<T, ReconError>;
