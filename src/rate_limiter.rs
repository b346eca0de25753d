// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Service Rate Limiter
 * Token bucket budgets per external data source
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use nonzero_ext::*;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::ReconConfig;

type DirectLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-service token bucket rate limiter. Public data sources publish
/// courtesy limits (crt.sh, bgp.he.net, hackertarget) and exceeding them
/// gets the scanner blocked, so every outbound request acquires a permit
/// first.
pub struct ServiceRateLimiter {
    limits_rpm: HashMap<String, u32>,
    default_rpm: u32,
    limiters: Arc<RwLock<HashMap<String, Arc<DirectLimiter>>>>,
}

impl ServiceRateLimiter {
    pub fn new(config: &ReconConfig) -> Self {
        info!(
            "Initialized service rate limiter: {} configured services, default {} rpm",
            config.rate_limits_rpm.len(),
            config.default_rpm
        );
        Self {
            limits_rpm: config.rate_limits_rpm.clone(),
            default_rpm: config.default_rpm,
            limiters: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn quota_for(&self, service: &str) -> Quota {
        let rpm = self
            .limits_rpm
            .get(service)
            .copied()
            .unwrap_or(self.default_rpm);
        Quota::per_minute(NonZeroU32::new(rpm).unwrap_or(nonzero!(1u32)))
    }

    /// Wait until a request against the service is allowed.
    pub async fn acquire(&self, service: &str) {
        let limiter = {
            let limiters = self.limiters.read().await;
            limiters.get(service).cloned()
        };

        let limiter = match limiter {
            Some(l) => l,
            None => {
                let mut limiters = self.limiters.write().await;
                limiters
                    .entry(service.to_string())
                    .or_insert_with(|| {
                        debug!("Creating rate limiter for service: {}", service);
                        Arc::new(GovernorRateLimiter::direct(self.quota_for(service)))
                    })
                    .clone()
            }
        };

        limiter.until_ready().await;
    }

    /// Requests-per-minute budget for a service
    pub fn rpm(&self, service: &str) -> u32 {
        self.limits_rpm
            .get(service)
            .copied()
            .unwrap_or(self.default_rpm)
    }
}
