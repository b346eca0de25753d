// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka HTTP Client
 * Pooled client with per-service rate limiting and retry/backoff
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ReconConfig;
use crate::errors::SourceError;
use crate::rate_limiter::ServiceRateLimiter;

/// Realistic browser User-Agents; some looking-glass pages refuse
/// obvious bot agents
const BROWSER_USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Safari on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

fn get_browser_user_agent() -> &'static str {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let index = COUNTER.fetch_add(1, Ordering::Relaxed) % BROWSER_USER_AGENTS.len();
    BROWSER_USER_AGENTS[index]
}

/// Maximum response body size (10MB); crt.sh responses for wildcard
/// queries can be large but anything above this is malformed
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

const DEFAULT_POOL_IDLE_PER_HOST: usize = 16;
const DEFAULT_POOL_MAX_IDLE_TIMEOUT: u64 = 90;

/// Plain response view handed to source parsers
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP collaborator used by all web-backed data sources. Blocking from
/// the caller's perspective: acquires a rate-limit permit, retries with
/// exponential backoff on 429/5xx, and surfaces a typed rate-limit error
/// only after retries are exhausted.
#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    rate_limiter: Arc<ServiceRateLimiter>,
    max_retries: u32,
}

impl HttpClient {
    pub fn new(config: &ReconConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(get_browser_user_agent())
            .pool_max_idle_per_host(DEFAULT_POOL_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(DEFAULT_POOL_MAX_IDLE_TIMEOUT))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| SourceError::Http {
                service: "client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client: Arc::new(client),
            rate_limiter: Arc::new(ServiceRateLimiter::new(config)),
            max_retries: config.max_retries,
        })
    }

    /// GET a URL on behalf of a named service. The service name selects
    /// the rate-limit bucket and appears in error messages.
    pub async fn get(&self, url: &str, service: &str) -> Result<HttpResponse, SourceError> {
        let mut attempt = 0u32;

        loop {
            self.rate_limiter.acquire(service).await;

            let outcome = self.client.get(url).send().await;
            match outcome {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if status == 429 || (500..600).contains(&status) {
                        attempt += 1;
                        if attempt > self.max_retries {
                            if status == 429 {
                                return Err(SourceError::RateLimited {
                                    service: service.to_string(),
                                    retries: self.max_retries,
                                });
                            }
                            return Err(SourceError::Http {
                                service: service.to_string(),
                                reason: format!("HTTP {} after {} retries", status, attempt - 1),
                            });
                        }
                        let backoff = Duration::from_millis(500 * 2u64.pow(attempt - 1));
                        warn!(
                            "[WARNING] {} returned HTTP {}, retry {}/{} in {:?}",
                            service, status, attempt, self.max_retries, backoff
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    let headers = response
                        .headers()
                        .iter()
                        .filter_map(|(k, v)| {
                            v.to_str().ok().map(|v| (k.to_string(), v.to_string()))
                        })
                        .collect();

                    let body = response.text().await.map_err(|e| SourceError::Http {
                        service: service.to_string(),
                        reason: format!("body read failed: {}", e),
                    })?;

                    if body.len() > MAX_BODY_SIZE {
                        return Err(SourceError::Parse {
                            service: service.to_string(),
                            reason: format!("response body too large ({} bytes)", body.len()),
                        });
                    }

                    debug!("{} GET {} -> {}", service, url, status);
                    return Ok(HttpResponse {
                        status,
                        body,
                        headers,
                    });
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        return Err(SourceError::Http {
                            service: service.to_string(),
                            reason: e.to_string(),
                        });
                    }
                    let backoff = Duration::from_millis(500 * 2u64.pow(attempt - 1));
                    debug!(
                        "{} request error ({}), retry {}/{} in {:?}",
                        service, e, attempt, self.max_retries, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
