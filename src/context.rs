// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Scan Context
 * Per-scan cancellation, quota tracking and observer callbacks
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Progress observer: (percent 0.0-100.0, message)
pub type ProgressCallback = Arc<dyn Fn(f32, &str) + Send + Sync>;

/// Status observer: (icon, message)
pub type StatusCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// State scoped to a single scan. The passive-DNS quota flag lives here,
/// per scan, so an exhausted quota in one scan can never leak into
/// another.
#[derive(Clone, Default)]
pub struct ScanContext {
    cancelled: Arc<AtomicBool>,
    passive_dns_quota_exhausted: Arc<AtomicBool>,
    progress_callback: Option<ProgressCallback>,
    status_callback: Option<StatusCallback>,
}

impl ScanContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_status_callback(mut self, callback: StatusCallback) -> Self {
        self.status_callback = Some(callback);
        self
    }

    /// Request cancellation. Checked at phase boundaries and inside
    /// fan-out loops; in-flight network calls finish on their own.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        debug!("Scan cancellation requested");
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Mark the passive-DNS quota as exhausted for the rest of this scan.
    pub fn mark_passive_dns_exhausted(&self) {
        self.passive_dns_quota_exhausted.store(true, Ordering::SeqCst);
    }

    pub fn passive_dns_exhausted(&self) -> bool {
        self.passive_dns_quota_exhausted.load(Ordering::SeqCst)
    }

    /// Fire the progress callback if one is registered. Fire-and-forget;
    /// observer failures must never affect the scan, so a panicking
    /// callback is caught and logged here instead of unwinding into the
    /// discovery loop.
    pub fn report_progress(&self, percent: f32, message: &str) {
        if let Some(cb) = &self.progress_callback {
            let percent = percent.clamp(0.0, 100.0);
            if catch_unwind(AssertUnwindSafe(|| cb(percent, message))).is_err() {
                warn!("[WARNING] Progress callback panicked on '{}'", message);
            }
        }
    }

    /// Fire the status callback if one is registered. Same containment
    /// as `report_progress`.
    pub fn report_status(&self, icon: &str, message: &str) {
        if let Some(cb) = &self.status_callback {
            if catch_unwind(AssertUnwindSafe(|| cb(icon, message))).is_err() {
                warn!("[WARNING] Status callback panicked on '{}'", message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_cancellation_flag() {
        let ctx = ScanContext::new();
        assert!(!ctx.is_cancelled());
        ctx.cancel();
        assert!(ctx.is_cancelled());

        // Clones observe the same flag
        let clone = ctx.clone();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_quota_flag_is_per_context() {
        let first = ScanContext::new();
        let second = ScanContext::new();
        first.mark_passive_dns_exhausted();
        assert!(first.passive_dns_exhausted());
        assert!(!second.passive_dns_exhausted());
    }

    #[test]
    fn test_progress_callback_invoked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let ctx = ScanContext::new().with_progress_callback(Arc::new(move |pct, _msg| {
            assert!((0.0..=100.0).contains(&pct));
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        ctx.report_progress(50.0, "halfway");
        ctx.report_progress(150.0, "clamped");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_callback_is_contained() {
        let ctx = ScanContext::new()
            .with_progress_callback(Arc::new(|_, _| panic!("observer bug")))
            .with_status_callback(Arc::new(|_, _| panic!("observer bug")));
        // Neither call may unwind into the caller
        ctx.report_progress(10.0, "survives");
        ctx.report_status("[*]", "survives");
    }

    #[test]
    fn test_no_callback_is_noop() {
        let ctx = ScanContext::new();
        ctx.report_progress(10.0, "ignored");
        ctx.report_status("[OK]", "ignored");
    }
}
