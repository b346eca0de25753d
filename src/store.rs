// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tutka Result Store
 * JSON persistence for reconnaissance results
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::{Duration, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{ReconError, ReconResult};
use crate::types::ReconnaissanceResult;

/// Persistence seam for scan results
pub trait ResultStore: Send + Sync {
    fn save(&self, result: &ReconnaissanceResult) -> ReconResult<PathBuf>;
    fn load(&self, path: &Path) -> ReconResult<ReconnaissanceResult>;
    /// Most recent stored result for an organization, no older than
    /// `max_age`.
    fn find_recent(
        &self,
        org_name: &str,
        max_age: Duration,
    ) -> ReconResult<Option<ReconnaissanceResult>>;
}

/// Stores each result as a pretty-printed JSON file named
/// `<org-slug>_<timestamp>.json` under a base directory.
pub struct JsonFileStore {
    base_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Filesystem-safe slug of an organization name
    fn slug(org_name: &str) -> String {
        let mut slug = String::with_capacity(org_name.len());
        for ch in org_name.chars() {
            if ch.is_alphanumeric() {
                for lc in ch.to_lowercase() {
                    slug.push(lc);
                }
            } else if !slug.ends_with('_') && !slug.is_empty() {
                slug.push('_');
            }
        }
        slug.trim_end_matches('_').to_string()
    }

    fn store_err(context: &str, e: impl std::fmt::Display) -> ReconError {
        ReconError::Store(format!("{}: {}", context, e))
    }
}

impl ResultStore for JsonFileStore {
    fn save(&self, result: &ReconnaissanceResult) -> ReconResult<PathBuf> {
        fs::create_dir_all(&self.base_dir)
            .map_err(|e| Self::store_err("creating store directory", e))?;

        let filename = format!(
            "{}_{}.json",
            Self::slug(&result.target_organization),
            Utc::now().format("%Y%m%dT%H%M%S")
        );
        let path = self.base_dir.join(filename);
        let json = serde_json::to_string_pretty(result)
            .map_err(|e| Self::store_err("serializing result", e))?;
        fs::write(&path, json).map_err(|e| Self::store_err("writing result file", e))?;

        info!("[OK] Result saved to {}", path.display());
        Ok(path)
    }

    fn load(&self, path: &Path) -> ReconResult<ReconnaissanceResult> {
        let json =
            fs::read_to_string(path).map_err(|e| Self::store_err("reading result file", e))?;
        serde_json::from_str(&json).map_err(|e| Self::store_err("parsing result file", e))
    }

    fn find_recent(
        &self,
        org_name: &str,
        max_age: Duration,
    ) -> ReconResult<Option<ReconnaissanceResult>> {
        let prefix = format!("{}_", Self::slug(org_name));
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::store_err("reading store directory", e)),
        };

        let mut newest: Option<ReconnaissanceResult> = None;
        for entry in entries {
            let entry = entry.map_err(|e| Self::store_err("reading store directory", e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(&prefix) || !name.ends_with(".json") {
                continue;
            }
            let result = match self.load(&entry.path()) {
                Ok(result) => result,
                Err(e) => {
                    debug!("Skipping unreadable result file {}: {}", name, e);
                    continue;
                }
            };
            if Utc::now() - result.scan_started > max_age {
                continue;
            }
            let is_newer = newest
                .as_ref()
                .map(|best| result.scan_started > best.scan_started)
                .unwrap_or(true);
            if is_newer {
                newest = Some(result);
            }
        }
        Ok(newest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(JsonFileStore::slug("Acme Corporation"), "acme_corporation");
        assert_eq!(JsonFileStore::slug("Acme, Inc."), "acme_inc");
        assert_eq!(JsonFileStore::slug("  Acme  "), "acme");
    }
}
