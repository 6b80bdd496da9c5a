//! Batch run report.

use std::path::Path;

use chrono::{DateTime, Utc};
use netprofile_core::models::SkipReason;
use netprofile_core::{ProfileError, Result};
use serde::Serialize;

/// A device left out of the summary and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDevice {
    pub file_id: String,
    pub reason: SkipReason,
}

/// Outcome counts of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub devices_total: usize,
    pub devices_profiled: usize,
    pub devices_ignored: usize,
    pub skipped: Vec<SkippedDevice>,
    pub elapsed_seconds: f64,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            devices_total: 0,
            devices_profiled: 0,
            devices_ignored: 0,
            skipped: Vec::new(),
            elapsed_seconds: 0.0,
        }
    }

    pub fn record_profiled(&mut self) {
        self.devices_total += 1;
        self.devices_profiled += 1;
    }

    pub fn record_skipped(&mut self, file_id: &str, reason: SkipReason) {
        self.devices_total += 1;
        self.devices_ignored += 1;
        self.skipped.push(SkippedDevice {
            file_id: file_id.to_string(),
            reason,
        });
    }

    /// Write the report as pretty JSON.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ProfileError::SummaryWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
