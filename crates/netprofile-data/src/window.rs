//! Canonical observation window of a device log.
//!
//! One pass over every record finds the earliest and latest valid timestamps;
//! both are then snapped to 04:00 logical-day boundaries and the device is
//! rejected when the result spans fewer than [`MIN_DEVICE_DAYS`] days.

use chrono::NaiveDateTime;
use netprofile_core::models::{DeviceWindow, LogRecord, SkipReason, MIN_DEVICE_DAYS};
use netprofile_core::time_utils::{canonical_end_date, canonical_start_date, logical_day_start};

/// Running min/max of valid record timestamps.
#[derive(Debug, Clone, Default)]
pub struct TimeRangeResolver {
    earliest: Option<NaiveDateTime>,
    latest: Option<NaiveDateTime>,
}

impl TimeRangeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record in; records with invalid timestamps are ignored.
    pub fn observe(&mut self, record: &LogRecord) {
        let Some(ts) = record.timestamp.valid() else {
            return;
        };
        self.earliest = Some(self.earliest.map_or(ts, |e| e.min(ts)));
        self.latest = Some(self.latest.map_or(ts, |l| l.max(ts)));
    }

    /// Build the canonical window for `file_id`.
    pub fn resolve(&self, file_id: &str) -> Result<DeviceWindow, SkipReason> {
        let (Some(earliest), Some(latest)) = (self.earliest, self.latest) else {
            return Err(SkipReason::NoValidTimestamps);
        };

        let start = canonical_start_date(earliest);
        let end = canonical_end_date(latest);
        let span_days = (end - start).num_days();
        if span_days < MIN_DEVICE_DAYS {
            return Err(SkipReason::WindowTooShort { days: span_days });
        }

        Ok(DeviceWindow {
            file_id: file_id.to_string(),
            start: logical_day_start(start),
            end: logical_day_start(end),
            span_days,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
