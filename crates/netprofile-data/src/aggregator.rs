//! Hour-of-day network profile for one weekday.

use netprofile_core::models::{HourlyProfile, HOURS_PER_DAY, SATURDAY};

use crate::analyzer::{CounterKind, DeviceActivity};

/// Builds per-device weekday profiles from analyzed activity.
pub struct WeekdayAggregator;

impl WeekdayAggregator {
    /// Saturday profile of `activity`.
    pub fn saturday(activity: &DeviceActivity) -> HourlyProfile {
        Self::profile(activity, SATURDAY)
    }

    /// Sum over apps of the mean per-hour deltas on `weekday`.
    ///
    /// Each app's hourly delta sum is divided by the number of logged days
    /// that fell on `weekday`. With no such days every mean is zero.
    pub fn profile(activity: &DeviceActivity, weekday: usize) -> HourlyProfile {
        let mut profile = HourlyProfile::new(activity.file_id.clone());
        let occurrences = activity.days_per_weekday[weekday];
        if occurrences == 0 {
            return profile;
        }

        for traffic in activity.traffic.values() {
            let mean_rx = Self::mean_per_hour(traffic.deltas(CounterKind::Rx).day(weekday), occurrences);
            let mean_tx = Self::mean_per_hour(traffic.deltas(CounterKind::Tx).day(weekday), occurrences);
            Self::accumulate(&mut profile.rx, &mean_rx);
            Self::accumulate(&mut profile.tx, &mean_tx);
        }
        profile
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn mean_per_hour(day: &[Vec<i64>; HOURS_PER_DAY], occurrences: u32) -> [f64; HOURS_PER_DAY] {
        std::array::from_fn(|h| {
            let sum: f64 = day[h].iter().map(|d| *d as f64).sum();
            sum / f64::from(occurrences)
        })
    }

    /// Add `means` into `total` unless the app contributed nothing.
    fn accumulate(total: &mut [f64; HOURS_PER_DAY], means: &[f64; HOURS_PER_DAY]) {
        if means.iter().all(|m| *m == 0.0) {
            return;
        }
        for (t, m) in total.iter_mut().zip(means) {
            *t += m;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
