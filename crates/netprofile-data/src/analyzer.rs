//! Per-device activity state machine.
//!
//! Folds the in-window records of one log into per-app foreground activation
//! counts and per-app rx/tx byte deltas, bucketed by weekday and hour.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use netprofile_core::models::{
    DeviceWindow, LogRecord, SkipReason, WeekGrid, DAYS_PER_WEEK, MIN_DEVICE_DAYS,
    TRACKED_CATEGORIES,
};
use netprofile_core::time_utils::weekday_index;
use tracing::debug;

use crate::identity::AppIdentityMap;

// ── Counters ──────────────────────────────────────────────────────────────────

/// Direction of a cumulative network byte counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Rx,
    Tx,
}

impl CounterKind {
    /// Parse the last segment of a `net|app|<id>|<kind>` entry type.
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "rx_bytes" => Some(CounterKind::Rx),
            "tx_bytes" => Some(CounterKind::Tx),
            _ => None,
        }
    }
}

/// Last counter readings of one app and the deltas derived from them.
#[derive(Debug, Clone, Default)]
pub struct AppTraffic {
    last_rx: Option<i64>,
    last_tx: Option<i64>,
    rx: WeekGrid<Vec<i64>>,
    tx: WeekGrid<Vec<i64>>,
}

impl AppTraffic {
    /// Apply a counter reading and return the delta appended, if any.
    ///
    /// The first reading is only a baseline. A reading below the previous one
    /// means the counter was reset, so the reading itself is the delta.
    /// Readings are signed: counters report `-1` when unsupported.
    pub fn record(
        &mut self,
        kind: CounterKind,
        weekday: usize,
        hour: usize,
        reading: i64,
    ) -> Option<i64> {
        let (last, grid) = match kind {
            CounterKind::Rx => (&mut self.last_rx, &mut self.rx),
            CounterKind::Tx => (&mut self.last_tx, &mut self.tx),
        };

        let delta = match *last {
            None => None,
            Some(prev) if reading > prev => Some(reading.saturating_sub(prev)),
            Some(prev) if reading < prev => Some(reading),
            Some(_) => None,
        };
        if let Some(d) = delta {
            grid.cell_mut(weekday, hour).push(d);
        }
        *last = Some(reading);
        delta
    }

    pub fn last(&self, kind: CounterKind) -> Option<i64> {
        match kind {
            CounterKind::Rx => self.last_rx,
            CounterKind::Tx => self.last_tx,
        }
    }

    pub fn deltas(&self, kind: CounterKind) -> &WeekGrid<Vec<i64>> {
        match kind {
            CounterKind::Rx => &self.rx,
            CounterKind::Tx => &self.tx,
        }
    }
}

// ── DeviceActivity ────────────────────────────────────────────────────────────

/// Everything the analyzer learned about one device.
#[derive(Debug, Clone)]
pub struct DeviceActivity {
    pub file_id: String,
    /// Number of date changes seen among processed records.
    pub logged_days: u32,
    /// Logged days per weekday, Monday = 0.
    pub days_per_weekday: [u32; DAYS_PER_WEEK],
    /// Foreground activations per app name.
    pub foreground: BTreeMap<String, WeekGrid<u32>>,
    /// Network deltas per app name.
    pub traffic: BTreeMap<String, AppTraffic>,
    pub identities: AppIdentityMap,
}

// ── ActivityAnalyzer ──────────────────────────────────────────────────────────

/// Streaming state machine over the records of one device log.
pub struct ActivityAnalyzer {
    window: DeviceWindow,

    current_day: Option<NaiveDate>,
    weekday: usize,
    hour: usize,
    logged_days: u32,
    days_per_weekday: [u32; DAYS_PER_WEEK],

    screen_on: bool,
    unlocked: bool,
    /// Pid of the last process reported as foreground, consumed by the next
    /// app-name event.
    pending_pid: Option<String>,

    identities: AppIdentityMap,
    foreground: BTreeMap<String, WeekGrid<u32>>,
    traffic: BTreeMap<String, AppTraffic>,
    records_applied: u64,
}

impl ActivityAnalyzer {
    pub fn new(window: DeviceWindow) -> Self {
        Self {
            window,
            current_day: None,
            weekday: 0,
            hour: 0,
            logged_days: 0,
            days_per_weekday: [0; DAYS_PER_WEEK],
            screen_on: false,
            unlocked: false,
            pending_pid: None,
            identities: AppIdentityMap::new(),
            foreground: BTreeMap::new(),
            traffic: BTreeMap::new(),
            records_applied: 0,
        }
    }

    // ── Public methods ────────────────────────────────────────────────────────

    /// Fold one record into the state.
    ///
    /// Records with an invalid timestamp, an untracked category or a timestamp
    /// outside the window leave the state untouched.
    pub fn process(&mut self, record: &LogRecord) {
        let Some(ts) = record.timestamp.valid() else {
            return;
        };
        if !TRACKED_CATEGORIES.contains(&record.category()) || !self.window.contains(ts) {
            return;
        }

        self.advance_clock(ts);
        self.records_applied += 1;

        let value = record.value.trim();
        let segments = record.segments();
        let entry_type = record.entry_type.as_str();

        if segments.contains(&"importance") && value.contains("foreground") {
            self.pending_pid = pid_segment(&segments, "importance").map(str::to_string);
        } else if segments.contains(&"app")
            && segments.contains(&"name")
            && self.pending_pid.is_some()
        {
            self.on_app_name(&segments, value);
        } else if entry_type.starts_with("hf|locked") {
            self.unlocked = !value.contains("true");
        } else if entry_type.starts_with("screen|power") {
            self.screen_on = !value.contains("off");
        } else if entry_type.starts_with("net|app") {
            self.on_net_counter(&segments, value);
        } else if entry_type.starts_with("app|installed") {
            self.on_installed(value);
        }
    }

    /// Finish the pass, rejecting devices with too few logged days.
    pub fn finish(self) -> Result<DeviceActivity, SkipReason> {
        if i64::from(self.logged_days) < MIN_DEVICE_DAYS {
            return Err(SkipReason::TooFewLoggedDays {
                days: self.logged_days,
            });
        }
        Ok(self.into_activity())
    }

    /// Finish the pass without the logged-day check.
    pub fn into_activity(self) -> DeviceActivity {
        debug!(
            "Device {}: {} records applied over {} logged days, {} apps with traffic",
            self.window.file_id,
            self.records_applied,
            self.logged_days,
            self.traffic.len(),
        );
        DeviceActivity {
            file_id: self.window.file_id,
            logged_days: self.logged_days,
            days_per_weekday: self.days_per_weekday,
            foreground: self.foreground,
            traffic: self.traffic,
            identities: self.identities,
        }
    }

    // ── Event handlers ────────────────────────────────────────────────────────

    /// Track the calendar day, weekday and hour of the current record.
    fn advance_clock(&mut self, ts: NaiveDateTime) {
        let date = ts.date();
        if self.current_day != Some(date) {
            self.current_day = Some(date);
            self.weekday = weekday_index(date);
            self.days_per_weekday[self.weekday] += 1;
            self.logged_days += 1;
        }
        self.hour = ts.hour() as usize;
    }

    /// Count a foreground activation when the name event matches the pending
    /// pid while the device is in use. The pending pid is single-use.
    fn on_app_name(&mut self, segments: &[&str], value: &str) {
        let pending = self.pending_pid.take();
        let app_name = value.split(':').next().unwrap_or_default();

        if pending.as_deref() == pid_segment(segments, "name") && self.screen_on && self.unlocked {
            *self
                .foreground
                .entry(app_name.to_string())
                .or_default()
                .cell_mut(self.weekday, self.hour) += 1;
        }
    }

    /// Apply a `net|app|<id>|<kind>` counter reading.
    fn on_net_counter(&mut self, segments: &[&str], value: &str) {
        let (Some(app_id), Some(kind)) = (
            segments.get(2),
            segments.get(3).and_then(|s| CounterKind::parse(s)),
        ) else {
            return;
        };
        let Some(app_name) = self.identities.resolve(app_id) else {
            return;
        };
        let Ok(reading) = value.parse::<i64>() else {
            debug!(
                "Device {}: ignoring non-integer counter {:?} for {}",
                self.window.file_id, value, app_name
            );
            return;
        };

        self.traffic
            .entry(app_name.to_string())
            .or_default()
            .record(kind, self.weekday, self.hour, reading);
    }

    /// Learn name/id bindings from an installed-apps snapshot.
    ///
    /// Entries are separated by `,` or `;`. Both log formats can carry `;`
    /// inside the value (compressed logs after repacking, plain logs inside a
    /// quoted field), and every listed app is bound either way.
    fn on_installed(&mut self, value: &str) {
        for app_entry in value.split([',', ';']) {
            let mut details = app_entry.split('@');
            let (Some(name), Some(info)) = (details.next(), details.next()) else {
                continue;
            };
            let fields: Vec<&str> = info.split(':').collect();
            let app_id = fields[fields.len().saturating_sub(2)];

            let outcome = self.identities.bind(name, app_id);
            if outcome.new_name {
                self.traffic.entry(name.to_string()).or_default();
            }
            for stale in outcome.unbound {
                debug!(
                    "Device {}: app id {} moved from {} to {}",
                    self.window.file_id, app_id, stale, name
                );
            }
        }
    }
}

/// Pid carried by an `app|<pid>|<keyword>` path (`app|<keyword>|<pid>` works too).
fn pid_segment<'a>(segments: &[&'a str], keyword: &str) -> Option<&'a str> {
    segments.iter().skip(1).copied().find(|s| *s != keyword)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
