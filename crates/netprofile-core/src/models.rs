use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Days in a week; grids are indexed Monday = 0 … Sunday = 6.
pub const DAYS_PER_WEEK: usize = 7;

/// Hours in a day; grids are indexed by the wall-clock hour of the record.
pub const HOURS_PER_DAY: usize = 24;

/// Weekday index of Saturday in a [`WeekGrid`].
pub const SATURDAY: usize = 5;

/// Minimum span, and minimum number of logged days, for a device to count.
pub const MIN_DEVICE_DAYS: i64 = 14;

/// Top-level entry-type categories the activity analysis looks at.
pub const TRACKED_CATEGORIES: &[&str] = &["app", "screen", "hf", "net"];

// ── LogFormat ─────────────────────────────────────────────────────────────────

/// On-disk layout of a device log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Gzip-compressed `.csv.gz`, where the value field may itself contain `;`.
    Compressed,
    /// Uncompressed `.csv` with one `;` per field boundary and optional quoting.
    Plain,
}

impl LogFormat {
    /// File-name suffix of a log in this format.
    pub fn extension(self) -> &'static str {
        match self {
            LogFormat::Compressed => ".csv.gz",
            LogFormat::Plain => ".csv",
        }
    }

    /// Path of the log for `file_id` inside `data_dir`.
    pub fn log_path(self, data_dir: &Path, file_id: &str) -> PathBuf {
        data_dir.join(format!("{}{}", file_id, self.extension()))
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Compressed => write!(f, "compressed"),
            LogFormat::Plain => write!(f, "plain"),
        }
    }
}

// ── LogRecord ─────────────────────────────────────────────────────────────────

/// Timestamp carried by a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTime {
    /// Local wall-clock time, truncated to whole seconds.
    Valid(NaiveDateTime),
    /// The device logged `(invalid date)` or something unparseable.
    Invalid,
}

impl RecordTime {
    pub fn valid(self) -> Option<NaiveDateTime> {
        match self {
            RecordTime::Valid(ts) => Some(ts),
            RecordTime::Invalid => None,
        }
    }
}

/// One decoded line of a device activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub entry: String,
    pub sequence: String,
    pub timestamp: RecordTime,
    /// `|`-separated category path, e.g. `net|app|10123|rx_bytes`.
    pub entry_type: String,
    /// Free-text payload, untrimmed.
    pub value: String,
}

impl LogRecord {
    /// Path segments of the entry type.
    pub fn segments(&self) -> Vec<&str> {
        self.entry_type.split('|').collect()
    }

    /// First path segment.
    pub fn category(&self) -> &str {
        self.entry_type.split('|').next().unwrap_or("")
    }
}

// ── WeekGrid ──────────────────────────────────────────────────────────────────

/// Fixed 7×24 grid indexed by `[weekday][hour]`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekGrid<T> {
    cells: [[T; HOURS_PER_DAY]; DAYS_PER_WEEK],
}

impl<T: Default> Default for WeekGrid<T> {
    fn default() -> Self {
        Self {
            cells: std::array::from_fn(|_| std::array::from_fn(|_| T::default())),
        }
    }
}

impl<T> WeekGrid<T> {
    /// # Panics
    /// When `weekday >= 7` or `hour >= 24`.
    pub fn cell(&self, weekday: usize, hour: usize) -> &T {
        &self.cells[weekday][hour]
    }

    /// # Panics
    /// When `weekday >= 7` or `hour >= 24`.
    pub fn cell_mut(&mut self, weekday: usize, hour: usize) -> &mut T {
        &mut self.cells[weekday][hour]
    }

    /// All 24 hourly cells of one weekday.
    pub fn day(&self, weekday: usize) -> &[T; HOURS_PER_DAY] {
        &self.cells[weekday]
    }
}

// ── DeviceWindow ──────────────────────────────────────────────────────────────

/// Canonical `[start, end)` observation window of a device, both ends at 04:00.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceWindow {
    pub file_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// `end.date() - start.date()` in days, at least [`MIN_DEVICE_DAYS`].
    pub span_days: i64,
}

impl DeviceWindow {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts < self.end
    }
}

// ── Batch types ───────────────────────────────────────────────────────────────

/// A device log scheduled for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceJob {
    pub file_id: String,
    pub path: PathBuf,
}

/// Why a device was left out of the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The log could not be opened or broke while decoding.
    Unreadable { message: String },
    /// No record carried a valid timestamp.
    NoValidTimestamps,
    /// The canonical window spans fewer than 14 days.
    WindowTooShort { days: i64 },
    /// Fewer than 14 distinct days had tracked activity inside the window.
    TooFewLoggedDays { days: u32 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unreadable { message } => write!(f, "unreadable log: {}", message),
            SkipReason::NoValidTimestamps => write!(f, "no valid start or end dates"),
            SkipReason::WindowTooShort { days } => {
                write!(f, "under {} days of logging ({} days)", MIN_DEVICE_DAYS, days)
            }
            SkipReason::TooFewLoggedDays { days } => {
                write!(f, "no. of actual data days: {}", days)
            }
        }
    }
}

/// Mean per-hour network usage of one device on the reference weekday.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyProfile {
    pub file_id: String,
    pub rx: [f64; HOURS_PER_DAY],
    pub tx: [f64; HOURS_PER_DAY],
}

impl HourlyProfile {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            rx: [0.0; HOURS_PER_DAY],
            tx: [0.0; HOURS_PER_DAY],
        }
    }

    /// Received plus transmitted bytes per hour.
    pub fn combined(&self) -> [f64; HOURS_PER_DAY] {
        std::array::from_fn(|h| self.rx[h] + self.tx[h])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
