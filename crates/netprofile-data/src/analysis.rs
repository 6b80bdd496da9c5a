//! Per-device analysis pipeline.
//!
//! Resolves the canonical window in a first pass over the log, runs the
//! activity state machine in a second pass and reduces the result to the
//! device's Saturday profile.

use std::path::Path;

use netprofile_core::models::{DeviceWindow, HourlyProfile, LogFormat, SkipReason};
use tracing::debug;

use crate::aggregator::WeekdayAggregator;
use crate::analyzer::ActivityAnalyzer;
use crate::reader::LogReader;
use crate::window::TimeRangeResolver;

// ── Public types ──────────────────────────────────────────────────────────────

/// Result of analysing one device log.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceOutcome {
    Profiled(HourlyProfile),
    Skipped(SkipReason),
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline for the log at `path`.
///
/// The log is streamed twice; a failure in either pass marks the device as
/// unreadable.
pub fn analyze_device(file_id: &str, path: &Path, format: LogFormat) -> DeviceOutcome {
    // ── Pass 1: window ────────────────────────────────────────────────────────
    let window = match resolve_file_window(file_id, path, format) {
        Ok(window) => window,
        Err(reason) => return DeviceOutcome::Skipped(reason),
    };
    debug!(
        "Device {}: window {} .. {} ({} days)",
        file_id, window.start, window.end, window.span_days
    );

    // ── Pass 2: activity ──────────────────────────────────────────────────────
    let mut reader = match LogReader::open(path, format) {
        Ok(reader) => reader,
        Err(e) => return DeviceOutcome::Skipped(unreadable(e)),
    };
    let mut analyzer = ActivityAnalyzer::new(window);
    for record in reader.by_ref() {
        analyzer.process(&record);
    }
    if let Err(e) = reader.finish() {
        return DeviceOutcome::Skipped(unreadable(e));
    }

    summarise(analyzer)
}

/// First pass only: the canonical window of the log at `path`.
pub fn resolve_file_window(
    file_id: &str,
    path: &Path,
    format: LogFormat,
) -> Result<DeviceWindow, SkipReason> {
    let mut reader = LogReader::open(path, format).map_err(unreadable)?;
    let mut resolver = TimeRangeResolver::new();
    for record in reader.by_ref() {
        resolver.observe(&record);
    }
    reader.finish().map_err(unreadable)?;
    resolver.resolve(file_id)
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn summarise(analyzer: ActivityAnalyzer) -> DeviceOutcome {
    match analyzer.finish() {
        Ok(activity) => DeviceOutcome::Profiled(WeekdayAggregator::saturday(&activity)),
        Err(reason) => DeviceOutcome::Skipped(reason),
    }
}

fn unreadable(err: netprofile_core::ProfileError) -> SkipReason {
    SkipReason::Unreadable {
        message: err.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::decode_line;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use netprofile_core::models::{LogRecord, HOURS_PER_DAY};
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // ── Fixture ───────────────────────────────────────────────────────────────

    /// Log lines spanning 2024-03-03 10:00 to 2024-03-23 10:00.
    ///
    /// The canonical window is 2024-03-04 04:00 .. 2024-03-23 04:00, holding
    /// exactly two Saturdays (03-09 and 03-16) and 19 logged days. Maps
    /// receives 1000 bytes during hour 14 of the first Saturday only, and is
    /// brought to the foreground three times in that hour.
    fn twenty_day_fixture() -> Vec<String> {
        let mut seq = 0u32;
        let mut lines = Vec::new();
        let mut push = |ts: &str, entry_type: &str, value: &str| {
            seq += 1;
            lines.push(format!("{};{};{}.000+0000;{};{}", seq, seq, ts, entry_type, value));
        };

        push("2024-03-03T10:00:00", "screen|power", "on");
        for day in 4..=22 {
            let date = format!("2024-03-{:02}", day);
            if day == 4 {
                push(
                    &format!("{}T09:00:00", date),
                    "app|installed",
                    "Maps@com.maps:1:10123:x;Mail@com.mail:1:10200:x",
                );
            }
            push(&format!("{}T12:00:00", date), "screen|power", "on");
            match day {
                8 => push(&format!("{}T20:00:00", date), "net|app|10123|rx_bytes", "5000"),
                9 => {
                    push(&format!("{}T14:00:00", date), "screen|power", "on");
                    push(&format!("{}T14:00:01", date), "hf|locked", "false");
                    for minute in 1..=3 {
                        push(
                            &format!("{}T14:0{}:10", date, minute),
                            "app|42|importance",
                            "foreground",
                        );
                        push(
                            &format!("{}T14:0{}:11", date, minute),
                            "app|42|name",
                            "Maps:com.google",
                        );
                    }
                    push(&format!("{}T14:10:00", date), "net|app|10123|rx_bytes", "6000");
                }
                16 => push(&format!("{}T14:10:00", date), "net|app|10123|rx_bytes", "6000"),
                _ => {}
            }
        }
        push("2024-03-23T10:00:00", "screen|power", "off");
        lines
    }

    fn write_gz(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
        let path = dir.join(name);
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        for line in lines {
            writeln!(encoder, "{}", line).unwrap();
        }
        encoder.finish().unwrap();
        path
    }

    /// Same pipeline as [`analyze_device`] over records already in memory.
    fn analyze_records(file_id: &str, records: &[LogRecord]) -> DeviceOutcome {
        let mut resolver = TimeRangeResolver::new();
        records.iter().for_each(|r| resolver.observe(r));
        let window = match resolver.resolve(file_id) {
            Ok(window) => window,
            Err(reason) => return DeviceOutcome::Skipped(reason),
        };

        let mut analyzer = ActivityAnalyzer::new(window);
        records.iter().for_each(|r| analyzer.process(r));
        summarise(analyzer)
    }

    fn decode_all(lines: &[String]) -> Vec<LogRecord> {
        lines
            .iter()
            .filter_map(|l| decode_line(l, LogFormat::Compressed))
            .collect()
    }

    // ── End to end ────────────────────────────────────────────────────────────

    #[test]
    fn test_twenty_day_fixture_profile() {
        let dir = TempDir::new().unwrap();
        let path = write_gz(dir.path(), "device-a.csv.gz", &twenty_day_fixture());

        let outcome = analyze_device("device-a", &path, LogFormat::Compressed);
        let DeviceOutcome::Profiled(profile) = outcome else {
            panic!("expected a profile, got {:?}", outcome);
        };

        // One 1000-byte delta on Saturday hour 14, two Saturdays observed.
        let combined = profile.combined();
        assert_eq!(profile.file_id, "device-a");
        assert_eq!(combined[14], 1000.0 / 2.0);
        for hour in (0..HOURS_PER_DAY).filter(|h| *h != 14) {
            assert_eq!(combined[hour], 0.0, "hour {}", hour);
        }
    }

    #[test]
    fn test_fixture_foreground_counts() {
        let records = decode_all(&twenty_day_fixture());
        let mut resolver = TimeRangeResolver::new();
        records.iter().for_each(|r| resolver.observe(r));
        let mut analyzer = ActivityAnalyzer::new(resolver.resolve("device-a").unwrap());
        records.iter().for_each(|r| analyzer.process(r));

        let activity = analyzer.finish().unwrap();
        assert_eq!(activity.logged_days, 19);
        assert_eq!(activity.days_per_weekday[netprofile_core::models::SATURDAY], 2);
        assert_eq!(
            *activity.foreground["Maps"].cell(netprofile_core::models::SATURDAY, 14),
            3
        );
    }

    #[test]
    fn test_in_memory_matches_file_pipeline() {
        let lines = twenty_day_fixture();
        let dir = TempDir::new().unwrap();
        let path = write_gz(dir.path(), "device-a.csv.gz", &lines);

        assert_eq!(
            analyze_records("device-a", &decode_all(&lines)),
            analyze_device("device-a", &path, LogFormat::Compressed)
        );
    }

    // ── Skips ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_missing_file_is_unreadable() {
        let outcome = analyze_device(
            "ghost",
            Path::new("/tmp/netprofile-ghost-xyz.csv.gz"),
            LogFormat::Compressed,
        );
        assert!(matches!(
            outcome,
            DeviceOutcome::Skipped(SkipReason::Unreadable { .. })
        ));
    }

    #[test]
    fn test_only_invalid_dates() {
        let dir = TempDir::new().unwrap();
        let lines = vec![
            "1;1;(invalid date);screen|power;on".to_string(),
            "2;2;(invalid date);hf|locked;true".to_string(),
        ];
        let path = write_gz(dir.path(), "d.csv.gz", &lines);
        assert_eq!(
            analyze_device("d", &path, LogFormat::Compressed),
            DeviceOutcome::Skipped(SkipReason::NoValidTimestamps)
        );
    }

    #[test]
    fn test_short_window() {
        let lines = vec![
            "1;1;2024-03-01T12:00:00.000+0000;screen|power;on".to_string(),
            "2;2;2024-03-10T12:00:00.000+0000;screen|power;on".to_string(),
        ];
        assert_eq!(
            analyze_records("d", &decode_all(&lines)),
            DeviceOutcome::Skipped(SkipReason::WindowTooShort { days: 8 })
        );
    }

    #[test]
    fn test_long_window_with_sparse_activity() {
        // Long enough window, but a single record falls inside it.
        let lines = vec![
            "1;1;2024-03-01T12:00:00.000+0000;screen|power;on".to_string(),
            "2;2;2024-03-02T12:00:00.000+0000;screen|power;on".to_string(),
            "3;3;2024-03-31T12:00:00.000+0000;screen|power;on".to_string(),
        ];
        assert_eq!(
            analyze_records("d", &decode_all(&lines)),
            DeviceOutcome::Skipped(SkipReason::TooFewLoggedDays { days: 1 })
        );
    }
}
