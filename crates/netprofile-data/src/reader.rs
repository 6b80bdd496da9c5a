//! Device log decoding and discovery.
//!
//! Opens `.csv.gz` / `.csv` activity logs, decodes every line into a
//! [`LogRecord`] and builds the list of [`DeviceJob`]s for a run.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use netprofile_core::error::{ProfileError, Result};
use netprofile_core::models::{DeviceJob, LogFormat, LogRecord, RecordTime};
use netprofile_core::time_utils::parse_log_timestamp;
use tracing::{debug, warn};

/// Field separator of both log layouts.
const FIELD_DELIMITER: char = ';';

/// Entry, sequence, date and entry type precede the value.
const LEADING_FIELDS: usize = 4;

// ── Record decoding ───────────────────────────────────────────────────────────

/// Decode one line of a log in `format`, or `None` when it is malformed.
pub fn decode_line(line: &str, format: LogFormat) -> Option<LogRecord> {
    let line = line.trim_end_matches(['\r', '\n']);
    let fields = match format {
        LogFormat::Compressed => split_repacked(line)?,
        LogFormat::Plain => {
            let fields = split_quoted(line);
            if fields.len() != LEADING_FIELDS + 1 {
                return None;
            }
            fields
        }
    };

    let mut fields = fields.into_iter();
    let entry = fields.next()?;
    let sequence = fields.next()?;
    let date = fields.next()?;
    let entry_type = fields.next()?;
    let value = fields.next()?;

    let timestamp = match parse_log_timestamp(&date) {
        Some(ts) => RecordTime::Valid(ts),
        None => RecordTime::Invalid,
    };

    Some(LogRecord {
        entry,
        sequence,
        timestamp,
        entry_type,
        value,
    })
}

/// Split on the first four delimiters only.
///
/// App lists in the value field use the same `;` as the field separator, so
/// everything after the fourth delimiter is the value, delimiters included.
fn split_repacked(line: &str) -> Option<Vec<String>> {
    let fields: Vec<String> = line
        .splitn(LEADING_FIELDS + 1, FIELD_DELIMITER)
        .map(str::to_string)
        .collect();
    (fields.len() == LEADING_FIELDS + 1).then_some(fields)
}

/// Split a `;`-separated row honouring double-quoted fields (`""` is a quote).
fn split_quoted(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == FIELD_DELIMITER && !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

// ── LogReader ─────────────────────────────────────────────────────────────────

/// Counters collected while streaming one log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub lines: u64,
    pub records: u64,
    pub malformed: u64,
}

/// Streaming iterator over the records of one device log.
///
/// A read or decode failure ends the stream; the error is reported by
/// [`LogReader::finish`] so callers can tell an unreadable log from an empty one.
pub struct LogReader {
    path: PathBuf,
    format: LogFormat,
    lines: Box<dyn BufRead + Send>,
    buf: String,
    failure: Option<std::io::Error>,
    stats: ReadStats,
}

impl LogReader {
    /// Open the log at `path`, decompressing it when `format` is compressed.
    pub fn open(path: &Path, format: LogFormat) -> Result<Self> {
        let file = File::open(path).map_err(|source| ProfileError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let lines: Box<dyn BufRead + Send> = match format {
            LogFormat::Compressed => Box::new(BufReader::new(MultiGzDecoder::new(file))),
            LogFormat::Plain => Box::new(BufReader::new(file)),
        };
        Ok(Self::from_reader(lines, path, format))
    }

    /// Wrap an already-decoded text source.
    pub fn from_reader(lines: Box<dyn BufRead + Send>, path: &Path, format: LogFormat) -> Self {
        Self {
            path: path.to_path_buf(),
            format,
            lines,
            buf: String::new(),
            failure: None,
            stats: ReadStats::default(),
        }
    }

    /// Consume the reader and report how the stream ended.
    pub fn finish(self) -> Result<ReadStats> {
        debug!(
            "File {}: {} lines, {} records, {} malformed",
            self.path.display(),
            self.stats.lines,
            self.stats.records,
            self.stats.malformed,
        );
        match self.failure {
            Some(source) => Err(ProfileError::Decode {
                path: self.path,
                source,
            }),
            None => Ok(self.stats),
        }
    }
}

impl Iterator for LogReader {
    type Item = LogRecord;

    fn next(&mut self) -> Option<LogRecord> {
        if self.failure.is_some() {
            return None;
        }
        loop {
            self.buf.clear();
            match self.lines.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.stats.lines += 1;
                    match decode_line(&self.buf, self.format) {
                        Some(record) => {
                            self.stats.records += 1;
                            return Some(record);
                        }
                        None => self.stats.malformed += 1,
                    }
                }
                Err(e) => {
                    warn!("Failed to read file {}: {}", self.path.display(), e);
                    self.failure = Some(e);
                    return None;
                }
            }
        }
    }
}

// ── Device list ───────────────────────────────────────────────────────────────

/// Build the jobs for a run.
///
/// With an ids file the listed ids are used in file order; otherwise every log
/// of the given format under `data_dir` is picked up.
pub fn plan_device_jobs(
    ids_file: Option<&Path>,
    data_dir: &Path,
    format: LogFormat,
) -> Result<Vec<DeviceJob>> {
    if !data_dir.is_dir() {
        return Err(ProfileError::DataPathNotFound(data_dir.to_path_buf()));
    }

    let ids = match ids_file {
        Some(path) => read_device_ids(path, format)?,
        None => discover_device_ids(data_dir, format),
    };
    if ids.is_empty() {
        return Err(ProfileError::NoDeviceFiles(data_dir.to_path_buf()));
    }

    Ok(ids
        .into_iter()
        .map(|file_id| DeviceJob {
            path: format.log_path(data_dir, &file_id),
            file_id,
        })
        .collect())
}

/// Read device ids from a list file.
///
/// Compressed-format lists are space-separated rows whose second column is the
/// id (the remaining columns are precomputed metadata and are ignored); plain
/// lists hold one id per line.
pub fn read_device_ids(path: &Path, format: LogFormat) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|source| ProfileError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let ids = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match format {
            LogFormat::Compressed => {
                let id = line.split(' ').nth(1).map(str::to_string);
                if id.is_none() {
                    debug!("Skipping device list row without a file name: {}", line);
                }
                id
            }
            LogFormat::Plain => Some(line.to_string()),
        })
        .collect();
    Ok(ids)
}

/// Find every log of `format` under `data_dir`, returned as ids relative to it.
pub fn discover_device_ids(data_dir: &Path, format: LogFormat) -> Vec<String> {
    let suffix = format.extension();
    let mut ids: Vec<String> = walkdir::WalkDir::new(data_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(data_dir).ok()?;
            let relative = relative.to_str()?;
            relative.strip_suffix(suffix).map(str::to_string)
        })
        .filter(|id| !id.is_empty())
        .collect();

    ids.sort();
    ids
}

// ── Tests ─────────────────────────────────────────────────────────────────────
