//! Saturday summary table writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use netprofile_core::models::{HourlyProfile, HOURS_PER_DAY};
use netprofile_core::{ProfileError, Result};

/// Appends one `fileId,total0,...,total23` row per profiled device.
pub struct SummaryWriter {
    path: PathBuf,
    out: BufWriter<File>,
    rows: usize,
}

impl SummaryWriter {
    /// Truncate `path` and write the `hour,0,...,23` header.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|source| ProfileError::SummaryWrite {
            path: path.clone(),
            source,
        })?;

        let mut writer = Self {
            path,
            out: BufWriter::new(file),
            rows: 0,
        };
        let header = header_line();
        writer.write_line(&header)?;
        Ok(writer)
    }

    /// Append the combined rx+tx row of `profile`.
    pub fn append(&mut self, profile: &HourlyProfile) -> Result<()> {
        let line = row_line(profile);
        self.write_line(&line)?;
        self.rows += 1;
        Ok(())
    }

    /// Flush buffered rows to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(|source| ProfileError::SummaryWrite {
            path: self.path.clone(),
            source,
        })
    }

    /// Rows appended so far, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{}", line).map_err(|source| ProfileError::SummaryWrite {
            path: self.path.clone(),
            source,
        })
    }
}

fn header_line() -> String {
    let hours: Vec<String> = (0..HOURS_PER_DAY).map(|h| h.to_string()).collect();
    format!("hour,{}", hours.join(","))
}

fn row_line(profile: &HourlyProfile) -> String {
    let totals: Vec<String> = profile
        .combined()
        .iter()
        .map(|total| format!("{:?}", total))
        .collect();
    format!("{},{}", profile.file_id, totals.join(","))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
