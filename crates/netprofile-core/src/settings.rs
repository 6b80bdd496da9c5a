use clap::Parser;
use std::path::PathBuf;

use crate::models::LogFormat;

/// Name of the summary table written inside the output directory.
pub const SUMMARY_FILE_NAME: &str = "saturday_totals.csv";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Saturday hour-of-day network usage profiles from device activity logs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "netprofile",
    about = "Saturday hour-of-day network usage profiles from device activity logs",
    version
)]
pub struct Settings {
    /// Directory holding the device log files
    pub data_dir: PathBuf,

    /// File listing the device log ids to process (defaults to every log in DATA_DIR)
    #[arg(long)]
    pub ids: Option<PathBuf>,

    /// Device log layout
    #[arg(long, value_enum, default_value_t = LogFormat::Compressed)]
    pub format: LogFormat,

    /// Directory receiving the summary table
    #[arg(long, default_value = "anomaly_output")]
    pub output_dir: PathBuf,

    /// Number of device logs processed concurrently (1-64)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..=64))]
    pub jobs: u16,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments and apply derived values.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::resolve(Settings::parse_from(args))
    }

    /// Full path of the summary table.
    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(SUMMARY_FILE_NAME)
    }

    /// `--debug` overrides the log level.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::load_from_args(["netprofile", "/data/logs"]);

        assert_eq!(settings.data_dir, PathBuf::from("/data/logs"));
        assert!(settings.ids.is_none());
        assert_eq!(settings.format, LogFormat::Compressed);
        assert_eq!(settings.output_dir, PathBuf::from("anomaly_output"));
        assert_eq!(settings.jobs, 1);
        assert!(settings.report.is_none());
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
    }

    #[test]
    fn test_settings_plain_format_with_ids() {
        let settings = Settings::load_from_args([
            "netprofile",
            "/data/lancs",
            "--ids",
            "/data/ids.txt",
            "--format",
            "plain",
        ]);
        assert_eq!(settings.format, LogFormat::Plain);
        assert_eq!(settings.ids, Some(PathBuf::from("/data/ids.txt")));
    }

    #[test]
    fn test_settings_debug_overrides_log_level() {
        let settings = Settings::load_from_args(["netprofile", "/d", "--log-level", "ERROR", "--debug"]);
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_settings_jobs_range() {
        assert!(Settings::try_parse_from(["netprofile", "/d", "--jobs", "0"]).is_err());
        assert!(Settings::try_parse_from(["netprofile", "/d", "--jobs", "65"]).is_err());
        let settings = Settings::load_from_args(["netprofile", "/d", "--jobs", "8"]);
        assert_eq!(settings.jobs, 8);
    }

    #[test]
    fn test_summary_path() {
        let settings = Settings::load_from_args(["netprofile", "/d", "--output-dir", "/tmp/out"]);
        assert_eq!(
            settings.summary_path(),
            PathBuf::from("/tmp/out/saturday_totals.csv")
        );
    }

    #[test]
    fn test_settings_requires_data_dir() {
        assert!(Settings::try_parse_from(["netprofile"]).is_err());
    }
}
