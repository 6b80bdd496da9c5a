//! Async batch driver.
//!
//! Runs the per-device pipeline for every job on tokio's blocking pool, with
//! at most `jobs` devices in flight. Results flow through an `mpsc` channel to
//! a single writer loop, so summary rows are appended one at a time.

use std::sync::Arc;
use std::time::Instant;

use netprofile_core::models::{DeviceJob, LogFormat, SkipReason};
use netprofile_core::Result;
use netprofile_data::analysis::{analyze_device, DeviceOutcome};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::report::RunReport;
use crate::summary::SummaryWriter;

/// Result of one worker, tagged with its device.
#[derive(Debug)]
struct DeviceResult {
    file_id: String,
    outcome: DeviceOutcome,
}

// ── BatchDriver ───────────────────────────────────────────────────────────────

/// Drives a batch of device jobs to completion.
///
/// With a single job slot, rows are written in input order.
pub struct BatchDriver {
    jobs: usize,
}

impl BatchDriver {
    /// Create a driver running up to `jobs` devices at once (at least one).
    pub fn new(jobs: usize) -> Self {
        Self { jobs: jobs.max(1) }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Process every job and append a summary row per profiled device.
    ///
    /// Per-device failures are recorded in the returned report; only summary
    /// write failures abort the batch.
    pub async fn run(
        &self,
        jobs: Vec<DeviceJob>,
        format: LogFormat,
        mut writer: SummaryWriter,
    ) -> Result<RunReport> {
        let started = Instant::now();
        let total = jobs.len();
        // Buffer a modest number of results so workers rarely wait on the writer.
        let (tx, mut rx) = mpsc::channel::<DeviceResult>(16);
        let semaphore = Arc::new(Semaphore::new(self.jobs));

        let producer = tokio::spawn(async move {
            for job in jobs {
                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = process_job(job, format).await;
                    if tx.send(result).await.is_err() {
                        debug!("result channel closed; dropping device result");
                    }
                    // Released only once the result is queued, keeping
                    // single-slot runs in input order.
                    drop(permit);
                });
            }
        });

        let mut report = RunReport::new();
        while let Some(DeviceResult { file_id, outcome }) = rx.recv().await {
            match outcome {
                DeviceOutcome::Profiled(profile) => {
                    writer.append(&profile)?;
                    report.record_profiled();
                    debug!("Device {}: summary row written", file_id);
                }
                DeviceOutcome::Skipped(reason) => {
                    warn!("Ignoring device {}: {}", file_id, reason);
                    report.record_skipped(&file_id, reason);
                }
            }
            debug!("Progress: {}/{} devices", report.devices_total, total);
        }

        producer.await.map_err(std::io::Error::from)?;
        writer.flush()?;

        report.elapsed_seconds = started.elapsed().as_secs_f64();
        info!(
            "Batch finished: {} profiled, {} ignored of {} devices in {:.2}s",
            report.devices_profiled, report.devices_ignored, total, report.elapsed_seconds
        );
        Ok(report)
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

async fn process_job(job: DeviceJob, format: LogFormat) -> DeviceResult {
    info!("Processing device {}", job.file_id);
    let file_id = job.file_id.clone();

    let outcome = tokio::task::spawn_blocking(move || {
        analyze_device(&job.file_id, &job.path, format)
    })
    .await
    .unwrap_or_else(|e| {
        DeviceOutcome::Skipped(SkipReason::Unreadable {
            message: format!("worker failed: {}", e),
        })
    });

    DeviceResult { file_id, outcome }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
