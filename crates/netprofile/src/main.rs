mod bootstrap;

use anyhow::Result;
use netprofile_core::settings::Settings;
use netprofile_data::reader::plan_device_jobs;
use netprofile_runtime::orchestrator::BatchDriver;
use netprofile_runtime::summary::SummaryWriter;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;
    bootstrap::ensure_output_dir(&settings.output_dir)?;

    tracing::info!("netprofile v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Data: {}, Format: {}, Jobs: {}",
        settings.data_dir.display(),
        settings.format,
        settings.jobs
    );

    let jobs = plan_device_jobs(settings.ids.as_deref(), &settings.data_dir, settings.format)?;
    tracing::info!("{} device logs scheduled", jobs.len());

    let writer = SummaryWriter::create(settings.summary_path())?;
    let driver = BatchDriver::new(usize::from(settings.jobs));
    let report = driver.run(jobs, settings.format, writer).await?;

    if let Some(path) = settings.report.as_deref() {
        report.save_to(path)?;
        tracing::info!("Run report written to {}", path.display());
    }

    println!("Time taken: {:.2} seconds", report.elapsed_seconds);
    println!("No. of files ignored: {}", report.devices_ignored);
    println!("Summary written to {}", settings.summary_path().display());

    Ok(())
}
