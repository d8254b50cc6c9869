use crate::output::{write_json, STRATEGY_FILE};
use crate::pipeline::Pipeline;
use crate::strategy::StrategyReport;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// Periodic strategy batch job over a pipeline's engagement log.
///
/// Only one run executes at a time; a tick that arrives while a run is in
/// progress is skipped.
pub struct StrategyJob {
    pipeline: Pipeline,
    output_dir: PathBuf,
    running: Mutex<()>,
    latest: RwLock<Option<StrategyReport>>,
}

impl StrategyJob {
    pub fn new(pipeline: Pipeline, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            output_dir: output_dir.into(),
            running: Mutex::new(()),
            latest: RwLock::new(None),
        }
    }

    /// Run the job once. Returns the number of recommendations, or `None`
    /// when another run was still in progress.
    pub async fn run_once(&self) -> Result<Option<usize>> {
        let Ok(_running) = self.running.try_lock() else {
            warn!("Strategy job still running, skipping this tick");
            return Ok(None);
        };

        info!("Starting strategy job");
        let report = self.pipeline.report_now();
        write_json(&self.output_dir.join(STRATEGY_FILE), &report)?;

        let count = report.recommendations.len();
        info!(
            recommendations = count,
            coverage_gaps = report.coverage_gaps.len(),
            "✓ Strategy job completed"
        );
        *self.latest.write().await = Some(report);

        Ok(Some(count))
    }

    /// Report from the most recent completed run.
    pub async fn latest(&self) -> Option<StrategyReport> {
        self.latest.read().await.clone()
    }
}

/// Initialize and start the scheduler with one daily job per time.
pub async fn start_scheduler(job: Arc<StrategyJob>, times: &[String]) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    for time in times {
        let cron_expr = time_to_cron(time)?;
        info!("Scheduling strategy job for {} UTC (cron: {})", time, cron_expr);

        let job_clone = Arc::clone(&job);
        let cron_job = Job::new_async(cron_expr.as_str(), move |_uuid, _l| {
            let job = Arc::clone(&job_clone);
            Box::pin(async move {
                info!("⏰ Scheduled strategy job triggered");
                if let Err(e) = job.run_once().await {
                    error!("Scheduled strategy job failed: {:#}", e);
                }
            })
        })?;

        scheduler.add(cron_job).await?;
    }

    scheduler.start().await?;
    info!("✓ Scheduler started");

    Ok(scheduler)
}

/// Convert a UTC time string (HH:MM) to a daily cron expression.
pub fn time_to_cron(time: &str) -> Result<String> {
    let parts: Vec<&str> = time.trim().split(':').collect();
    if parts.len() != 2 {
        bail!("Invalid time format: {}. Expected HH:MM", time);
    }

    let hour: u8 = parts[0]
        .parse()
        .with_context(|| format!("Invalid hour in '{}'", time))?;
    let minute: u8 = parts[1]
        .parse()
        .with_context(|| format!("Invalid minute in '{}'", time))?;

    if hour > 23 || minute > 59 {
        bail!("Time out of range: {}", time);
    }

    // Cron format: "second minute hour day month day_of_week"
    Ok(format!("0 {} {} * * *", minute, hour))
}
