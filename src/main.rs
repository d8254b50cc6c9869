use adaptive_content_pipeline::config::Config;
use adaptive_content_pipeline::content::ContentBlock;
use adaptive_content_pipeline::i18n::LanguageRegistry;
use adaptive_content_pipeline::output::{self, write_json};
use adaptive_content_pipeline::personalization::UserProfileStore;
use adaptive_content_pipeline::pipeline::{Pipeline, RunSummary};
use adaptive_content_pipeline::scheduler::{self, StrategyJob};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when not present)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adaptive_content_pipeline=info".parse()?),
        )
        .init();

    info!("Starting adaptive content pipeline");

    // Load configuration from environment
    let config = Config::from_env()?;

    // Step 1: Load read-only inputs
    let registry = match &config.language_profiles_file {
        Some(path) => LanguageRegistry::load_from_json(Path::new(path))?,
        None => LanguageRegistry::builtin(),
    };
    let profiles = UserProfileStore::load_from_json(Path::new(&config.user_profiles_file))?;
    let blocks = load_content_blocks(Path::new(&config.content_blocks_file))?;

    info!(
        "Loaded {} content blocks, {} user profiles, {} languages",
        blocks.len(),
        profiles.len(),
        registry.list_all().len()
    );

    if blocks.is_empty() {
        info!("No content blocks to process, exiting");
        return Ok(());
    }

    // Step 2: Run every block through the pipeline
    let output_dir = config.output_dir.clone();
    let schedule = config.strategy_schedule.clone();
    let pipeline = Pipeline::new(config, registry, profiles);
    let summary = pipeline.run(blocks).await;

    let failures = summary.failures().count();
    if failures > 0 {
        warn!("{} stage failures, see {}", failures, output::FAILURES_FILE);
    }

    // Step 3: Write records
    write_run_outputs(Path::new(&output_dir), &summary)?;

    // Step 4: Strategy report
    let job = Arc::new(StrategyJob::new(pipeline, &output_dir));
    job.run_once().await?;

    if let Some(report) = job.latest().await {
        if !report.coverage_gaps.is_empty() {
            info!(
                "{} language/tone pairs need better voice coverage",
                report.coverage_gaps.len()
            );
        }
    }

    info!("✓ Outputs written to {}", output_dir);

    // Step 5: Keep re-running the strategy job if a schedule is configured
    if schedule.is_empty() {
        return Ok(());
    }

    let mut sched = scheduler::start_scheduler(Arc::clone(&job), &schedule).await?;
    info!("Waiting for scheduled strategy runs (Ctrl+C to stop)");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down scheduler");
    sched.shutdown().await?;
    Ok(())
}

fn load_content_blocks(path: &Path) -> Result<Vec<ContentBlock>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read content blocks from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse content blocks in {}", path.display()))
}

fn write_run_outputs(dir: &Path, summary: &RunSummary) -> Result<()> {
    let outcomes = &summary.outcomes;

    let translations: Vec<_> = outcomes.iter().flat_map(|o| &o.translations).collect();
    let personalized: Vec<_> = outcomes.iter().flat_map(|o| &o.personalized).collect();
    let voices: Vec<_> = outcomes.iter().flat_map(|o| &o.voices).collect();
    let previews: Vec<_> = outcomes.iter().flat_map(|o| &o.previews).collect();
    let engagement: Vec<_> = outcomes.iter().flat_map(|o| &o.engagement).collect();
    let failures: Vec<_> = summary.failures().collect();

    write_json(&dir.join(output::TRANSLATIONS_FILE), &translations)?;
    write_json(&dir.join(output::PERSONALIZED_FILE), &personalized)?;
    write_json(&dir.join(output::VOICES_FILE), &voices)?;
    write_json(&dir.join(output::PREVIEWS_FILE), &previews)?;
    write_json(&dir.join(output::ENGAGEMENT_FILE), &engagement)?;
    write_json(&dir.join(output::FAILURES_FILE), &failures)?;
    write_json(&dir.join(output::METRICS_FILE), &summary.metrics)?;
    Ok(())
}
