//! Preview binary - runs a single text through the pipeline for one user
//! and prints every intermediate record, without writing output files.
//!
//! Usage:
//!   cargo run --bin preview -- "Be kind to all beings"
//!   cargo run --bin preview -- "Be kind" --lang sa --tone devotional --type quote
//!   cargo run --bin preview -- "Be kind" --platform twitter,linkedin --seed 42
//!
//! Options:
//!   --lang       target language code (defaults to hi)
//!   --tone       preferred tone: formal, casual, devotional, neutral (defaults to formal)
//!   --type       content type: fact, quote, devotional, article (defaults to fact)
//!   --source     source language code (defaults to en)
//!   --platform   comma-separated platforms (defaults to all)
//!   --interests  comma-separated interest tags, also used as content tags
//!   --seed       engagement seed for a reproducible run
//!
//! Other settings (LANGUAGE_PROFILES_FILE, MAX_SOURCE_WORDS) come from the
//! environment as for the batch binary.

use adaptive_content_pipeline::config::{parse_list, parse_platforms, Config};
use adaptive_content_pipeline::content::{ContentBlock, ContentType};
use adaptive_content_pipeline::i18n::{LanguageRegistry, Tone};
use adaptive_content_pipeline::personalization::{UserProfile, UserProfileStore};
use adaptive_content_pipeline::pipeline::Pipeline;
use adaptive_content_pipeline::publisher::Platform;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::Path;
use tracing::info;

const PREVIEW_CONTENT_ID: &str = "preview";
const PREVIEW_USER_ID: &str = "preview-user";

struct PreviewArgs {
    text: String,
    language: String,
    tone: Tone,
    content_type: ContentType,
    source_language: String,
    platforms: Vec<Platform>,
    interests: Vec<String>,
    seed: Option<u64>,
}

impl PreviewArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let mut text = None;
        let mut parsed = Self {
            text: String::new(),
            language: "hi".to_string(),
            tone: Tone::Formal,
            content_type: ContentType::Fact,
            source_language: "en".to_string(),
            platforms: Platform::ALL.to_vec(),
            interests: Vec::new(),
            seed: None,
        };

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let mut value = || {
                iter.next()
                    .with_context(|| format!("Missing value for {}", arg))
            };
            match arg.as_str() {
                "--lang" => parsed.language = value()?.trim().to_string(),
                "--tone" => parsed.tone = value()?.parse()?,
                "--type" => parsed.content_type = value()?.parse()?,
                "--source" => parsed.source_language = value()?.trim().to_string(),
                "--platform" => parsed.platforms = parse_platforms(value()?)?,
                "--interests" => parsed.interests = parse_list(value()?),
                "--seed" => {
                    let raw = value()?;
                    parsed.seed = Some(
                        raw.parse()
                            .with_context(|| format!("Invalid seed: '{}'", raw))?,
                    );
                }
                flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
                positional => {
                    if text.is_some() {
                        bail!("Only one text argument is accepted");
                    }
                    text = Some(positional.to_string());
                }
            }
        }

        parsed.text = text.context("Usage: preview <text> [--lang CODE] [--tone TONE] ...")?;
        if parsed.platforms.is_empty() {
            bail!("At least one platform is required");
        }
        Ok(parsed)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adaptive_content_pipeline=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = PreviewArgs::parse(&args)?;

    let base = Config::from_env()?;
    let registry = match &base.language_profiles_file {
        Some(path) => LanguageRegistry::load_from_json(Path::new(path))?,
        None => LanguageRegistry::builtin(),
    };

    let interests: Vec<&str> = args.interests.iter().map(String::as_str).collect();
    let profile = UserProfile::new(PREVIEW_USER_ID, &args.language, args.tone)
        .with_interests(&interests);
    let block = ContentBlock::new(
        PREVIEW_CONTENT_ID,
        &args.text,
        args.content_type,
        &args.source_language,
    )
    .with_tags(&interests);

    let config = Config {
        concurrency_limit: 1,
        engagement_seed: args.seed,
        target_platforms: args.platforms,
        ..base
    };

    info!(
        "Previewing {} → {} ({}) on {} platform(s)",
        args.source_language,
        registry.display_name(&args.language),
        args.tone,
        config.target_platforms.len()
    );

    let pipeline = Pipeline::new(config, registry, UserProfileStore::from_profiles(vec![profile]));
    let outcome = pipeline.process_item(&block, Utc::now());

    for failure in &outcome.failures {
        eprintln!("✗ {} failed: {}", failure.stage, failure.message);
    }

    println!("\n{}", "=".repeat(60));
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    println!("{}", "=".repeat(60));

    if !outcome.failures.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
