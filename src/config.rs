use crate::content::ContentLimits;
use crate::personalization::PersonalizationWeights;
use crate::publisher::Platform;
use crate::strategy::StrategyWeights;
use crate::translation::TranslationScoring;
use anyhow::{Context, Result};

/// Tunable scoring constants. Not read from the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringConfig {
    pub translation: TranslationScoring,
    pub personalization: PersonalizationWeights,
    pub strategy: StrategyWeights,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Worker pool
    pub concurrency_limit: usize,

    // Engagement simulation
    pub engagement_seed: Option<u64>,
    pub target_platforms: Vec<Platform>,

    // Input files
    pub content_blocks_file: String,
    pub user_profiles_file: String,
    pub language_profiles_file: Option<String>,

    // Output
    pub output_dir: String,

    // Strategy job times (HH:MM, UTC)
    pub strategy_schedule: Vec<String>,

    // Intake
    pub max_source_words: usize,

    pub scoring: ScoringConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            // Worker pool
            concurrency_limit: std::env::var("CONCURRENCY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.concurrency_limit)
                .max(1),

            // Engagement simulation
            engagement_seed: std::env::var("ENGAGEMENT_SEED")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().parse::<u64>())
                .transpose()
                .context("ENGAGEMENT_SEED must be an unsigned integer")?,
            target_platforms: match std::env::var("TARGET_PLATFORMS") {
                Ok(list) if !list.trim().is_empty() => parse_platforms(&list)?,
                _ => defaults.target_platforms,
            },

            // Input files
            content_blocks_file: std::env::var("CONTENT_BLOCKS_FILE")
                .unwrap_or(defaults.content_blocks_file),
            user_profiles_file: std::env::var("USER_PROFILES_FILE")
                .unwrap_or(defaults.user_profiles_file),
            language_profiles_file: std::env::var("LANGUAGE_PROFILES_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            // Output
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(defaults.output_dir),

            // Strategy schedule
            strategy_schedule: std::env::var("STRATEGY_SCHEDULE")
                .map(|s| parse_list(&s))
                .unwrap_or_default(),

            // Intake
            max_source_words: std::env::var("MAX_SOURCE_WORDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_source_words),

            scoring: ScoringConfig::default(),
        })
    }

    /// Intake limits derived from this config.
    pub fn content_limits(&self) -> ContentLimits {
        ContentLimits {
            max_words: self.max_source_words,
            ..ContentLimits::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency_limit: 4,
            engagement_seed: None,
            target_platforms: Platform::ALL.to_vec(),
            content_blocks_file: "data/content_blocks.json".to_string(),
            user_profiles_file: "data/user_profiles.json".to_string(),
            language_profiles_file: None,
            output_dir: "output".to_string(),
            strategy_schedule: Vec::new(),
            max_source_words: ContentLimits::default().max_words,
            scoring: ScoringConfig::default(),
        }
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn parse_platforms(raw: &str) -> Result<Vec<Platform>> {
    let mut platforms = Vec::new();
    for name in parse_list(raw) {
        let platform: Platform = name
            .parse()
            .with_context(|| format!("Invalid TARGET_PLATFORMS entry '{}'", name))?;
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }
    Ok(platforms)
}
