//! Pipeline orchestration: run content blocks through every stage.
//!
//! Each block is one unit of work. Within a block the stages run strictly in
//! sequence (intake, then per user: translate, personalize, select voice,
//! then per platform: preview and simulated engagement). Blocks run
//! concurrently on blocking worker tasks, at most `concurrency_limit` at a
//! time. A failure is recorded against its block and stage and never stops
//! other blocks.

use crate::config::Config;
use crate::content::ContentBlock;
use crate::engagement::{simulate_engagement, EngagementLog, EngagementMetric};
use crate::error::{PipelineError, Stage, StageFailure};
use crate::i18n::LanguageRegistry;
use crate::metrics::{MetricsReport, PipelineMetrics};
use crate::personalization::{PersonalizationEngine, PersonalizedContent, UserProfile, UserProfileStore};
use crate::publisher::{build_preview, Platform, PostPreview, PublishedArtifact};
use crate::strategy::{StrategyRecommendation, StrategyRecommender, StrategyReport};
use crate::translation::{Translation, TranslationCache, TranslationEngine};
use crate::voice::{select_voice, VoiceAssignment};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, info_span, warn};

/// Everything one content block produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemOutcome {
    pub content_id: String,
    /// False when the block was rejected at intake
    pub accepted: bool,
    pub translations: Vec<Translation>,
    pub personalized: Vec<PersonalizedContent>,
    pub voices: Vec<VoiceAssignment>,
    pub previews: Vec<PostPreview>,
    pub engagement: Vec<EngagementMetric>,
    pub failures: Vec<StageFailure>,
}

impl ItemOutcome {
    fn new(content_id: &str) -> Self {
        Self {
            content_id: content_id.to_string(),
            ..Self::default()
        }
    }
}

/// Result of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One outcome per input block, in input order
    pub outcomes: Vec<ItemOutcome>,
    pub metrics: MetricsReport,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &StageFailure> {
        self.outcomes.iter().flat_map(|o| o.failures.iter())
    }

    pub fn voices(&self) -> Vec<VoiceAssignment> {
        self.outcomes
            .iter()
            .flat_map(|o| o.voices.iter().cloned())
            .collect()
    }
}

/// Shared, read-only inputs plus the append-only state one pipeline owns.
///
/// Cloning is cheap and every clone shares the same cache, log and metrics.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    registry: Arc<LanguageRegistry>,
    profiles: Arc<UserProfileStore>,
    cache: Arc<TranslationCache>,
    log: Arc<EngagementLog>,
    metrics: Arc<PipelineMetrics>,
    voice_log: Arc<Mutex<Vec<VoiceAssignment>>>,
}

impl Pipeline {
    pub fn new(config: Config, registry: LanguageRegistry, profiles: UserProfileStore) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            profiles: Arc::new(profiles),
            cache: Arc::new(TranslationCache::new()),
            log: Arc::new(EngagementLog::new()),
            metrics: Arc::new(PipelineMetrics::new()),
            voice_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn engagement_log(&self) -> Arc<EngagementLog> {
        Arc::clone(&self.log)
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Run every block through the pipeline with bounded concurrency.
    pub async fn run(&self, blocks: Vec<ContentBlock>) -> RunSummary {
        let started_at = Utc::now();
        let total = blocks.len();
        let limit = self.config.concurrency_limit.max(1);

        info!(
            blocks = total,
            users = self.profiles.len(),
            concurrency = limit,
            "Starting pipeline run"
        );

        let mut indexed: Vec<(usize, ItemOutcome)> = stream::iter(blocks.into_iter().enumerate())
            .map(|(index, block)| {
                let pipeline = self.clone();
                async move {
                    let content_id = block.id.clone();
                    let joined = tokio::task::spawn_blocking(move || {
                        pipeline.process_item(&block, started_at)
                    })
                    .await;

                    let outcome = match joined {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            error!(content_id = %content_id, error = %e, "Worker task failed");
                            let mut outcome = ItemOutcome::new(&content_id);
                            outcome.failures.push(StageFailure::with_message(
                                &content_id,
                                Stage::Worker,
                                e.to_string(),
                            ));
                            outcome
                        }
                    };
                    (index, outcome)
                }
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        let outcomes: Vec<ItemOutcome> = indexed.into_iter().map(|(_, o)| o).collect();

        let failures: usize = outcomes.iter().map(|o| o.failures.len()).sum();
        info!(
            blocks = total,
            failures,
            cached_translations = self.cache.len(),
            engagement_records = self.log.len(),
            "Pipeline run complete"
        );

        RunSummary {
            started_at,
            finished_at: Utc::now(),
            outcomes,
            metrics: self.metrics.report(),
        }
    }

    /// Run one block through every stage for every user and platform.
    ///
    /// `published_at` stamps the simulated posts, so a seeded run is fully
    /// reproducible.
    pub fn process_item(&self, block: &ContentBlock, published_at: DateTime<Utc>) -> ItemOutcome {
        let span = info_span!("item", content_id = %block.id);
        let _enter = span.enter();

        let mut outcome = ItemOutcome::new(&block.id);

        // Intake
        if let Err(e) = block.validate(&self.config.content_limits()) {
            self.metrics.record_item_rejected();
            self.fail(&mut outcome, Stage::Intake, None, &e);
            return outcome;
        }
        self.metrics.record_item_accepted();
        outcome.accepted = true;

        for profile in self.profiles.iter() {
            self.process_for_user(block, profile, published_at, &mut outcome);
        }

        info!(
            translations = outcome.translations.len(),
            previews = outcome.previews.len(),
            failures = outcome.failures.len(),
            "Item processed"
        );
        outcome
    }

    fn process_for_user(
        &self,
        block: &ContentBlock,
        profile: &UserProfile,
        published_at: DateTime<Utc>,
        outcome: &mut ItemOutcome,
    ) {
        let user_id = profile.user_id.as_str();
        let tone = block.content_type.base_tone();

        let language = match profile.require_preferences() {
            Ok((language, _)) => language,
            Err(e) => return self.fail(outcome, Stage::Personalize, Some(user_id), &e),
        };

        // Translate
        let engine = TranslationEngine::new(&self.registry)
            .with_scoring(self.config.scoring.translation.clone())
            .with_limits(self.config.content_limits());
        let translation =
            match self
                .cache
                .get_or_translate(&engine, block, language, tone, &self.metrics)
            {
                Ok(translation) => translation,
                Err(e) => return self.fail(outcome, Stage::Translate, Some(user_id), &e),
            };

        // Personalize
        let personalizer = PersonalizationEngine::new(self.config.scoring.personalization.clone());
        let personalized = match personalizer.personalize(&translation, profile) {
            Ok(personalized) => personalized,
            Err(e) => return self.fail(outcome, Stage::Personalize, Some(user_id), &e),
        };
        self.metrics.record_personalization();

        // Select voice
        let voice = select_voice(
            &self.registry,
            &block.id,
            &translation.target_language,
            personalized.applied_tone,
            &translation.translated_text,
        );
        self.metrics.record_voice_assignment(voice.fallback_depth);
        self.voice_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(voice.clone());

        // Publish and simulate
        for &platform in &self.config.target_platforms {
            let preview = build_preview(&personalized, &voice, platform);
            let artifact = PublishedArtifact::from_preview(
                &preview,
                block.content_type,
                translation.confidence_score,
                voice.quality_score,
                published_at,
            );
            let seed = self
                .config
                .engagement_seed
                .map(|base| derive_seed(base, &block.id, user_id, platform));
            let metric = simulate_engagement(&artifact, seed);

            self.log.append(metric.clone());
            self.metrics.record_engagement();
            outcome.previews.push(preview);
            outcome.engagement.push(metric);
        }

        outcome.translations.push(translation);
        outcome.personalized.push(personalized);
        outcome.voices.push(voice);
    }

    fn fail(
        &self,
        outcome: &mut ItemOutcome,
        stage: Stage,
        user_id: Option<&str>,
        error: &PipelineError,
    ) {
        warn!(
            content_id = %outcome.content_id,
            stage = %stage,
            user_id = user_id.unwrap_or("-"),
            error = %error,
            "Stage failed"
        );
        self.metrics.record_stage_failure();

        let failure = StageFailure::new(&outcome.content_id, stage, error);
        outcome.failures.push(match user_id {
            Some(user_id) => failure.for_user(user_id),
            None => failure,
        });
    }

    /// Strategy recommendations over everything logged so far.
    pub fn recommend_now(&self) -> Vec<StrategyRecommendation> {
        StrategyRecommender::new(self.config.scoring.strategy.clone())
            .recommend_at(&self.log.snapshot(), Utc::now())
    }

    /// Every voice assignment made so far, in completion order.
    pub fn voice_assignments(&self) -> Vec<VoiceAssignment> {
        self.voice_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Strategy report over everything logged so far.
    pub fn report_now(&self) -> StrategyReport {
        StrategyRecommender::new(self.config.scoring.strategy.clone()).report_at(
            &self.log.snapshot(),
            &self.voice_assignments(),
            Utc::now(),
        )
    }
}

/// Per-post seed from the run seed and the post's identity (FNV-1a).
fn derive_seed(base: u64, content_id: &str, user_id: &str, platform: Platform) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET ^ base;
    for part in [content_id, user_id, platform.as_str()] {
        // 0xff never appears in UTF-8, so parts can't run together
        for byte in part.bytes().chain(std::iter::once(0xff)) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}
