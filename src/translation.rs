use crate::content::{word_count, ContentBlock, ContentLimits, ContentType};
use crate::error::PipelineError;
use crate::i18n::{LanguageProfile, LanguageRegistry, Tone};
use crate::metrics::PipelineMetrics;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Tunable constants for confidence scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationScoring {
    /// Source words allowed before the length penalty starts
    pub length_threshold_words: usize,
    /// Penalty per source word beyond the threshold
    pub length_penalty_per_word: f64,
    /// Cap on the total length penalty
    pub max_length_penalty: f64,
    /// Penalty when the requested tone falls back to the language default
    pub unsupported_tone_penalty: f64,
}

impl Default for TranslationScoring {
    fn default() -> Self {
        Self {
            length_threshold_words: 60,
            length_penalty_per_word: 0.002,
            max_length_penalty: 0.15,
            unsupported_tone_penalty: 0.03,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationMethod {
    /// Target equals the source language; text passed through
    Original,
    /// Deterministic simulated translation
    Simulated,
}

/// Unique key of a translation record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TranslationKey {
    pub content_id: String,
    pub target_language: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub content_id: String,
    pub target_language: String,
    /// Tone requested by the caller (part of the key)
    pub tone: Tone,
    /// Tone actually rendered
    pub applied_tone: Tone,
    /// True when `tone` was unsupported and the language default was used
    pub tone_fallback: bool,
    pub translated_text: String,
    pub confidence_score: f64,
    pub word_count: usize,
    pub method: TranslationMethod,
    pub content_type: ContentType,
    pub tags: Vec<String>,
}

impl Translation {
    pub fn key(&self) -> TranslationKey {
        TranslationKey {
            content_id: self.content_id.clone(),
            target_language: self.target_language.clone(),
            tone: self.tone,
        }
    }
}

/// Computes translations against a language profile table.
///
/// Pure: identical `(content, target_language, tone)` always yields an
/// identical record, so results can be cached by that triple.
pub struct TranslationEngine<'a> {
    registry: &'a LanguageRegistry,
    scoring: TranslationScoring,
    limits: ContentLimits,
}

impl<'a> TranslationEngine<'a> {
    pub fn new(registry: &'a LanguageRegistry) -> Self {
        Self {
            registry,
            scoring: TranslationScoring::default(),
            limits: ContentLimits::default(),
        }
    }

    pub fn with_scoring(mut self, scoring: TranslationScoring) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_limits(mut self, limits: ContentLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Translate a content block into `target_language` with `tone`.
    ///
    /// # Errors
    /// * `InvalidContent` if the block fails intake validation
    /// * `UnsupportedLanguage` if the target has no language profile
    pub fn translate(
        &self,
        content: &ContentBlock,
        target_language: &str,
        tone: Tone,
    ) -> Result<Translation, PipelineError> {
        content.validate(&self.limits)?;
        let profile = self.registry.require(target_language)?;

        let (applied_tone, tone_fallback) = if profile.supports_tone(tone) {
            (tone, false)
        } else {
            debug!(
                content_id = %content.id,
                language = %profile.code,
                requested = %tone,
                fallback = %profile.default_tone,
                "Tone not supported, using language default"
            );
            (profile.default_tone, true)
        };

        let (translated_text, confidence, method) = if content.source_language == profile.code {
            (content.text.clone(), 1.0, TranslationMethod::Original)
        } else {
            let text = render_translation(profile, applied_tone, &content.text);
            let confidence = self.confidence(profile, &content.text, applied_tone, tone_fallback);
            (text, confidence, TranslationMethod::Simulated)
        };

        if confidence < profile.banded_base_confidence() - self.scoring.max_length_penalty {
            warn!(
                content_id = %content.id,
                language = %profile.code,
                confidence,
                "Low translation confidence"
            );
        }

        Ok(Translation {
            content_id: content.id.clone(),
            target_language: profile.code.clone(),
            tone,
            applied_tone,
            tone_fallback,
            word_count: word_count(&translated_text),
            translated_text,
            confidence_score: confidence,
            method,
            content_type: content.content_type,
            tags: content.normalized_tags(),
        })
    }

    fn confidence(
        &self,
        profile: &LanguageProfile,
        source_text: &str,
        applied_tone: Tone,
        tone_fallback: bool,
    ) -> f64 {
        let mut score = profile.banded_base_confidence();
        score -= self.length_penalty(word_count(source_text));
        if tone_fallback {
            score -= self.scoring.unsupported_tone_penalty;
        }
        if applied_tone == Tone::Devotional {
            score += profile.tier.devotional_bonus();
        }
        // The bonus never lifts a score out of its tier band
        let (_, band_max) = profile.tier.confidence_band();
        round3(score.clamp(0.0, band_max))
    }

    fn length_penalty(&self, source_words: usize) -> f64 {
        let excess = source_words.saturating_sub(self.scoring.length_threshold_words);
        (excess as f64 * self.scoring.length_penalty_per_word).min(self.scoring.max_length_penalty)
    }
}

/// Translate with default scoring and limits.
pub fn translate(
    registry: &LanguageRegistry,
    content: &ContentBlock,
    target_language: &str,
    tone: Tone,
) -> Result<Translation, PipelineError> {
    TranslationEngine::new(registry).translate(content, target_language, tone)
}

/// Build the simulated translated text: a language/register label followed
/// by the source text.
fn render_translation(profile: &LanguageProfile, tone: Tone, source_text: &str) -> String {
    format!("[{} - {}]: {}", profile.name, tone.label(), source_text.trim())
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Content-addressed translation cache keyed by `(content_id,
/// target_language, tone)`.
///
/// Failures are never cached. Since translation is deterministic, two
/// workers racing on the same key compute identical records, so the lock
/// only guards the map itself.
#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: Mutex<HashMap<TranslationKey, Translation>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_translate(
        &self,
        engine: &TranslationEngine<'_>,
        content: &ContentBlock,
        target_language: &str,
        tone: Tone,
        metrics: &PipelineMetrics,
    ) -> Result<Translation, PipelineError> {
        let key = TranslationKey {
            content_id: content.id.clone(),
            target_language: target_language.to_string(),
            tone,
        };

        if let Some(hit) = self.lock().get(&key) {
            metrics.record_cache_hit();
            return Ok(hit.clone());
        }

        metrics.record_cache_miss();
        let translation = engine.translate(content, target_language, tone)?;
        self.lock()
            .entry(key)
            .or_insert_with(|| translation.clone());
        Ok(translation)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All cached translations, ordered by key.
    pub fn snapshot(&self) -> Vec<Translation> {
        let mut all: Vec<_> = self.lock().values().cloned().collect();
        all.sort_by_key(|t| t.key());
        all
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TranslationKey, Translation>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hello() -> ContentBlock {
        ContentBlock::new("1", "Hello, how are you?", ContentType::Fact, "en")
    }

    // ==================== Scenario Tests ====================

    #[test]
    fn test_hello_to_hindi_formal_in_indic_band() {
        let registry = LanguageRegistry::builtin();
        let translation = translate(&registry, &hello(), "hi", Tone::Formal).unwrap();

        assert!(!translation.translated_text.is_empty());
        assert!(
            (0.85..=0.95).contains(&translation.confidence_score),
            "confidence {} outside Indic band",
            translation.confidence_score
        );
        assert_eq!(translation.method, TranslationMethod::Simulated);
        assert_eq!(translation.applied_tone, Tone::Formal);
        assert!(!translation.tone_fallback);
    }

    #[test]
    fn test_translated_text_is_labelled() {
        let registry = LanguageRegistry::builtin();
        let translation = translate(&registry, &hello(), "hi", Tone::Formal).unwrap();
        assert_eq!(
            translation.translated_text,
            "[Hindi - Formal]: Hello, how are you?"
        );
        assert_eq!(translation.word_count, 7);
    }

    #[test]
    fn test_translate_is_idempotent() {
        let registry = LanguageRegistry::builtin();
        let first = translate(&registry, &hello(), "ta", Tone::Devotional).unwrap();
        let second = translate(&registry, &hello(), "ta", Tone::Devotional).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.confidence_score.to_bits(),
            second.confidence_score.to_bits()
        );
    }

    // ==================== Error Tests ====================

    #[test]
    fn test_unsupported_language() {
        let registry = LanguageRegistry::builtin();
        let err = translate(&registry, &hello(), "tlh", Tone::Formal).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedLanguage { code } if code == "tlh"));
    }

    #[test]
    fn test_invalid_content_rejected_before_language_lookup() {
        let registry = LanguageRegistry::builtin();
        let empty = ContentBlock::new("9", "", ContentType::Fact, "en");
        let err = translate(&registry, &empty, "tlh", Tone::Formal).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidContent { .. }));
    }

    // ==================== Scoring Tests ====================

    #[test]
    fn test_unsupported_tone_falls_back_with_penalty() {
        let registry = LanguageRegistry::builtin();
        // Marathi has no casual register
        let casual = translate(&registry, &hello(), "mr", Tone::Casual).unwrap();
        let formal = translate(&registry, &hello(), "mr", Tone::Formal).unwrap();

        assert!(casual.tone_fallback);
        assert_eq!(casual.tone, Tone::Casual);
        assert_eq!(casual.applied_tone, Tone::Formal);
        assert!(casual.confidence_score < formal.confidence_score);
        assert!(casual.translated_text.contains("Formal"));
    }

    #[test]
    fn test_sanskrit_devotional_bonus() {
        let registry = LanguageRegistry::builtin();
        let devotional = translate(&registry, &hello(), "sa", Tone::Devotional).unwrap();
        let formal = translate(&registry, &hello(), "sa", Tone::Formal).unwrap();

        assert!(devotional.confidence_score > formal.confidence_score);
        assert!((0.85..=0.95).contains(&devotional.confidence_score));
    }

    #[test]
    fn test_devotional_bonus_stays_within_band() {
        let builtin = LanguageRegistry::builtin();
        let mut hi = builtin.get_by_code("hi").unwrap().clone();
        let mut sa = builtin.get_by_code("sa").unwrap().clone();
        hi.base_confidence = 0.95;
        sa.base_confidence = 0.95;
        let registry = LanguageRegistry::from_profiles(vec![hi, sa]).unwrap();

        let hindi = translate(&registry, &hello(), "hi", Tone::Devotional).unwrap();
        let sanskrit = translate(&registry, &hello(), "sa", Tone::Devotional).unwrap();

        assert_eq!(hindi.confidence_score, 0.95);
        assert_eq!(sanskrit.confidence_score, 0.95);
    }

    #[test]
    fn test_european_band() {
        let registry = LanguageRegistry::builtin();
        for code in ["es", "fr", "de", "it", "pt"] {
            let t = translate(&registry, &hello(), code, Tone::Formal).unwrap();
            assert!((0.92..=0.96).contains(&t.confidence_score), "{}", code);
        }
    }

    #[test]
    fn test_length_penalty_is_monotonic() {
        let registry = LanguageRegistry::builtin();
        let engine = TranslationEngine::new(&registry);
        let short = ContentBlock::new("s", &"word ".repeat(50), ContentType::Article, "en");
        let medium = ContentBlock::new("m", &"word ".repeat(100), ContentType::Article, "en");
        let long = ContentBlock::new("l", &"word ".repeat(200), ContentType::Article, "en");

        let s = engine.translate(&short, "de", Tone::Formal).unwrap();
        let m = engine.translate(&medium, "de", Tone::Formal).unwrap();
        let l = engine.translate(&long, "de", Tone::Formal).unwrap();

        assert!(s.confidence_score > m.confidence_score);
        assert!(m.confidence_score > l.confidence_score);
    }

    #[test]
    fn test_length_penalty_is_capped() {
        let registry = LanguageRegistry::builtin();
        let engine = TranslationEngine::new(&registry);
        let scoring = TranslationScoring::default();
        let long = ContentBlock::new("l", &"word ".repeat(399), ContentType::Article, "en");

        let t = engine.translate(&long, "de", Tone::Formal).unwrap();
        let floor = 0.94 - scoring.max_length_penalty;
        assert!((t.confidence_score - floor).abs() < 1e-9);
    }

    #[test]
    fn test_same_language_passes_through() {
        let registry = LanguageRegistry::builtin();
        let t = translate(&registry, &hello(), "en", Tone::Formal).unwrap();
        assert_eq!(t.translated_text, "Hello, how are you?");
        assert_eq!(t.confidence_score, 1.0);
        assert_eq!(t.method, TranslationMethod::Original);
    }

    #[test]
    fn test_translation_carries_tags() {
        let registry = LanguageRegistry::builtin();
        let block = hello().with_tags(&["Greetings"]);
        let t = translate(&registry, &block, "fr", Tone::Formal).unwrap();
        assert_eq!(t.tags, vec!["greetings".to_string()]);
        assert_eq!(t.content_type, ContentType::Fact);
    }

    // ==================== Cache Tests ====================

    #[test]
    fn test_cache_hit_returns_identical_record() {
        let registry = LanguageRegistry::builtin();
        let engine = TranslationEngine::new(&registry);
        let cache = TranslationCache::new();
        let metrics = PipelineMetrics::new();

        let first = cache
            .get_or_translate(&engine, &hello(), "hi", Tone::Formal, &metrics)
            .unwrap();
        let second = cache
            .get_or_translate(&engine, &hello(), "hi", Tone::Formal, &metrics)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(metrics.cache_misses(), 1);
        assert_eq!(metrics.cache_hits(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_keys_on_tone() {
        let registry = LanguageRegistry::builtin();
        let engine = TranslationEngine::new(&registry);
        let cache = TranslationCache::new();
        let metrics = PipelineMetrics::new();

        cache
            .get_or_translate(&engine, &hello(), "hi", Tone::Formal, &metrics)
            .unwrap();
        cache
            .get_or_translate(&engine, &hello(), "hi", Tone::Casual, &metrics)
            .unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(metrics.cache_hits(), 0);
    }

    #[test]
    fn test_cache_does_not_store_failures() {
        let registry = LanguageRegistry::builtin();
        let engine = TranslationEngine::new(&registry);
        let cache = TranslationCache::new();
        let metrics = PipelineMetrics::new();

        assert!(cache
            .get_or_translate(&engine, &hello(), "xx", Tone::Formal, &metrics)
            .is_err());
        assert!(cache.is_empty());
    }

    // ==================== Property Tests ====================

    proptest! {
        #[test]
        fn prop_confidence_in_unit_interval(
            text in "[a-zA-Z ,.]{0,3000}",
            lang_idx in 0usize..16,
            tone_idx in 0usize..4,
        ) {
            let registry = LanguageRegistry::builtin();
            let engine = TranslationEngine::new(&registry).with_limits(ContentLimits {
                max_words: 10_000,
                max_chars: 100_000,
            });
            let code = registry.list_all()[lang_idx].code.clone();
            let block = ContentBlock::new("p", &text, ContentType::Article, "xx");

            match engine.translate(&block, &code, Tone::ALL[tone_idx]) {
                Ok(t) => prop_assert!((0.0..=1.0).contains(&t.confidence_score)),
                Err(e) => {
                    let is_invalid_content = matches!(e, PipelineError::InvalidContent { .. });
                    prop_assert!(is_invalid_content);
                }
            }
        }

        #[test]
        fn prop_translate_is_deterministic(text in "[a-z ]{1,200}", tone_idx in 0usize..4) {
            let registry = LanguageRegistry::builtin();
            let block = ContentBlock::new("p", &text, ContentType::Quote, "en");
            let a = translate(&registry, &block, "sa", Tone::ALL[tone_idx]);
            let b = translate(&registry, &block, "sa", Tone::ALL[tone_idx]);
            prop_assert_eq!(a, b);
        }
    }
}
