//! Voice selection: pick a synthesis voice for a (language, tone) pair.
//!
//! Resolution walks a fixed chain and records how far it had to go:
//!
//! | depth | source                          | quality                    |
//! |-------|---------------------------------|----------------------------|
//! | 0     | exact (language, tone)          | table value                |
//! | 1     | (language, default tone)        | table value x 0.92         |
//! | 2     | (family fallback language, tone)| table value x 0.80         |
//! | 3     | global neutral voice            | 0.60                       |
//!
//! Each step is capped by the lowest quality the previous step could reach
//! for the same language, so quality never rises with depth.

use crate::content::word_count;
use crate::i18n::{LanguageProfile, LanguageRegistry, Tone};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Quality of the global neutral voice and the floor for every assignment.
pub const GLOBAL_NEUTRAL_QUALITY: f64 = 0.60;
pub const GLOBAL_NEUTRAL_VOICE: &str = "neutral_multilingual_1";

const LANGUAGE_DEFAULT_FACTOR: f64 = 0.92;
const FAMILY_FALLBACK_FACTOR: f64 = 0.80;

/// Speaking rate assumed for languages missing from the table.
const DEFAULT_WORDS_PER_SECOND: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceResolution {
    Exact,
    LanguageDefaultTone,
    FamilyFallback,
    GlobalNeutral,
}

impl VoiceResolution {
    pub fn depth(&self) -> u8 {
        match self {
            VoiceResolution::Exact => 0,
            VoiceResolution::LanguageDefaultTone => 1,
            VoiceResolution::FamilyFallback => 2,
            VoiceResolution::GlobalNeutral => 3,
        }
    }

    /// Multiplier applied to the table quality at this step.
    pub fn penalty(&self) -> f64 {
        match self {
            VoiceResolution::Exact | VoiceResolution::GlobalNeutral => 1.0,
            VoiceResolution::LanguageDefaultTone => LANGUAGE_DEFAULT_FACTOR,
            VoiceResolution::FamilyFallback => FAMILY_FALLBACK_FACTOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceAssignment {
    pub content_id: String,
    pub language: String,
    /// Requested tone
    pub tone: Tone,
    pub voice_tag: String,
    pub quality_score: f64,
    pub fallback_depth: u8,
    pub resolution: VoiceResolution,
    pub penalty: f64,
    pub estimated_duration_seconds: f64,
}

/// Select a voice for `translated_text` in `language` with `tone`.
///
/// Never fails: a language missing from the table resolves straight to the
/// global neutral voice.
pub fn select_voice(
    registry: &LanguageRegistry,
    content_id: &str,
    language: &str,
    tone: Tone,
    translated_text: &str,
) -> VoiceAssignment {
    let profile = registry.get_by_code(language);
    let (voice_tag, quality, resolution) = match profile {
        Some(profile) => resolve(registry, profile, tone),
        None => (
            GLOBAL_NEUTRAL_VOICE.to_string(),
            GLOBAL_NEUTRAL_QUALITY,
            VoiceResolution::GlobalNeutral,
        ),
    };

    if resolution != VoiceResolution::Exact {
        debug!(
            content_id,
            language,
            tone = %tone,
            voice = %voice_tag,
            depth = resolution.depth(),
            "Voice resolved through fallback"
        );
    }

    let words_per_second = profile
        .map(|p| p.words_per_second)
        .unwrap_or(DEFAULT_WORDS_PER_SECOND);

    VoiceAssignment {
        content_id: content_id.to_string(),
        language: language.to_string(),
        tone,
        voice_tag,
        quality_score: round3(quality.max(GLOBAL_NEUTRAL_QUALITY)),
        fallback_depth: resolution.depth(),
        resolution,
        penalty: resolution.penalty(),
        estimated_duration_seconds: estimate_duration(translated_text, words_per_second, tone),
    }
}

fn resolve(
    registry: &LanguageRegistry,
    profile: &LanguageProfile,
    tone: Tone,
) -> (String, f64, VoiceResolution) {
    // Depth 0
    if let Some(entry) = profile.voice_for(tone) {
        return (entry.voice_tag.clone(), entry.quality, VoiceResolution::Exact);
    }

    // Lowest quality an exact match could have produced for this language
    let exact_floor = profile.min_voice_quality().unwrap_or(1.0);

    // Depth 1
    let default_entry = profile.voice_for(profile.default_tone);
    let default_quality = default_entry.map(|e| (e.quality * LANGUAGE_DEFAULT_FACTOR).min(exact_floor));
    if tone != profile.default_tone {
        if let (Some(entry), Some(quality)) = (default_entry, default_quality) {
            return (
                entry.voice_tag.clone(),
                quality,
                VoiceResolution::LanguageDefaultTone,
            );
        }
    }

    // Depth 2
    let family_cap = default_quality.unwrap_or(exact_floor);
    let family_entry = profile
        .family_fallback
        .as_deref()
        .and_then(|code| registry.get_by_code(code))
        .and_then(|family| family.voice_for(tone));
    if let Some(entry) = family_entry {
        return (
            entry.voice_tag.clone(),
            (entry.quality * FAMILY_FALLBACK_FACTOR).min(family_cap),
            VoiceResolution::FamilyFallback,
        );
    }

    // Depth 3
    (
        GLOBAL_NEUTRAL_VOICE.to_string(),
        GLOBAL_NEUTRAL_QUALITY,
        VoiceResolution::GlobalNeutral,
    )
}

/// Relative speaking pace per tone.
fn pacing(tone: Tone) -> f64 {
    match tone {
        Tone::Devotional => 1.25,
        Tone::Casual => 0.9,
        Tone::Formal | Tone::Neutral => 1.0,
    }
}

/// Spoken duration in seconds, rounded to centiseconds.
fn estimate_duration(text: &str, words_per_second: f64, tone: Tone) -> f64 {
    let seconds = word_count(text) as f64 / words_per_second * pacing(tone);
    (seconds * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
