//! Language profile table: the read-only source of per-language metadata.
//!
//! The table is built once (from the built-in defaults or a JSON file) and
//! handed to every component by reference. Nothing mutates it after
//! construction.

use crate::error::PipelineError;
use crate::i18n::{DifficultyTier, ScriptFamily, Tone};
use crate::voice::GLOBAL_NEUTRAL_QUALITY;
use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A voice available for one tone of a language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceEntry {
    pub tone: Tone,
    pub voice_tag: String,
    /// Synthesis quality of this voice, in [0, 1]
    pub quality: f64,
}

/// Metadata for a supported language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageProfile {
    /// ISO 639-1 language code (e.g., "hi", "sa")
    pub code: String,

    /// English name of the language (e.g., "Hindi")
    pub name: String,

    /// Native name of the language (e.g., "हिन्दी")
    pub native_name: String,

    pub script: ScriptFamily,

    pub tier: DifficultyTier,

    /// Per-language base confidence before adjustments. Clamped into the
    /// tier's band when used.
    pub base_confidence: f64,

    /// Tone used when a requested tone is not supported
    pub default_tone: Tone,

    pub supported_tones: Vec<Tone>,

    /// Average spoken words per second for this language
    pub words_per_second: f64,

    /// Language whose voices stand in when this one has none for a tone
    #[serde(default)]
    pub family_fallback: Option<String>,

    #[serde(default)]
    pub voices: Vec<VoiceEntry>,
}

impl LanguageProfile {
    /// Base confidence clamped into the language's tier band.
    pub fn banded_base_confidence(&self) -> f64 {
        self.tier.clamp_base(self.base_confidence)
    }

    pub fn supports_tone(&self, tone: Tone) -> bool {
        self.supported_tones.contains(&tone)
    }

    /// Voice map entry for an exact tone, if any.
    pub fn voice_for(&self, tone: Tone) -> Option<&VoiceEntry> {
        self.voices.iter().find(|v| v.tone == tone)
    }

    /// Lowest voice quality in this language's own voice map.
    pub fn min_voice_quality(&self) -> Option<f64> {
        self.voices.iter().map(|v| v.quality).reduce(f64::min)
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.code.trim().is_empty(), "Language code must not be empty");
        ensure!(
            (0.0..=1.0).contains(&self.base_confidence),
            "Language '{}': base_confidence {} outside [0, 1]",
            self.code,
            self.base_confidence
        );
        ensure!(
            self.words_per_second > 0.0,
            "Language '{}': words_per_second must be positive",
            self.code
        );
        ensure!(
            self.supports_tone(self.default_tone),
            "Language '{}': default tone '{}' is not in supported_tones",
            self.code,
            self.default_tone
        );

        let mut seen = HashSet::new();
        for voice in &self.voices {
            ensure!(
                seen.insert(voice.tone),
                "Language '{}': duplicate voice entry for tone '{}'",
                self.code,
                voice.tone
            );
            ensure!(
                self.supports_tone(voice.tone),
                "Language '{}': voice '{}' is mapped to unsupported tone '{}'",
                self.code,
                voice.voice_tag,
                voice.tone
            );
            ensure!(
                (GLOBAL_NEUTRAL_QUALITY..=1.0).contains(&voice.quality),
                "Language '{}': voice '{}' quality {} outside [{}, 1]",
                self.code,
                voice.voice_tag,
                voice.quality,
                GLOBAL_NEUTRAL_QUALITY
            );
        }
        Ok(())
    }
}

/// Read-only table of language profiles.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: Vec<LanguageProfile>,
}

impl LanguageRegistry {
    /// Registry with the built-in language table.
    pub fn builtin() -> Self {
        Self {
            languages: default_languages(),
        }
    }

    /// Build a registry from externally supplied profiles.
    ///
    /// # Errors
    /// Fails if any profile is out of range, a code is duplicated, or a
    /// family fallback points at a language that is not in the table.
    pub fn from_profiles(languages: Vec<LanguageProfile>) -> Result<Self> {
        let mut codes = HashSet::new();
        for profile in &languages {
            profile.validate()?;
            if !codes.insert(profile.code.as_str()) {
                bail!("Duplicate language code in profile table: '{}'", profile.code);
            }
        }

        for profile in &languages {
            if let Some(fallback) = &profile.family_fallback {
                ensure!(
                    fallback != &profile.code,
                    "Language '{}' lists itself as family fallback",
                    profile.code
                );
                ensure!(
                    codes.contains(fallback.as_str()),
                    "Language '{}': family fallback '{}' is not in the table",
                    profile.code,
                    fallback
                );
            }
        }

        Ok(Self { languages })
    }

    /// Load and validate a profile table from a JSON array file.
    pub fn load_from_json(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read language profiles from {}", path.display()))?;
        let languages: Vec<LanguageProfile> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse language profiles in {}", path.display()))?;
        Self::from_profiles(languages)
    }

    /// Get a language profile by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageProfile> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Get a language profile, or fail with `UnsupportedLanguage`.
    pub fn require(&self, code: &str) -> Result<&LanguageProfile, PipelineError> {
        self.get_by_code(code)
            .ok_or_else(|| PipelineError::UnsupportedLanguage {
                code: code.to_string(),
            })
    }

    pub fn list_all(&self) -> Vec<&LanguageProfile> {
        self.languages.iter().collect()
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }

    /// English name of a language, or the code itself when unknown.
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.get_by_code(code)
            .map(|lang| lang.name.as_str())
            .unwrap_or(code)
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn voice(tone: Tone, voice_tag: &str, quality: f64) -> VoiceEntry {
    VoiceEntry {
        tone,
        voice_tag: voice_tag.to_string(),
        quality,
    }
}

#[allow(clippy::too_many_arguments)]
fn language(
    code: &str,
    name: &str,
    native_name: &str,
    script: ScriptFamily,
    tier: DifficultyTier,
    base_confidence: f64,
    default_tone: Tone,
    supported_tones: &[Tone],
    words_per_second: f64,
    family_fallback: Option<&str>,
    voices: Vec<VoiceEntry>,
) -> LanguageProfile {
    LanguageProfile {
        code: code.to_string(),
        name: name.to_string(),
        native_name: native_name.to_string(),
        script,
        tier,
        base_confidence,
        default_tone,
        supported_tones: supported_tones.to_vec(),
        words_per_second,
        family_fallback: family_fallback.map(str::to_string),
        voices,
    }
}

/// Built-in language table.
fn default_languages() -> Vec<LanguageProfile> {
    use DifficultyTier::*;
    use ScriptFamily::*;
    use Tone::*;

    const ALL: &[Tone] = &[Formal, Casual, Devotional, Neutral];
    const NO_CASUAL: &[Tone] = &[Formal, Devotional, Neutral];

    vec![
        language("en", "English", "English", Latin, HighResourceEuropean, 0.96, Formal, ALL, 2.5, None, vec![
            voice(Formal, "english_male_formal_1", 0.94),
            voice(Casual, "english_female_casual_1", 0.93),
            voice(Neutral, "english_female_1", 0.95),
        ]),
        language("es", "Spanish", "Español", Latin, HighResourceEuropean, 0.96, Formal, ALL, 2.7, Some("en"), vec![
            voice(Casual, "spanish_female_casual_1", 0.91),
            voice(Neutral, "spanish_female_1", 0.93),
        ]),
        language("fr", "French", "Français", Latin, HighResourceEuropean, 0.95, Formal, ALL, 2.6, Some("en"), vec![
            voice(Formal, "french_female_formal_1", 0.94),
            voice(Neutral, "french_male_1", 0.92),
        ]),
        language("de", "German", "Deutsch", Latin, HighResourceEuropean, 0.94, Formal, ALL, 2.3, Some("en"), vec![
            voice(Formal, "german_male_formal_1", 0.93),
            voice(Neutral, "german_male_2", 0.91),
        ]),
        language("it", "Italian", "Italiano", Latin, HighResourceEuropean, 0.94, Formal, ALL, 2.6, Some("en"), vec![
            voice(Formal, "italian_female_formal_1", 0.94),
            voice(Neutral, "italian_female_1", 0.92),
        ]),
        language("pt", "Portuguese", "Português", Latin, HighResourceEuropean, 0.95, Formal, ALL, 2.6, Some("en"), vec![
            voice(Formal, "portuguese_male_formal_1", 0.93),
            voice(Neutral, "portuguese_male_1", 0.91),
        ]),
        language("ru", "Russian", "Русский", Cyrillic, HighResourceEuropean, 0.92, Formal, ALL, 2.2, None, vec![
            voice(Formal, "russian_male_formal_1", 0.90),
            voice(Neutral, "russian_male_1", 0.88),
        ]),
        language("hi", "Hindi", "हिन्दी", Devanagari, MidResourceIndic, 0.90, Formal, ALL, 2.1, None, vec![
            voice(Formal, "hindi_female_1", 0.92),
            voice(Casual, "hindi_male_casual_1", 0.90),
            voice(Devotional, "hindi_female_devotional_1", 0.96),
        ]),
        language("mr", "Marathi", "मराठी", Devanagari, MidResourceIndic, 0.88, Formal, NO_CASUAL, 2.0, Some("hi"), vec![
            voice(Formal, "marathi_female_1", 0.89),
            voice(Devotional, "marathi_male_devotional_1", 0.94),
        ]),
        language("bn", "Bengali", "বাংলা", Bengali, MidResourceIndic, 0.89, Formal, ALL, 2.0, Some("hi"), vec![
            voice(Formal, "bengali_female_1", 0.89),
            voice(Devotional, "bengali_female_devotional_1", 0.93),
        ]),
        language("ta", "Tamil", "தமிழ்", Tamil, MidResourceIndic, 0.87, Formal, ALL, 1.9, Some("hi"), vec![
            voice(Formal, "tamil_female_1", 0.88),
            voice(Devotional, "tamil_female_devotional_1", 0.93),
        ]),
        language("sa", "Sanskrit", "संस्कृतम्", Devanagari, Classical, 0.85, Devotional, NO_CASUAL, 1.8, Some("hi"), vec![
            voice(Devotional, "sanskrit_male_devotional_1", 0.95),
            voice(Formal, "sanskrit_male_formal_1", 0.88),
        ]),
        language("ja", "Japanese", "日本語", Cjk, MidResourceAsian, 0.88, Formal, ALL, 2.4, None, vec![
            voice(Formal, "japanese_male_formal_1", 0.89),
            voice(Neutral, "japanese_female_1", 0.87),
        ]),
        language("zh", "Chinese", "中文", Cjk, MidResourceAsian, 0.86, Formal, ALL, 2.4, None, vec![
            voice(Formal, "chinese_female_formal_1", 0.88),
            voice(Neutral, "chinese_female_1", 0.86),
        ]),
        language("ko", "Korean", "한국어", Hangul, MidResourceAsian, 0.87, Formal, ALL, 2.4, None, vec![
            voice(Formal, "korean_male_formal_1", 0.87),
            voice(Neutral, "korean_female_1", 0.85),
        ]),
        language("ar", "Arabic", "العربية", Arabic, MidResourceAsian, 0.85, Formal, ALL, 2.2, None, vec![
            voice(Formal, "arabic_female_formal_1", 0.86),
            voice(Neutral, "arabic_female_1", 0.83),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_table_validates() {
        let registry = LanguageRegistry::builtin();
        let profiles = registry.list_all().into_iter().cloned().collect();
        assert!(LanguageRegistry::from_profiles(profiles).is_ok());
    }

    #[test]
    fn test_get_by_code_hindi() {
        let registry = LanguageRegistry::builtin();
        let hindi = registry.get_by_code("hi").expect("hi should exist");
        assert_eq!(hindi.name, "Hindi");
        assert_eq!(hindi.tier, DifficultyTier::MidResourceIndic);
        assert_eq!(hindi.default_tone, Tone::Formal);
    }

    #[test]
    fn test_get_by_code_nonexistent() {
        let registry = LanguageRegistry::builtin();
        assert!(registry.get_by_code("xx").is_none());
        assert!(!registry.is_supported("xx"));
    }

    #[test]
    fn test_require_unknown_is_unsupported_language() {
        let registry = LanguageRegistry::builtin();
        let err = registry.require("tlh").unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnsupportedLanguage {
                code: "tlh".to_string()
            }
        );
    }

    #[test]
    fn test_sanskrit_has_devotional_voice_but_no_casual() {
        let registry = LanguageRegistry::builtin();
        let sanskrit = registry.get_by_code("sa").unwrap();
        assert!(sanskrit.voice_for(Tone::Devotional).is_some());
        assert!(sanskrit.voice_for(Tone::Casual).is_none());
        assert!(!sanskrit.supports_tone(Tone::Casual));
        assert_eq!(sanskrit.default_tone, Tone::Devotional);
    }

    #[test]
    fn test_banded_base_confidence_clamps() {
        let registry = LanguageRegistry::builtin();
        // Arabic base sits at the bottom of the mid-resource Asian band
        let arabic = registry.get_by_code("ar").unwrap();
        assert_eq!(arabic.banded_base_confidence(), 0.85);

        let mut custom = arabic.clone();
        custom.base_confidence = 0.99;
        assert_eq!(custom.banded_base_confidence(), 0.89);
    }

    #[test]
    fn test_display_name_falls_back_to_code() {
        let registry = LanguageRegistry::builtin();
        assert_eq!(registry.display_name("fr"), "French");
        assert_eq!(registry.display_name("zz"), "zz");
    }

    #[test]
    fn test_family_fallbacks_resolve() {
        let registry = LanguageRegistry::builtin();
        for profile in registry.list_all() {
            if let Some(fallback) = &profile.family_fallback {
                assert!(registry.is_supported(fallback), "{} -> {}", profile.code, fallback);
            }
        }
    }

    // ==================== Validation Tests ====================

    fn minimal(code: &str) -> LanguageProfile {
        language(
            code,
            "Test",
            "Test",
            ScriptFamily::Latin,
            DifficultyTier::HighResourceEuropean,
            0.9,
            Tone::Formal,
            &[Tone::Formal],
            2.5,
            None,
            vec![voice(Tone::Formal, "test_voice", 0.9)],
        )
    }

    #[test]
    fn test_from_profiles_rejects_duplicate_code() {
        let result = LanguageRegistry::from_profiles(vec![minimal("en"), minimal("en")]);
        assert!(result.unwrap_err().to_string().contains("Duplicate"));
    }

    #[test]
    fn test_from_profiles_rejects_out_of_range_quality() {
        let mut profile = minimal("en");
        profile.voices[0].quality = 1.2;
        assert!(LanguageRegistry::from_profiles(vec![profile]).is_err());

        let mut profile = minimal("en");
        profile.voices[0].quality = GLOBAL_NEUTRAL_QUALITY - 0.1;
        assert!(LanguageRegistry::from_profiles(vec![profile]).is_err());
    }

    #[test]
    fn test_from_profiles_rejects_unknown_fallback() {
        let mut profile = minimal("es");
        profile.family_fallback = Some("en".to_string());
        let result = LanguageRegistry::from_profiles(vec![profile]);
        assert!(result.unwrap_err().to_string().contains("not in the table"));
    }

    #[test]
    fn test_from_profiles_rejects_default_tone_not_supported() {
        let mut profile = minimal("en");
        profile.default_tone = Tone::Casual;
        assert!(LanguageRegistry::from_profiles(vec![profile]).is_err());
    }

    #[test]
    fn test_from_profiles_rejects_zero_speaking_rate() {
        let mut profile = minimal("en");
        profile.words_per_second = 0.0;
        assert!(LanguageRegistry::from_profiles(vec![profile]).is_err());
    }

    #[test]
    fn test_load_from_json() {
        let profiles = vec![minimal("en"), {
            let mut es = minimal("es");
            es.family_fallback = Some("en".to_string());
            es
        }];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&profiles).unwrap()).unwrap();

        let registry = LanguageRegistry::load_from_json(file.path()).unwrap();
        assert_eq!(registry.list_all().len(), 2);
        assert_eq!(
            registry.get_by_code("es").unwrap().family_fallback.as_deref(),
            Some("en")
        );
    }

    #[test]
    fn test_load_from_json_missing_file() {
        let result = LanguageRegistry::load_from_json(Path::new("/nonexistent/languages.json"));
        assert!(result.unwrap_err().to_string().contains("Failed to read"));
    }
}
