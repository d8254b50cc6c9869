//! Personalization: adapt a translation to one user's register and interests.
//!
//! The text transform is a fixed template per tone (salutation and sign-off
//! for devotional, hashtags and emoji for casual); the adaptation score is a
//! weighted blend of tone match, interest overlap and historical affinity.

use crate::content::normalize_tag;
use crate::error::PipelineError;
use crate::i18n::{RegisterStrings, Tone};
use crate::translation::{Translation, TranslationKey};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Hashtags suggested for casual text, at most.
const MAX_SUGGESTED_HASHTAGS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub preferred_language: Option<String>,
    #[serde(default)]
    pub preferred_tone: Option<Tone>,
    #[serde(default)]
    pub interests: Vec<String>,
    /// Tag -> affinity in [0, 1]
    #[serde(default)]
    pub engagement_history: Option<BTreeMap<String, f64>>,
}

impl UserProfile {
    pub fn new(user_id: &str, language: &str, tone: Tone) -> Self {
        Self {
            user_id: user_id.to_string(),
            preferred_language: Some(language.to_string()),
            preferred_tone: Some(tone),
            interests: Vec::new(),
            engagement_history: None,
        }
    }

    pub fn with_interests(mut self, interests: &[&str]) -> Self {
        self.interests = interests.iter().map(|i| i.to_string()).collect();
        self
    }

    pub fn with_history(mut self, history: &[(&str, f64)]) -> Self {
        self.engagement_history = Some(
            history
                .iter()
                .map(|(tag, affinity)| (tag.to_string(), *affinity))
                .collect(),
        );
        self
    }

    /// Preferred language and tone, or `ProfileIncomplete` naming the
    /// missing field.
    pub fn require_preferences(&self) -> Result<(&str, Tone), PipelineError> {
        let language = self
            .preferred_language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| PipelineError::ProfileIncomplete {
                user_id: self.user_id.clone(),
                field: "preferred_language",
            })?;
        let tone = self
            .preferred_tone
            .ok_or_else(|| PipelineError::ProfileIncomplete {
                user_id: self.user_id.clone(),
                field: "preferred_tone",
            })?;
        Ok((language, tone))
    }
}

/// Read-only user profile store, keyed by user id.
#[derive(Debug, Clone, Default)]
pub struct UserProfileStore {
    profiles: BTreeMap<String, UserProfile>,
}

impl UserProfileStore {
    pub fn from_profiles(profiles: Vec<UserProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.user_id.clone(), p))
                .collect(),
        }
    }

    /// Load profiles from a JSON array file.
    pub fn load_from_json(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read user profiles from {}", path.display()))?;
        let profiles: Vec<UserProfile> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse user profiles in {}", path.display()))?;
        Ok(Self::from_profiles(profiles))
    }

    pub fn get(&self, user_id: &str) -> Option<&UserProfile> {
        self.profiles.get(user_id)
    }

    /// Profiles in user id order.
    pub fn iter(&self) -> impl Iterator<Item = &UserProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Weights and fixed values of the adaptation score.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalizationWeights {
    pub tone_weight: f64,
    pub interest_weight: f64,
    pub history_weight: f64,
    /// Tone component when the user's tone differs from the rendered tone
    pub partial_tone_match: f64,
    /// Interest/history component when there is nothing to compare
    pub neutral_value: f64,
}

impl Default for PersonalizationWeights {
    fn default() -> Self {
        Self {
            tone_weight: 0.40,
            interest_weight: 0.35,
            history_weight: 0.25,
            partial_tone_match: 0.5,
            neutral_value: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedContent {
    pub translation_ref: TranslationKey,
    pub user_id: String,
    pub personalized_text: String,
    pub adaptation_score: f64,
    /// Register the text was adapted to (the user's preferred tone)
    pub applied_tone: Tone,
    pub tone_match: f64,
    pub interest_overlap: f64,
    pub history_affinity: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PersonalizationEngine {
    weights: PersonalizationWeights,
}

impl PersonalizationEngine {
    pub fn new(weights: PersonalizationWeights) -> Self {
        Self { weights }
    }

    /// Personalize a translation for one user.
    ///
    /// # Errors
    /// * `ProfileIncomplete` if the profile has no language or tone
    /// * `InvalidProfile` if a history affinity is outside [0, 1]
    pub fn personalize(
        &self,
        translation: &Translation,
        profile: &UserProfile,
    ) -> Result<PersonalizedContent, PipelineError> {
        let (_, preferred_tone) = profile.require_preferences()?;
        let history = normalized_history(profile)?;

        let tone_match = if preferred_tone == translation.applied_tone {
            1.0
        } else {
            self.weights.partial_tone_match
        };
        let interest_overlap = self.interest_overlap(&translation.tags, &profile.interests);
        let history_affinity = self.history_affinity(&translation.tags, history.as_ref());

        let w = &self.weights;
        let weight_sum = w.tone_weight + w.interest_weight + w.history_weight;
        let blended = if weight_sum > 0.0 {
            (w.tone_weight * tone_match
                + w.interest_weight * interest_overlap
                + w.history_weight * history_affinity)
                / weight_sum
        } else {
            w.neutral_value
        };

        Ok(PersonalizedContent {
            translation_ref: translation.key(),
            user_id: profile.user_id.clone(),
            personalized_text: adapt_register(translation, preferred_tone),
            adaptation_score: round3(blended),
            applied_tone: preferred_tone,
            tone_match,
            interest_overlap,
            history_affinity,
        })
    }

    /// Fraction of content tags the user is interested in.
    fn interest_overlap(&self, tags: &[String], interests: &[String]) -> f64 {
        if tags.is_empty() {
            return self.weights.neutral_value;
        }
        let interests: BTreeSet<String> = interests.iter().map(|i| normalize_tag(i)).collect();
        let matched = tags.iter().filter(|t| interests.contains(*t)).count();
        matched as f64 / tags.len() as f64
    }

    /// Mean historical affinity over content tags the user has history for.
    fn history_affinity(&self, tags: &[String], history: Option<&BTreeMap<String, f64>>) -> f64 {
        let Some(history) = history else {
            return self.weights.neutral_value;
        };
        let matched: Vec<f64> = tags.iter().filter_map(|t| history.get(t).copied()).collect();
        if matched.is_empty() {
            self.weights.neutral_value
        } else {
            matched.iter().sum::<f64>() / matched.len() as f64
        }
    }
}

/// Personalize with default weights.
pub fn personalize(
    translation: &Translation,
    profile: &UserProfile,
) -> Result<PersonalizedContent, PipelineError> {
    PersonalizationEngine::default().personalize(translation, profile)
}

/// History keyed by normalized tag, rejecting out-of-range affinities.
fn normalized_history(
    profile: &UserProfile,
) -> Result<Option<BTreeMap<String, f64>>, PipelineError> {
    let Some(history) = &profile.engagement_history else {
        return Ok(None);
    };

    let mut normalized = BTreeMap::new();
    for (tag, affinity) in history {
        if !(0.0..=1.0).contains(affinity) {
            return Err(PipelineError::InvalidProfile {
                user_id: profile.user_id.clone(),
                reason: format!("affinity {} for tag '{}' outside [0, 1]", affinity, tag),
            });
        }
        normalized.insert(normalize_tag(tag), *affinity);
    }
    Ok(Some(normalized))
}

/// Apply the register template for `tone` to the translated text.
fn adapt_register(translation: &Translation, tone: Tone) -> String {
    let strings = RegisterStrings::for_language(&translation.target_language);
    let text = translation.translated_text.trim();

    match tone {
        Tone::Devotional => format!(
            "{} {} {}",
            strings.devotional_salutation, text, strings.devotional_sign_off
        ),
        Tone::Casual => {
            let hashtags = if translation.tags.is_empty() {
                strings.casual_default_hashtag.to_string()
            } else {
                translation
                    .tags
                    .iter()
                    .take(MAX_SUGGESTED_HASHTAGS)
                    .map(|t| format!("#{}", t))
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            format!("{} {} {}", text, strings.casual_emoji, hashtags)
        }
        Tone::Formal | Tone::Neutral => text.to_string(),
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
