//! Language vocabulary: tones, script families and difficulty tiers.
//!
//! These are the closed sets every language profile is described with. Each
//! type parses from the lowercase code used in configuration files and
//! serializes back to the same code.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Register classifier applied across translation, personalization and
/// voice selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    Casual,
    Devotional,
    Neutral,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::Formal, Tone::Casual, Tone::Devotional, Tone::Neutral];

    /// Get the lowercase code for this tone (e.g., "formal").
    pub fn code(&self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Casual => "casual",
            Tone::Devotional => "devotional",
            Tone::Neutral => "neutral",
        }
    }

    /// Get the capitalized label used in rendered text (e.g., "Formal").
    pub fn label(&self) -> &'static str {
        match self {
            Tone::Formal => "Formal",
            Tone::Casual => "Casual",
            Tone::Devotional => "Devotional",
            Tone::Neutral => "Neutral",
        }
    }
}

impl FromStr for Tone {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "formal" => Ok(Tone::Formal),
            "casual" => Ok(Tone::Casual),
            "devotional" => Ok(Tone::Devotional),
            "neutral" => Ok(Tone::Neutral),
            other => bail!("Unknown tone: '{}'", other),
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Writing system family. Languages sharing a family can borrow each
/// other's voices as a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptFamily {
    Latin,
    Cyrillic,
    Devanagari,
    Bengali,
    Tamil,
    Cjk,
    Hangul,
    Arabic,
}

/// Resource tier of a language, which fixes its translation confidence band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    /// Well-resourced European languages.
    HighResourceEuropean,
    /// Indian languages with moderate parallel data.
    MidResourceIndic,
    /// East-Asian and Arabic languages with moderate parallel data.
    MidResourceAsian,
    /// Classical and liturgical scripts (e.g., Sanskrit).
    Classical,
}

impl DifficultyTier {
    /// Inclusive confidence band `(min, max)` a base score is clamped into.
    pub fn confidence_band(&self) -> (f64, f64) {
        match self {
            DifficultyTier::HighResourceEuropean => (0.92, 0.96),
            DifficultyTier::MidResourceIndic => (0.85, 0.95),
            DifficultyTier::MidResourceAsian => (0.85, 0.89),
            DifficultyTier::Classical => (0.85, 0.95),
        }
    }

    /// Confidence bonus when the rendered tone is devotional.
    ///
    /// Classical scripts get the largest bonus since a devotional register
    /// matches the tradition the script is used in.
    pub fn devotional_bonus(&self) -> f64 {
        match self {
            DifficultyTier::Classical => 0.08,
            DifficultyTier::MidResourceIndic => 0.02,
            DifficultyTier::HighResourceEuropean | DifficultyTier::MidResourceAsian => 0.0,
        }
    }

    /// Clamp a base confidence into this tier's band.
    pub fn clamp_base(&self, base: f64) -> f64 {
        let (min, max) = self.confidence_band();
        base.clamp(min, max)
    }
}
