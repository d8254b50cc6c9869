//! Platform previews: format a personalized item for each target platform.
//!
//! Nothing is sent anywhere. A preview is the structured post a platform
//! would receive, and a `PublishedArtifact` is what the engagement simulator
//! needs to know about it.

use crate::content::ContentType;
use crate::i18n::{RegisterStrings, Tone};
use crate::personalization::PersonalizedContent;
use crate::voice::VoiceAssignment;
use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Twitter post limit, in characters.
pub const TWITTER_CHAR_LIMIT: usize = 280;

const ELLIPSIS: char = '…';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Twitter,
    Linkedin,
    Sanatan,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Instagram,
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Sanatan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Sanatan => "sanatan",
        }
    }

    /// Human-readable description of the post format.
    pub fn format_label(&self) -> &'static str {
        match self {
            Platform::Instagram => "multilingual text + audio thumbnail",
            Platform::Twitter => "multilingual short text + TTS snippet",
            Platform::Linkedin => "multilingual title + summary + TTS",
            Platform::Sanatan => "multilingual voice script + audio",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "twitter" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::Linkedin),
            "sanatan" => Ok(Platform::Sanatan),
            other => bail!("Unknown platform: '{}'", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreviewBody {
    Text(String),
    TitleSummary { title: String, summary: String },
}

impl PreviewBody {
    /// Body flattened to one string.
    pub fn as_text(&self) -> String {
        match self {
            PreviewBody::Text(text) => text.clone(),
            PreviewBody::TitleSummary { title, summary } => format!("{}\n\n{}", title, summary),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPreview {
    pub content_id: String,
    pub user_id: String,
    pub platform: Platform,
    pub language: String,
    pub tone: Tone,
    pub body: PreviewBody,
    pub voice_tag: String,
    /// Audio file the post would reference (voice platforms only)
    pub audio_reference: Option<String>,
    pub format: String,
}

/// Format a personalized item for `platform`.
pub fn build_preview(
    personalized: &PersonalizedContent,
    voice: &VoiceAssignment,
    platform: Platform,
) -> PostPreview {
    let key = &personalized.translation_ref;
    let strings = RegisterStrings::for_language(&key.target_language);
    let text = personalized.personalized_text.trim();

    let body = match platform {
        Platform::Instagram => {
            let hashtags = if text.contains('#') {
                "#Multilingual".to_string()
            } else {
                format!("{} #Multilingual", strings.casual_default_hashtag)
            };
            PreviewBody::Text(format!("{}\n{}", text, hashtags))
        }
        Platform::Twitter => PreviewBody::Text(truncate_chars(text, TWITTER_CHAR_LIMIT)),
        Platform::Linkedin => PreviewBody::TitleSummary {
            title: strings.insight_title_for(&key.content_id),
            summary: text.to_string(),
        },
        Platform::Sanatan => PreviewBody::Text(text.to_string()),
    };

    let audio_reference = (platform == Platform::Sanatan).then(|| {
        format!(
            "voice_{}_{}_{}.mp3",
            key.content_id, platform, key.target_language
        )
    });

    PostPreview {
        content_id: key.content_id.clone(),
        user_id: personalized.user_id.clone(),
        platform,
        language: key.target_language.clone(),
        tone: personalized.applied_tone,
        body,
        voice_tag: voice.voice_tag.clone(),
        audio_reference,
        format: platform.format_label().to_string(),
    }
}

/// Truncate to at most `limit` characters, ending in an ellipsis when cut.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit.saturating_sub(1)).collect();
    truncated.push(ELLIPSIS);
    truncated
}

/// What the engagement simulator sees of a published post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedArtifact {
    pub content_id: String,
    pub user_id: String,
    pub platform: Platform,
    pub language: String,
    pub tone: Tone,
    pub content_type: ContentType,
    pub confidence_score: f64,
    pub quality_score: f64,
    pub published_at: DateTime<Utc>,
}

impl PublishedArtifact {
    pub fn from_preview(
        preview: &PostPreview,
        content_type: ContentType,
        confidence_score: f64,
        quality_score: f64,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            content_id: preview.content_id.clone(),
            user_id: preview.user_id.clone(),
            platform: preview.platform,
            language: preview.language.clone(),
            tone: preview.tone,
            content_type,
            confidence_score,
            quality_score,
            published_at,
        }
    }
}
