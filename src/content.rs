//! Content blocks: the atomic source items entering the pipeline.
//!
//! Blocks are produced upstream by the sanitizer and are immutable here.
//! Intake validation rejects empty or over-length text before any stage runs.

use crate::error::PipelineError;
use crate::i18n::Tone;
use anyhow::bail;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Fact,
    Quote,
    Devotional,
    Article,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Fact => "fact",
            ContentType::Quote => "quote",
            ContentType::Devotional => "devotional",
            ContentType::Article => "article",
        }
    }

    /// Tone a block is rendered in when the caller does not ask for one.
    pub fn base_tone(&self) -> Tone {
        match self {
            ContentType::Fact => Tone::Formal,
            ContentType::Article => Tone::Casual,
            ContentType::Quote | ContentType::Devotional => Tone::Devotional,
        }
    }
}

impl FromStr for ContentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fact" => Ok(ContentType::Fact),
            "quote" => Ok(ContentType::Quote),
            "devotional" => Ok(ContentType::Devotional),
            "article" => Ok(ContentType::Article),
            other => bail!("Unknown content type: '{}'", other),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Length limits applied at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentLimits {
    pub max_words: usize,
    pub max_chars: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            max_words: 400,
            max_chars: 4000,
        }
    }
}

/// An atomic source item to be localized and distributed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: String,
    pub text: String,
    pub content_type: ContentType,
    pub source_language: String,
    /// Interest tags supplied upstream
    #[serde(default)]
    pub tags: Vec<String>,
}

static HASHTAG_REGEX: OnceLock<Regex> = OnceLock::new();

impl ContentBlock {
    pub fn new(id: &str, text: &str, content_type: ContentType, source_language: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            content_type,
            source_language: source_language.to_string(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Reject blocks that must not enter the pipeline.
    ///
    /// # Errors
    /// `InvalidContent` when the text is blank, has more than
    /// `limits.max_words` words or more than `limits.max_chars` characters.
    pub fn validate(&self, limits: &ContentLimits) -> Result<(), PipelineError> {
        let reject = |reason: String| PipelineError::InvalidContent {
            content_id: self.id.clone(),
            reason,
        };

        if self.text.trim().is_empty() {
            return Err(reject("text is empty".to_string()));
        }

        let chars = self.text.chars().count();
        if chars > limits.max_chars {
            return Err(reject(format!(
                "text has {} characters (limit {})",
                chars, limits.max_chars
            )));
        }

        let words = word_count(&self.text);
        if words > limits.max_words {
            return Err(reject(format!(
                "text has {} words (limit {})",
                words, limits.max_words
            )));
        }

        Ok(())
    }

    /// Normalized interest tags: explicit tags plus hashtags found in the
    /// text, lowercased, without the leading '#', sorted and deduplicated.
    pub fn normalized_tags(&self) -> Vec<String> {
        let mut tags: BTreeSet<String> = self
            .tags
            .iter()
            .map(|t| normalize_tag(t))
            .filter(|t| !t.is_empty())
            .collect();
        tags.extend(extract_hashtags(&self.text).iter().map(|t| normalize_tag(t)));
        tags.into_iter().collect()
    }
}

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn normalize_tag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_lowercase()
}

/// Extract all #hashtags from text
fn extract_hashtags(text: &str) -> Vec<String> {
    let regex = HASHTAG_REGEX.get_or_init(|| Regex::new(r"#(\w+)").unwrap());

    regex
        .captures_iter(text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
