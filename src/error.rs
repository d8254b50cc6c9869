//! Error taxonomy for the content pipeline.
//!
//! Every variant is fatal for the single call that produced it and nothing
//! else. The pipeline catches these at the per-item boundary, logs them with
//! the content id and stage, and keeps going with the remaining items.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Target language has no entry in the language profile table.
    #[error("unsupported language: '{code}'")]
    UnsupportedLanguage { code: String },

    /// User profile is missing a field personalization cannot work without.
    #[error("profile for user '{user_id}' is missing required field '{field}'")]
    ProfileIncomplete {
        user_id: String,
        field: &'static str,
    },

    /// User profile carries a value outside its documented range.
    #[error("profile for user '{user_id}' is invalid: {reason}")]
    InvalidProfile { user_id: String, reason: String },

    /// Source text is empty or too long to enter the pipeline.
    #[error("content '{content_id}' rejected: {reason}")]
    InvalidContent { content_id: String, reason: String },
}

/// Pipeline stage names, used to tag logs and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intake,
    Translate,
    Personalize,
    SelectVoice,
    Publish,
    SimulateEngagement,
    /// The worker task running the item died
    Worker,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Intake => "intake",
            Stage::Translate => "translate",
            Stage::Personalize => "personalize",
            Stage::SelectVoice => "select_voice",
            Stage::Publish => "publish",
            Stage::SimulateEngagement => "simulate_engagement",
            Stage::Worker => "worker",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure isolated to one stage of one content item.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize)]
#[error("[{stage}] content '{content_id}': {message}")]
pub struct StageFailure {
    pub content_id: String,
    pub stage: Stage,
    /// User the failing call was made for, when the stage is per-user.
    pub user_id: Option<String>,
    pub message: String,
}

impl StageFailure {
    pub fn new(content_id: &str, stage: Stage, error: &PipelineError) -> Self {
        Self {
            content_id: content_id.to_string(),
            stage,
            user_id: None,
            message: error.to_string(),
        }
    }

    pub fn with_message(content_id: &str, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            content_id: content_id.to_string(),
            stage,
            user_id: None,
            message: message.into(),
        }
    }

    pub fn for_user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }
}
