//! Adaptive multilingual content pipeline.
//!
//! Short content blocks are translated with a confidence score, personalized
//! per user, matched to a synthesis voice, formatted per platform and scored
//! with simulated engagement. The engagement log feeds strategy
//! recommendations.

pub mod config;
pub mod content;
pub mod engagement;
pub mod error;
pub mod i18n;
pub mod metrics;
pub mod output;
pub mod personalization;
pub mod pipeline;
pub mod publisher;
pub mod scheduler;
pub mod strategy;
pub mod translation;
pub mod voice;

pub use engagement::simulate_engagement;
pub use error::{PipelineError, Stage, StageFailure};
pub use i18n::{LanguageRegistry, Tone};
pub use personalization::personalize;
pub use strategy::{recommend, strategy_report};
pub use translation::translate;
pub use voice::select_voice;
