//! Internationalization (i18n) module: the language profile table and the
//! vocabulary it is described with.
//!
//! # Architecture
//!
//! - `registry`: Read-only table of supported languages, their tiers and voice maps
//! - `language`: Tones, script families and difficulty tiers
//! - `strings`: Localized register strings for personalization templates
//!
//! # Example
//!
//! ```rust,ignore
//! use adaptive_content_pipeline::i18n::{LanguageRegistry, Tone};
//!
//! let registry = LanguageRegistry::builtin();
//! let hindi = registry.require("hi")?;
//! let voice = hindi.voice_for(Tone::Devotional);
//! ```

mod language;
mod registry;
mod strings;

pub use language::{DifficultyTier, ScriptFamily, Tone};
pub use registry::{LanguageProfile, LanguageRegistry, VoiceEntry};
pub use strings::RegisterStrings;
