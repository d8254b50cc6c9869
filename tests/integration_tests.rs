//! Integration tests for the adaptive content pipeline
//!
//! These tests drive the public API the way the batch binary does: load
//! inputs from JSON files, run blocks through every stage, then feed the
//! engagement log to the strategy job.

use adaptive_content_pipeline::config::Config;
use adaptive_content_pipeline::content::{ContentBlock, ContentType};
use adaptive_content_pipeline::engagement::EngagementMetric;
use adaptive_content_pipeline::i18n::{LanguageRegistry, Tone};
use adaptive_content_pipeline::output::STRATEGY_FILE;
use adaptive_content_pipeline::personalization::{UserProfile, UserProfileStore};
use adaptive_content_pipeline::pipeline::Pipeline;
use adaptive_content_pipeline::publisher::Platform;
use adaptive_content_pipeline::scheduler::StrategyJob;
use adaptive_content_pipeline::strategy::{Priority, RecommendationKind};
use adaptive_content_pipeline::voice::VoiceResolution;
use adaptive_content_pipeline::{
    recommend, select_voice, simulate_engagement, translate, PipelineError, Stage,
};
use std::path::Path;
use tempfile::TempDir;

// ==================== Test Helpers ====================

const BLOCKS_JSON: &str = r##"[
  {"id": "q1", "text": "Be kind to all beings", "content_type": "quote", "source_language": "en", "tags": ["karma"]},
  {"id": "f1", "text": "The Ganga is over 2500 km long", "content_type": "fact", "source_language": "en"},
  {"id": "bad", "text": "   ", "content_type": "fact", "source_language": "en"}
]"##;

const PROFILES_JSON: &str = r##"[
  {"user_id": "asha", "preferred_language": "hi", "preferred_tone": "devotional", "interests": ["karma"]},
  {"user_id": "meera", "preferred_language": "sa", "preferred_tone": "casual"},
  {"user_id": "ghost", "preferred_language": "tlh", "preferred_tone": "formal"}
]"##;

/// Write the input files and return a config pointing at them.
fn create_test_config(temp_dir: &TempDir) -> Config {
    let blocks_path = temp_dir.path().join("content_blocks.json");
    let profiles_path = temp_dir.path().join("user_profiles.json");
    std::fs::write(&blocks_path, BLOCKS_JSON).expect("Failed to write content blocks");
    std::fs::write(&profiles_path, PROFILES_JSON).expect("Failed to write user profiles");

    Config {
        concurrency_limit: 2,
        engagement_seed: Some(7),
        content_blocks_file: blocks_path.to_str().unwrap().to_string(),
        user_profiles_file: profiles_path.to_str().unwrap().to_string(),
        output_dir: temp_dir.path().join("out").to_str().unwrap().to_string(),
        ..Config::default()
    }
}

fn load_blocks(config: &Config) -> Vec<ContentBlock> {
    let raw = std::fs::read_to_string(&config.content_blocks_file).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn metric(
    platform: Platform,
    language: &str,
    views: u64,
    likes: u64,
    comments: u64,
    shares: u64,
) -> EngagementMetric {
    EngagementMetric {
        content_id: format!("{}-{}", platform, language),
        user_id: "u1".to_string(),
        platform,
        language: language.to_string(),
        content_type: ContentType::Fact,
        tone: Tone::Formal,
        views,
        likes,
        shares,
        comments,
        timestamp: chrono::Utc::now(),
    }
}

// ==================== End-to-End Tests ====================

#[tokio::test]
async fn test_full_run_from_json_inputs() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir);
    let profiles = UserProfileStore::load_from_json(Path::new(&config.user_profiles_file)).unwrap();
    let blocks = load_blocks(&config);
    let output_dir = config.output_dir.clone();

    let pipeline = Pipeline::new(config, LanguageRegistry::builtin(), profiles);
    let summary = pipeline.run(blocks).await;

    // Outcomes come back in input order
    let ids: Vec<_> = summary.outcomes.iter().map(|o| o.content_id.as_str()).collect();
    assert_eq!(ids, vec!["q1", "f1", "bad"]);

    // Blank block rejected at intake, others accepted
    let bad = &summary.outcomes[2];
    assert!(!bad.accepted);
    assert_eq!(bad.failures.len(), 1);
    assert_eq!(bad.failures[0].stage, Stage::Intake);

    // Two usable users per accepted block, one per platform each
    for outcome in &summary.outcomes[..2] {
        assert!(outcome.accepted);
        assert_eq!(outcome.translations.len(), 2);
        assert_eq!(outcome.voices.len(), 2);
        assert_eq!(outcome.previews.len(), 2 * Platform::ALL.len());
        assert_eq!(outcome.engagement.len(), 2 * Platform::ALL.len());

        // The unsupported language fails only its own user
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].stage, Stage::Translate);
        assert_eq!(outcome.failures[0].user_id.as_deref(), Some("ghost"));
    }

    assert_eq!(pipeline.engagement_log().len(), 4 * Platform::ALL.len());
    assert_eq!(summary.metrics.items_rejected, 1);

    let job = StrategyJob::new(pipeline, &output_dir);
    let count = job.run_once().await.unwrap().unwrap();
    assert!(count > 0);

    let raw = std::fs::read_to_string(Path::new(&output_dir).join(STRATEGY_FILE)).unwrap();
    let written: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(written["recommendations"].as_array().unwrap().len(), count);
    assert_eq!(
        written["summary"]["records"].as_u64(),
        Some(4 * Platform::ALL.len() as u64)
    );
    assert!(!written["performance"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_seeded_runs_are_reproducible() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir);
    let blocks = load_blocks(&config);

    let first = Pipeline::new(
        config.clone(),
        LanguageRegistry::builtin(),
        UserProfileStore::load_from_json(Path::new(&config.user_profiles_file)).unwrap(),
    );
    let second = Pipeline::new(
        config.clone(),
        LanguageRegistry::builtin(),
        UserProfileStore::load_from_json(Path::new(&config.user_profiles_file)).unwrap(),
    );

    let a = first.run(blocks.clone()).await;
    let b = second.run(blocks).await;

    let counters = |m: &EngagementMetric| (m.platform, m.views, m.likes, m.comments, m.shares);
    for (left, right) in a.outcomes.iter().zip(&b.outcomes) {
        let left: Vec<_> = left.engagement.iter().map(counters).collect();
        let right: Vec<_> = right.engagement.iter().map(counters).collect();
        assert_eq!(left, right);
    }
}

// ==================== Stage Scenario Tests ====================

#[test]
fn test_hello_to_hindi_formal() {
    let registry = LanguageRegistry::builtin();
    let block = ContentBlock::new("hello", "Hello, how are you?", ContentType::Fact, "en");

    let translation = translate(&registry, &block, "hi", Tone::Formal).unwrap();

    assert!(!translation.translated_text.is_empty());
    assert!((0.85..=0.95).contains(&translation.confidence_score));
    assert_eq!(translation.target_language, "hi");
}

#[test]
fn test_unsupported_language_is_an_error() {
    let registry = LanguageRegistry::builtin();
    let block = ContentBlock::new("hello", "Hello", ContentType::Fact, "en");

    let err = translate(&registry, &block, "tlh", Tone::Formal).unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedLanguage { ref code } if code == "tlh"));
}

#[test]
fn test_sanskrit_voice_depths() {
    let registry = LanguageRegistry::builtin();
    let text = "ॐ नमः शिवाय";

    let devotional = select_voice(&registry, "c1", "sa", Tone::Devotional, text);
    let casual = select_voice(&registry, "c1", "sa", Tone::Casual, text);

    assert_eq!(devotional.fallback_depth, 0);
    assert_eq!(devotional.resolution, VoiceResolution::Exact);
    assert!(casual.fallback_depth >= 1);
    assert!(casual.quality_score < devotional.quality_score);
}

#[test]
fn test_engagement_within_platform_bounds() {
    let registry = LanguageRegistry::builtin();
    let profiles = UserProfileStore::from_profiles(vec![UserProfile::new("u1", "hi", Tone::Devotional)]);
    let config = Config {
        engagement_seed: Some(99),
        ..Config::default()
    };
    let pipeline = Pipeline::new(config, registry, profiles);

    let block = ContentBlock::new("d1", "May all beings be happy", ContentType::Devotional, "en");
    let outcome = pipeline.process_item(&block, chrono::Utc::now());

    assert_eq!(outcome.engagement.len(), Platform::ALL.len());
    for metric in &outcome.engagement {
        let bounds = metric.platform.bounds();
        assert!(bounds.views.contains(metric.views), "{:?}", metric);
        assert!(bounds.likes.contains(metric.likes), "{:?}", metric);
        assert!(bounds.comments.contains(metric.comments), "{:?}", metric);
        assert!(bounds.shares.contains(metric.shares), "{:?}", metric);
    }
}

#[test]
fn test_simulate_engagement_public_entry_point() {
    let registry = LanguageRegistry::builtin();
    let profiles = UserProfileStore::from_profiles(vec![UserProfile::new("u1", "es", Tone::Casual)]);
    let pipeline = Pipeline::new(Config::default(), registry, profiles);

    let block = ContentBlock::new("a1", "Breathe slowly", ContentType::Article, "en");
    let outcome = pipeline.process_item(&block, chrono::Utc::now());
    let preview = &outcome.previews[0];

    let artifact = adaptive_content_pipeline::publisher::PublishedArtifact::from_preview(
        preview,
        ContentType::Article,
        outcome.translations[0].confidence_score,
        outcome.voices[0].quality_score,
        chrono::Utc::now(),
    );
    let first = simulate_engagement(&artifact, Some(5));
    let second = simulate_engagement(&artifact, Some(5));

    assert_eq!(first.views, second.views);
    assert_eq!(first.shares, second.shares);
    assert_eq!(first.platform, preview.platform);
}

// ==================== Strategy Tests ====================

#[test]
fn test_recommend_empty_window() {
    assert!(recommend(&[]).is_empty());
}

#[test]
fn test_recommend_single_group() {
    let window = vec![metric(Platform::Instagram, "hi", 1000, 100, 20, 30)];

    let recommendations = recommend(&window);

    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].kind, RecommendationKind::Amplify);
    assert_eq!(recommendations[0].priority, Priority::High);
    assert_eq!(recommendations[0].platform, Some(Platform::Instagram));
}

#[test]
fn test_recommend_amplifies_leader_and_revises_laggard() {
    let window = vec![
        metric(Platform::Instagram, "hi", 2000, 300, 60, 200),
        metric(Platform::Twitter, "es", 500, 20, 5, 10),
        metric(Platform::Linkedin, "sa", 900, 80, 20, 40),
        metric(Platform::Sanatan, "en", 1000, 90, 25, 50),
    ];

    let recommendations = recommend(&window);

    let first = &recommendations[0];
    assert_eq!(first.kind, RecommendationKind::Amplify);
    assert_eq!(first.platform, Some(Platform::Instagram));
    assert_eq!(first.language, "hi");

    let revise: Vec<_> = recommendations
        .iter()
        .filter(|r| r.kind == RecommendationKind::Revise)
        .collect();
    assert_eq!(revise.len(), 1);
    assert_eq!(revise[0].platform, Some(Platform::Twitter));
}

// ==================== Registry Tests ====================

#[test]
fn test_registry_loads_from_json_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("languages.json");
    let json = r#"[
      {
        "code": "hi",
        "name": "Hindi",
        "native_name": "हिन्दी",
        "script": "devanagari",
        "tier": "mid_resource_indic",
        "base_confidence": 0.9,
        "default_tone": "formal",
        "supported_tones": ["formal", "devotional"],
        "words_per_second": 2.2,
        "voices": [{"tone": "formal", "voice_tag": "hindi_formal", "quality": 0.88}]
      }
    ]"#;
    std::fs::write(&path, json).unwrap();

    let registry = LanguageRegistry::load_from_json(&path).unwrap();

    assert_eq!(registry.list_all().len(), 1);
    assert!(registry.is_supported("hi"));
    assert!(!registry.is_supported("sa"));

    let voice = select_voice(&registry, "c1", "hi", Tone::Formal, "नमस्ते");
    assert_eq!(voice.voice_tag, "hindi_formal");
    assert_eq!(voice.quality_score, 0.88);
}

#[test]
fn test_registry_rejects_invalid_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("languages.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(LanguageRegistry::load_from_json(&path).is_err());
    assert!(LanguageRegistry::load_from_json(&temp_dir.path().join("missing.json")).is_err());
}
