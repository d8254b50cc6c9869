//! Engagement simulation and the append-only engagement log.

use crate::content::ContentType;
use crate::i18n::Tone;
use crate::publisher::{Platform, PublishedArtifact};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Quality multiplier range: 0.9 + 0.2 x confidence x quality.
const QUALITY_MULTIPLIER_BASE: f64 = 0.9;
const QUALITY_MULTIPLIER_SPAN: f64 = 0.2;

const CONTENT_TYPES: [ContentType; 4] = [
    ContentType::Fact,
    ContentType::Quote,
    ContentType::Devotional,
    ContentType::Article,
];

/// Inclusive range of one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricRange {
    pub min: u64,
    pub max: u64,
}

impl MetricRange {
    const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Per-counter ranges for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngagementBounds {
    pub views: MetricRange,
    pub likes: MetricRange,
    pub comments: MetricRange,
    pub shares: MetricRange,
}

/// Per-counter multipliers for a content type.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ContentMultipliers {
    views: f64,
    likes: f64,
    comments: f64,
    shares: f64,
}

impl ContentMultipliers {
    fn for_type(content_type: ContentType) -> Self {
        let neutral = Self {
            views: 1.0,
            likes: 1.0,
            comments: 1.0,
            shares: 1.0,
        };
        match content_type {
            ContentType::Quote => Self {
                shares: 1.3,
                ..neutral
            },
            ContentType::Devotional => Self {
                shares: 1.4,
                likes: 1.1,
                ..neutral
            },
            ContentType::Fact => Self {
                comments: 1.3,
                ..neutral
            },
            ContentType::Article => Self {
                views: 1.1,
                comments: 1.1,
                ..neutral
            },
        }
    }
}

impl Platform {
    /// Raw draw ranges before content and quality multipliers.
    pub fn base_ranges(&self) -> EngagementBounds {
        match self {
            Platform::Instagram => EngagementBounds {
                views: MetricRange::new(500, 2000),
                likes: MetricRange::new(100, 500),
                comments: MetricRange::new(10, 50),
                shares: MetricRange::new(20, 100),
            },
            Platform::Twitter => EngagementBounds {
                views: MetricRange::new(200, 1000),
                likes: MetricRange::new(20, 100),
                comments: MetricRange::new(5, 20),
                shares: MetricRange::new(10, 50),
            },
            Platform::Linkedin => EngagementBounds {
                views: MetricRange::new(300, 1500),
                likes: MetricRange::new(50, 300),
                comments: MetricRange::new(10, 40),
                shares: MetricRange::new(10, 50),
            },
            Platform::Sanatan => EngagementBounds {
                views: MetricRange::new(200, 1000),
                likes: MetricRange::new(50, 200),
                comments: MetricRange::new(5, 30),
                shares: MetricRange::new(10, 50),
            },
        }
    }

    /// Bounds every simulated counter on this platform falls within, for
    /// any content type and upstream quality.
    pub fn bounds(&self) -> EngagementBounds {
        let base = self.base_ranges();
        let widest = |pick: fn(&ContentMultipliers) -> f64| {
            CONTENT_TYPES
                .iter()
                .map(|&t| pick(&ContentMultipliers::for_type(t)))
                .fold(1.0, f64::max)
        };
        let envelope = |range: MetricRange, max_multiplier: f64| {
            MetricRange::new(
                scale(range.min, QUALITY_MULTIPLIER_BASE),
                scale(
                    range.max,
                    max_multiplier * (QUALITY_MULTIPLIER_BASE + QUALITY_MULTIPLIER_SPAN),
                ),
            )
        };

        EngagementBounds {
            views: envelope(base.views, widest(|m| m.views)),
            likes: envelope(base.likes, widest(|m| m.likes)),
            comments: envelope(base.comments, widest(|m| m.comments)),
            shares: envelope(base.shares, widest(|m| m.shares)),
        }
    }
}

/// Simulated engagement counters for one published post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetric {
    pub content_id: String,
    pub user_id: String,
    pub platform: Platform,
    pub language: String,
    pub content_type: ContentType,
    pub tone: Tone,
    pub views: u64,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub timestamp: DateTime<Utc>,
}

impl EngagementMetric {
    /// Sum of all counters.
    pub fn volume(&self) -> u64 {
        self.views + self.likes + self.shares + self.comments
    }
}

/// Simulate engagement for an artifact.
///
/// An explicit seed makes the result reproducible; without one the
/// generator is seeded from OS entropy.
pub fn simulate_engagement(artifact: &PublishedArtifact, seed: Option<u64>) -> EngagementMetric {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    simulate_engagement_with_rng(artifact, &mut rng)
}

pub fn simulate_engagement_with_rng<R: Rng>(
    artifact: &PublishedArtifact,
    rng: &mut R,
) -> EngagementMetric {
    let ranges = artifact.platform.base_ranges();
    let content = ContentMultipliers::for_type(artifact.content_type);
    let quality = quality_multiplier(artifact.confidence_score, artifact.quality_score);

    let mut draw = |range: MetricRange, content_multiplier: f64| {
        scale(rng.gen_range(range.min..=range.max), content_multiplier * quality)
    };

    let views = draw(ranges.views, content.views);
    let likes = draw(ranges.likes, content.likes);
    let comments = draw(ranges.comments, content.comments);
    let shares = draw(ranges.shares, content.shares);

    EngagementMetric {
        content_id: artifact.content_id.clone(),
        user_id: artifact.user_id.clone(),
        platform: artifact.platform,
        language: artifact.language.clone(),
        content_type: artifact.content_type,
        tone: artifact.tone,
        views,
        likes,
        shares,
        comments,
        timestamp: artifact.published_at,
    }
}

/// Multiplier in [0.9, 1.1] from upstream confidence and voice quality.
fn quality_multiplier(confidence: f64, quality: f64) -> f64 {
    let product = (confidence * quality).clamp(0.0, 1.0);
    QUALITY_MULTIPLIER_BASE + QUALITY_MULTIPLIER_SPAN * product
}

fn scale(value: u64, multiplier: f64) -> u64 {
    (value as f64 * multiplier).round() as u64
}

type Stream = Arc<Mutex<Vec<EngagementMetric>>>;

/// Append-only engagement log shared across workers.
///
/// Each content id has its own stream, so appends for different items only
/// share the brief map lookup. Records are never modified once appended.
#[derive(Debug, Default)]
pub struct EngagementLog {
    streams: RwLock<HashMap<String, Stream>>,
}

impl EngagementLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, metric: EngagementMetric) {
        let stream = self.stream_for(&metric.content_id);
        stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(metric);
    }

    /// Copy of every record, ordered by content id then append order.
    pub fn snapshot(&self) -> Vec<EngagementMetric> {
        let streams = self.streams.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<&String> = streams.keys().collect();
        ids.sort();

        ids.into_iter()
            .flat_map(|id| {
                streams[id]
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            })
            .collect()
    }

    /// Records for one content id, in append order.
    pub fn for_content(&self, content_id: &str) -> Vec<EngagementMetric> {
        let streams = self.streams.read().unwrap_or_else(PoisonError::into_inner);
        streams
            .get(content_id)
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        let streams = self.streams.read().unwrap_or_else(PoisonError::into_inner);
        streams
            .values()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stream_for(&self, content_id: &str) -> Stream {
        if let Some(stream) = self
            .streams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(content_id)
        {
            return Arc::clone(stream);
        }

        let mut streams = self.streams.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(streams.entry(content_id.to_string()).or_default())
    }
}
