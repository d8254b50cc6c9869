//! Pipeline metrics and observability.
//!
//! Counters are atomics so concurrent workers can record without locking.
//! One `PipelineMetrics` instance belongs to one pipeline; there is no
//! process-wide instance.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Content items accepted at intake
    items_accepted: AtomicUsize,

    /// Content items rejected at intake
    items_rejected: AtomicUsize,

    /// Translations served from the cache
    cache_hits: AtomicUsize,

    /// Translations that had to be computed
    cache_misses: AtomicUsize,

    /// Personalized records produced
    personalizations: AtomicUsize,

    /// Voice assignments that needed at least one fallback step
    voice_fallbacks: AtomicUsize,

    /// Voice assignments in total
    voice_assignments: AtomicUsize,

    /// Engagement records appended to the log
    engagement_records: AtomicUsize,

    /// Stage failures caught at the item boundary
    stage_failures: AtomicUsize,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_item_accepted(&self) {
        self.items_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_item_rejected(&self) {
        self.items_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_personalization(&self) {
        self.personalizations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a voice assignment and whether it fell back.
    pub fn record_voice_assignment(&self, fallback_depth: u8) {
        self.voice_assignments.fetch_add(1, Ordering::Relaxed);
        if fallback_depth > 0 {
            self.voice_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_engagement(&self) {
        self.engagement_records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stage_failure(&self) {
        self.stage_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn stage_failures(&self) -> usize {
        self.stage_failures.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_lookups = hits + misses;
        let cache_hit_rate = if total_lookups > 0 {
            (hits as f64 / total_lookups as f64) * 100.0
        } else {
            0.0
        };

        let voice_assignments = self.voice_assignments.load(Ordering::Relaxed);
        let voice_fallbacks = self.voice_fallbacks.load(Ordering::Relaxed);
        let voice_fallback_rate = if voice_assignments > 0 {
            (voice_fallbacks as f64 / voice_assignments as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            items_accepted: self.items_accepted.load(Ordering::Relaxed),
            items_rejected: self.items_rejected.load(Ordering::Relaxed),
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            personalizations: self.personalizations.load(Ordering::Relaxed),
            voice_assignments,
            voice_fallbacks,
            voice_fallback_rate,
            engagement_records: self.engagement_records.load(Ordering::Relaxed),
            stage_failures: self.stage_failures(),
        }
    }
}

/// Snapshot of pipeline counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub items_accepted: usize,
    pub items_rejected: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    pub personalizations: usize,
    pub voice_assignments: usize,
    pub voice_fallbacks: usize,

    /// Share of voice assignments that fell back, as a percentage (0-100)
    pub voice_fallback_rate: f64,

    pub engagement_records: usize,
    pub stage_failures: usize,
}
