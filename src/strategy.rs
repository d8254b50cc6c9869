//! Strategy recommendation from an engagement window.
//!
//! Records are grouped by (platform, language, content type). Each group
//! gets a composite score from its mean counters, each normalized by the
//! largest group mean in the window. The top quartile is flagged for
//! amplification and the bottom quartile for revision. Recommendations are
//! advisory; nothing downstream acts on them automatically.
//!
//! A [`StrategyReport`] bundles the ranked recommendations with
//! language-expansion and tone-diversification advice, voice coverage gaps,
//! per-group performance insights and a summary.

use crate::content::ContentType;
use crate::engagement::EngagementMetric;
use crate::i18n::Tone;
use crate::publisher::Platform;
use crate::voice::{VoiceAssignment, VoiceResolution};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

/// Composite weights and thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyWeights {
    pub views: f64,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    /// Revise groups scoring below this fraction of the leader at medium
    /// priority instead of low
    pub revise_threshold: f64,
    /// Languages reached by fewer distinct content items are flagged for
    /// expansion
    pub expansion_min_items: usize,
    pub max_expansion_recommendations: usize,
    /// Devotional posts below this share of formal posts in a language
    /// trigger diversification
    pub devotional_share_floor: f64,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            views: 0.15,
            likes: 0.25,
            comments: 0.20,
            shares: 0.40,
            revise_threshold: 0.5,
            expansion_min_items: 5,
            max_expansion_recommendations: 3,
            devotional_share_floor: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Amplify,
    Revise,
    VoiceCoverage,
    LanguageExpansion,
    ToneDiversification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecommendation {
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub action: String,
    pub rationale: String,
    pub platform: Option<Platform>,
    pub language: String,
    pub content_type: Option<ContentType>,
    pub tone: Tone,
    pub composite_score: Option<f64>,
    pub generated_at: DateTime<Utc>,
}

/// Performance of one (platform, language, content type) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInsight {
    pub rank: usize,
    pub platform: Platform,
    pub language: String,
    pub content_type: ContentType,
    pub tone: Tone,
    pub records: u64,
    pub composite_score: f64,
    pub mean_views: f64,
    pub mean_likes: f64,
    pub mean_comments: f64,
    pub mean_shares: f64,
    /// Content id of the record with the highest total volume
    pub top_content_id: String,
    /// Top record volume minus the group's mean volume
    pub improvement_potential: f64,
}

/// Headline numbers of a strategy report.
///
/// Priority and kind counts cover both the recommendations and the voice
/// coverage gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub records: usize,
    pub groups: usize,
    pub platforms: usize,
    pub languages: usize,
    /// Mean composite score across groups
    pub average_composite: f64,
    pub total_recommendations: usize,
    pub high_priority: usize,
    pub medium_priority: usize,
    pub low_priority: usize,
    pub by_kind: BTreeMap<RecommendationKind, usize>,
    pub key_insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub generated_at: DateTime<Utc>,
    pub summary: StrategySummary,
    /// Ranked, expansion and diversification advice, ordered by priority
    pub recommendations: Vec<StrategyRecommendation>,
    pub coverage_gaps: Vec<StrategyRecommendation>,
    /// Groups in rank order
    pub performance: Vec<GroupInsight>,
}

/// Grouping key, compared by its string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    platform: Platform,
    language: String,
    content_type: ContentType,
}

impl GroupKey {
    fn sort_key(&self) -> (&'static str, &str, &'static str) {
        (self.platform.as_str(), &self.language, self.content_type.as_str())
    }
}

#[derive(Debug, Default)]
struct GroupStats {
    records: u64,
    views: u64,
    likes: u64,
    comments: u64,
    shares: u64,
    tones: HashMap<Tone, usize>,
    top_content_id: String,
    top_volume: u64,
}

impl GroupStats {
    fn add(&mut self, metric: &EngagementMetric) {
        let volume = metric.volume();
        if self.records == 0 || volume > self.top_volume {
            self.top_volume = volume;
            self.top_content_id = metric.content_id.clone();
        }
        self.records += 1;
        self.views += metric.views;
        self.likes += metric.likes;
        self.comments += metric.comments;
        self.shares += metric.shares;
        *self.tones.entry(metric.tone).or_default() += 1;
    }

    fn means(&self) -> [f64; 4] {
        let n = self.records.max(1) as f64;
        [
            self.views as f64 / n,
            self.likes as f64 / n,
            self.comments as f64 / n,
            self.shares as f64 / n,
        ]
    }

    fn volume(&self) -> u64 {
        self.views + self.likes + self.comments + self.shares
    }

    fn dominant_tone(&self) -> Tone {
        dominant_tone(&self.tones)
    }
}

#[derive(Debug)]
struct ScoredGroup {
    key: GroupKey,
    tone: Tone,
    composite: f64,
    volume: u64,
    means: [f64; 4],
    records: u64,
    top_content_id: String,
    top_volume: u64,
}

impl ScoredGroup {
    fn insight(&self, rank: usize) -> GroupInsight {
        let mean_volume = self.volume as f64 / self.records.max(1) as f64;
        GroupInsight {
            rank: rank + 1,
            platform: self.key.platform,
            language: self.key.language.clone(),
            content_type: self.key.content_type,
            tone: self.tone,
            records: self.records,
            composite_score: self.composite,
            mean_views: round3(self.means[0]),
            mean_likes: round3(self.means[1]),
            mean_comments: round3(self.means[2]),
            mean_shares: round3(self.means[3]),
            top_content_id: self.top_content_id.clone(),
            improvement_potential: round3(self.top_volume as f64 - mean_volume),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StrategyRecommender {
    weights: StrategyWeights,
}

impl StrategyRecommender {
    pub fn new(weights: StrategyWeights) -> Self {
        Self { weights }
    }

    /// Rank the groups in `window` and recommend actions, stamped with `now`.
    pub fn recommend_at(
        &self,
        window: &[EngagementMetric],
        now: DateTime<Utc>,
    ) -> Vec<StrategyRecommendation> {
        let ranked = self.rank_groups(window);
        self.recommend_ranked(&ranked, window.len(), now)
    }

    fn recommend_ranked(
        &self,
        ranked: &[ScoredGroup],
        records: usize,
        now: DateTime<Utc>,
    ) -> Vec<StrategyRecommendation> {
        let Some(leader) = ranked.first() else {
            return Vec::new();
        };
        let leader_score = leader.composite;

        let n = ranked.len();
        let quartile = n.div_ceil(4);

        let mut out: Vec<(usize, StrategyRecommendation)> = Vec::new();
        for (rank, group) in ranked.iter().enumerate() {
            let rec = if rank < quartile {
                self.amplify(group, rank, n, now)
            } else if rank >= n - quartile {
                self.revise(group, rank, n, leader_score, now)
            } else {
                continue;
            };
            out.push((rank, rec));
        }

        out.sort_by(|(ra, a), (rb, b)| a.priority.cmp(&b.priority).then(ra.cmp(rb)));

        info!(
            groups = n,
            recommendations = out.len(),
            records,
            "Strategy recommendations generated"
        );
        out.into_iter().map(|(_, rec)| rec).collect()
    }

    /// Full report over an engagement window and the voice assignments made
    /// for it.
    pub fn report_at(
        &self,
        window: &[EngagementMetric],
        assignments: &[VoiceAssignment],
        now: DateTime<Utc>,
    ) -> StrategyReport {
        let ranked = self.rank_groups(window);

        let mut recommendations = self.recommend_ranked(&ranked, window.len(), now);
        recommendations.extend(self.language_expansion_at(window, now));
        recommendations.extend(self.tone_diversification_at(window, now));
        // Stable, so ranked advice keeps its rank order within a priority
        recommendations.sort_by_key(|r| r.priority);

        let coverage_gaps = self.voice_coverage_at(assignments, now);
        let performance: Vec<GroupInsight> = ranked
            .iter()
            .enumerate()
            .map(|(rank, group)| group.insight(rank))
            .collect();
        let summary = summarize(window.len(), &performance, &recommendations, &coverage_gaps);

        info!(
            recommendations = recommendations.len(),
            coverage_gaps = coverage_gaps.len(),
            groups = performance.len(),
            "Strategy report built"
        );

        StrategyReport {
            generated_at: now,
            summary,
            recommendations,
            coverage_gaps,
            performance,
        }
    }

    /// Flag languages reached by few distinct content items, fewest first.
    pub fn language_expansion_at(
        &self,
        window: &[EngagementMetric],
        now: DateTime<Utc>,
    ) -> Vec<StrategyRecommendation> {
        let mut usage: BTreeMap<&str, (BTreeSet<&str>, HashMap<Tone, usize>)> = BTreeMap::new();
        for metric in window {
            let (items, tones) = usage.entry(metric.language.as_str()).or_default();
            items.insert(metric.content_id.as_str());
            *tones.entry(metric.tone).or_default() += 1;
        }

        let mut under: Vec<(usize, &str, Tone)> = usage
            .iter()
            .filter(|(_, (items, _))| items.len() < self.weights.expansion_min_items)
            .map(|(language, (items, tones))| (items.len(), *language, dominant_tone(tones)))
            .collect();
        under.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

        under
            .into_iter()
            .take(self.weights.max_expansion_recommendations)
            .map(|(count, language, tone)| StrategyRecommendation {
                kind: RecommendationKind::LanguageExpansion,
                priority: Priority::Low,
                action: format!("Increase content production in '{}'", language),
                rationale: format!(
                    "Only {} content item(s) reached '{}' audiences in this window",
                    count, language
                ),
                platform: None,
                language: language.to_string(),
                content_type: None,
                tone,
                composite_score: None,
                generated_at: now,
            })
            .collect()
    }

    /// Flag languages where devotional posts are scarce next to formal ones.
    pub fn tone_diversification_at(
        &self,
        window: &[EngagementMetric],
        now: DateTime<Utc>,
    ) -> Vec<StrategyRecommendation> {
        // A post is one personalized item, counted once across platforms
        let mut posts: BTreeMap<&str, HashMap<Tone, BTreeSet<(&str, &str)>>> = BTreeMap::new();
        for metric in window {
            posts
                .entry(metric.language.as_str())
                .or_default()
                .entry(metric.tone)
                .or_default()
                .insert((metric.content_id.as_str(), metric.user_id.as_str()));
        }

        posts
            .into_iter()
            .filter_map(|(language, by_tone)| {
                let count = |tone: Tone| by_tone.get(&tone).map_or(0, BTreeSet::len);
                let formal = count(Tone::Formal);
                let devotional = count(Tone::Devotional);
                if formal == 0
                    || devotional as f64 >= formal as f64 * self.weights.devotional_share_floor
                {
                    return None;
                }
                Some(StrategyRecommendation {
                    kind: RecommendationKind::ToneDiversification,
                    priority: Priority::Medium,
                    action: format!("Increase devotional content in '{}'", language),
                    rationale: format!(
                        "{} devotional against {} formal post(s) in this window",
                        devotional, formal
                    ),
                    platform: None,
                    language: language.to_string(),
                    content_type: None,
                    tone: Tone::Devotional,
                    composite_score: None,
                    generated_at: now,
                })
            })
            .collect()
    }

    /// Recommend voices for (language, tone) pairs that had to borrow a
    /// family or global voice.
    pub fn voice_coverage_at(
        &self,
        assignments: &[VoiceAssignment],
        now: DateTime<Utc>,
    ) -> Vec<StrategyRecommendation> {
        let mut gaps: BTreeMap<(String, &'static str), (Tone, usize, VoiceResolution)> =
            BTreeMap::new();
        for assignment in assignments.iter().filter(|a| a.fallback_depth >= 2) {
            let entry = gaps
                .entry((assignment.language.clone(), assignment.tone.code()))
                .or_insert((assignment.tone, 0, assignment.resolution));
            entry.1 += 1;
            if assignment.resolution.depth() > entry.2.depth() {
                entry.2 = assignment.resolution;
            }
        }

        gaps.into_iter()
            .map(|((language, _), (tone, count, worst))| StrategyRecommendation {
                kind: RecommendationKind::VoiceCoverage,
                priority: Priority::Medium,
                action: format!("Add a {} voice for '{}'", tone.code(), language),
                rationale: format!(
                    "{} voice assignment(s) fell back as far as {} (depth {})",
                    count,
                    resolution_label(worst),
                    worst.depth()
                ),
                platform: None,
                language,
                content_type: None,
                tone,
                composite_score: None,
                generated_at: now,
            })
            .collect()
    }

    fn rank_groups(&self, window: &[EngagementMetric]) -> Vec<ScoredGroup> {
        let mut groups: HashMap<GroupKey, GroupStats> = HashMap::new();
        for metric in window {
            groups
                .entry(GroupKey {
                    platform: metric.platform,
                    language: metric.language.clone(),
                    content_type: metric.content_type,
                })
                .or_default()
                .add(metric);
        }

        let mut maxima = [0.0f64; 4];
        for stats in groups.values() {
            for (max, mean) in maxima.iter_mut().zip(stats.means()) {
                *max = max.max(mean);
            }
        }

        let w = &self.weights;
        let weights = [w.views, w.likes, w.comments, w.shares];
        let mut scored: Vec<ScoredGroup> = groups
            .into_iter()
            .map(|(key, stats)| {
                let means = stats.means();
                let composite: f64 = means
                    .iter()
                    .zip(maxima)
                    .zip(weights)
                    .map(|((mean, max), weight)| if max > 0.0 { weight * mean / max } else { 0.0 })
                    .sum();
                ScoredGroup {
                    tone: stats.dominant_tone(),
                    composite: round3(composite),
                    volume: stats.volume(),
                    means,
                    records: stats.records,
                    top_content_id: stats.top_content_id,
                    top_volume: stats.top_volume,
                    key,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.composite
                .partial_cmp(&a.composite)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.volume.cmp(&a.volume))
                .then_with(|| a.key.sort_key().cmp(&b.key.sort_key()))
        });

        debug!(groups = scored.len(), "Engagement groups ranked");
        scored
    }

    fn amplify(
        &self,
        group: &ScoredGroup,
        rank: usize,
        n: usize,
        now: DateTime<Utc>,
    ) -> StrategyRecommendation {
        StrategyRecommendation {
            kind: RecommendationKind::Amplify,
            priority: Priority::High,
            action: format!(
                "Increase {} {} {} content on {}",
                group.tone, group.key.language, group.key.content_type, group.key.platform
            ),
            rationale: format!(
                "Ranked {} of {} with composite score {:.3} ({})",
                rank + 1,
                n,
                group.composite,
                describe_means(&group.means)
            ),
            ..self.base(group, now)
        }
    }

    fn revise(
        &self,
        group: &ScoredGroup,
        rank: usize,
        n: usize,
        leader_score: f64,
        now: DateTime<Utc>,
    ) -> StrategyRecommendation {
        let priority = if group.composite < self.weights.revise_threshold * leader_score {
            Priority::Medium
        } else {
            Priority::Low
        };
        StrategyRecommendation {
            kind: RecommendationKind::Revise,
            priority,
            action: format!(
                "Revise {} {} {} content on {}",
                group.tone, group.key.language, group.key.content_type, group.key.platform
            ),
            rationale: format!(
                "Ranked {} of {} with composite score {:.3} against leader {:.3} ({})",
                rank + 1,
                n,
                group.composite,
                leader_score,
                describe_means(&group.means)
            ),
            ..self.base(group, now)
        }
    }

    fn base(&self, group: &ScoredGroup, now: DateTime<Utc>) -> StrategyRecommendation {
        StrategyRecommendation {
            kind: RecommendationKind::Amplify,
            priority: Priority::Low,
            action: String::new(),
            rationale: String::new(),
            platform: Some(group.key.platform),
            language: group.key.language.clone(),
            content_type: Some(group.key.content_type),
            tone: group.tone,
            composite_score: Some(group.composite),
            generated_at: now,
        }
    }
}

/// Recommend with default weights, stamped with the current time.
pub fn recommend(window: &[EngagementMetric]) -> Vec<StrategyRecommendation> {
    StrategyRecommender::default().recommend_at(window, Utc::now())
}

pub fn recommend_voice_coverage(assignments: &[VoiceAssignment]) -> Vec<StrategyRecommendation> {
    StrategyRecommender::default().voice_coverage_at(assignments, Utc::now())
}

/// Build a report with default weights, stamped with the current time.
pub fn strategy_report(
    window: &[EngagementMetric],
    assignments: &[VoiceAssignment],
) -> StrategyReport {
    StrategyRecommender::default().report_at(window, assignments, Utc::now())
}

fn summarize(
    records: usize,
    performance: &[GroupInsight],
    recommendations: &[StrategyRecommendation],
    coverage_gaps: &[StrategyRecommendation],
) -> StrategySummary {
    let platforms: BTreeSet<Platform> = performance.iter().map(|g| g.platform).collect();
    let languages: BTreeSet<&str> = performance.iter().map(|g| g.language.as_str()).collect();
    let average_composite = if performance.is_empty() {
        0.0
    } else {
        round3(performance.iter().map(|g| g.composite_score).sum::<f64>() / performance.len() as f64)
    };

    let all: Vec<&StrategyRecommendation> = recommendations.iter().chain(coverage_gaps).collect();
    let priority_count = |p: Priority| all.iter().filter(|r| r.priority == p).count();
    let mut by_kind = BTreeMap::new();
    for rec in &all {
        *by_kind.entry(rec.kind).or_insert(0) += 1;
    }

    let mut key_insights = Vec::new();
    if let Some(leader) = performance.first() {
        key_insights.push(format!(
            "{} {} {} content leads with composite score {:.3} over {} record(s)",
            leader.language, leader.content_type, leader.platform, leader.composite_score, leader.records
        ));
    }
    let amplify = by_kind.get(&RecommendationKind::Amplify).copied().unwrap_or(0);
    key_insights.push(format!("{} amplification opportunity(ies) identified", amplify));
    if !coverage_gaps.is_empty() {
        key_insights.push(format!(
            "{} language/tone pair(s) rely on borrowed voices",
            coverage_gaps.len()
        ));
    }

    StrategySummary {
        records,
        groups: performance.len(),
        platforms: platforms.len(),
        languages: languages.len(),
        average_composite,
        total_recommendations: all.len(),
        high_priority: priority_count(Priority::High),
        medium_priority: priority_count(Priority::Medium),
        low_priority: priority_count(Priority::Low),
        by_kind,
        key_insights,
    }
}

/// Most frequent tone, ties broken by tone code.
fn dominant_tone(tones: &HashMap<Tone, usize>) -> Tone {
    tones
        .iter()
        .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then_with(|| b.code().cmp(a.code())))
        .map(|(tone, _)| *tone)
        .unwrap_or(Tone::Neutral)
}

fn describe_means(means: &[f64; 4]) -> String {
    format!(
        "avg views {:.0}, likes {:.0}, comments {:.0}, shares {:.0}",
        means[0], means[1], means[2], means[3]
    )
}

fn resolution_label(resolution: VoiceResolution) -> &'static str {
    match resolution {
        VoiceResolution::Exact => "an exact voice",
        VoiceResolution::LanguageDefaultTone => "the language default voice",
        VoiceResolution::FamilyFallback => "a related language's voice",
        VoiceResolution::GlobalNeutral => "the global neutral voice",
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
