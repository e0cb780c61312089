use std::cmp::Ordering;

use crate::config::FeedConfig;
use crate::models::{Candidate, SortKey};
use crate::services::scoring::{ScoreWeights, ScoringPreset};

/// A candidate with the value of the requested sort key
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
}

/// Ranker - orders filtered candidates by a sort key
///
/// Descending by key, ties broken by `created_at` (newest first) and then by
/// id so the order is total. With an active geo filter, nearest items come
/// first and the key only breaks distance ties. The comparison reads nothing
/// but candidate fields, so re-ranking any slice gives the same relative order.
#[derive(Debug, Clone)]
pub struct Ranker {
    engagement: ScoreWeights,
    popularity: ScoreWeights,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(
            ScoringPreset::Engagement.default_weights(),
            ScoringPreset::Popularity.default_weights(),
        )
    }
}

impl Ranker {
    pub fn new(engagement: ScoreWeights, popularity: ScoreWeights) -> Self {
        Self {
            engagement,
            popularity,
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(
            config.weights_for(ScoringPreset::Engagement),
            config.weights_for(ScoringPreset::Popularity),
        )
    }

    pub fn weights(&self, preset: ScoringPreset) -> ScoreWeights {
        match preset {
            ScoringPreset::Engagement => self.engagement,
            ScoringPreset::Popularity => self.popularity,
        }
    }

    /// Value of `key` for one candidate
    pub fn key_value(&self, candidate: &Candidate, key: SortKey) -> f64 {
        let counts = candidate.counts.clamped();
        match key {
            SortKey::ScoreEngagement | SortKey::ScorePopularity => key
                .preset()
                .map_or(0.0, |preset| self.weights(preset).score(&counts)),
            SortKey::Likes => counts.likes as f64,
            SortKey::Comments => counts.comments as f64,
            SortKey::Recency => candidate.item.created_at.timestamp() as f64,
        }
    }

    /// Total order used by [`Ranker::rank`]
    pub fn compare(a: &ScoredCandidate, b: &ScoredCandidate, by_distance: bool) -> Ordering {
        let distance = if by_distance {
            match (a.candidate.distance_km, b.candidate.distance_km) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        } else {
            Ordering::Equal
        };

        distance
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| b.candidate.item.created_at.cmp(&a.candidate.item.created_at))
            .then_with(|| a.candidate.item.id.cmp(&b.candidate.item.id))
    }

    pub fn rank(
        &self,
        candidates: Vec<Candidate>,
        key: SortKey,
        by_distance: bool,
    ) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| ScoredCandidate {
                score: self.key_value(&candidate, key),
                candidate,
            })
            .collect();

        scored.sort_by(|a, b| Self::compare(a, b, by_distance));
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentItem, InteractionCounts, PublicationState};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn candidate(likes: i64, reads: i64, comments: i64, age_hours: i64) -> Candidate {
        Candidate {
            item: ContentItem {
                id: Uuid::new_v4(),
                author_id: Uuid::new_v4(),
                title: String::new(),
                summary: String::new(),
                content: String::new(),
                location_name: None,
                latitude: None,
                longitude: None,
                status: PublicationState::Published,
                is_approved: true,
                category: None,
                tags: vec![],
                created_at: Utc::now() - Duration::hours(age_hours),
                like_count: likes,
                read_count: reads,
            },
            counts: InteractionCounts::new(likes, reads, comments, 0),
            distance_km: None,
        }
    }

    fn ids(ranked: &[ScoredCandidate]) -> Vec<Uuid> {
        ranked.iter().map(|s| s.candidate.item.id).collect()
    }

    #[test]
    fn test_popularity_ranking_example() {
        let a = candidate(10, 100, 0, 5);
        let b = candidate(5, 5, 0, 1);
        let (a_id, b_id) = (a.item.id, b.item.id);

        let ranked = Ranker::default().rank(vec![b, a], SortKey::ScorePopularity, false);

        assert_eq!(ids(&ranked), vec![a_id, b_id]);
        assert!((ranked[0].score - 37.0).abs() < 1e-9);
        assert!((ranked[1].score - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_keys_use_configured_weights() {
        let mut config = FeedConfig::default();
        config.popularity_weights = ScoreWeights {
            likes: 1.0,
            reads: 0.0,
            comments: 0.0,
            favorites: 0.0,
        };
        let ranker = Ranker::from_config(&config);
        let c = candidate(4, 100, 0, 1);

        assert!((ranker.key_value(&c, SortKey::ScorePopularity) - 4.0).abs() < 1e-9);
        assert!((ranker.key_value(&c, SortKey::ScoreEngagement) - 31.6).abs() < 1e-9);
    }

    #[test]
    fn test_ties_broken_by_recency() {
        let older = candidate(3, 0, 0, 48);
        let newer = candidate(3, 0, 0, 1);
        let (older_id, newer_id) = (older.item.id, newer.item.id);

        let ranked = Ranker::default().rank(vec![older, newer], SortKey::Likes, false);
        assert_eq!(ids(&ranked), vec![newer_id, older_id]);
    }

    #[test]
    fn test_comments_and_recency_keys() {
        let chatty = candidate(0, 0, 9, 30);
        let quiet = candidate(50, 0, 1, 2);
        let (chatty_id, quiet_id) = (chatty.item.id, quiet.item.id);

        let ranker = Ranker::default();
        let by_comments = ranker.rank(vec![quiet.clone(), chatty.clone()], SortKey::Comments, false);
        assert_eq!(ids(&by_comments), vec![chatty_id, quiet_id]);

        let by_recency = ranker.rank(vec![chatty, quiet], SortKey::Recency, false);
        assert_eq!(ids(&by_recency), vec![quiet_id, chatty_id]);
    }

    #[test]
    fn test_distance_takes_precedence() {
        let mut close = candidate(0, 0, 0, 10);
        close.distance_km = Some(0.5);
        let mut popular = candidate(100, 100, 100, 1);
        popular.distance_km = Some(8.0);
        let close_id = close.item.id;

        let ranked = Ranker::default().rank(vec![popular, close], SortKey::ScoreEngagement, true);
        assert_eq!(ranked[0].candidate.item.id, close_id);
    }

    #[test]
    fn test_rerank_of_slice_is_consistent() {
        let ranker = Ranker::default();
        let candidates: Vec<Candidate> = (0..20).map(|i| candidate(i % 4, i % 3, 0, i)).collect();

        let full = ranker.rank(candidates, SortKey::ScoreEngagement, false);
        let slice: Vec<Candidate> = full[5..12].iter().rev().map(|s| s.candidate.clone()).collect();
        let reranked = ranker.rank(slice, SortKey::ScoreEngagement, false);

        assert_eq!(ids(&reranked), ids(&full[5..12]));
    }
}
