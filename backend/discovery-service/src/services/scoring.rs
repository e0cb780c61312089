/// Popularity scoring
///
/// Linear weighting of an item's interaction counts. Two presets exist:
/// - Engagement: likes 0.4, reads 0.3, comments 0.2, favorites 0.1
/// - Popularity: likes 0.7, reads 0.3 (lighter list views)
use serde::{Deserialize, Serialize};

use crate::models::InteractionCounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPreset {
    Engagement,
    Popularity,
}

impl ScoringPreset {
    pub fn default_weights(&self) -> ScoreWeights {
        match self {
            Self::Engagement => ScoreWeights {
                likes: 0.4,
                reads: 0.3,
                comments: 0.2,
                favorites: 0.1,
            },
            Self::Popularity => ScoreWeights {
                likes: 0.7,
                reads: 0.3,
                comments: 0.0,
                favorites: 0.0,
            },
        }
    }
}

/// Per-interaction weights; all non-negative, likes strictly positive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub likes: f64,
    pub reads: f64,
    pub comments: f64,
    pub favorites: f64,
}

impl ScoreWeights {
    /// Parse "likes,reads,comments,favorites", e.g. "0.4,0.3,0.2,0.1".
    pub fn parse(raw: &str) -> Result<Self, String> {
        let values = raw
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|e| format!("invalid weight {:?}: {}", part, e))
            })
            .collect::<Result<Vec<f64>, String>>()?;

        let [likes, reads, comments, favorites] = values[..] else {
            return Err(format!("expected 4 weights, got {}", values.len()));
        };

        if values.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(format!("weights must be finite and >= 0: {}", raw));
        }
        // more likes must always mean a higher score
        if likes <= 0.0 {
            return Err(format!("likes weight must be > 0: {}", raw));
        }

        Ok(Self {
            likes,
            reads,
            comments,
            favorites,
        })
    }

    /// Weighted score of `counts`. Zero interactions score 0.
    pub fn score(&self, counts: &InteractionCounts) -> f64 {
        let c = counts.clamped();

        self.likes * c.likes as f64
            + self.reads * c.reads as f64
            + self.comments * c.comments as f64
            + self.favorites * c.favorites as f64
    }
}
