/// Data models for discovery-service
///
/// This module defines structures for:
/// - ContentItem: a travel post together with its denormalized counters
/// - PublicationState: the post lifecycle (author transitions, moderator actions)
/// - InteractionKind / InteractionCounts: the interaction facts feeding the scores
/// - FeedFilters / SortKey: the knobs of a feed request
/// - FeedPage / RankedResult: the ranked, paginated response
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::services::scoring::ScoringPreset;

// =====================================================================
// Content
// =====================================================================

/// Publication state of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationState {
    Draft,
    Pending,
    Published,
    Rejected,
}

/// Moderator decisions; the only way a published or rejected item changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Approve,
    Reject,
    Unpublish,
}

impl PublicationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }

    /// Author-driven transition. An item is published only once both flags
    /// are set and never moves backward from `Published` or `Rejected`.
    pub fn transition(self, is_published: bool, is_approved: bool) -> Self {
        match self {
            Self::Published | Self::Rejected => self,
            _ if is_published && is_approved => Self::Published,
            _ if is_published => Self::Pending,
            other => other,
        }
    }

    pub fn moderate(self, action: ModerationAction) -> Self {
        match action {
            ModerationAction::Approve => Self::Published,
            ModerationAction::Reject => Self::Rejected,
            ModerationAction::Unpublish => Self::Draft,
        }
    }
}

impl fmt::Display for PublicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PublicationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "published" => Ok(Self::Published),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown publication state: {}", other)),
        }
    }
}

/// A post as the ranking core sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub location_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: PublicationState,
    pub is_approved: bool,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub like_count: i64,
    pub read_count: i64,
}

impl ContentItem {
    /// Published and approved: visible to everyone.
    pub fn is_publicly_visible(&self) -> bool {
        self.status == PublicationState::Published && self.is_approved
    }
}

// =====================================================================
// Interactions
// =====================================================================

/// Kind of interaction fact recorded between a user and an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Like,
    Read,
    Comment,
    Favorite,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Read => "read",
            Self::Comment => "comment",
            Self::Favorite => "favorite",
        }
    }

    /// Likes and favorites toggle; reads and comments append.
    pub fn is_toggle(&self) -> bool {
        matches!(self, Self::Like | Self::Favorite)
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One interaction between a user and an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionFact {
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub kind: InteractionKind,
    pub created_at: DateTime<Utc>,
}

/// Live interaction counts for one item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionCounts {
    pub likes: i64,
    pub reads: i64,
    pub comments: i64,
    pub favorites: i64,
}

impl InteractionCounts {
    pub fn new(likes: i64, reads: i64, comments: i64, favorites: i64) -> Self {
        Self {
            likes,
            reads,
            comments,
            favorites,
        }
    }

    /// Negative counts (bad data) are treated as zero.
    pub fn clamped(&self) -> Self {
        Self {
            likes: self.likes.max(0),
            reads: self.reads.max(0),
            comments: self.comments.max(0),
            favorites: self.favorites.max(0),
        }
    }
}

// =====================================================================
// Requests
// =====================================================================

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Uuid,
    pub is_staff: bool,
}

/// Relative time window for trending-style feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Day,
    Week,
    Month,
    All,
}

impl TimeWindow {
    /// Earliest creation time inside the window, `None` for `All`.
    pub fn lower_bound(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Day => Some(now - Duration::days(1)),
            Self::Week => Some(now - Duration::days(7)),
            Self::Month => Some(now - Duration::days(30)),
            Self::All => None,
        }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" | "24h" => Ok(Self::Day),
            "week" | "7d" => Ok(Self::Week),
            "month" | "30d" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => Err(format!("unknown time window: {}", other)),
        }
    }
}

/// Raw geographic filter as supplied by the caller; validated by the candidate filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFilter {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: Option<f64>,
}

/// Optional filters of a feed request
#[derive(Debug, Clone, Default)]
pub struct FeedFilters {
    pub category: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub time_window: Option<TimeWindow>,
    pub query: Option<String>,
    pub geo: Option<GeoFilter>,
    pub personalized: bool,
}

impl FeedFilters {
    /// Effective lower bound on `created_at`: the later of `start_date` and the window start.
    pub fn created_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let window = self.time_window.and_then(|w| w.lower_bound(now));
        match (self.start_date, window) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Key a feed is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    ScoreEngagement,
    ScorePopularity,
    Likes,
    Comments,
    Recency,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScoreEngagement => "score_engagement",
            Self::ScorePopularity => "score_popularity",
            Self::Likes => "likes",
            Self::Comments => "comments",
            Self::Recency => "recency",
        }
    }

    /// Scoring preset behind a score-based key
    pub fn preset(&self) -> Option<ScoringPreset> {
        match self {
            Self::ScoreEngagement => Some(ScoringPreset::Engagement),
            Self::ScorePopularity => Some(ScoringPreset::Popularity),
            _ => None,
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "score_engagement" | "score" => Ok(Self::ScoreEngagement),
            "score_popularity" | "popularity" => Ok(Self::ScorePopularity),
            "likes" => Ok(Self::Likes),
            "comments" => Ok(Self::Comments),
            "recency" | "recent" => Ok(Self::Recency),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

// =====================================================================
// Responses
// =====================================================================

/// An eligible item with everything the ranker needs
#[derive(Debug, Clone)]
pub struct Candidate {
    pub item: ContentItem,
    pub counts: InteractionCounts,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub item_id: Uuid,
    pub score: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// One page of a ranked feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    pub results: Vec<RankedResult>,
    pub count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub links: PageLinks,
    /// Set when a personalized feed had no interest signal to work with
    pub no_recommendations: bool,
}
