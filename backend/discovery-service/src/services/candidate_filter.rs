/// Candidate Filter
///
/// Narrows the fetched items to the ones a viewer may see and that match
/// the request filters. Rules, all ANDed:
/// 1. Visibility: published + approved, or staff viewer, or the viewer's own item
/// 2. Category, creation-time bounds, free-text query, geo radius
/// 3. Personalized feeds: interest categories only, nothing already seen
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::metrics::GEO_FILTER_SKIPPED_TOTAL;
use crate::models::{Candidate, ContentItem, FeedFilters, Viewer};
use crate::services::ledger::{InteractionLedger, VisibilityProvider};
use crate::utils::{haversine_km, matches_query, ValidGeo};

/// Interest signal of a personalized request
#[derive(Debug, Clone, Default)]
pub struct Personalization {
    pub interests: HashSet<String>,
    pub seen: HashSet<Uuid>,
}

impl Personalization {
    pub fn admits(&self, item: &ContentItem) -> bool {
        let in_interests = item
            .category
            .as_ref()
            .is_some_and(|c| self.interests.contains(c));

        in_interests && !self.seen.contains(&item.id)
    }
}

/// Result of filtering
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub candidates: Vec<Candidate>,
    /// The geo filter ran; candidates carry distances and rank nearest first
    pub geo_active: bool,
}

pub struct FilterContext<'a> {
    pub viewer: Option<&'a Viewer>,
    pub visibility: &'a dyn VisibilityProvider,
    pub personalization: Option<&'a Personalization>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CandidateFilter {
    default_radius_km: f64,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl CandidateFilter {
    pub fn new(default_radius_km: f64) -> Self {
        Self { default_radius_km }
    }

    /// Whether `viewer` may see `item` at all.
    pub fn is_visible(
        item: &ContentItem,
        viewer: Option<&Viewer>,
        visibility: &dyn VisibilityProvider,
    ) -> bool {
        if item.is_publicly_visible() {
            return true;
        }

        match viewer {
            Some(v) => v.is_staff || visibility.owns(v.user_id, item),
            None => false,
        }
    }

    /// Validated geo parameters, or `None` when absent or unusable.
    fn resolve_geo(&self, filters: &FeedFilters) -> Option<ValidGeo> {
        let raw = filters.geo.as_ref()?;

        match raw.validate(self.default_radius_km) {
            Ok(geo) => Some(geo),
            Err(e) => {
                warn!(error = %e, "Invalid geo parameter, skipping geo filter");
                GEO_FILTER_SKIPPED_TOTAL.inc();
                None
            }
        }
    }

    pub fn apply(
        &self,
        items: Vec<ContentItem>,
        ledger: &InteractionLedger,
        filters: &FeedFilters,
        ctx: &FilterContext<'_>,
    ) -> FilterOutcome {
        let input_count = items.len();
        let geo = self.resolve_geo(filters);
        let created_after = filters.created_after(ctx.now);
        let query = filters
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());

        let candidates: Vec<Candidate> = items
            .into_iter()
            .filter(|item| Self::is_visible(item, ctx.viewer, ctx.visibility))
            .filter(|item| match &filters.category {
                Some(category) => item.category.as_deref() == Some(category.as_str()),
                None => true,
            })
            .filter(|item| created_after.map_or(true, |after| item.created_at >= after))
            .filter(|item| filters.end_date.map_or(true, |end| item.created_at <= end))
            .filter(|item| query.map_or(true, |q| matches_query(item, q)))
            .filter(|item| ctx.personalization.map_or(true, |p| p.admits(item)))
            .filter_map(|item| {
                let distance_km = match &geo {
                    Some(g) => {
                        let d = haversine_km(g.lat, g.lng, item.latitude?, item.longitude?);
                        if d > g.radius_km {
                            return None;
                        }
                        Some(d)
                    }
                    None => None,
                };

                Some(Candidate {
                    counts: ledger.counts(item.id),
                    item,
                    distance_km,
                })
            })
            .collect();

        debug!(
            input_count = input_count,
            output_count = candidates.len(),
            geo_active = geo.is_some(),
            "Candidate filter applied"
        );

        FilterOutcome {
            candidates,
            geo_active: geo.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::models::{GeoFilter, PublicationState};
    use async_trait::async_trait;
    use chrono::Duration;

    struct AuthorOwns;

    #[async_trait]
    impl VisibilityProvider for AuthorOwns {
        async fn is_staff(&self, _user_id: Uuid) -> Result<bool> {
            Ok(false)
        }
    }

    fn post(title: &str, category: &str, coords: Option<(f64, f64)>) -> ContentItem {
        ContentItem {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: title.to_string(),
            summary: String::new(),
            content: String::new(),
            location_name: None,
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
            status: PublicationState::Published,
            is_approved: true,
            category: Some(category.to_string()),
            tags: vec![],
            created_at: Utc::now(),
            like_count: 0,
            read_count: 0,
        }
    }

    fn run(items: Vec<ContentItem>, filters: &FeedFilters, viewer: Option<&Viewer>) -> FilterOutcome {
        let ctx = FilterContext {
            viewer,
            visibility: &AuthorOwns,
            personalization: None,
            now: Utc::now(),
        };
        CandidateFilter::default().apply(items, &InteractionLedger::default(), filters, &ctx)
    }

    #[test]
    fn test_hidden_items_visible_to_author_and_staff_only() {
        let mut draft = post("draft", "nature", None);
        draft.status = PublicationState::Pending;
        let author = Viewer {
            user_id: draft.author_id,
            is_staff: false,
        };
        let stranger = Viewer {
            user_id: Uuid::new_v4(),
            is_staff: false,
        };
        let staff = Viewer {
            user_id: Uuid::new_v4(),
            is_staff: true,
        };

        assert!(!CandidateFilter::is_visible(&draft, None, &AuthorOwns));
        assert!(!CandidateFilter::is_visible(&draft, Some(&stranger), &AuthorOwns));
        assert!(CandidateFilter::is_visible(&draft, Some(&author), &AuthorOwns));
        assert!(CandidateFilter::is_visible(&draft, Some(&staff), &AuthorOwns));
    }

    #[test]
    fn test_published_but_unapproved_is_hidden() {
        let mut item = post("awaiting review", "art", None);
        item.is_approved = false;
        let outcome = run(vec![item], &FeedFilters::default(), None);
        assert!(outcome.candidates.is_empty());
    }

    #[test]
    fn test_category_and_date_filters() {
        let mut old = post("old", "food", None);
        old.created_at = Utc::now() - Duration::days(20);
        let fresh = post("fresh", "food", None);
        let other = post("other", "music", None);
        let fresh_id = fresh.id;

        let filters = FeedFilters {
            category: Some("food".into()),
            start_date: Some(Utc::now() - Duration::days(7)),
            ..Default::default()
        };
        let outcome = run(vec![old, fresh, other], &filters, None);
        let ids: Vec<Uuid> = outcome.candidates.iter().map(|c| c.item.id).collect();
        assert_eq!(ids, vec![fresh_id]);
    }

    #[test]
    fn test_geo_radius_filter() {
        let near = post("Hagia Sophia", "historical", Some((41.0086, 28.9802)));
        let far = post("Anitkabir", "historical", Some((39.9250, 32.8369)));
        let nowhere = post("no coordinates", "historical", None);
        let near_id = near.id;

        let filters = FeedFilters {
            geo: Some(GeoFilter {
                lat: 41.0082,
                lng: 28.9784,
                radius_km: Some(10.0),
            }),
            ..Default::default()
        };
        let outcome = run(vec![near, far, nowhere], &filters, None);

        assert!(outcome.geo_active);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].item.id, near_id);
        assert!(outcome.candidates[0].distance_km.unwrap() < 1.0);
    }

    #[test]
    fn test_invalid_geo_is_skipped() {
        let far = post("Anitkabir", "historical", Some((39.9250, 32.8369)));
        let filters = FeedFilters {
            geo: Some(GeoFilter {
                lat: 123.0,
                lng: 28.9784,
                radius_km: None,
            }),
            ..Default::default()
        };
        let outcome = run(vec![far], &filters, None);

        assert!(!outcome.geo_active);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].distance_km, None);
    }

    #[test]
    fn test_personalization_excludes_seen_and_other_categories() {
        let seen = post("seen", "nature", None);
        let unseen = post("unseen", "nature", None);
        let off_topic = post("off topic", "nightlife", None);
        let unseen_id = unseen.id;

        let personalization = Personalization {
            interests: HashSet::from(["nature".to_string()]),
            seen: HashSet::from([seen.id]),
        };
        let ctx = FilterContext {
            viewer: None,
            visibility: &AuthorOwns,
            personalization: Some(&personalization),
            now: Utc::now(),
        };
        let outcome = CandidateFilter::default().apply(
            vec![seen, unseen, off_topic],
            &InteractionLedger::default(),
            &FeedFilters::default(),
            &ctx,
        );

        let ids: Vec<Uuid> = outcome.candidates.iter().map(|c| c.item.id).collect();
        assert_eq!(ids, vec![unseen_id]);
    }

    #[test]
    fn test_query_filter() {
        let hit = post("Street food in Kadikoy", "food", None);
        let miss = post("Museum night", "art", None);
        let filters = FeedFilters {
            query: Some("kadikoy".into()),
            ..Default::default()
        };
        let outcome = run(vec![hit, miss], &filters, None);
        assert_eq!(outcome.candidates.len(), 1);
    }
}
