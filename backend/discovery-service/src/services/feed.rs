use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::error::Result;
use crate::metrics::{FEED_CANDIDATE_COUNT, FEED_REQUEST_DURATION_SECONDS, FEED_REQUEST_TOTAL};
use crate::models::{FeedFilters, FeedPage, PageLinks, RankedResult, SortKey, Viewer};
use crate::services::candidate_filter::{CandidateFilter, FilterContext, Personalization};
use crate::services::ledger::{
    ContentStore, HiddenScope, InteractionLedger, InterestProvider, ItemPredicate,
    VisibilityProvider,
};
use crate::services::paginator::{paginate, PageRequest};
use crate::services::ranker::Ranker;

/// Feed service - ranked, filtered, paginated feeds
///
/// Pipeline per request: validate paging → resolve viewer → (personalized)
/// load interests → one bulk item fetch → one bulk count fetch → filter →
/// rank → paginate. Stateless; holds only collaborators and configuration.
pub struct FeedService {
    store: Arc<dyn ContentStore>,
    visibility: Arc<dyn VisibilityProvider>,
    interests: Arc<dyn InterestProvider>,
    filter: CandidateFilter,
    ranker: Ranker,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        visibility: Arc<dyn VisibilityProvider>,
        interests: Arc<dyn InterestProvider>,
        config: FeedConfig,
    ) -> Self {
        Self {
            store,
            visibility,
            interests,
            filter: CandidateFilter::new(config.default_radius_km),
            ranker: Ranker::from_config(&config),
            config,
        }
    }

    pub fn default_page_size(&self) -> i64 {
        self.config.default_page_size
    }

    pub async fn rank_feed(
        &self,
        viewer_id: Option<Uuid>,
        filters: &FeedFilters,
        sort_key: SortKey,
        page: i64,
        page_size: i64,
    ) -> Result<FeedPage> {
        self.rank_feed_at(viewer_id, filters, sort_key, page, page_size, Utc::now())
            .await
    }

    /// [`FeedService::rank_feed`] with an explicit clock for relative time windows.
    #[instrument(skip(self, filters), fields(sort = sort_key.as_str(), personalized = filters.personalized))]
    pub async fn rank_feed_at(
        &self,
        viewer_id: Option<Uuid>,
        filters: &FeedFilters,
        sort_key: SortKey,
        page: i64,
        page_size: i64,
        now: DateTime<Utc>,
    ) -> Result<FeedPage> {
        let start = Instant::now();
        let request = match PageRequest::new(page, page_size, self.config.max_page_size) {
            Ok(request) => request,
            Err(e) => {
                FEED_REQUEST_TOTAL
                    .with_label_values(&[sort_key.as_str(), "invalid"])
                    .inc();
                return Err(e);
            }
        };

        let result = self.build_page(viewer_id, filters, sort_key, request, now).await;

        let outcome = match &result {
            Ok(page) if page.no_recommendations => "no_recommendations",
            Ok(_) => "ok",
            Err(_) => "error",
        };
        FEED_REQUEST_TOTAL
            .with_label_values(&[sort_key.as_str(), outcome])
            .inc();
        FEED_REQUEST_DURATION_SECONDS
            .with_label_values(&[sort_key.as_str()])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn build_page(
        &self,
        viewer_id: Option<Uuid>,
        filters: &FeedFilters,
        sort_key: SortKey,
        request: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<FeedPage> {
        let viewer = match viewer_id {
            Some(user_id) => Some(Viewer {
                user_id,
                is_staff: self.visibility.is_staff(user_id).await?,
            }),
            None => None,
        };

        let personalization = if filters.personalized {
            let Some(v) = viewer else {
                debug!("Personalized feed requested anonymously");
                return Ok(empty_recommendations(request));
            };

            let interests = self.interests.interest_categories(v.user_id).await?;
            if interests.is_empty() {
                info!(user_id = %v.user_id, "No interaction history, no recommendations");
                return Ok(empty_recommendations(request));
            }

            let seen = self.interests.seen_items(v.user_id).await?;
            Some(Personalization { interests, seen })
        } else {
            None
        };

        let predicate = ItemPredicate {
            category: filters.category.clone(),
            created_after: filters.created_after(now),
            created_before: filters.end_date,
            hidden: match viewer {
                Some(v) if v.is_staff => HiddenScope::All,
                Some(v) => HiddenScope::AuthoredBy(v.user_id),
                None => HiddenScope::None,
            },
        };

        let items = self.store.fetch_items(&predicate).await?;
        let item_ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let ledger = InteractionLedger::load(self.store.as_ref(), &item_ids).await?;

        let ctx = FilterContext {
            viewer: viewer.as_ref(),
            visibility: self.visibility.as_ref(),
            personalization: personalization.as_ref(),
            now,
        };
        let outcome = self.filter.apply(items, &ledger, filters, &ctx);

        FEED_CANDIDATE_COUNT
            .with_label_values(&[sort_key.as_str()])
            .observe(outcome.candidates.len() as f64);

        let ranked: Vec<RankedResult> = self
            .ranker
            .rank(outcome.candidates, sort_key, outcome.geo_active)
            .into_iter()
            .enumerate()
            .map(|(idx, scored)| RankedResult {
                item_id: scored.candidate.item.id,
                score: scored.score,
                rank: idx + 1,
            })
            .collect();

        let page = paginate(ranked, request);

        debug!(
            count = page.count,
            page = page.current_page,
            total_pages = page.total_pages,
            "Feed ranked"
        );

        Ok(FeedPage {
            no_recommendations: filters.personalized && page.count == 0,
            results: page.items,
            count: page.count,
            total_pages: page.total_pages,
            current_page: page.current_page,
            links: page.links,
        })
    }
}

fn empty_recommendations(request: PageRequest) -> FeedPage {
    FeedPage {
        results: Vec::new(),
        count: 0,
        total_pages: 0,
        current_page: request.page,
        links: PageLinks::default(),
        no_recommendations: true,
    }
}
