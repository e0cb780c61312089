use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::{FeedFilters, GeoFilter, SortKey, TimeWindow};
use crate::services::{FeedService, PageToken};

/// Query string of every feed endpoint.
///
/// `lat`, `lng` and `radius_km` stay raw strings: unusable coordinates only
/// drop the geo filter, they never fail the request.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQueryParams {
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub time_window: Option<String>,
    pub query: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius_km: Option<String>,
    #[serde(default)]
    pub personalized: bool,
    pub sort: Option<String>,
    pub page: Option<i64>,
    /// Opaque token from a previous response's `links`; wins over `page`
    pub page_token: Option<String>,
    pub page_size: Option<i64>,
}

impl FeedQueryParams {
    pub(crate) fn filters(&self) -> Result<FeedFilters> {
        let time_window = self
            .time_window
            .as_deref()
            .map(str::parse::<TimeWindow>)
            .transpose()
            .map_err(AppError::Validation)?;

        let geo = match GeoFilter::from_raw(
            self.lat.as_deref(),
            self.lng.as_deref(),
            self.radius_km.as_deref(),
        ) {
            Ok(geo) => geo,
            Err(err) => {
                warn!(error = %err, "Ignoring unparseable geo parameters");
                None
            }
        };

        Ok(FeedFilters {
            category: self.category.clone().filter(|c| !c.is_empty()),
            start_date: self
                .start_date
                .as_deref()
                .map(|raw| parse_date(raw, DateBound::Start))
                .transpose()?,
            end_date: self
                .end_date
                .as_deref()
                .map(|raw| parse_date(raw, DateBound::End))
                .transpose()?,
            time_window,
            query: self.query.clone().filter(|q| !q.trim().is_empty()),
            geo,
            personalized: self.personalized,
        })
    }

    pub(crate) fn sort_key(&self, fallback: SortKey) -> Result<SortKey> {
        match self.sort.as_deref() {
            Some(raw) => raw.parse().map_err(AppError::Validation),
            None => Ok(fallback),
        }
    }

    pub(crate) fn page(&self) -> Result<i64> {
        match &self.page_token {
            Some(token) => Ok(PageToken::decode(token)? as i64),
            None => Ok(self.page.unwrap_or(1)),
        }
    }
}

#[derive(Clone, Copy)]
enum DateBound {
    Start,
    End,
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates. A plain end date
/// covers the whole day.
fn parse_date(raw: &str, bound: DateBound) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {}", raw)))?;
    let time = match bound {
        DateBound::Start => NaiveTime::MIN,
        DateBound::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or_else(|| AppError::Internal("invalid end-of-day time".into()))?,
    };

    Ok(date.and_time(time).and_utc())
}

pub struct FeedHandlerState {
    pub feed: Arc<FeedService>,
}

async fn respond(
    state: &FeedHandlerState,
    viewer: Option<UserId>,
    query: &FeedQueryParams,
    filters: FeedFilters,
    sort_key: SortKey,
) -> Result<HttpResponse> {
    let page = query.page()?;
    let page_size = query
        .page_size
        .unwrap_or_else(|| state.feed.default_page_size());

    debug!(
        viewer = ?viewer.map(|v| v.0),
        sort = sort_key.as_str(),
        page,
        page_size,
        "Feed request"
    );

    let result = state
        .feed
        .rank_feed(viewer.map(|v| v.0), &filters, sort_key, page, page_size)
        .await?;

    Ok(HttpResponse::Ok().json(result))
}

/// GET /api/v1/feed
pub async fn get_feed(
    query: web::Query<FeedQueryParams>,
    viewer: Option<UserId>,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let filters = query.filters()?;
    let sort_key = query.sort_key(SortKey::default())?;
    respond(&state, viewer, &query, filters, sort_key).await
}

/// GET /api/v1/feed/trending: most liked, last week unless a window is given
pub async fn get_trending(
    query: web::Query<FeedQueryParams>,
    viewer: Option<UserId>,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let mut filters = query.filters()?;
    filters.time_window.get_or_insert(TimeWindow::Week);
    respond(&state, viewer, &query, filters, SortKey::Likes).await
}

/// GET /api/v1/feed/most-commented
pub async fn get_most_commented(
    query: web::Query<FeedQueryParams>,
    viewer: Option<UserId>,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let filters = query.filters()?;
    respond(&state, viewer, &query, filters, SortKey::Comments).await
}

/// GET /api/v1/feed/recent
pub async fn get_recent(
    query: web::Query<FeedQueryParams>,
    viewer: Option<UserId>,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let filters = query.filters()?;
    respond(&state, viewer, &query, filters, SortKey::Recency).await
}

/// GET /api/v1/feed/recommended: personalized by the viewer's interaction history
pub async fn get_recommended(
    query: web::Query<FeedQueryParams>,
    viewer: Option<UserId>,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let (filters, sort_key) = recommended_request(&query)?;
    respond(&state, viewer, &query, filters, sort_key).await
}

/// Recommendations are always personalized and ranked by the popularity preset
/// unless the caller picks another sort.
fn recommended_request(query: &FeedQueryParams) -> Result<(FeedFilters, SortKey)> {
    let mut filters = query.filters()?;
    filters.personalized = true;
    Ok((filters, query.sort_key(SortKey::ScorePopularity)?))
}
