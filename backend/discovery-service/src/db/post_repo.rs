use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{ContentItem, InteractionCounts, PublicationState};
use crate::services::ledger::{ContentStore, HiddenScope, ItemPredicate};

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    title: String,
    summary: String,
    content: String,
    location_name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    status: String,
    is_approved: bool,
    category: Option<String>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    like_count: i64,
    read_count: i64,
}

impl TryFrom<PostRow> for ContentItem {
    type Error = AppError;

    fn try_from(row: PostRow) -> Result<Self> {
        let status: PublicationState = row.status.parse().map_err(AppError::Internal)?;

        Ok(ContentItem {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            summary: row.summary,
            content: row.content,
            location_name: row.location_name,
            latitude: row.latitude,
            longitude: row.longitude,
            status,
            is_approved: row.is_approved,
            category: row.category,
            tags: row.tags,
            created_at: row.created_at,
            like_count: row.like_count,
            read_count: row.read_count,
        })
    }
}

/// Postgres-backed content store
///
/// Category, creation bounds and visibility are pushed into SQL; query and
/// geo matching stay in process.
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn fetch_items(&self, predicate: &ItemPredicate) -> Result<Vec<ContentItem>> {
        let (include_all_hidden, hidden_author) = match predicate.hidden {
            HiddenScope::None => (false, None),
            HiddenScope::AuthoredBy(author) => (false, Some(author)),
            HiddenScope::All => (true, None),
        };

        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, author_id, title, summary, content, location_name, latitude, longitude,
                   status, is_approved, category, tags, created_at, like_count, read_count
            FROM posts
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
              AND (
                    (status = 'published' AND is_approved)
                    OR $4
                    OR ($5::uuid IS NOT NULL AND author_id = $5)
              )
            "#,
        )
        .bind(predicate.category.as_deref())
        .bind(predicate.created_after)
        .bind(predicate.created_before)
        .bind(include_all_hidden)
        .bind(hidden_author)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ContentItem::try_from).collect()
    }

    async fn fetch_interaction_counts(
        &self,
        item_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, InteractionCounts>> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT post_id,
                   COUNT(*) FILTER (WHERE kind = 'like')     AS likes,
                   COUNT(*) FILTER (WHERE kind = 'read')     AS reads,
                   COUNT(*) FILTER (WHERE kind = 'comment')  AS comments,
                   COUNT(*) FILTER (WHERE kind = 'favorite') AS favorites
            FROM interactions
            WHERE post_id = ANY($1)
            GROUP BY post_id
            "#,
        )
        .bind(item_ids)
        .fetch_all(&self.pool)
        .await?;

        let counts = rows
            .into_iter()
            .map(|row| {
                let post_id: Uuid = row.get("post_id");
                let counts = InteractionCounts::new(
                    row.get("likes"),
                    row.get("reads"),
                    row.get("comments"),
                    row.get("favorites"),
                );
                (post_id, counts)
            })
            .collect();

        Ok(counts)
    }
}
