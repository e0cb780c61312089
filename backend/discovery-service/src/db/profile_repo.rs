use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::Result;
use crate::services::ledger::{InterestProvider, VisibilityProvider};

/// Staff flags and interest signals read from Postgres
#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisibilityProvider for PgProfileRepository {
    async fn is_staff(&self, user_id: Uuid) -> Result<bool> {
        let is_staff: Option<bool> = sqlx::query_scalar("SELECT is_staff FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        // unknown users get the regular visibility rules
        Ok(is_staff.unwrap_or(false))
    }
}

#[async_trait]
impl InterestProvider for PgProfileRepository {
    async fn interest_categories(&self, user_id: Uuid) -> Result<HashSet<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT p.category
            FROM interactions i
            JOIN posts p ON p.id = i.post_id
            WHERE i.user_id = $1
              AND i.kind IN ('read', 'like', 'favorite')
              AND p.category IS NOT NULL
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories.into_iter().collect())
    }

    async fn seen_items(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT post_id
            FROM interactions
            WHERE user_id = $1 AND kind IN ('read', 'like', 'favorite')
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }
}
