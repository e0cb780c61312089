use serde::Serialize;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::metrics::INTERACTION_WRITE_TOTAL;
use crate::models::InteractionKind;

/// Result of a like/favorite toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    /// Whether the interaction exists after the toggle
    pub active: bool,
    pub like_count: i64,
}

/// Writes interaction facts and keeps the denormalized post counters in step.
#[derive(Clone)]
pub struct InteractionRepository {
    pool: PgPool,
}

impl InteractionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add the fact if absent, remove it if present.
    ///
    /// The post row is locked for the duration of the transaction so
    /// concurrent toggles on the same post serialize and `like_count`
    /// never drifts from the fact table.
    pub async fn toggle(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        kind: InteractionKind,
    ) -> Result<ToggleOutcome> {
        if !kind.is_toggle() {
            return Err(AppError::Validation(format!(
                "{} interactions cannot be toggled",
                kind
            )));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT like_count FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        // one statement: delete if present, otherwise insert, then adjust the counter
        let row = sqlx::query(
            r#"
            WITH removed AS (
                DELETE FROM interactions
                WHERE user_id = $1 AND post_id = $2 AND kind = $3
                RETURNING 1
            ),
            inserted AS (
                INSERT INTO interactions (user_id, post_id, kind)
                SELECT $1, $2, $3
                WHERE NOT EXISTS (SELECT 1 FROM removed)
                ON CONFLICT DO NOTHING
                RETURNING 1
            )
            UPDATE posts
            SET like_count = GREATEST(
                like_count + CASE
                    WHEN $3 = 'like'
                    THEN (SELECT COUNT(*) FROM inserted) - (SELECT COUNT(*) FROM removed)
                    ELSE 0
                END,
                0
            )
            WHERE id = $2
            RETURNING like_count, EXISTS (SELECT 1 FROM inserted) AS active
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .bind(kind.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let active: bool = row.get("active");
        let like_count: i64 = row.get("like_count");

        tx.commit().await?;

        let result = if active { "added" } else { "removed" };
        INTERACTION_WRITE_TOTAL
            .with_label_values(&[kind.as_str(), result])
            .inc();
        debug!(%user_id, %post_id, kind = kind.as_str(), result, "Interaction toggled");

        Ok(ToggleOutcome { active, like_count })
    }

    /// Append a read fact and bump `read_count`. Returns the new read count.
    pub async fn record_read(&self, user_id: Uuid, post_id: Uuid) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE posts
            SET read_count = read_count + 1
            WHERE id = $1
            RETURNING read_count
            "#,
        )
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        self.append(&mut tx, user_id, post_id, InteractionKind::Read)
            .await?;
        tx.commit().await?;

        INTERACTION_WRITE_TOTAL
            .with_label_values(&[InteractionKind::Read.as_str(), "recorded"])
            .inc();

        Ok(row.get("read_count"))
    }

    /// Append a comment fact. Comment bodies live with the comment store;
    /// only the fact feeds the scores.
    pub async fn record_comment(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT 1 FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        self.append(&mut tx, user_id, post_id, InteractionKind::Comment)
            .await?;
        tx.commit().await?;

        INTERACTION_WRITE_TOTAL
            .with_label_values(&[InteractionKind::Comment.as_str(), "recorded"])
            .inc();

        Ok(())
    }

    async fn append(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: Uuid,
        post_id: Uuid,
        kind: InteractionKind,
    ) -> Result<()> {
        sqlx::query("INSERT INTO interactions (user_id, post_id, kind) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(post_id)
            .bind(kind.as_str())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
