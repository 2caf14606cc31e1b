use crate::domain::models::Code;
use crate::error::Result;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Repository for the external Code entities whose comment threads this
/// service manages. Codes are owned elsewhere; only `comment_count` is
/// written here.
#[derive(Clone)]
pub struct CodeRepository {
    pool: PgPool,
}

impl CodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a code by ID
    pub async fn get(&self, code_id: Uuid) -> Result<Option<Code>> {
        let code = sqlx::query_as::<_, Code>(
            r#"
            SELECT id, user_id, name, language, comment_count, created_at
            FROM codes
            WHERE id = $1
            "#,
        )
        .bind(code_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(code)
    }

    /// Apply a delta to a code's comment counter as a single atomic update,
    /// floored at zero. Returns the number of rows touched (0 when the code
    /// no longer exists).
    pub async fn increment_comments(
        &self,
        exec: impl PgExecutor<'_>,
        code_id: Uuid,
        delta: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE codes
            SET comment_count = GREATEST(comment_count + $2, 0)
            WHERE id = $1
            "#,
        )
        .bind(code_id)
        .bind(delta)
        .execute(exec)
        .await?;

        Ok(result.rows_affected())
    }
}
