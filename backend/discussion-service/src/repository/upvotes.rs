use crate::error::Result;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Repository for Upvote operations. One row per (user, post) pair, enforced
/// by a unique constraint.
#[derive(Clone)]
pub struct UpvoteRepository {
    pool: PgPool,
}

impl UpvoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an upvote unless the user already holds one on this post.
    /// Returns the number of rows written (0 when the vote already existed),
    /// so callers can couple the counter bump to an actual insert.
    pub async fn insert_if_absent(
        &self,
        exec: impl PgExecutor<'_>,
        user_id: Uuid,
        post_id: Uuid,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO upvotes (user_id, post_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, post_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .execute(exec)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete a user's upvote on a post. Returns rows removed (0 or 1).
    pub async fn delete(
        &self,
        exec: impl PgExecutor<'_>,
        user_id: Uuid,
        post_id: Uuid,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM upvotes
            WHERE user_id = $1 AND post_id = $2
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .execute(exec)
        .await?;

        Ok(result.rows_affected())
    }

    /// Check whether a user holds an upvote on a post
    pub async fn exists(&self, user_id: Uuid, post_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM upvotes
                WHERE user_id = $1 AND post_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Count live upvotes on a post
    pub async fn count_by_post(&self, post_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM upvotes
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Remove every upvote referencing a post. Idempotent; used by the
    /// cascading delete.
    pub async fn delete_all_by_post(&self, post_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM upvotes
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
