use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for question subscriptions. The discussion core only ever
/// purges them when a question is deleted; creating and listing followings
/// belongs to the notification surface, which is out of scope.
#[derive(Clone)]
pub struct FollowingRepository {
    pool: PgPool,
}

impl FollowingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Remove every subscription referencing a question. Idempotent.
    pub async fn delete_all_by_question(&self, question_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM question_followings
            WHERE question_id = $1
            "#,
        )
        .bind(question_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
