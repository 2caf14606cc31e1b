use crate::domain::models::{CleanupPost, Post, PostKind};
use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const POST_COLUMNS: &str = "id, kind, title, message, user_id, parent_id, code_id, tag_ids, \
                            vote_count, reply_count, is_accepted, created_at, updated_at";

/// Selects the posts a `delete_and_cleanup` pass operates on: either a
/// single post by id or every direct child of a parent. Matching is by
/// query, never by following stored references.
#[derive(Debug, Clone, Copy)]
pub enum PostMatcher {
    Id(Uuid),
    Parent(Uuid),
}

/// Sort orders for the question list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionOrder {
    CreatedDesc,
    VotesDesc,
}

/// Sort orders shared by the answer and code-comment list views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOrder {
    MostPopular,
    OldestFirst,
    NewestFirst,
}

impl ReplyOrder {
    fn sql(self) -> &'static str {
        match self {
            ReplyOrder::MostPopular => "vote_count DESC, created_at DESC",
            ReplyOrder::OldestFirst => "created_at ASC",
            ReplyOrder::NewestFirst => "created_at DESC",
        }
    }
}

/// Predicates and ordering for the question list, assembled by the
/// QuestionListService and translated to SQL here.
#[derive(Debug, Clone, Default)]
pub struct QuestionQuery {
    /// Raw search text matched case-insensitively against title prefixes;
    /// LIKE metacharacters are escaped when the predicate is built
    pub search_prefix: Option<String>,
    /// Tag ids the search text matched exactly; OR-ed with the title prefix
    pub search_tag_ids: Vec<Uuid>,
    /// Restrict to questions authored by this user
    pub author_id: Option<Uuid>,
    /// Restrict to questions answered by this user
    pub answered_by: Option<Uuid>,
    /// Restrict to questions with no live answers
    pub only_unanswered: bool,
    /// Restrict to questions created strictly after this instant
    pub created_after: Option<DateTime<Utc>>,
    pub order: Option<QuestionOrder>,
}

/// Repository for the polymorphic posts table
#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a post of any kind by ID
    pub async fn get(&self, post_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Get a question by ID
    pub async fn get_question(&self, question_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND kind = $2"
        ))
        .bind(question_id)
        .bind(PostKind::Question)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Check that a post exists
    pub async fn exists(&self, post_id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    // ========== Creation ==========

    /// Insert a new question
    pub async fn insert_question(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        tag_ids: &[Uuid],
    ) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (kind, title, message, user_id, tag_ids)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(PostKind::Question)
        .bind(title)
        .bind(message)
        .bind(user_id)
        .bind(tag_ids)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    /// Insert a new answer under a question. Runs on the caller's executor
    /// so the owning question's reply_count bump lands in the same
    /// transaction.
    pub async fn insert_answer(
        &self,
        exec: impl PgExecutor<'_>,
        user_id: Uuid,
        question_id: Uuid,
        message: &str,
    ) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (kind, message, user_id, parent_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(PostKind::Answer)
        .bind(message)
        .bind(user_id)
        .bind(question_id)
        .fetch_one(exec)
        .await?;

        Ok(post)
    }

    /// Insert a new code comment, top-level or nested under another comment
    pub async fn insert_code_comment(
        &self,
        exec: impl PgExecutor<'_>,
        user_id: Uuid,
        code_id: Uuid,
        parent_id: Option<Uuid>,
        message: &str,
    ) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (kind, message, user_id, code_id, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(PostKind::CodeComment)
        .bind(message)
        .bind(user_id)
        .bind(code_id)
        .bind(parent_id)
        .fetch_one(exec)
        .await?;

        Ok(post)
    }

    // ========== Edits ==========

    /// Replace a question's title, message and tag set
    pub async fn update_question(
        &self,
        question_id: Uuid,
        title: &str,
        message: &str,
        tag_ids: &[Uuid],
    ) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET title = $2, message = $3, tag_ids = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(question_id)
        .bind(title)
        .bind(message)
        .bind(tag_ids)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    /// Replace an answer's or code comment's message
    pub async fn update_message(&self, post_id: Uuid, message: &str) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET message = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    // ========== Denormalized counters ==========

    /// Atomically bump a post's reply_count by +1. Returns rows touched.
    pub async fn increment_reply_count(
        &self,
        exec: impl PgExecutor<'_>,
        post_id: Uuid,
    ) -> Result<u64> {
        let result =
            sqlx::query("UPDATE posts SET reply_count = reply_count + 1 WHERE id = $1")
                .bind(post_id)
                .execute(exec)
                .await?;

        Ok(result.rows_affected())
    }

    /// Atomically bump a post's reply_count by -1, floored at zero.
    /// Returns rows touched (0 when the post no longer exists).
    pub async fn decrement_reply_count(
        &self,
        exec: impl PgExecutor<'_>,
        post_id: Uuid,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE posts SET reply_count = GREATEST(reply_count - 1, 0) WHERE id = $1",
        )
        .bind(post_id)
        .execute(exec)
        .await?;

        Ok(result.rows_affected())
    }

    /// Atomically bump a post's vote_count by +1
    pub async fn increment_vote_count(
        &self,
        exec: impl PgExecutor<'_>,
        post_id: Uuid,
    ) -> Result<u64> {
        let result =
            sqlx::query("UPDATE posts SET vote_count = vote_count + 1 WHERE id = $1")
                .bind(post_id)
                .execute(exec)
                .await?;

        Ok(result.rows_affected())
    }

    /// Atomically bump a post's vote_count by -1, floored at zero
    pub async fn decrement_vote_count(
        &self,
        exec: impl PgExecutor<'_>,
        post_id: Uuid,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE posts SET vote_count = GREATEST(vote_count - 1, 0) WHERE id = $1",
        )
        .bind(post_id)
        .execute(exec)
        .await?;

        Ok(result.rows_affected())
    }

    // ========== Accepted answer ==========

    /// Set a single post's accepted flag
    pub async fn set_accepted_flag(
        &self,
        exec: impl PgExecutor<'_>,
        post_id: Uuid,
        accepted: bool,
    ) -> Result<u64> {
        let result = sqlx::query("UPDATE posts SET is_accepted = $2 WHERE id = $1")
            .bind(post_id)
            .bind(accepted)
            .execute(exec)
            .await?;

        Ok(result.rows_affected())
    }

    /// Clear the accepted flag on every sibling of `keep_id` under the same
    /// parent; upholds the single-accepted-answer invariant.
    pub async fn clear_accepted_siblings(
        &self,
        exec: impl PgExecutor<'_>,
        parent_id: Uuid,
        keep_id: Uuid,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET is_accepted = FALSE
            WHERE parent_id = $1 AND id <> $2 AND is_accepted = TRUE
            "#,
        )
        .bind(parent_id)
        .bind(keep_id)
        .execute(exec)
        .await?;

        Ok(result.rows_affected())
    }

    /// Recompute a parent's accepted state from its live children. The
    /// parent flag means "this thread has an accepted reply", so it is
    /// derived rather than copied from the toggled post.
    pub async fn recompute_parent_accepted(
        &self,
        exec: impl PgExecutor<'_>,
        parent_id: Uuid,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET is_accepted = EXISTS(
                SELECT 1 FROM posts c
                WHERE c.parent_id = $1 AND c.is_accepted = TRUE
            )
            WHERE id = $1
            "#,
        )
        .bind(parent_id)
        .execute(exec)
        .await?;

        Ok(result.rows_affected())
    }

    // ========== Cascading delete support ==========

    /// Load the posts a matcher selects, projected to the fields the
    /// cleanup branches on
    pub async fn find_for_cleanup(&self, matcher: PostMatcher) -> Result<Vec<CleanupPost>> {
        let posts = match matcher {
            PostMatcher::Id(id) => {
                sqlx::query_as::<_, CleanupPost>(
                    "SELECT id, kind, parent_id, code_id FROM posts WHERE id = $1",
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            PostMatcher::Parent(parent_id) => {
                sqlx::query_as::<_, CleanupPost>(
                    "SELECT id, kind, parent_id, code_id FROM posts WHERE parent_id = $1",
                )
                .bind(parent_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(posts)
    }

    /// Delete every post a matcher selects. Idempotent.
    pub async fn delete_matching(&self, matcher: PostMatcher) -> Result<u64> {
        let result = match matcher {
            PostMatcher::Id(id) => {
                sqlx::query("DELETE FROM posts WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
            PostMatcher::Parent(parent_id) => {
                sqlx::query("DELETE FROM posts WHERE parent_id = $1")
                    .bind(parent_id)
                    .execute(&self.pool)
                    .await?
            }
        };

        Ok(result.rows_affected())
    }

    // ========== Question list ==========

    /// Count the questions a query matches, before pagination
    pub async fn count_questions(&self, query: &QuestionQuery) -> Result<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
        push_question_predicates(&mut builder, query);

        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Fetch one page of the questions a query matches
    pub async fn list_questions(
        &self,
        query: &QuestionQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM posts"));
        push_question_predicates(&mut builder, query);

        match query.order.unwrap_or(QuestionOrder::CreatedDesc) {
            QuestionOrder::CreatedDesc => builder.push(" ORDER BY created_at DESC"),
            QuestionOrder::VotesDesc => builder.push(" ORDER BY vote_count DESC"),
        };
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let posts = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    // ========== Reply lists ==========

    /// Count live answers under a question
    pub async fn count_answers(&self, question_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE parent_id = $1 AND kind = $2",
        )
        .bind(question_id)
        .bind(PostKind::Answer)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Fetch one page of answers under a question
    pub async fn list_answers(
        &self,
        question_id: Uuid,
        order: ReplyOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE parent_id = $1 AND kind = $2
            ORDER BY {}
            LIMIT $3 OFFSET $4
            "#,
            order.sql()
        );

        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(question_id)
            .bind(PostKind::Answer)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    /// Count code comments under a code, optionally scoped to one parent
    /// comment (`None` selects the top-level thread)
    pub async fn count_code_comments(
        &self,
        code_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM posts
            WHERE code_id = $1 AND kind = $2 AND parent_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(code_id)
        .bind(PostKind::CodeComment)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Fetch one page of code comments under a code / parent comment
    pub async fn list_code_comments(
        &self,
        code_id: Uuid,
        parent_id: Option<Uuid>,
        order: ReplyOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE code_id = $1 AND kind = $2 AND parent_id IS NOT DISTINCT FROM $3
            ORDER BY {}
            LIMIT $4 OFFSET $5
            "#,
            order.sql()
        );

        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(code_id)
            .bind(PostKind::CodeComment)
            .bind(parent_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }
}

/// Translate a QuestionQuery into WHERE predicates
fn push_question_predicates<'q>(
    builder: &mut QueryBuilder<'q, Postgres>,
    query: &'q QuestionQuery,
) {
    builder.push(" WHERE kind = ");
    builder.push_bind(PostKind::Question);

    if let Some(prefix) = &query.search_prefix {
        builder.push(" AND (title ILIKE ");
        builder.push_bind(format!("{}%", crate::repository::tags::escape_like(prefix)));
        builder.push(" OR tag_ids && ");
        builder.push_bind(&query.search_tag_ids[..]);
        builder.push(")");
    }

    if query.only_unanswered {
        builder.push(" AND reply_count = 0");
    }

    if let Some(author_id) = query.author_id {
        builder.push(" AND user_id = ");
        builder.push_bind(author_id);
    }

    if let Some(answered_by) = query.answered_by {
        builder.push(" AND id IN (SELECT DISTINCT a.parent_id FROM posts a WHERE a.kind = ");
        builder.push_bind(PostKind::Answer);
        builder.push(" AND a.parent_id IS NOT NULL AND a.user_id = ");
        builder.push_bind(answered_by);
        builder.push(")");
    }

    if let Some(created_after) = query.created_after {
        builder.push(" AND created_at > ");
        builder.push_bind(created_after);
    }
}
