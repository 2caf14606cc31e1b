use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminant for the single polymorphic posts table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
pub enum PostKind {
    Question = 1,
    Answer = 2,
    CodeComment = 3,
}

/// Post entity - questions, answers and code comments share one table.
///
/// Which optional fields are meaningful depends on `kind`:
/// - Question: `title` and `tag_ids` set, `parent_id`/`code_id` absent
/// - Answer: `parent_id` = owning question
/// - CodeComment: `code_id` set, `parent_id` = parent comment or absent for
///   a top-level comment on the code
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub kind: PostKind,
    pub title: Option<String>,
    pub message: String,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub code_id: Option<Uuid>,
    pub tag_ids: Vec<Uuid>,
    pub vote_count: i64,
    pub reply_count: i64,
    pub is_accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Narrow projection used by the cascading delete; only the fields the
/// cleanup branches on.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CleanupPost {
    pub id: Uuid,
    pub kind: PostKind,
    pub parent_id: Option<Uuid>,
    pub code_id: Option<Uuid>,
}

/// Tag entity - immutable once created, shared by reference from questions
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Upvote entity - at most one row per (user, post) pair
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Upvote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// External content entity owning a comment counter. This service never
/// creates codes; it only reads them and maintains `comment_count`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Code {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub language: String,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Question subscription, purged when the question is deleted
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QuestionFollowing {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Question list item annotated for the viewer
#[derive(Debug, Clone, Serialize)]
pub struct QuestionSummary {
    pub id: Uuid,
    pub title: String,
    pub tags: Vec<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub reply_count: i64,
    pub vote_count: i64,
    pub is_accepted: bool,
    pub is_upvoted: bool,
}

/// Full question view, annotated for the viewer
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub tags: Vec<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub reply_count: i64,
    pub vote_count: i64,
    pub is_accepted: bool,
    pub is_upvoted: bool,
}

/// Reply list item (answer or code comment) annotated for the viewer
#[derive(Debug, Clone, Serialize)]
pub struct ReplyView {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub code_id: Option<Uuid>,
    pub message: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub vote_count: i64,
    pub reply_count: i64,
    pub is_accepted: bool,
    pub is_upvoted: bool,
}
