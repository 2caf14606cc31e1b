//! Post store - creation, edits, accepted-answer toggle and the cascading
//! delete over the polymorphic post hierarchy.

use crate::domain::models::{Post, PostKind};
use crate::error::{AppError, Result};
use crate::repository::{
    CodeRepository, FollowingRepository, PostMatcher, PostRepository, UpvoteRepository,
};
use crate::services::TagResolver;
use futures::future::BoxFuture;
use sqlx::PgPool;
use uuid::Uuid;

const MIN_TITLE_LENGTH: usize = 1;
const MAX_TITLE_LENGTH: usize = 120;
const MIN_MESSAGE_LENGTH: usize = 1;
const MAX_MESSAGE_LENGTH: usize = 1000;
const MAX_QUESTION_TAGS: usize = 10;

#[derive(Clone)]
pub struct PostService {
    pool: PgPool,
    posts: PostRepository,
    upvotes: UpvoteRepository,
    codes: CodeRepository,
    followings: FollowingRepository,
    tag_resolver: TagResolver,
}

impl PostService {
    pub fn new(
        pool: PgPool,
        posts: PostRepository,
        upvotes: UpvoteRepository,
        codes: CodeRepository,
        followings: FollowingRepository,
        tag_resolver: TagResolver,
    ) -> Self {
        Self {
            pool,
            posts,
            upvotes,
            codes,
            followings,
            tag_resolver,
        }
    }

    // ========== Creation ==========

    /// Create a question. Tag names are resolved concurrently before the
    /// insert; the new question starts with zeroed counters.
    pub async fn create_question(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        tag_names: &[String],
    ) -> Result<Post> {
        let title = validate_title(title)?;
        let message = validate_message(message)?;
        let tag_names = normalize_tag_names(tag_names)?;

        let tag_ids = self.tag_resolver.resolve(&tag_names).await?;

        self.posts
            .insert_question(user_id, title, message, &tag_ids)
            .await
    }

    /// Create an answer under a question. The insert and the question's
    /// reply_count bump commit as one transaction.
    pub async fn create_answer(
        &self,
        user_id: Uuid,
        question_id: Uuid,
        message: &str,
    ) -> Result<Post> {
        let message = validate_message(message)?;

        if self.posts.get_question(question_id).await?.is_none() {
            return Err(AppError::NotFound("Question not found".into()));
        }

        let mut tx = self.pool.begin().await?;
        let answer = self
            .posts
            .insert_answer(&mut *tx, user_id, question_id, message)
            .await?;
        self.posts
            .increment_reply_count(&mut *tx, question_id)
            .await?;
        tx.commit().await?;

        Ok(answer)
    }

    /// Create a code comment, top-level or nested. Bumps the code's comment
    /// counter, and the parent comment's reply_count for nested replies,
    /// in the same transaction as the insert.
    pub async fn create_code_comment(
        &self,
        user_id: Uuid,
        code_id: Uuid,
        parent_id: Option<Uuid>,
        message: &str,
    ) -> Result<Post> {
        let message = validate_message(message)?;

        if self.codes.get(code_id).await?.is_none() {
            return Err(AppError::NotFound("Code not found".into()));
        }

        if let Some(parent_id) = parent_id {
            match self.posts.get(parent_id).await? {
                Some(parent) if parent.kind == PostKind::CodeComment => {}
                _ => return Err(AppError::NotFound("Parent comment not found".into())),
            }
        }

        let mut tx = self.pool.begin().await?;
        let comment = self
            .posts
            .insert_code_comment(&mut *tx, user_id, code_id, parent_id, message)
            .await?;
        self.codes.increment_comments(&mut *tx, code_id, 1).await?;
        if let Some(parent_id) = parent_id {
            self.posts.increment_reply_count(&mut *tx, parent_id).await?;
        }
        tx.commit().await?;

        Ok(comment)
    }

    // ========== Edits ==========

    /// Edit a question's title, message and tags. Author-only; the tag set
    /// is re-resolved from scratch, old tag references are simply dropped.
    pub async fn edit_question(
        &self,
        user_id: Uuid,
        question_id: Uuid,
        title: &str,
        message: &str,
        tag_names: &[String],
    ) -> Result<Post> {
        let question = self
            .posts
            .get_question(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".into()))?;

        if question.user_id != user_id {
            return Err(AppError::Unauthorized("Not the question author".into()));
        }

        let title = validate_title(title)?;
        let message = validate_message(message)?;
        let tag_names = normalize_tag_names(tag_names)?;
        let tag_ids = self.tag_resolver.resolve(&tag_names).await?;

        self.posts
            .update_question(question_id, title, message, &tag_ids)
            .await
    }

    /// Edit an answer's or code comment's message. Author-only.
    pub async fn edit_reply(&self, user_id: Uuid, post_id: Uuid, message: &str) -> Result<Post> {
        let post = self
            .posts
            .get(post_id)
            .await?
            .filter(|p| p.kind != PostKind::Question)
            .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

        if post.user_id != user_id {
            return Err(AppError::Unauthorized("Not the post author".into()));
        }

        let message = validate_message(message)?;
        self.posts.update_message(post_id, message).await
    }

    // ========== Accepted answer ==========

    /// Toggle the accepted flag on an answer or nested code comment.
    ///
    /// Accepting clears any competing accepted sibling in the same thread.
    /// The parent's own flag ("this thread has an accepted reply") is
    /// recomputed from the live children rather than copied, so sending
    /// accepted=false for an already-unaccepted post leaves a still-accepted
    /// sibling visible on the parent.
    pub async fn set_accepted(&self, post_id: Uuid, accepted: bool) -> Result<()> {
        let post = self
            .posts
            .get(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

        let parent_id = post
            .parent_id
            .ok_or_else(|| AppError::NotFound("Question not found".into()))?;

        if self.posts.get(parent_id).await?.is_none() {
            return Err(AppError::NotFound("Question not found".into()));
        }

        let mut tx = self.pool.begin().await?;
        self.posts
            .set_accepted_flag(&mut *tx, post_id, accepted)
            .await?;
        if accepted {
            self.posts
                .clear_accepted_siblings(&mut *tx, parent_id, post_id)
                .await?;
        }
        self.posts
            .recompute_parent_accepted(&mut *tx, parent_id)
            .await?;
        tx.commit().await?;

        Ok(())
    }

    // ========== Deletion ==========

    /// Delete a question and everything hanging off it. Author-only.
    pub async fn delete_question(&self, user_id: Uuid, question_id: Uuid) -> Result<()> {
        let question = self
            .posts
            .get_question(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".into()))?;

        if question.user_id != user_id {
            return Err(AppError::Unauthorized("Not the question author".into()));
        }

        self.delete_and_cleanup(PostMatcher::Id(question_id)).await
    }

    /// Delete an answer. Author-only; the owning question must still exist.
    pub async fn delete_reply(&self, user_id: Uuid, reply_id: Uuid) -> Result<()> {
        let reply = self
            .posts
            .get(reply_id)
            .await?
            .filter(|p| p.kind == PostKind::Answer)
            .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

        if reply.user_id != user_id {
            return Err(AppError::Unauthorized("Not the post author".into()));
        }

        let question_id = reply
            .parent_id
            .ok_or_else(|| AppError::NotFound("Question not found".into()))?;
        if self.posts.get_question(question_id).await?.is_none() {
            return Err(AppError::NotFound("Question not found".into()));
        }

        self.delete_and_cleanup(PostMatcher::Id(reply_id)).await
    }

    /// Delete a code comment. Author-only; the owning code must still exist.
    pub async fn delete_code_comment(&self, user_id: Uuid, comment_id: Uuid) -> Result<()> {
        let comment = self
            .posts
            .get(comment_id)
            .await?
            .filter(|p| p.kind == PostKind::CodeComment)
            .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

        if comment.user_id != user_id {
            return Err(AppError::Unauthorized("Not the post author".into()));
        }

        let code_id = comment
            .code_id
            .ok_or_else(|| AppError::Consistency("code comment without code id".into()))?;
        if self.codes.get(code_id).await?.is_none() {
            return Err(AppError::NotFound("Code not found".into()));
        }

        self.delete_and_cleanup(PostMatcher::Id(comment_id)).await
    }

    /// Recursive cascading delete.
    ///
    /// For every post the matcher selects, counters and rows on *other*
    /// entities are adjusted first and the matched posts themselves are
    /// deleted last, so an interrupted run can be re-invoked with the same
    /// matcher: rows already gone are not re-counted, rows still present
    /// finish their single adjust-then-delete pass.
    ///
    /// Branching mirrors the post hierarchy:
    /// - Question: recurse into its answers, purge followings.
    /// - Answer: decrement the owning question's reply_count; a missing
    ///   question is an invariant violation.
    /// - CodeComment: decrement the code's comment counter; then either
    ///   decrement the parent comment's reply_count, or - when there is no
    ///   live parent - recurse into this comment's own replies. A comment
    ///   subtree is therefore fully enumerated exactly once, from its root.
    pub fn delete_and_cleanup(&self, matcher: PostMatcher) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let matched = self.posts.find_for_cleanup(matcher).await?;

            for post in &matched {
                match post.kind {
                    PostKind::Question => {
                        self.delete_and_cleanup(PostMatcher::Parent(post.id)).await?;
                        self.followings.delete_all_by_question(post.id).await?;
                    }
                    PostKind::Answer => {
                        let question_id = post.parent_id.ok_or_else(|| {
                            AppError::Consistency(format!("answer {} has no parent", post.id))
                        })?;
                        let touched = self
                            .posts
                            .decrement_reply_count(&self.pool, question_id)
                            .await?;
                        if touched == 0 {
                            return Err(AppError::Consistency(format!(
                                "question {} missing while deleting answer {}",
                                question_id, post.id
                            )));
                        }
                    }
                    PostKind::CodeComment => {
                        let code_id = post.code_id.ok_or_else(|| {
                            AppError::Consistency(format!("comment {} has no code", post.id))
                        })?;
                        let touched =
                            self.codes.increment_comments(&self.pool, code_id, -1).await?;
                        if touched == 0 {
                            return Err(AppError::Consistency(format!(
                                "code {} missing while deleting comment {}",
                                code_id, post.id
                            )));
                        }

                        match post.parent_id {
                            Some(parent_id) => {
                                let touched = self
                                    .posts
                                    .decrement_reply_count(&self.pool, parent_id)
                                    .await?;
                                if touched == 0 {
                                    // Parent comment already gone: this
                                    // comment is the live root of its
                                    // subtree, so sweep its replies here.
                                    self.delete_and_cleanup(PostMatcher::Parent(post.id))
                                        .await?;
                                }
                            }
                            None => {
                                self.delete_and_cleanup(PostMatcher::Parent(post.id))
                                    .await?;
                            }
                        }
                    }
                }

                self.upvotes.delete_all_by_post(post.id).await?;
            }

            self.posts.delete_matching(matcher).await?;

            Ok(())
        })
    }
}

// ========== Validation ==========

fn validate_title(title: &str) -> Result<&str> {
    let trimmed = title.trim();
    let len = trimmed.chars().count();
    if len < MIN_TITLE_LENGTH || len > MAX_TITLE_LENGTH {
        return Err(AppError::Validation(format!(
            "title must be {}-{} characters",
            MIN_TITLE_LENGTH, MAX_TITLE_LENGTH
        )));
    }
    Ok(trimmed)
}

fn validate_message(message: &str) -> Result<&str> {
    let trimmed = message.trim();
    let len = trimmed.chars().count();
    if len < MIN_MESSAGE_LENGTH || len > MAX_MESSAGE_LENGTH {
        return Err(AppError::Validation(format!(
            "message must be {}-{} characters",
            MIN_MESSAGE_LENGTH, MAX_MESSAGE_LENGTH
        )));
    }
    Ok(trimmed)
}

/// Trim and de-duplicate tag names preserving first occurrence, then cap
/// the distinct count.
fn normalize_tag_names(names: &[String]) -> Result<Vec<String>> {
    let mut seen = std::collections::HashSet::new();
    let normalized: Vec<String> = names
        .iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect();

    if normalized.len() > MAX_QUESTION_TAGS {
        return Err(AppError::Validation(format!(
            "tags exceed limit of {}",
            MAX_QUESTION_TAGS
        )));
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_bounds_are_enforced() {
        assert!(validate_title("Why Go?").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(121)).is_err());
        assert_eq!(validate_title("  trimmed  ").unwrap(), "trimmed");
    }

    #[test]
    fn message_bounds_are_enforced() {
        assert!(validate_message("fine").is_ok());
        assert!(validate_message("").is_err());
        assert!(validate_message(&"x".repeat(1001)).is_err());
    }

    #[test]
    fn tag_names_are_deduplicated_preserving_order() {
        let names = vec![
            "go".to_string(),
            "perf".to_string(),
            " go ".to_string(),
            "".to_string(),
        ];
        assert_eq!(normalize_tag_names(&names).unwrap(), vec!["go", "perf"]);
    }

    #[test]
    fn more_than_ten_distinct_tags_is_rejected() {
        let names: Vec<String> = (0..11).map(|i| format!("tag{}", i)).collect();
        assert!(matches!(
            normalize_tag_names(&names),
            Err(AppError::Validation(_))
        ));
    }
}
