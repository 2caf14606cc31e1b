//! Reply list engine - paginated views over answers and code-comment
//! threads, sharing one ordering policy and the viewer annotation contract
//! of the question list.

use crate::domain::models::{Post, ReplyView};
use crate::error::{AppError, Result};
use crate::repository::{PostRepository, ReplyOrder, UpvoteRepository};
use crate::services::question_list::{annotate_upvoted, validate_page};
use uuid::Uuid;

/// Reply list filters, numbered as the API exposes them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFilter {
    MostPopular = 1,
    OldestFirst = 2,
    NewestFirst = 3,
}

impl TryFrom<i32> for ReplyFilter {
    type Error = AppError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            1 => Ok(ReplyFilter::MostPopular),
            2 => Ok(ReplyFilter::OldestFirst),
            3 => Ok(ReplyFilter::NewestFirst),
            other => Err(AppError::Validation(format!("unknown filter {}", other))),
        }
    }
}

impl From<ReplyFilter> for ReplyOrder {
    fn from(filter: ReplyFilter) -> Self {
        match filter {
            ReplyFilter::MostPopular => ReplyOrder::MostPopular,
            ReplyFilter::OldestFirst => ReplyOrder::OldestFirst,
            ReplyFilter::NewestFirst => ReplyOrder::NewestFirst,
        }
    }
}

#[derive(Clone)]
pub struct ReplyListService {
    posts: PostRepository,
    upvotes: UpvoteRepository,
}

impl ReplyListService {
    pub fn new(posts: PostRepository, upvotes: UpvoteRepository) -> Self {
        Self { posts, upvotes }
    }

    /// List the answers under a question
    pub async fn list_answers(
        &self,
        question_id: Uuid,
        filter: i32,
        page: i64,
        page_size: i64,
        viewer_user_id: Option<Uuid>,
    ) -> Result<(i64, Vec<ReplyView>)> {
        let order = ReplyOrder::from(ReplyFilter::try_from(filter)?);
        validate_page(page, page_size)?;

        let total = self.posts.count_answers(question_id).await?;
        let items = self
            .posts
            .list_answers(question_id, order, page_size, (page - 1) * page_size)
            .await?;

        self.annotate(items, viewer_user_id, total).await
    }

    /// List the code comments under a code, optionally scoped to one parent
    /// comment; `parent_id = None` selects the top-level thread.
    pub async fn list_code_comments(
        &self,
        code_id: Uuid,
        parent_id: Option<Uuid>,
        filter: i32,
        page: i64,
        page_size: i64,
        viewer_user_id: Option<Uuid>,
    ) -> Result<(i64, Vec<ReplyView>)> {
        let order = ReplyOrder::from(ReplyFilter::try_from(filter)?);
        validate_page(page, page_size)?;

        let total = self.posts.count_code_comments(code_id, parent_id).await?;
        let items = self
            .posts
            .list_code_comments(code_id, parent_id, order, page_size, (page - 1) * page_size)
            .await?;

        self.annotate(items, viewer_user_id, total).await
    }

    async fn annotate(
        &self,
        items: Vec<Post>,
        viewer_user_id: Option<Uuid>,
        total: i64,
    ) -> Result<(i64, Vec<ReplyView>)> {
        let ids: Vec<Uuid> = items.iter().map(|p| p.id).collect();
        let upvoted = annotate_upvoted(&self.upvotes, viewer_user_id, &ids).await?;

        let views = items
            .into_iter()
            .zip(upvoted)
            .map(|(post, is_upvoted)| ReplyView {
                id: post.id,
                parent_id: post.parent_id,
                code_id: post.code_id,
                message: post.message,
                user_id: post.user_id,
                created_at: post.created_at,
                vote_count: post.vote_count,
                reply_count: post.reply_count,
                is_accepted: post.is_accepted,
                is_upvoted,
            })
            .collect();

        Ok((total, views))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_filters_parse() {
        assert_eq!(
            ReplyFilter::try_from(1).unwrap(),
            ReplyFilter::MostPopular
        );
        assert_eq!(
            ReplyFilter::try_from(3).unwrap(),
            ReplyFilter::NewestFirst
        );
    }

    #[test]
    fn unknown_reply_filter_is_rejected() {
        assert!(matches!(
            ReplyFilter::try_from(4),
            Err(AppError::Validation(_))
        ));
    }
}
