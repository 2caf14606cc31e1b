//! Question list engine - filtered, paginated, sorted views over questions
//! with per-viewer vote annotation.

use crate::domain::models::{Post, QuestionDetail, QuestionSummary};
use crate::error::{AppError, Result};
use crate::repository::{
    PostRepository, QuestionOrder, QuestionQuery, TagRepository, UpvoteRepository,
};
use chrono::{Duration, Utc};
use futures::future::try_join_all;
use uuid::Uuid;

/// Question list filters, numbered as the API exposes them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionFilter {
    MostRecent = 1,
    Unanswered = 2,
    MyQuestions = 3,
    MyReplies = 4,
    HotToday = 5,
}

impl TryFrom<i32> for QuestionFilter {
    type Error = AppError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            1 => Ok(QuestionFilter::MostRecent),
            2 => Ok(QuestionFilter::Unanswered),
            3 => Ok(QuestionFilter::MyQuestions),
            4 => Ok(QuestionFilter::MyReplies),
            5 => Ok(QuestionFilter::HotToday),
            other => Err(AppError::Validation(format!("unknown filter {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuestionListParams {
    pub filter: i32,
    pub page: i64,
    pub page_size: i64,
    pub search_query: Option<String>,
    pub profile_user_id: Option<Uuid>,
    pub viewer_user_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct QuestionListService {
    posts: PostRepository,
    tags: TagRepository,
    upvotes: UpvoteRepository,
}

impl QuestionListService {
    pub fn new(posts: PostRepository, tags: TagRepository, upvotes: UpvoteRepository) -> Self {
        Self {
            posts,
            tags,
            upvotes,
        }
    }

    /// List questions: total count over the filtered set, plus one page of
    /// annotated items.
    pub async fn list(
        &self,
        params: &QuestionListParams,
    ) -> Result<(i64, Vec<QuestionSummary>)> {
        let filter = QuestionFilter::try_from(params.filter)?;
        validate_page(params.page, params.page_size)?;

        let mut query = QuestionQuery::default();

        let search = params
            .search_query
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(text) = search {
            // Title prefix OR exact tag match; the tag lookup happens once,
            // up front, so the page and count queries agree.
            query.search_tag_ids = self
                .tags
                .find_by_name(text)
                .await?
                .map(|tag| vec![tag.id])
                .unwrap_or_default();
            query.search_prefix = Some(text.to_string());
        }

        query.order = Some(QuestionOrder::CreatedDesc);
        match filter {
            QuestionFilter::MostRecent => {}
            QuestionFilter::Unanswered => query.only_unanswered = true,
            QuestionFilter::MyQuestions => {
                query.author_id = Some(require_profile(params.profile_user_id)?);
            }
            QuestionFilter::MyReplies => {
                query.answered_by = Some(require_profile(params.profile_user_id)?);
            }
            QuestionFilter::HotToday => {
                query.created_after = Some(Utc::now() - Duration::hours(24));
                query.order = Some(QuestionOrder::VotesDesc);
            }
        }

        let total = self.posts.count_questions(&query).await?;
        let page = self
            .posts
            .list_questions(
                &query,
                params.page_size,
                (params.page - 1) * params.page_size,
            )
            .await?;

        let tag_names = self.hydrate_tag_names(&page).await?;
        let ids: Vec<Uuid> = page.iter().map(|p| p.id).collect();
        let upvoted = annotate_upvoted(&self.upvotes, params.viewer_user_id, &ids).await?;

        let items = page
            .into_iter()
            .zip(tag_names)
            .zip(upvoted)
            .map(|((post, tags), is_upvoted)| QuestionSummary {
                id: post.id,
                title: post.title.unwrap_or_default(),
                tags,
                user_id: post.user_id,
                created_at: post.created_at,
                reply_count: post.reply_count,
                vote_count: post.vote_count,
                is_accepted: post.is_accepted,
                is_upvoted,
            })
            .collect();

        Ok((total, items))
    }

    /// Fetch a single question with full message, tags and viewer annotation
    pub async fn get_question(
        &self,
        question_id: Uuid,
        viewer_user_id: Option<Uuid>,
    ) -> Result<QuestionDetail> {
        let question = self
            .posts
            .get_question(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".into()))?;

        let tags = self
            .hydrate_tag_names(std::slice::from_ref(&question))
            .await?
            .pop()
            .unwrap_or_default();

        let is_upvoted = match viewer_user_id {
            Some(user_id) => self.upvotes.exists(user_id, question.id).await?,
            None => false,
        };

        Ok(QuestionDetail {
            id: question.id,
            title: question.title.unwrap_or_default(),
            message: question.message,
            tags,
            user_id: question.user_id,
            created_at: question.created_at,
            reply_count: question.reply_count,
            vote_count: question.vote_count,
            is_accepted: question.is_accepted,
            is_upvoted,
        })
    }

    /// Resolve each post's tag id list to names, one Vec per post in order
    async fn hydrate_tag_names(&self, posts: &[Post]) -> Result<Vec<Vec<String>>> {
        let mut all_ids: Vec<Uuid> = posts.iter().flat_map(|p| p.tag_ids.clone()).collect();
        all_ids.sort_unstable();
        all_ids.dedup();

        let by_id = self.tags.find_by_ids(&all_ids).await?;

        Ok(posts
            .iter()
            .map(|post| {
                post.tag_ids
                    .iter()
                    .filter_map(|id| by_id.get(id).map(|t| t.name.clone()))
                    .collect()
            })
            .collect())
    }
}

/// Viewer vote annotation for a page of posts; one lookup per item,
/// dispatched concurrently and joined.
pub(crate) async fn annotate_upvoted(
    upvotes: &UpvoteRepository,
    viewer_user_id: Option<Uuid>,
    post_ids: &[Uuid],
) -> Result<Vec<bool>> {
    match viewer_user_id {
        Some(user_id) => {
            try_join_all(post_ids.iter().map(|id| upvotes.exists(user_id, *id))).await
        }
        None => Ok(vec![false; post_ids.len()]),
    }
}

/// Page window validation shared by both list engines
pub(crate) fn validate_page(page: i64, page_size: i64) -> Result<()> {
    if page < 1 || page_size < 1 {
        return Err(AppError::Validation("invalid pagination params".into()));
    }
    Ok(())
}

fn require_profile(profile_user_id: Option<Uuid>) -> Result<Uuid> {
    profile_user_id
        .ok_or_else(|| AppError::Validation("profile user id is required for this filter".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_five_filters_parse() {
        assert_eq!(
            QuestionFilter::try_from(1).unwrap(),
            QuestionFilter::MostRecent
        );
        assert_eq!(
            QuestionFilter::try_from(5).unwrap(),
            QuestionFilter::HotToday
        );
    }

    #[test]
    fn unknown_filter_is_rejected() {
        assert!(matches!(
            QuestionFilter::try_from(0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            QuestionFilter::try_from(6),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn page_window_rejects_zero_and_negative() {
        assert!(validate_page(1, 20).is_ok());
        assert!(validate_page(0, 20).is_err());
        assert!(validate_page(1, 0).is_err());
        assert!(validate_page(-1, 20).is_err());
    }
}
