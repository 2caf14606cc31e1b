/// HTTP handlers - thin endpoints over the discussion services
pub mod comments;
pub mod questions;
pub mod replies;
pub mod tags;
pub mod votes;

use crate::repository::{
    CodeRepository, FollowingRepository, PostRepository, TagRepository, UpvoteRepository,
};
use crate::services::{
    PostService, QuestionListService, ReplyListService, TagResolver, VoteService,
};
use actix_web::web;
use sqlx::PgPool;

/// Shared handler state: the wired service graph
pub struct AppState {
    pub posts: PostService,
    pub votes: VoteService,
    pub question_list: QuestionListService,
    pub reply_list: ReplyListService,
    pub tags: TagRepository,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let post_repo = PostRepository::new(pool.clone());
        let upvote_repo = UpvoteRepository::new(pool.clone());
        let tag_repo = TagRepository::new(pool.clone());
        let code_repo = CodeRepository::new(pool.clone());
        let following_repo = FollowingRepository::new(pool.clone());
        let tag_resolver = TagResolver::new(tag_repo.clone());

        Self {
            posts: PostService::new(
                pool.clone(),
                post_repo.clone(),
                upvote_repo.clone(),
                code_repo,
                following_repo,
                tag_resolver,
            ),
            votes: VoteService::new(pool, post_repo.clone(), upvote_repo.clone()),
            question_list: QuestionListService::new(
                post_repo.clone(),
                tag_repo.clone(),
                upvote_repo.clone(),
            ),
            reply_list: ReplyListService::new(post_repo, upvote_repo),
            tags: tag_repo,
        }
    }
}

/// Route table. Literal segments are registered before the `{question_id}`
/// capture so `/discussion/tags` stays reachable.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/discussion")
            .route("", web::post().to(questions::create_question))
            .route("", web::get().to(questions::list_questions))
            .route("", web::put().to(questions::edit_question))
            .route("", web::delete().to(questions::delete_question))
            .route("/tags", web::get().to(tags::search_tags))
            .route("/reply", web::post().to(replies::create_reply))
            .route("/reply", web::put().to(replies::edit_reply))
            .route("/reply", web::delete().to(replies::delete_reply))
            .route("/accepted", web::put().to(replies::set_accepted))
            .route("/vote", web::post().to(votes::vote_post))
            .route("/{question_id}", web::get().to(questions::get_question))
            .route(
                "/{question_id}/replies",
                web::get().to(replies::list_replies),
            ),
    )
    .service(
        web::scope("/codes")
            .route("/comments", web::get().to(comments::list_code_comments))
            .route("/comment", web::post().to(comments::create_code_comment))
            .route("/comment", web::put().to(comments::edit_code_comment))
            .route("/comment", web::delete().to(comments::delete_code_comment)),
    );
}
