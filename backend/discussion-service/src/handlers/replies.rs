/// Reply handlers - answers under questions, plus the accepted-answer toggle
use crate::error::Result;
use crate::handlers::AppState;
use crate::middleware::{MaybeUserId, UserId};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Request body for answering a question
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReplyRequest {
    pub question_id: Uuid,
    #[validate(length(min = 1, max = 1000))]
    pub message: String,
}

/// Request body for editing an answer
#[derive(Debug, Deserialize, Validate)]
pub struct EditReplyRequest {
    pub reply_id: Uuid,
    #[validate(length(min = 1, max = 1000))]
    pub message: String,
}

/// Request body for deleting an answer
#[derive(Debug, Deserialize)]
pub struct DeleteReplyRequest {
    pub reply_id: Uuid,
}

/// Request body for the accepted-answer toggle
#[derive(Debug, Deserialize)]
pub struct SetAcceptedRequest {
    pub post_id: Uuid,
    pub accepted: bool,
}

/// Query params for the reply list
#[derive(Debug, Deserialize)]
pub struct ListRepliesQuery {
    pub page: i64,
    pub count: i64,
    pub filter: i32,
}

/// Answer a question
pub async fn create_reply(
    state: web::Data<AppState>,
    user: UserId,
    req: web::Json<CreateReplyRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let reply = state
        .posts
        .create_answer(user.0, req.question_id, &req.message)
        .await?;

    Ok(HttpResponse::Created().json(reply))
}

/// List the answers under a question
pub async fn list_replies(
    state: web::Data<AppState>,
    viewer: MaybeUserId,
    question_id: web::Path<Uuid>,
    query: web::Query<ListRepliesQuery>,
) -> Result<HttpResponse> {
    let (count, posts) = state
        .reply_list
        .list_answers(*question_id, query.filter, query.page, query.count, viewer.0)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": count,
        "posts": posts,
    })))
}

/// Edit an answer (author only)
pub async fn edit_reply(
    state: web::Data<AppState>,
    user: UserId,
    req: web::Json<EditReplyRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let reply = state
        .posts
        .edit_reply(user.0, req.reply_id, &req.message)
        .await?;

    Ok(HttpResponse::Ok().json(reply))
}

/// Delete an answer (author only)
pub async fn delete_reply(
    state: web::Data<AppState>,
    user: UserId,
    req: web::Json<DeleteReplyRequest>,
) -> Result<HttpResponse> {
    state.posts.delete_reply(user.0, req.reply_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Toggle the accepted flag on an answer or nested code comment
pub async fn set_accepted(
    state: web::Data<AppState>,
    _user: UserId,
    req: web::Json<SetAcceptedRequest>,
) -> Result<HttpResponse> {
    state.posts.set_accepted(req.post_id, req.accepted).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "accepted": req.accepted,
    })))
}
