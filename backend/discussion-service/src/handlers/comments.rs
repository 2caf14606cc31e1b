/// Code-comment handlers - threaded comments attached to external code
/// entities
use crate::error::Result;
use crate::handlers::AppState;
use crate::middleware::{MaybeUserId, UserId};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Request body for commenting on a code
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCodeCommentRequest {
    pub code_id: Uuid,
    pub parent_id: Option<Uuid>,
    #[validate(length(min = 1, max = 1000))]
    pub message: String,
}

/// Request body for editing a code comment
#[derive(Debug, Deserialize, Validate)]
pub struct EditCodeCommentRequest {
    pub comment_id: Uuid,
    #[validate(length(min = 1, max = 1000))]
    pub message: String,
}

/// Request body for deleting a code comment
#[derive(Debug, Deserialize)]
pub struct DeleteCodeCommentRequest {
    pub comment_id: Uuid,
}

/// Query params for the code-comment list; `parent_id` scopes the view to
/// one comment's replies, absent selects the top-level thread
#[derive(Debug, Deserialize)]
pub struct ListCodeCommentsQuery {
    pub code_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub page: i64,
    pub count: i64,
    pub filter: i32,
}

/// Comment on a code, top-level or as a reply to another comment
pub async fn create_code_comment(
    state: web::Data<AppState>,
    user: UserId,
    req: web::Json<CreateCodeCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let comment = state
        .posts
        .create_code_comment(user.0, req.code_id, req.parent_id, &req.message)
        .await?;

    Ok(HttpResponse::Created().json(comment))
}

/// List the comments under a code / parent comment
pub async fn list_code_comments(
    state: web::Data<AppState>,
    viewer: MaybeUserId,
    query: web::Query<ListCodeCommentsQuery>,
) -> Result<HttpResponse> {
    let (count, posts) = state
        .reply_list
        .list_code_comments(
            query.code_id,
            query.parent_id,
            query.filter,
            query.page,
            query.count,
            viewer.0,
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": count,
        "posts": posts,
    })))
}

/// Edit a code comment (author only)
pub async fn edit_code_comment(
    state: web::Data<AppState>,
    user: UserId,
    req: web::Json<EditCodeCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let comment = state
        .posts
        .edit_reply(user.0, req.comment_id, &req.message)
        .await?;

    Ok(HttpResponse::Ok().json(comment))
}

/// Delete a code comment and, for thread roots, its nested replies
/// (author only)
pub async fn delete_code_comment(
    state: web::Data<AppState>,
    user: UserId,
    req: web::Json<DeleteCodeCommentRequest>,
) -> Result<HttpResponse> {
    state
        .posts
        .delete_code_comment(user.0, req.comment_id)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
