/// Question handlers - HTTP endpoints for asking, listing, editing and
/// deleting questions
use crate::error::Result;
use crate::handlers::AppState;
use crate::middleware::{MaybeUserId, UserId};
use crate::services::QuestionListParams;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Request body for creating a question
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[validate(length(min = 1, max = 1000))]
    pub message: String,
    #[validate(length(max = 10))]
    pub tags: Vec<String>,
}

/// Request body for editing a question
#[derive(Debug, Deserialize, Validate)]
pub struct EditQuestionRequest {
    pub question_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[validate(length(min = 1, max = 1000))]
    pub message: String,
    #[validate(length(max = 10))]
    pub tags: Vec<String>,
}

/// Request body for deleting a question
#[derive(Debug, Deserialize)]
pub struct DeleteQuestionRequest {
    pub question_id: Uuid,
}

/// Query params for the question list
#[derive(Debug, Deserialize)]
pub struct ListQuestionsQuery {
    pub page: i64,
    pub count: i64,
    pub filter: i32,
    pub query: Option<String>,
    pub profile_id: Option<Uuid>,
}

/// Create a new question
pub async fn create_question(
    state: web::Data<AppState>,
    user: UserId,
    req: web::Json<CreateQuestionRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let question = state
        .posts
        .create_question(user.0, &req.title, &req.message, &req.tags)
        .await?;

    Ok(HttpResponse::Created().json(question))
}

/// List questions with filter, search and pagination
pub async fn list_questions(
    state: web::Data<AppState>,
    viewer: MaybeUserId,
    query: web::Query<ListQuestionsQuery>,
) -> Result<HttpResponse> {
    let (count, questions) = state
        .question_list
        .list(&QuestionListParams {
            filter: query.filter,
            page: query.page,
            page_size: query.count,
            search_query: query.query.clone(),
            profile_user_id: query.profile_id,
            viewer_user_id: viewer.0,
        })
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": count,
        "questions": questions,
    })))
}

/// Fetch a single question with viewer annotation
pub async fn get_question(
    state: web::Data<AppState>,
    viewer: MaybeUserId,
    question_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let question = state
        .question_list
        .get_question(*question_id, viewer.0)
        .await?;

    Ok(HttpResponse::Ok().json(question))
}

/// Edit a question (author only)
pub async fn edit_question(
    state: web::Data<AppState>,
    user: UserId,
    req: web::Json<EditQuestionRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let question = state
        .posts
        .edit_question(user.0, req.question_id, &req.title, &req.message, &req.tags)
        .await?;

    Ok(HttpResponse::Ok().json(question))
}

/// Delete a question and its whole thread (author only)
pub async fn delete_question(
    state: web::Data<AppState>,
    user: UserId,
    req: web::Json<DeleteQuestionRequest>,
) -> Result<HttpResponse> {
    state.posts.delete_question(user.0, req.question_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
