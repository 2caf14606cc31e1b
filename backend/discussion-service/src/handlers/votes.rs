/// Vote handler - idempotent vote/unvote on any post
use crate::error::Result;
use crate::handlers::AppState;
use crate::middleware::UserId;
use crate::services::votes::VoteState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

/// Request body for setting a vote; `vote` is 1 to upvote, 0 to clear
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub post_id: Uuid,
    pub vote: i32,
}

/// Set the caller's vote membership on a post
pub async fn vote_post(
    state: web::Data<AppState>,
    user: UserId,
    req: web::Json<VoteRequest>,
) -> Result<HttpResponse> {
    let desired = VoteState::try_from(req.vote)?;
    let resulting = state.votes.set_vote(user.0, req.post_id, desired).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "vote": resulting as i32,
    })))
}
