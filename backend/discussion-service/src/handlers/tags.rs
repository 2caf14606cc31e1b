/// Tag handler - autocomplete lookup for the ask/edit forms
use crate::error::Result;
use crate::handlers::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

/// Prefixes shorter than this return no suggestions
const MIN_PREFIX_LENGTH: usize = 3;
const MAX_SUGGESTIONS: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct TagSearchQuery {
    pub query: String,
}

/// Suggest tag names matching a prefix
pub async fn search_tags(
    state: web::Data<AppState>,
    query: web::Query<TagSearchQuery>,
) -> Result<HttpResponse> {
    let prefix = query.query.trim();

    let tags = if prefix.chars().count() < MIN_PREFIX_LENGTH {
        Vec::new()
    } else {
        state
            .tags
            .find_by_prefix(prefix, MAX_SUGGESTIONS)
            .await?
            .into_iter()
            .map(|tag| tag.name)
            .collect()
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({ "tags": tags })))
}
