//! Tag resolution - maps user-supplied tag names to stable tag ids,
//! creating missing tags on demand.

use crate::error::{AppError, Result};
use crate::repository::TagRepository;
use futures::future::try_join_all;
use uuid::Uuid;

/// Attempts before a persistent unique-constraint race is treated as a bug
const MAX_CREATE_ATTEMPTS: usize = 3;

/// Resolves tag names to ids with concurrent get-or-create per name.
///
/// Duplicate names in one call resolve to the same id and never create
/// duplicate rows: the repository's compare-and-create lets the unique
/// constraint pick a winner and re-reads the winner's row on conflict.
#[derive(Clone)]
pub struct TagResolver {
    tags: TagRepository,
}

impl TagResolver {
    pub fn new(tags: TagRepository) -> Self {
        Self { tags }
    }

    /// Resolve each name to a tag id, one id per input name in input order.
    /// Resolutions for distinct names run concurrently.
    pub async fn resolve(&self, names: &[String]) -> Result<Vec<Uuid>> {
        try_join_all(names.iter().map(|name| self.resolve_one(name))).await
    }

    async fn resolve_one(&self, name: &str) -> Result<Uuid> {
        for _ in 0..MAX_CREATE_ATTEMPTS {
            match self.tags.get_or_create(name).await {
                Ok(tag) => return Ok(tag.id),
                Err(AppError::Conflict(reason)) => {
                    tracing::debug!(%name, %reason, "tag create conflicted, retrying");
                }
                Err(err) => return Err(err),
            }
        }

        // Tags are never deleted, so a lost create race must become readable;
        // running out of retries means the invariant does not hold.
        Err(AppError::Consistency(format!(
            "tag '{}' unresolvable after {} attempts",
            name, MAX_CREATE_ATTEMPTS
        )))
    }
}
