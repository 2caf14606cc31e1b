use crate::domain::models::Tag;
use crate::error::{AppError, Result};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Longest tag name the store accepts
pub const MAX_TAG_NAME_LENGTH: usize = 64;

/// Repository for Tag operations. Tags are immutable once created and never
/// deleted by this service.
#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a tag by exact (case-sensitive) name
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, created_at
            FROM tags
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    /// Find tags whose name starts with the given prefix (case-sensitive)
    pub async fn find_by_prefix(&self, prefix: &str, limit: i64) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, created_at
            FROM tags
            WHERE name LIKE $1
            ORDER BY name ASC
            LIMIT $2
            "#,
        )
        .bind(format!("{}%", escape_like(prefix)))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// Resolve a set of tag ids to their rows, keyed by id
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Tag>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, created_at
            FROM tags
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags.into_iter().map(|t| (t.id, t)).collect())
    }

    /// Look up a tag by name, creating it when absent.
    ///
    /// The create is compare-and-create, not read-then-write: the insert
    /// yields to the unique constraint (`ON CONFLICT DO NOTHING`) and the
    /// winner's row is re-read on conflict, so concurrent resolution of the
    /// same name produces exactly one row. A conflicted insert whose re-read
    /// also misses is reported as `Conflict` for the caller to retry.
    pub async fn get_or_create(&self, name: &str) -> Result<Tag> {
        let name = validate_name(name)?;

        let inserted = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (name)
            VALUES ($1)
            ON CONFLICT (name) DO NOTHING
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(tag) = inserted {
            return Ok(tag);
        }

        match self.find_by_name(name).await? {
            Some(tag) => Ok(tag),
            None => Err(AppError::Conflict(format!(
                "tag '{}' lost a create race and was not readable",
                name
            ))),
        }
    }
}

/// Validate a user-supplied tag name against the store's limits
fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("tag name must not be empty".into()));
    }
    if trimmed.len() > MAX_TAG_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "tag name exceeds {} characters",
            MAX_TAG_NAME_LENGTH
        )));
    }
    Ok(trimmed)
}

/// Escape LIKE metacharacters so user input only matches literally
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_name_trims_whitespace() {
        assert_eq!(validate_name("  rust  ").unwrap(), "rust");
    }

    #[test]
    fn validate_name_rejects_empty() {
        assert!(matches!(
            validate_name("   "),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn validate_name_rejects_overlong() {
        let name = "x".repeat(MAX_TAG_NAME_LENGTH + 1);
        assert!(matches!(
            validate_name(&name),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn escape_like_escapes_metacharacters() {
        assert_eq!(escape_like("50%_done\\"), "50\\%\\_done\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
