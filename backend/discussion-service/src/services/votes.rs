//! Vote ledger - at most one upvote per (user, post), with the denormalized
//! vote_count kept in lockstep.

use crate::error::{AppError, Result};
use crate::repository::{PostRepository, UpvoteRepository};
use sqlx::PgPool;
use uuid::Uuid;

/// Desired vote membership, parsed from the caller's {0,1}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteState {
    Absent = 0,
    Cast = 1,
}

impl TryFrom<i32> for VoteState {
    type Error = AppError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(VoteState::Absent),
            1 => Ok(VoteState::Cast),
            other => Err(AppError::Validation(format!("invalid vote value {}", other))),
        }
    }
}

#[derive(Clone)]
pub struct VoteService {
    pool: PgPool,
    posts: PostRepository,
    upvotes: UpvoteRepository,
}

impl VoteService {
    pub fn new(pool: PgPool, posts: PostRepository, upvotes: UpvoteRepository) -> Self {
        Self {
            pool,
            posts,
            upvotes,
        }
    }

    /// Set a user's vote membership on a post and return the resulting
    /// state. Idempotent in both directions: repeating a call changes
    /// nothing and bumps no counter.
    ///
    /// The ledger mutation and the vote_count bump commit as one
    /// transaction, and the bump is gated on the ledger actually changing,
    /// so concurrent voters cannot double-count.
    pub async fn set_vote(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        desired: VoteState,
    ) -> Result<VoteState> {
        if !self.posts.exists(post_id).await? {
            return Err(AppError::NotFound("Post not found".into()));
        }

        let mut tx = self.pool.begin().await?;

        match desired {
            VoteState::Cast => {
                let inserted = self
                    .upvotes
                    .insert_if_absent(&mut *tx, user_id, post_id)
                    .await?;
                if inserted > 0 {
                    self.posts.increment_vote_count(&mut *tx, post_id).await?;
                }
            }
            VoteState::Absent => {
                let deleted = self.upvotes.delete(&mut *tx, user_id, post_id).await?;
                if deleted > 0 {
                    self.posts.decrement_vote_count(&mut *tx, post_id).await?;
                }
            }
        }

        tx.commit().await?;

        Ok(desired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_state_parses_zero_and_one() {
        assert_eq!(VoteState::try_from(0).unwrap(), VoteState::Absent);
        assert_eq!(VoteState::try_from(1).unwrap(), VoteState::Cast);
    }

    #[test]
    fn vote_state_rejects_other_values() {
        assert!(matches!(
            VoteState::try_from(2),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            VoteState::try_from(-1),
            Err(AppError::Validation(_))
        ));
    }
}
