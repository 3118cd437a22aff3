//! Follow edges between users.
//!
//! Every operation is idempotent: following twice leaves one edge, unfollowing
//! an author that is not followed changes nothing, and a user can never
//! follow themselves.

use crate::client::{DbClient, Result};
use sqlx::{query, query_scalar};
use tracing::debug;
use yatube_common::model::{
    Id,
    follow::{Follow, FollowOutcome, UnfollowOutcome},
    user::UserMarker,
};

impl DbClient {
    pub async fn follow(
        &self,
        user: Id<UserMarker>,
        author: Id<UserMarker>,
    ) -> Result<FollowOutcome> {
        let edge = Follow::new(user, author);
        if edge.is_self_follow() {
            debug!(%user, "Ignoring self-follow");
            return Ok(FollowOutcome::SelfFollow);
        }

        let inserted = query(
            "
            INSERT INTO follows (user_id, author_id)
            VALUES (?, ?)
            ON CONFLICT (user_id, author_id) DO NOTHING
            ",
        )
        .bind(edge.user.to_db())
        .bind(edge.author.to_db())
        .execute(&self.pool)
        .await?
        .rows_affected();

        let outcome = if inserted == 0 {
            FollowOutcome::AlreadyFollowing
        } else {
            FollowOutcome::Followed
        };
        debug!(%user, %author, ?outcome, "Follow");

        Ok(outcome)
    }

    pub async fn unfollow(
        &self,
        user: Id<UserMarker>,
        author: Id<UserMarker>,
    ) -> Result<UnfollowOutcome> {
        let deleted = query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user.to_db())
            .bind(author.to_db())
            .execute(&self.pool)
            .await?
            .rows_affected();

        let outcome = if deleted == 0 {
            UnfollowOutcome::NotFollowing
        } else {
            UnfollowOutcome::Unfollowed
        };
        debug!(%user, %author, ?outcome, "Unfollow");

        Ok(outcome)
    }

    pub async fn is_following(&self, user: Id<UserMarker>, author: Id<UserMarker>) -> Result<bool> {
        let edges: i64 = query_scalar(
            "SELECT COUNT(*) FROM follows WHERE user_id = ? AND author_id = ?",
        )
        .bind(user.to_db())
        .bind(author.to_db())
        .fetch_one(&self.pool)
        .await?;

        Ok(edges > 0)
    }

    /// How many users follow `author`.
    pub async fn follower_count(&self, author: Id<UserMarker>) -> Result<u64> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM follows WHERE author_id = ?")
            .bind(author.to_db())
            .fetch_one(&self.pool)
            .await?;

        Ok(count.cast_unsigned())
    }

    /// How many authors `user` follows.
    pub async fn following_count(&self, user: Id<UserMarker>) -> Result<u64> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = ?")
            .bind(user.to_db())
            .fetch_one(&self.pool)
            .await?;

        Ok(count.cast_unsigned())
    }
}
