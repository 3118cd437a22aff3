use crate::{
    client::{DbClient, Result},
    record::{CommentRecord, timestamp_to_db},
};
use sqlx::{query_as, query_scalar};
use time::OffsetDateTime;
use tracing::info;
use yatube_common::model::{
    Id,
    comment::{Comment, CommentForm, CommentMarker},
    post::PostMarker,
    user::UserMarker,
};

impl DbClient {
    pub async fn create_comment(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        form: &CommentForm,
    ) -> Result<Id<CommentMarker>> {
        let comment_id: i64 = query_scalar(
            "
            INSERT INTO comments (post_id, user_id, text, created)
            VALUES (?, ?, ?, ?)
            RETURNING comment_id
            ",
        )
        .bind(post_id.to_db())
        .bind(author.to_db())
        .bind(form.text.get())
        .bind(timestamp_to_db(OffsetDateTime::now_utc()))
        .fetch_one(&self.pool)
        .await?;

        info!(%comment_id, %post_id, %author, "Created comment");
        Ok(Id::from_db(comment_id))
    }

    /// Comments on a post, newest first.
    pub async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let records = query_as::<_, CommentRecord>(
            "
            SELECT
                comments.comment_id,
                comments.post_id,
                comments.text,
                comments.created,
                users.user_id,
                users.username
            FROM
                comments
                JOIN users ON users.user_id = comments.user_id
            WHERE
                comments.post_id = ?
            ORDER BY
                comments.created DESC,
                comments.comment_id DESC
            ",
        )
        .bind(post_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(comments)
    }
}
