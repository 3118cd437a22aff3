use crate::{
    client::{DbClient, Result},
    record::UserRecord,
};
use sqlx::{query_as, query_scalar};
use yatube_common::model::{
    Id,
    user::{CreateUser, User, UserMarker, Username},
};

impl DbClient {
    pub async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_id,
                users.username
            FROM
                users
            WHERE
                users.username = ?
            ",
        )
        .bind(username.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    pub async fn create_user(&self, user: &CreateUser) -> Result<Id<UserMarker>> {
        let user_id: i64 = query_scalar(
            "
            INSERT INTO users (username)
            VALUES (?)
            RETURNING user_id
            ",
        )
        .bind(user.username.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(Id::from_db(user_id))
    }
}
