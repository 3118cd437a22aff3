use crate::{
    client::{DbClient, Result},
    record::{AuthenticationRecord, utc_timestamp_to_db},
};
use sqlx::{query, query_as};
use time::UtcDateTime;
use tracing::info;
use yatube_common::{
    model::{
        Id,
        auth::{AuthToken, AuthTokenHash, Authentication},
        user::UserMarker,
    },
    util::PositiveDuration,
};

impl DbClient {
    /// Registers a fresh token for `user_id`. The returned token is the only
    /// copy of its secret; only its hash is stored.
    pub async fn create_authentication(
        &self,
        user_id: Id<UserMarker>,
        expires_after: Option<PositiveDuration>,
    ) -> Result<AuthToken> {
        let token = AuthToken::issue(user_id);
        let token_hash = token.hash()?;

        query(
            "
            INSERT INTO authentications (token_hash, user_id, created_at, expires_after_seconds)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(&token_hash.0[..])
        .bind(user_id.to_db())
        .bind(utc_timestamp_to_db(UtcDateTime::now()))
        .bind(expires_after.map(PositiveDuration::whole_seconds))
        .execute(&self.pool)
        .await?;

        info!(%user_id, "Registered authentication");
        Ok(token)
    }

    pub async fn fetch_authentication(
        &self,
        token_hash: &AuthTokenHash,
    ) -> Result<Option<Authentication>> {
        let record = query_as::<_, AuthenticationRecord>(
            "
            SELECT
                authentications.user_id,
                authentications.token_hash,
                authentications.created_at,
                authentications.expires_after_seconds
            FROM
                authentications
            WHERE
                authentications.token_hash = ?
            ",
        )
        .bind(&token_hash.0[..])
        .fetch_optional(&self.pool)
        .await?;

        let authentication = record.map(Authentication::try_from).transpose()?;
        Ok(authentication)
    }
}
