//! Helpers for tests that need a fresh, migrated database.

use crate::client::{DbClient, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use yatube_common::model::{
    Id,
    user::{CreateUser, UserMarker, Username},
};

impl DbClient {
    /// An isolated in-memory database. The pool keeps its single connection
    /// alive for the lifetime of the client.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let client = Self::new(pool);
        client.migrate().await?;

        Ok(client)
    }

    pub async fn create_test_user(&self, username: &str) -> Id<UserMarker> {
        let user = CreateUser {
            username: Username::new(username.to_owned()).expect("valid test username"),
        };

        self.create_user(&user).await.expect("create test user")
    }
}
