use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{Uri, request::Parts},
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use std::sync::Arc;
use time::UtcDateTime;
use tracing::debug;
use yatube_common::model::{Id, auth::AuthToken, user::UserMarker};
use yatube_db::client::DbClient;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// Where anonymous requests to protected pages are sent.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct LoginUrl(Arc<str>);

impl LoginUrl {
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self(url.into())
    }

    /// The login location that returns to `next` afterwards.
    #[must_use]
    pub fn redirect_for(&self, next: &str) -> String {
        format!("{}?next={}", self.0, urlencoding::encode(next))
    }
}

impl Default for LoginUrl {
    fn default() -> Self {
        Self::new("/auth/login")
    }
}

/// The identity behind a valid bearer token. Extracting it from an anonymous
/// request redirects to the login page; use `Option<AuthenticatedUser>` for
/// pages that anyone may view.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct AuthenticatedUser {
    id: Id<UserMarker>,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn user_id(self) -> Id<UserMarker> {
        self.id
    }

    async fn authenticate<S>(parts: &mut Parts, state: &S) -> Result<Option<Self>, ServerError>
    where
        Arc<DbClient>: FromRef<S>,
        S: Send + Sync,
    {
        let header =
            <AuthorizationHeader as FromRequestParts<S>>::from_request_parts(parts, state).await;
        let header = match header {
            Ok(header) => header,
            Err(rejection) if rejection.is_missing() => return Ok(None),
            Err(rejection) => return Err(ServerError::InvalidAuthorizationHeader(rejection)),
        };

        let request_token: AuthToken = header.token().parse()?;
        let token_hash = request_token.hash()?;

        let Some(authentication) = Arc::<DbClient>::from_ref(state)
            .fetch_authentication(&token_hash)
            .await?
        else {
            debug!(user_id = %request_token.user_id, "Unknown auth token");
            return Ok(None);
        };

        if authentication.user != request_token.user_id
            || authentication.is_expired_at(UtcDateTime::now())
        {
            debug!(user_id = %request_token.user_id, "Rejected stale auth token");
            return Ok(None);
        }

        Ok(Some(Self {
            id: authentication.user,
        }))
    }
}

fn return_path(uri: &Uri) -> String {
    uri.path_and_query()
        .map_or_else(|| uri.path().to_owned(), ToString::to_string)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<DbClient>: FromRef<S>,
    LoginUrl: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Self::authenticate(parts, state)
            .await?
            .ok_or_else(|| ServerError::LoginRequired {
                login_url: LoginUrl::from_ref(state),
                next: return_path(&parts.uri),
            })
    }
}

impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    Arc<DbClient>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Self::authenticate(parts, state).await
    }
}
