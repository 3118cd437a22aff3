use crate::server::{
    Result, ServerRouter, auth::AuthenticatedUser, json::Json, query::Query, routes::PageQuery,
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use std::sync::Arc;
use yatube_common::{model::post::Post, page::Page};
use yatube_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(get_feed)
}

#[derive(TypedPath)]
#[typed_path("/follow")]
struct FeedPath;

/// Posts by the authors the viewer follows. Never cached.
async fn get_feed(
    FeedPath: FeedPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Post>>> {
    let posts = db.fetch_feed_page(user.user_id(), query.request()).await?;

    Ok(Json(posts))
}
