use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    cache::{PageCache, PageKey},
    json::{Json, RenderedJson},
    query::Query,
    routes::{PageQuery, validate_post_form},
};
use axum::{extract::State, response::Redirect};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use yatube_common::model::{group::Group, post::PostForm};
use yatube_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_index)
        .typed_get(get_create_post_form)
        .typed_post(create_post)
}

#[derive(TypedPath)]
#[typed_path("/posts")]
pub(super) struct IndexPath;

async fn get_index(
    IndexPath: IndexPath,
    State(db): State<Arc<DbClient>>,
    State(cache): State<PageCache>,
    Query(query): Query<PageQuery>,
) -> Result<RenderedJson> {
    let page = query.request();

    cache
        .get_or_render(PageKey::Index, page, async {
            let posts = db.fetch_index_page(page).await?;
            Json(posts).render().map_err(ServerError::from)
        })
        .await
}

#[derive(TypedPath)]
#[typed_path("/posts/create")]
struct CreatePostPath;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct NewPostPage {
    groups: Vec<Group>,
}

async fn get_create_post_form(
    CreatePostPath: CreatePostPath,
    State(db): State<Arc<DbClient>>,
    _user: AuthenticatedUser,
) -> Result<Json<NewPostPage>> {
    let groups = db.fetch_groups().await?;

    Ok(Json(NewPostPage { groups }))
}

async fn create_post(
    CreatePostPath: CreatePostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(form): Json<PostForm>,
) -> Result<Redirect> {
    validate_post_form(&db, &form).await?;
    let post_id = db.create_post(user.user_id(), &form).await?;
    info!(%post_id, author = %user.user_id(), "Post published");

    Ok(Redirect::to(&IndexPath.to_string()))
}
