use crate::server::{
    Result, ServerError, ServerRouter,
    cache::{PageCache, PageKey},
    json::{Json, RenderedJson},
    query::Query,
    routes::PageQuery,
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use yatube_common::{
    model::{
        group::{Group, GroupSlug},
        post::Post,
    },
    page::Page,
};
use yatube_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(get_group)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/groups/{slug}", rejection(ServerError))]
struct GroupPath {
    slug: GroupSlug,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct GroupPage {
    group: Group,
    page: Page<Post>,
}

async fn get_group(
    GroupPath { slug }: GroupPath,
    State(db): State<Arc<DbClient>>,
    State(cache): State<PageCache>,
    Query(query): Query<PageQuery>,
) -> Result<RenderedJson> {
    let page = query.request();

    cache
        .get_or_render(PageKey::Group(slug.clone()), page, async {
            let group = db
                .fetch_group_by_slug(&slug)
                .await?
                .ok_or_else(|| ServerError::GroupBySlugNotFound(slug.clone()))?;
            let posts = db.fetch_group_page(group.id, page).await?;

            Json(GroupPage { group, page: posts })
                .render()
                .map_err(ServerError::from)
        })
        .await
}
