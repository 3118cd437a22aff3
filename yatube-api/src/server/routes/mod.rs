use crate::server::{Result, ServerError, ServerRouter};
use axum::Router;
use serde::Deserialize;
use yatube_common::{model::post::PostForm, page::PageRequest};
use yatube_db::client::DbClient;

mod feed;
mod groups;
mod posts;
mod users;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(posts::routes())
        .merge(groups::routes())
        .merge(users::routes())
        .merge(feed::routes())
}

/// `?page=` of a listing. Kept as a string so that junk selects the first page
/// instead of rejecting the request.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref())
    }
}

/// Checks what the form deserializer cannot: the chosen group must exist.
async fn validate_post_form(db: &DbClient, form: &PostForm) -> Result<()> {
    if let Some(group_id) = form.group
        && db.fetch_group(group_id).await?.is_none()
    {
        return Err(ServerError::InvalidForm(format!(
            "Select a valid choice. Group {group_id} is not one of the available choices."
        )));
    }

    Ok(())
}
