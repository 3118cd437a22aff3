//! Drives the router in-process against an in-memory database.

use crate::server::{LoginUrl, PageCache, ServerState, routes};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use yatube_common::{
    model::{
        Id,
        group::{CreateGroup, GroupMarker, GroupSlug, GroupTitle},
        post::{PostForm, PostMarker},
        text::Text,
        user::UserMarker,
    },
    util::PositiveDuration,
};
use yatube_db::client::DbClient;

pub struct TestApp {
    pub db: Arc<DbClient>,
    pub cache: PageCache,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Value,
}

impl TestResponse {
    /// Post texts of a `Page<Post>` body, in listing order.
    pub fn texts(&self) -> Vec<String> {
        self.body["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item["text"].as_str().map(ToOwned::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn message(&self) -> String {
        self.body["message"].as_str().unwrap_or_default().to_owned()
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_cache_timeout(time::Duration::seconds(20)).await
    }

    pub async fn with_cache_timeout(timeout: time::Duration) -> Self {
        let db = Arc::new(DbClient::in_memory().await.unwrap());
        let cache = PageCache::new(PositiveDuration::new(timeout).unwrap(), 1000);

        let router = routes().with_state(ServerState {
            db_client: Arc::clone(&db),
            page_cache: cache.clone(),
            login_url: LoginUrl::default(),
        });

        Self { db, cache, router }
    }

    /// Registers a user and returns its id and bearer token.
    pub async fn user(&self, username: &str) -> (Id<UserMarker>, String) {
        let user_id = self.db.create_test_user(username).await;
        let token = self.db.create_authentication(user_id, None).await.unwrap();

        (user_id, token.to_string())
    }

    pub async fn group(&self, title: &str, slug: &str) -> Id<GroupMarker> {
        let group = CreateGroup {
            title: GroupTitle::new(title.to_owned()).unwrap(),
            slug: GroupSlug::new(slug.to_owned()).unwrap(),
            description: String::new(),
        };

        self.db.create_group(&group).await.unwrap()
    }

    pub async fn create_post(&self, author: Id<UserMarker>, text: &str) -> Id<PostMarker> {
        let form = PostForm {
            text: Text::new(text).unwrap(),
            group: None,
            image: None,
        };

        self.db.create_post(author, &form).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(uri, "GET", token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, json: Value) -> TestResponse {
        let request = request(uri, "POST", token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap();

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|location| location.to_str().unwrap().to_owned());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            location,
            body,
        }
    }
}

fn request(uri: &str, method: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().uri(uri).method(method);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}
