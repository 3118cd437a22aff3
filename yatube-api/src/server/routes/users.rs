//! Author-scoped pages: the profile, single posts with their comments, post
//! editing, commenting and following.

use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    json::Json,
    query::Query,
    routes::{PageQuery, validate_post_form},
};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use yatube_common::{
    model::{
        Id,
        comment::{Comment, CommentForm},
        group::Group,
        post::{Post, PostForm, PostMarker},
        user::{User, Username},
    },
    page::Page,
};
use yatube_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_profile)
        .typed_get(get_post)
        .typed_get(get_edit_post_form)
        .typed_post(edit_post)
        .typed_post(add_comment)
        .typed_post(follow_author)
        .typed_post(unfollow_author)
}

async fn fetch_author(db: &DbClient, username: &Username) -> Result<User> {
    db.fetch_user_by_username(username)
        .await?
        .ok_or_else(|| ServerError::UserByUsernameNotFound(username.clone()))
}

/// The post `post_id`, provided it was written by `username`.
async fn fetch_authored_post(
    db: &DbClient,
    username: &Username,
    post_id: Id<PostMarker>,
) -> Result<(User, Post)> {
    let author = fetch_author(db, username).await?;
    let post = db
        .fetch_post(post_id)
        .await?
        .filter(|post| post.author.id == author.id)
        .ok_or(ServerError::PostByIdNotFound(post_id))?;

    Ok((author, post))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{username}", rejection(ServerError))]
struct ProfilePath {
    username: Username,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct ProfilePage {
    author: User,
    follower_count: u64,
    following_count: u64,
    /// Whether the viewer follows the author. Absent for anonymous viewers and
    /// on the viewer's own profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    following: Option<bool>,
    page: Page<Post>,
}

async fn get_profile(
    ProfilePath { username }: ProfilePath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProfilePage>> {
    let author = fetch_author(&db, &username).await?;

    let following = match viewer {
        Some(viewer) if viewer.user_id() != author.id => {
            Some(db.is_following(viewer.user_id(), author.id).await?)
        }
        _ => None,
    };

    Ok(Json(ProfilePage {
        follower_count: db.follower_count(author.id).await?,
        following_count: db.following_count(author.id).await?,
        following,
        page: db.fetch_author_page(author.id, query.request()).await?,
        author,
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{username}/posts/{post_id}", rejection(ServerError))]
struct PostPath {
    username: Username,
    post_id: Id<PostMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct PostPage {
    author: User,
    post: Post,
    comments: Vec<Comment>,
}

async fn get_post(
    PostPath { username, post_id }: PostPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<PostPage>> {
    let (author, post) = fetch_authored_post(&db, &username, post_id).await?;
    let comments = db.fetch_post_comments(post.id).await?;

    Ok(Json(PostPage {
        author,
        post,
        comments,
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{username}/posts/{post_id}/edit", rejection(ServerError))]
struct EditPostPath {
    username: Username,
    post_id: Id<PostMarker>,
}

impl EditPostPath {
    fn view(self) -> PostPath {
        PostPath {
            username: self.username,
            post_id: self.post_id,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct EditPostPage {
    post: Post,
    form: PostForm,
    groups: Vec<Group>,
}

async fn get_edit_post_form(
    path: EditPostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Response> {
    let (author, post) = fetch_authored_post(&db, &path.username, path.post_id).await?;
    if author.id != user.user_id() {
        debug!(post_id = %post.id, user_id = %user.user_id(), "Edit form denied to non-owner");
        return Ok(Redirect::to(&path.view().to_string()).into_response());
    }

    let groups = db.fetch_groups().await?;
    Ok(Json(EditPostPage {
        form: PostForm::from(&post),
        post,
        groups,
    })
    .into_response())
}

async fn edit_post(
    path: EditPostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    form: Result<Json<PostForm>>,
) -> Result<Redirect> {
    let (author, post) = fetch_authored_post(&db, &path.username, path.post_id).await?;
    if author.id != user.user_id() {
        debug!(post_id = %post.id, user_id = %user.user_id(), "Edit denied to non-owner");
        return Ok(Redirect::to(&path.view().to_string()));
    }

    // Only the owner's submission is validated.
    let Json(form) = form?;
    validate_post_form(&db, &form).await?;
    db.update_post(post.id, &form).await?;
    info!(post_id = %post.id, "Post edited");

    Ok(Redirect::to(&path.view().to_string()))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{username}/posts/{post_id}/comment", rejection(ServerError))]
struct CommentPath {
    username: Username,
    post_id: Id<PostMarker>,
}

async fn add_comment(
    CommentPath { username, post_id }: CommentPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    form: Result<Json<CommentForm>>,
) -> Result<Redirect> {
    let (_, post) = fetch_authored_post(&db, &username, post_id).await?;
    let Json(form) = form?;
    db.create_comment(post.id, user.user_id(), &form).await?;

    Ok(Redirect::to(&PostPath { username, post_id }.to_string()))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{username}/follow", rejection(ServerError))]
struct FollowPath {
    username: Username,
}

async fn follow_author(
    FollowPath { username }: FollowPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Redirect> {
    let author = fetch_author(&db, &username).await?;
    let outcome = db.follow(user.user_id(), author.id).await?;
    info!(user_id = %user.user_id(), author_id = %author.id, ?outcome, "Follow requested");

    Ok(Redirect::to(&ProfilePath { username }.to_string()))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{username}/unfollow", rejection(ServerError))]
struct UnfollowPath {
    username: Username,
}

async fn unfollow_author(
    UnfollowPath { username }: UnfollowPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Redirect> {
    let author = fetch_author(&db, &username).await?;
    let outcome = db.unfollow(user.user_id(), author.id).await?;
    info!(user_id = %user.user_id(), author_id = %author.id, ?outcome, "Unfollow requested");

    Ok(Redirect::to(&ProfilePath { username }.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::server::test_util::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn profile_of_unknown_user_is_not_found() {
        let app = TestApp::new().await;

        let response = app.get("/users/nobody", None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        app.user("somebody").await;
        let response = app.get("/users/somebody", None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["author"]["username"], "somebody");
        assert!(response.body.get("following").is_none());
    }

    #[tokio::test]
    async fn new_post_shows_on_profile_and_post_page() {
        let app = TestApp::new().await;
        let (user_id, _) = app.user("leo").await;
        let post_id = app.create_post(user_id, "Новая тестовая запись").await;

        let profile = app.get("/users/leo", None).await;
        assert_eq!(profile.body["page"]["items"][0]["text"], "Новая тестовая запись");

        let view = app.get(&format!("/users/leo/posts/{post_id}"), None).await;
        assert_eq!(view.status, StatusCode::OK);
        assert_eq!(view.body["post"]["text"], "Новая тестовая запись");
        assert_eq!(view.body["author"]["username"], "leo");
    }

    #[tokio::test]
    async fn post_under_wrong_author_is_not_found() {
        let app = TestApp::new().await;
        let (leo, _) = app.user("leo").await;
        app.user("ann").await;
        let post_id = app.create_post(leo, "Test post").await;

        let response = app.get(&format!("/users/ann/posts/{post_id}"), None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        let response = app.get("/users/leo/posts/999", None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        let response = app.get("/users/leo/posts/not-a-number", None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn author_edits_post() {
        let app = TestApp::new().await;
        let (user_id, token) = app.user("user1").await;
        let post_id = app.create_post(user_id, "Тестовая запись").await;
        let edit = format!("/users/user1/posts/{post_id}/edit");

        let form = app.get(&edit, Some(&token)).await;
        assert_eq!(form.status, StatusCode::OK);
        assert_eq!(form.body["form"]["text"], "Тестовая запись");

        let response = app
            .post(&edit, Some(&token), json!({"text": "Отредактированная запись"}))
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(
            response.location,
            Some(format!("/users/user1/posts/{post_id}"))
        );

        let post = app.db.fetch_post(post_id).await.unwrap().unwrap();
        assert_eq!(post.text.get(), "Отредактированная запись");
        let page = app.db.fetch_author_page(user_id, Default::default()).await.unwrap();
        assert_eq!(page.count, 1);
    }

    #[tokio::test]
    async fn non_owner_is_redirected_and_post_unchanged() {
        let app = TestApp::new().await;
        let (owner, _) = app.user("user1").await;
        let (_, intruder) = app.user("user2").await;
        let post_id = app.create_post(owner, "Тестовая запись").await;
        let edit = format!("/users/user1/posts/{post_id}/edit");
        let view = format!("/users/user1/posts/{post_id}");

        let form = app.get(&edit, Some(&intruder)).await;
        assert_eq!(form.status, StatusCode::SEE_OTHER);
        assert_eq!(form.location.as_deref(), Some(view.as_str()));

        let response = app
            .post(&edit, Some(&intruder), json!({"text": "Отредактированная запись"}))
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location.as_deref(), Some(view.as_str()));

        let post = app.db.fetch_post(post_id).await.unwrap().unwrap();
        assert_eq!(post.text.get(), "Тестовая запись");
    }

    #[tokio::test]
    async fn non_owner_with_invalid_form_is_still_redirected() {
        let app = TestApp::new().await;
        let (owner, _) = app.user("user1").await;
        let (_, intruder) = app.user("user2").await;
        let post_id = app.create_post(owner, "Тестовая запись").await;
        let edit = format!("/users/user1/posts/{post_id}/edit");
        let view = format!("/users/user1/posts/{post_id}");

        for body in [json!({"text": "   "}), json!({"text": "x", "image": "a.txt"}), json!({})] {
            let response = app.post(&edit, Some(&intruder), body).await;
            assert_eq!(response.status, StatusCode::SEE_OTHER);
            assert_eq!(response.location.as_deref(), Some(view.as_str()));
        }

        let post = app.db.fetch_post(post_id).await.unwrap().unwrap();
        assert_eq!(post.text.get(), "Тестовая запись");
    }

    #[tokio::test]
    async fn owner_with_invalid_form_gets_message() {
        let app = TestApp::new().await;
        let (owner, token) = app.user("user1").await;
        let post_id = app.create_post(owner, "Тестовая запись").await;

        let response = app
            .post(
                &format!("/users/user1/posts/{post_id}/edit"),
                Some(&token),
                json!({"text": "   "}),
            )
            .await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.message().contains("This field is required."));

        let post = app.db.fetch_post(post_id).await.unwrap().unwrap();
        assert_eq!(post.text.get(), "Тестовая запись");
    }

    #[tokio::test]
    async fn edit_of_unknown_post_is_not_found_before_form_checks() {
        let app = TestApp::new().await;
        let (_, token) = app.user("user1").await;

        let response = app
            .post("/users/user1/posts/999/edit", Some(&token), json!({}))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        let response = app
            .post("/users/user1/posts/999/comment", Some(&token), json!({"text": " "}))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn anonymous_edit_redirects_to_login() {
        let app = TestApp::new().await;
        let (owner, _) = app.user("user1").await;
        let post_id = app.create_post(owner, "Тестовая запись").await;

        let response = app
            .post(
                &format!("/users/user1/posts/{post_id}/edit"),
                None,
                json!({"text": "changed"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(
            response.location,
            Some(format!(
                "/auth/login?next=%2Fusers%2Fuser1%2Fposts%2F{post_id}%2Fedit"
            ))
        );
        let post = app.db.fetch_post(post_id).await.unwrap().unwrap();
        assert_eq!(post.text.get(), "Тестовая запись");
    }

    #[tokio::test]
    async fn edit_attaches_image_and_group() {
        let app = TestApp::new().await;
        let (user_id, token) = app.user("leo").await;
        let group_id = app.group("Test Group", "testgroup").await;
        let post_id = app.create_post(user_id, "Test post").await;

        app.post(
            &format!("/users/leo/posts/{post_id}/edit"),
            Some(&token),
            json!({"text": "New text", "group": group_id.get(), "image": "posts/testimg.jpg"}),
        )
        .await;

        let view = app.get(&format!("/users/leo/posts/{post_id}"), None).await;
        assert_eq!(view.body["post"]["image"], "posts/testimg.jpg");
        assert_eq!(view.body["post"]["group"]["slug"], "testgroup");

        let profile = app.get("/users/leo", None).await;
        assert_eq!(profile.body["page"]["items"][0]["image"], "posts/testimg.jpg");
    }

    #[tokio::test]
    async fn comment_when_logged_in() {
        let app = TestApp::new().await;
        let (user_id, token) = app.user("leo").await;
        let post_id = app.create_post(user_id, "Test post").await;

        let response = app
            .post(
                &format!("/users/leo/posts/{post_id}/comment"),
                Some(&token),
                json!({"text": "Test comment"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(
            response.location,
            Some(format!("/users/leo/posts/{post_id}"))
        );

        let view = app.get(&format!("/users/leo/posts/{post_id}"), None).await;
        assert_eq!(view.body["comments"][0]["text"], "Test comment");
        assert_eq!(view.body["comments"][0]["author"]["username"], "leo");
    }

    #[tokio::test]
    async fn anonymous_comment_changes_nothing() {
        let app = TestApp::new().await;
        let (user_id, _) = app.user("leo").await;
        let post_id = app.create_post(user_id, "Test post").await;
        let comment = format!("/users/leo/posts/{post_id}/comment");

        let response = app.post(&comment, None, json!({"text": "Test comment"})).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(
            response.location,
            Some(format!(
                "/auth/login?next=%2Fusers%2Fleo%2Fposts%2F{post_id}%2Fcomment"
            ))
        );
        assert!(app.db.fetch_post_comments(post_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn follow_and_unfollow() {
        let app = TestApp::new().await;
        let (user1, token) = app.user("user1").await;
        let (user3, _) = app.user("user3").await;

        let profile = app.get("/users/user3", Some(&token)).await;
        assert_eq!(profile.body["following"], false);

        let response = app.post("/users/user3/follow", Some(&token), json!({})).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location.as_deref(), Some("/users/user3"));
        assert!(app.db.is_following(user1, user3).await.unwrap());

        let profile = app.get("/users/user3", Some(&token)).await;
        assert_eq!(profile.body["following"], true);
        assert_eq!(profile.body["follower_count"], 1);

        app.post("/users/user3/unfollow", Some(&token), json!({})).await;
        assert!(!app.db.is_following(user1, user3).await.unwrap());
        assert_eq!(app.db.follower_count(user3).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn double_follow_and_double_unfollow() {
        let app = TestApp::new().await;
        let (_, token) = app.user("user1").await;
        let (user3, _) = app.user("user3").await;

        app.post("/users/user3/unfollow", Some(&token), json!({})).await;
        assert_eq!(app.db.follower_count(user3).await.unwrap(), 0);

        for _ in 0..2 {
            let response = app.post("/users/user3/follow", Some(&token), json!({})).await;
            assert_eq!(response.status, StatusCode::SEE_OTHER);
        }
        assert_eq!(app.db.follower_count(user3).await.unwrap(), 1);
        let profile = app.get("/users/user3", Some(&token)).await;
        assert_eq!(profile.body["following"], true);
    }

    #[tokio::test]
    async fn follow_yourself_is_ignored() {
        let app = TestApp::new().await;
        let (user1, token) = app.user("user1").await;

        let profile = app.get("/users/user1", Some(&token)).await;
        assert!(profile.body.get("following").is_none());

        let response = app.post("/users/user1/follow", Some(&token), json!({})).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(app.db.follower_count(user1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn anonymous_follow_changes_nothing() {
        let app = TestApp::new().await;
        let (user3, _) = app.user("user3").await;

        let response = app.post("/users/user3/follow", None, json!({})).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(
            response.location.as_deref(),
            Some("/auth/login?next=%2Fusers%2Fuser3%2Ffollow")
        );
        assert_eq!(app.db.follower_count(user3).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn follow_unknown_user_is_not_found() {
        let app = TestApp::new().await;
        let (_, token) = app.user("user1").await;

        let response = app.post("/users/ghost/follow", Some(&token), json!({})).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }
}
