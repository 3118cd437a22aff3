//! Post storage and the listing queries behind the index, group, profile and
//! follow pages. Every listing is newest-first and paginated with
//! [`PageRequest`].

use crate::{
    client::{DbClient, Result},
    record::{FullPostRecord, timestamp_to_db},
};
use sqlx::{query, query_as, query_scalar};
use time::OffsetDateTime;
use tracing::{debug, info};
use yatube_common::{
    model::{
        Id,
        group::GroupMarker,
        post::{Post, PostForm, PostMarker},
        user::UserMarker,
    },
    page::{Page, PageRequest},
};

macro_rules! select_posts {
    ($filter:literal) => {
        concat!(
            "
            SELECT
                posts.post_id,
                posts.text,
                posts.pub_date,
                posts.image,
                users.user_id,
                users.username,
                post_groups.group_id,
                post_groups.title AS group_title,
                post_groups.slug AS group_slug,
                post_groups.description AS group_description
            FROM
                posts
                JOIN users ON users.user_id = posts.user_id
                LEFT JOIN post_groups ON post_groups.group_id = posts.group_id
            ",
            $filter,
            "
            ORDER BY
                posts.pub_date DESC,
                posts.post_id DESC
            LIMIT ? OFFSET ?
            "
        )
    };
}

macro_rules! count_posts {
    ($filter:literal) => {
        concat!("SELECT COUNT(*) FROM posts ", $filter)
    };
}

/// Which posts a listing shows.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
enum Listing {
    All,
    Group(Id<GroupMarker>),
    Author(Id<UserMarker>),
    FollowedBy(Id<UserMarker>),
}

impl Listing {
    fn count_sql(self) -> &'static str {
        match self {
            Listing::All => count_posts!(""),
            Listing::Group(_) => count_posts!("WHERE posts.group_id = ?"),
            Listing::Author(_) => count_posts!("WHERE posts.user_id = ?"),
            Listing::FollowedBy(_) => count_posts!(
                "WHERE posts.user_id IN (SELECT author_id FROM follows WHERE follows.user_id = ?)"
            ),
        }
    }

    fn page_sql(self) -> &'static str {
        match self {
            Listing::All => select_posts!(""),
            Listing::Group(_) => select_posts!("WHERE posts.group_id = ?"),
            Listing::Author(_) => select_posts!("WHERE posts.user_id = ?"),
            Listing::FollowedBy(_) => select_posts!(
                "WHERE posts.user_id IN (SELECT author_id FROM follows WHERE follows.user_id = ?)"
            ),
        }
    }

    fn scope(self) -> Option<i64> {
        match self {
            Listing::All => None,
            Listing::Group(group_id) => Some(group_id.to_db()),
            Listing::Author(user_id) | Listing::FollowedBy(user_id) => Some(user_id.to_db()),
        }
    }
}

impl DbClient {
    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, FullPostRecord>(
            "
            SELECT
                posts.post_id,
                posts.text,
                posts.pub_date,
                posts.image,
                users.user_id,
                users.username,
                post_groups.group_id,
                post_groups.title AS group_title,
                post_groups.slug AS group_slug,
                post_groups.description AS group_description
            FROM
                posts
                JOIN users ON users.user_id = posts.user_id
                LEFT JOIN post_groups ON post_groups.group_id = posts.group_id
            WHERE
                posts.post_id = ?
            ",
        )
        .bind(post_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    pub async fn create_post(
        &self,
        author: Id<UserMarker>,
        form: &PostForm,
    ) -> Result<Id<PostMarker>> {
        self.create_post_at(author, form, OffsetDateTime::now_utc())
            .await
    }

    pub async fn create_post_at(
        &self,
        author: Id<UserMarker>,
        form: &PostForm,
        pub_date: OffsetDateTime,
    ) -> Result<Id<PostMarker>> {
        let post_id: i64 = query_scalar(
            "
            INSERT INTO posts (text, pub_date, user_id, group_id, image)
            VALUES (?, ?, ?, ?, ?)
            RETURNING post_id
            ",
        )
        .bind(form.text.get())
        .bind(timestamp_to_db(pub_date))
        .bind(author.to_db())
        .bind(form.group.map(Id::to_db))
        .bind(form.image.as_ref().map(|image| image.get()))
        .fetch_one(&self.pool)
        .await?;

        info!(%post_id, %author, "Created post");
        Ok(Id::from_db(post_id))
    }

    /// Replaces the editable fields of a post. Returns whether the post existed.
    pub async fn update_post(&self, post_id: Id<PostMarker>, form: &PostForm) -> Result<bool> {
        let updated = query(
            "
            UPDATE posts
            SET text = ?, group_id = ?, image = ?
            WHERE post_id = ?
            ",
        )
        .bind(form.text.get())
        .bind(form.group.map(Id::to_db))
        .bind(form.image.as_ref().map(|image| image.get()))
        .bind(post_id.to_db())
        .execute(&self.pool)
        .await?
        .rows_affected();

        info!(%post_id, updated, "Updated post");
        Ok(updated > 0)
    }

    /// Deletes a post together with its comments.
    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let deleted = query("DELETE FROM posts WHERE post_id = ?")
            .bind(post_id.to_db())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    pub async fn fetch_index_page(&self, page: PageRequest) -> Result<Page<Post>> {
        self.fetch_listing(Listing::All, page).await
    }

    pub async fn fetch_group_page(
        &self,
        group_id: Id<GroupMarker>,
        page: PageRequest,
    ) -> Result<Page<Post>> {
        self.fetch_listing(Listing::Group(group_id), page).await
    }

    pub async fn fetch_author_page(
        &self,
        author_id: Id<UserMarker>,
        page: PageRequest,
    ) -> Result<Page<Post>> {
        self.fetch_listing(Listing::Author(author_id), page).await
    }

    /// The personalized feed: posts of every author `viewer_id` follows. Following
    /// nobody yields an empty page.
    pub async fn fetch_feed_page(
        &self,
        viewer_id: Id<UserMarker>,
        page: PageRequest,
    ) -> Result<Page<Post>> {
        debug!(%viewer_id, "Fetching follow feed");
        self.fetch_listing(Listing::FollowedBy(viewer_id), page)
            .await
    }

    async fn fetch_listing(&self, listing: Listing, page: PageRequest) -> Result<Page<Post>> {
        let mut count_query = query_scalar::<_, i64>(listing.count_sql());
        if let Some(scope) = listing.scope() {
            count_query = count_query.bind(scope);
        }
        let count = count_query.fetch_one(&self.pool).await?;

        let window = page.locate(count.cast_unsigned());

        let mut page_query = query_as::<_, FullPostRecord>(listing.page_sql());
        if let Some(scope) = listing.scope() {
            page_query = page_query.bind(scope);
        }
        let records = page_query
            .bind(window.limit().cast_signed())
            .bind(window.offset().cast_signed())
            .fetch_all(&self.pool)
            .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(window.into_page(posts))
    }
}
