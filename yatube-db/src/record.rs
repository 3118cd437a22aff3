use sqlx::FromRow;
use time::{OffsetDateTime, UtcDateTime};
use yatube_common::{
    model::{
        Id, ModelValidationError,
        auth::Authentication,
        comment::Comment,
        group::{Group, GroupSlug, GroupTitle},
        post::{ImageRef, Post},
        text::Text,
        user::{User, Username},
    },
    util::PositiveDuration,
};

const NANOS_PER_MILLI: i128 = 1_000_000;

/// Timestamps are stored as unix milliseconds.
pub(crate) fn timestamp_to_db(timestamp: OffsetDateTime) -> i64 {
    timestamp.unix_timestamp() * 1000 + i64::from(timestamp.millisecond())
}

pub(crate) fn utc_timestamp_to_db(timestamp: UtcDateTime) -> i64 {
    timestamp.unix_timestamp() * 1000 + i64::from(timestamp.millisecond())
}

pub(crate) fn timestamp_from_db(millis: i64) -> Result<OffsetDateTime, ModelValidationError> {
    Ok(OffsetDateTime::from_unix_timestamp_nanos(
        i128::from(millis) * NANOS_PER_MILLI,
    )?)
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: i64,
    pub username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct GroupRecord {
    pub group_id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct FullPostRecord {
    pub post_id: i64,
    pub text: String,
    pub pub_date: i64,
    pub image: Option<String>,
    pub user_id: i64,
    pub username: String,
    pub group_id: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub group_description: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_id: i64,
    pub post_id: i64,
    pub text: String,
    pub created: i64,
    pub user_id: i64,
    pub username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct AuthenticationRecord {
    pub user_id: i64,
    pub token_hash: Vec<u8>,
    pub created_at: i64,
    pub expires_after_seconds: Option<i64>,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.user_id),
            username: Username::new(value.username)?,
        })
    }
}

impl TryFrom<GroupRecord> for Group {
    type Error = ModelValidationError;

    fn try_from(value: GroupRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.group_id),
            title: GroupTitle::new(value.title)?,
            slug: GroupSlug::new(value.slug)?,
            description: value.description,
        })
    }
}

impl TryFrom<FullPostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: FullPostRecord) -> Result<Self, Self::Error> {
        // The group columns come from a LEFT JOIN and are all present or all null.
        let group = match (
            value.group_id,
            value.group_title,
            value.group_slug,
            value.group_description,
        ) {
            (Some(group_id), Some(title), Some(slug), Some(description)) => {
                Some(Group::try_from(GroupRecord {
                    group_id,
                    title,
                    slug,
                    description,
                })?)
            }
            _ => None,
        };

        Ok(Self {
            id: Id::from_db(value.post_id),
            author: User {
                id: Id::from_db(value.user_id),
                username: Username::new(value.username)?,
            },
            text: Text::new(&value.text)?,
            pub_date: timestamp_from_db(value.pub_date)?,
            group,
            image: value.image.map(ImageRef::new).transpose()?,
        })
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.comment_id),
            post: Id::from_db(value.post_id),
            author: User {
                id: Id::from_db(value.user_id),
                username: Username::new(value.username)?,
            },
            text: Text::new(&value.text)?,
            created: timestamp_from_db(value.created)?,
        })
    }
}

impl TryFrom<AuthenticationRecord> for Authentication {
    type Error = ModelValidationError;

    fn try_from(value: AuthenticationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: Id::from_db(value.user_id),
            token_hash: value.token_hash.try_into()?,
            created_at: UtcDateTime::from_unix_timestamp_nanos(
                i128::from(value.created_at) * NANOS_PER_MILLI,
            )?,
            expires_after: value
                .expires_after_seconds
                .map(|seconds| PositiveDuration::try_from(time::Duration::seconds(seconds)))
                .transpose()?,
        })
    }
}
