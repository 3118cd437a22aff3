use crate::model::{
    Id,
    group::{Group, GroupMarker},
    text::Text,
    user::User,
};
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use thiserror::Error;
use time::OffsetDateTime;

pub const IMAGE_REF_MAX_LEN: usize = 100;
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: User,
    pub text: Text,
    #[serde(with = "time::serde::rfc3339")]
    pub pub_date: OffsetDateTime,
    pub group: Option<Group>,
    pub image: Option<ImageRef>,
}

/// Submitted fields of the new post and edit post forms.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct PostForm {
    pub text: Text,
    #[serde(default)]
    pub group: Option<Id<GroupMarker>>,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

impl From<&Post> for PostForm {
    fn from(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group.as_ref().map(|group| group.id),
            image: post.image.clone(),
        }
    }
}

/// Storage path of an uploaded image, relative to the media root.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageRef(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image: {0:?}")]
pub struct InvalidImageRefError(String);

impl ImageRef {
    pub fn new(path: String) -> Result<Self, InvalidImageRefError> {
        let relative = !path.starts_with('/') && !path.split('/').any(|part| part == "..");
        let file_name = path.rsplit('/').next().unwrap_or_default();
        let has_image_extension = file_name.rsplit_once('.').is_some_and(|(stem, extension)| {
            !stem.is_empty()
                && IMAGE_EXTENSIONS
                    .iter()
                    .any(|allowed| extension.eq_ignore_ascii_case(allowed))
        });

        if relative && has_image_extension && path.chars().count() <= IMAGE_REF_MAX_LEN {
            Ok(Self(path))
        } else {
            Err(InvalidImageRefError(path))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ImageRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        ImageRef::new(inner).map_err(Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::post::{ImageRef, PostForm};

    #[test]
    fn image_ref_rules() {
        assert!(ImageRef::new("posts/testimg.jpg".to_owned()).is_ok());
        assert!(ImageRef::new("posts/Photo.JPEG".to_owned()).is_ok());
        assert!(ImageRef::new("posts/testfile.txt".to_owned()).is_err());
        assert!(ImageRef::new("posts/noextension".to_owned()).is_err());
        assert!(ImageRef::new("posts/.png".to_owned()).is_err());
        assert!(ImageRef::new("/etc/passwd.png".to_owned()).is_err());
        assert!(ImageRef::new("posts/../../secret.png".to_owned()).is_err());
        assert!(ImageRef::new(format!("posts/{}.png", "a".repeat(100))).is_err());
    }

    #[test]
    fn post_form_defaults_optional_fields() {
        let form: PostForm = serde_json::from_str(r#"{"text": "New text"}"#).unwrap();
        assert_eq!(form.text.get(), "New text");
        assert_eq!(form.group, None);
        assert_eq!(form.image, None);

        let with_group: PostForm =
            serde_json::from_str(r#"{"text": "New text", "group": 1, "image": "posts/a.png"}"#)
                .unwrap();
        assert_eq!(with_group.group.map(u64::from), Some(1));
        assert_eq!(with_group.image.unwrap().get(), "posts/a.png");
    }

    #[test]
    fn post_form_rejects_bad_image() {
        let result = serde_json::from_str::<PostForm>(
            r#"{"text": "Test post", "group": 1, "image": "testfile.txt"}"#,
        );
        assert!(result.is_err());
    }
}
