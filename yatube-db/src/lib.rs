pub mod client;

mod auth;
mod comments;
mod follows;
mod groups;
mod posts;
mod record;
mod users;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;
