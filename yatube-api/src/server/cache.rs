//! Time-based cache for the public listing pages.
//!
//! Entries are keyed by the listing and the requested page number and are
//! never invalidated on writes: a new post shows up on a cached listing only
//! once the entry has expired.

use crate::server::{Result, json::RenderedJson};
use moka::future::Cache;
use std::fmt::{Debug, Formatter};
use tracing::debug;
use yatube_common::{model::group::GroupSlug, page::PageRequest, util::PositiveDuration};

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum PageKey {
    Index,
    Group(GroupSlug),
}

#[derive(Clone)]
pub struct PageCache {
    pages: Cache<(PageKey, PageRequest), RenderedJson>,
}

impl PageCache {
    #[must_use]
    pub fn new(timeout: PositiveDuration, capacity: u64) -> Self {
        let pages = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(timeout.to_std())
            .build();

        Self { pages }
    }

    pub async fn get(&self, key: &PageKey, page: PageRequest) -> Option<RenderedJson> {
        self.pages.get(&(key.clone(), page)).await
    }

    pub async fn insert(&self, key: PageKey, page: PageRequest, rendered: RenderedJson) {
        self.pages.insert((key, page), rendered).await;
    }

    /// Returns the cached page, or renders it with `render` and caches the
    /// result. Failed renders are not cached.
    pub async fn get_or_render<F>(
        &self,
        key: PageKey,
        page: PageRequest,
        render: F,
    ) -> Result<RenderedJson>
    where
        F: Future<Output = Result<RenderedJson>>,
    {
        if let Some(rendered) = self.get(&key, page).await {
            debug!(?key, page = page.get(), "Page cache hit");
            return Ok(rendered);
        }

        debug!(?key, page = page.get(), "Page cache miss");
        let rendered = render.await?;
        self.insert(key, page, rendered.clone()).await;

        Ok(rendered)
    }

    pub fn clear(&self) {
        self.pages.invalidate_all();
    }
}

impl Debug for PageCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("entries", &self.pages.entry_count())
            .field("time_to_live", &self.pages.policy().time_to_live())
            .finish()
    }
}
