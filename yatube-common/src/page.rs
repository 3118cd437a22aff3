//! Fixed-size pagination over newest-first listings.
//!
//! A requested page number is forgiving: anything that is not an integer
//! selects the first page, and out of range numbers clamp to the nearest
//! existing page. An empty listing still has one (empty) page.

use serde::{Deserialize, Serialize};

pub const PAGE_SIZE: u64 = 10;

/// A page number as requested by a client, normalized to at least 1.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct PageRequest(u64);

impl PageRequest {
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub fn new(number: u64) -> Self {
        Self(number.max(1))
    }

    /// Reads the raw `page` query value. Digits beyond `u64` saturate and land
    /// on the last page.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return Self::FIRST;
        };

        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            Self::new(raw.parse().unwrap_or(u64::MAX))
        } else {
            Self::FIRST
        }
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Places the request on a listing of `count` items.
    #[must_use]
    pub fn locate(self, count: u64) -> PageWindow {
        let num_pages = count.div_ceil(PAGE_SIZE).max(1);

        PageWindow {
            number: self.0.min(num_pages),
            num_pages,
            count,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::FIRST
    }
}

/// The resolved position of a page within a listing.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
}

impl PageWindow {
    #[must_use]
    pub fn offset(self) -> u64 {
        (self.number - 1) * PAGE_SIZE
    }

    #[must_use]
    pub fn limit(self) -> u64 {
        PAGE_SIZE
    }

    #[must_use]
    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_previous: self.number > 1,
            has_next: self.number < self.num_pages,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

#[cfg(test)]
mod tests {
    use crate::page::{PAGE_SIZE, PageRequest, PageWindow};

    #[test]
    fn parse_page_numbers() {
        assert_eq!(PageRequest::parse(None), PageRequest::FIRST);
        assert_eq!(PageRequest::parse(Some("3")).get(), 3);
        assert_eq!(PageRequest::parse(Some(" 3 ")).get(), 3);
        assert_eq!(PageRequest::parse(Some("abc")), PageRequest::FIRST);
        assert_eq!(PageRequest::parse(Some("")), PageRequest::FIRST);
        assert_eq!(PageRequest::parse(Some("0")), PageRequest::FIRST);
        assert_eq!(PageRequest::parse(Some("-5")), PageRequest::FIRST);
        assert_eq!(PageRequest::parse(Some("2.5")), PageRequest::FIRST);
        assert_eq!(
            PageRequest::parse(Some("99999999999999999999")).get(),
            u64::MAX
        );
        assert_eq!(
            PageRequest::parse(Some("99999999999999999999")).locate(12).number,
            2
        );
    }

    #[test]
    fn empty_listing_has_one_page() {
        let window = PageRequest::new(4).locate(0);
        assert_eq!(
            window,
            PageWindow {
                number: 1,
                num_pages: 1,
                count: 0
            }
        );
        let page = window.into_page(Vec::<u8>::new());
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn clamps_to_last_page() {
        let window = PageRequest::new(99).locate(25);
        assert_eq!(window.number, 3);
        assert_eq!(window.num_pages, 3);
        assert_eq!(window.offset(), 20);
        assert_eq!(window.limit(), PAGE_SIZE);
    }

    #[test]
    fn exact_multiple_of_page_size() {
        assert_eq!(PageRequest::FIRST.locate(PAGE_SIZE).num_pages, 1);
        assert_eq!(PageRequest::FIRST.locate(PAGE_SIZE + 1).num_pages, 2);
    }

    #[test]
    fn neighbours() {
        let page = PageRequest::new(2).locate(30).into_page(vec![(); 10]);
        assert!(page.has_previous);
        assert!(page.has_next);
        assert_eq!(page.number, 2);

        let last = PageRequest::new(3).locate(30).into_page(vec![(); 10]);
        assert!(!last.has_next);
    }
}
