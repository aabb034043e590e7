//! Paginated search results.

use serde::{Deserialize, Serialize};

/// One page of search results.
///
/// `count` is the number of rows matching the search across all pages, `data` holds at
/// most one page worth of them.
///
/// ```ignore
/// let page = PaginationData::new(2, 10, 25, books);
/// assert_eq!(page.total_pages, 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaginationData<T> {
    /// The requested page, starting at 1.
    pub page: u64,
    /// Number of pages needed to hold `count` rows.
    pub total_pages: u64,
    /// Total number of matching rows.
    pub count: u64,
    /// The rows on this page.
    pub data: Vec<T>,
}

impl<T> PaginationData<T> {
    pub fn new(page: u64, page_size: u64, count: u64, data: Vec<T>) -> Self {
        Self {
            page,
            total_pages: total_pages(count, page_size),
            count,
            data,
        }
    }

    /// Converts the rows of this page, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginationData<U> {
        PaginationData {
            page: self.page,
            total_pages: self.total_pages,
            count: self.count,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

/// Number of pages of `page_size` rows needed for `count` rows.
pub fn total_pages(count: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}
