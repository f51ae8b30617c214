use serde::{Deserialize, Serialize};

/// Page metadata returned alongside every paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    /// Build metadata for a 1-based `page` of `page_size` items.
    ///
    /// Callers validate `page >= 1` and `page_size >= 1` before querying.
    pub fn new(page: u32, page_size: u32, total_items: u64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(u64::from(page_size));
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);

        Self {
            page,
            page_size,
            total_pages,
            total_items,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        }
    }

    /// Row offset of the first item on this page
    pub fn offset(page: u32, page_size: u32) -> u64 {
        u64::from(page.saturating_sub(1)) * u64::from(page_size)
    }
}

/// One page of items plus its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, page_size: u32, total_items: u64) -> Self {
        Self {
            items,
            pagination: Pagination::new(page, page_size, total_items),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
