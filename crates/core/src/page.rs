//! Pagination bounds for administrative listings.

use serde::Serialize;

/// A clamped page request.
///
/// Page numbers are 1-based. Both the page number and the page size are
/// clamped to at least 1 before any offset is computed, so a request for page
/// 0 reads the first page instead of producing a negative offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Page size used when a request leaves it out.
    pub const DEFAULT_PAGE_SIZE: u32 = 10;

    /// Build a request, clamping both bounds to at least 1.
    #[must_use]
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: clamp_positive(page, u32::MAX),
            page_size: clamp_positive(page_size, u32::MAX),
        }
    }

    /// Build a request from optional query values, applying defaults and an
    /// upper bound on the page size.
    #[must_use]
    pub fn from_query(page: Option<i64>, page_size: Option<i64>, max_page_size: u32) -> Self {
        let page = clamp_positive(page.unwrap_or(1), u32::MAX);
        let page_size = page_size.map_or(Self::DEFAULT_PAGE_SIZE, |size| {
            clamp_positive(size, max_page_size.max(1))
        });
        Self { page, page_size }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Rows per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows to skip: `(page - 1) * page_size`, saturating at `i64::MAX`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1).saturating_mul(i64::from(self.page_size))
    }

    /// Rows to fetch.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

fn clamp_positive(value: i64, max: u32) -> u32 {
    u32::try_from(value.max(1)).map_or(max, |v| v.min(max))
}

/// Number of pages needed for `total` rows, 0 when there are none.
#[must_use]
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    if total == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size.max(1)))
}

/// One page of results plus the numbers needed to render pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Rows matching the filter across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// `ceil(total / page_size)`.
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from fetched rows and the unpaginated count.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            page_size: request.page_size(),
            total_pages: total_pages(total, request.page_size()),
        }
    }

    /// Convert every row, keeping the pagination numbers.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(23, 10), 3);
        assert_eq!(total_pages(20, 10), 2);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(0, 10), 0);
    }

    #[test]
    fn test_page_zero_clamps_to_first_page() {
        let request = PageRequest::new(0, 10);
        assert_eq!(request.page(), 1);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_negative_bounds_clamp() {
        let request = PageRequest::new(-3, -5);
        assert_eq!(request.page(), 1);
        assert_eq!(request.page_size(), 1);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
        assert_eq!(PageRequest::new(2, 25).offset(), 25);
    }

    #[test]
    fn test_huge_bounds_saturate() {
        let request = PageRequest::new(i64::from(u32::MAX), i64::from(u32::MAX));
        assert_eq!(request.page(), u32::MAX);
        assert_eq!(request.offset(), i64::MAX);

        let capped = PageRequest::from_query(Some(i64::MAX), Some(i64::MAX), 1_000);
        assert_eq!(capped.page(), u32::MAX);
        assert_eq!(capped.page_size(), 1_000);
        assert_eq!(capped.offset(), (i64::from(u32::MAX) - 1) * 1_000);
    }

    #[test]
    fn test_from_query_defaults_and_caps() {
        let request = PageRequest::from_query(None, None, 100);
        assert_eq!(request, PageRequest::default());

        let capped = PageRequest::from_query(Some(2), Some(1_000), 100);
        assert_eq!(capped.page_size(), 100);
        assert_eq!(capped.offset(), 100);

        let zero = PageRequest::from_query(Some(0), Some(0), 100);
        assert_eq!(zero.page(), 1);
        assert_eq!(zero.page_size(), 1);
    }

    #[test]
    fn test_page_carries_counts() {
        let page = Page::new(vec![1, 2, 3], 23, PageRequest::new(3, 10));
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 3);

        let doubled = page.map(|n| n * 2);
        assert_eq!(doubled.items, vec![2, 4, 6]);
        assert_eq!(doubled.total, 23);
    }
}
